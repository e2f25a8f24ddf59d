//! Bundled programs for the `stvm` binary, built with the tree builder.
use syntax::ast::{Expr, File, Stat};
use syntax::builder::*;

pub struct Demo {
    pub name: &'static str,
    pub description: &'static str,
    build: fn() -> File,
}

impl Demo {
    pub fn file(&self) -> File {
        (self.build)()
    }
}

pub const DEMOS: &[Demo] = &[
    Demo {
        name: "arith",
        description: "integer and float arithmetic",
        build: arith,
    },
    Demo {
        name: "closures",
        description: "blocks capturing and mutating a local",
        build: closures,
    },
    Demo {
        name: "nonlocal",
        description: "^ from inside a conditional block",
        build: nonlocal,
    },
    Demo {
        name: "inheritance",
        description: "overrides and super sends",
        build: inheritance,
    },
    Demo {
        name: "arrays",
        description: "array literals, at:put: and strings",
        build: arrays,
    },
    Demo {
        name: "factorial",
        description: "recursive method with an early return",
        build: factorial,
    },
];

pub fn demo(name: &str) -> Option<&'static Demo> {
    DEMOS.iter().find(|d| d.name == name)
}

pub fn names() -> impl Iterator<Item = &'static str> {
    DEMOS.iter().map(|d| d.name)
}

fn show(value: Expr) -> Stat {
    stat(send(var("Transcript"), "show:", vec![value]))
}

fn arith() -> File {
    script(body(&[], vec![
        show(send(int(3), "+", vec![int(4)])),
        show(send(send(float(1.5), "*", vec![float(4.0)]), "printString", vec![])),
        show(send(int(-7), "\\\\", vec![int(2)])),
        ret(send(send(int(10), "-", vec![int(2)]), "*", vec![int(3)])),
    ]))
}

fn closures() -> File {
    script(body(&["count", "inc"], vec![
        stat(assign("count", int(0))),
        stat(assign(
            "inc",
            block(&["by"], body(&[], vec![stat(assign(
                "count",
                send(var("count"), "+", vec![var("by")]),
            ))])),
        )),
        stat(send(var("inc"), "value:", vec![int(5)])),
        stat(send(var("inc"), "value:", vec![int(2)])),
        show(var("count")),
        ret(var("count")),
    ]))
}

fn nonlocal() -> File {
    let guard = class("Guard")
        .method(method("check:", &["x"], body(&[], vec![
            stat(send(send(var("x"), ">", vec![int(0)]), "ifTrue:", vec![block(
                &[],
                body(&[], vec![ret(string("positive"))]),
            )])),
            ret(string("non-positive")),
        ])))
        .build();
    script(body(&["g"], vec![
        stat(assign("g", send(var("Guard"), "new", vec![]))),
        show(send(var("g"), "check:", vec![int(5)])),
        ret(send(var("g"), "check:", vec![int(-1)])),
    ]))
    .with_class(guard)
}

fn inheritance() -> File {
    let animal = class("Animal")
        .fields(&["name"])
        .method(method("name:", &["n"], body(&[], vec![stat(assign("name", var("n")))])))
        .method(method("sound", &[], body(&[], vec![ret(string("..."))])))
        .method(method("speak", &[], body(&[], vec![ret(send(
            send(var("name"), ",", vec![string(" says ")]),
            ",",
            vec![send(self_(), "sound", vec![])],
        ))])))
        .build();
    let dog = class("Dog")
        .extends("Animal")
        .method(method("sound", &[], body(&[], vec![ret(string("woof"))])))
        .build();
    let cat = class("Cat")
        .extends("Animal")
        .method(method("sound", &[], body(&[], vec![ret(send(
            send(super_(), "sound", vec![]),
            ",",
            vec![string("meow")],
        ))])))
        .build();
    script(body(&[], vec![
        show(send(send(send(var("Dog"), "new", vec![]), "name:", vec![string("Rex")]), "speak", vec![])),
        ret(send(send(send(var("Cat"), "new", vec![]), "name:", vec![string("Tom")]), "speak", vec![])),
    ]))
    .with_class(animal)
    .with_class(dog)
    .with_class(cat)
}

fn arrays() -> File {
    script(body(&["a"], vec![
        stat(assign("a", send(var("Array"), "new:", vec![int(3)]))),
        stat(send(var("a"), "at:put:", vec![int(1), int(10)])),
        stat(send(var("a"), "at:put:", vec![int(3), string("three")])),
        show(var("a")),
        show(send(string("hello"), "at:", vec![int(1)])),
        show(send(array(vec![int(1), character('x'), nil()]), "size", vec![])),
        ret(var("a")),
    ]))
}

fn factorial() -> File {
    let math = class("Math")
        .method(method("fact:", &["n"], body(&[], vec![
            stat(send(send(var("n"), "<=", vec![int(1)]), "ifTrue:", vec![block(
                &[],
                body(&[], vec![ret(int(1))]),
            )])),
            ret(send(var("n"), "*", vec![send(self_(), "fact:", vec![send(
                var("n"),
                "-",
                vec![int(1)],
            )])])),
        ])))
        .build();
    script(body(&[], vec![ret(send(send(var("Math"), "new", vec![]), "fact:", vec![int(10)]))]))
        .with_class(math)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CompilerOptions, TranscriptBuffer, VmOptions, run_file};

    fn run(name: &str) -> (String, String) {
        let out = TranscriptBuffer::new();
        let demo = demo(name).expect("demo exists");
        let value = run_file(demo.file(), &CompilerOptions::default(), VmOptions::default(), out.clone())
            .expect("interpret error");
        (value.to_string(), out.contents())
    }

    #[test]
    fn names_are_unique() {
        let mut all: Vec<&str> = names().collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), DEMOS.len());
    }

    #[test]
    fn arith_demo() {
        assert_eq!(run("arith"), ("24".to_string(), "7\n6\n1\n".to_string()));
    }

    #[test]
    fn closures_demo() {
        assert_eq!(run("closures"), ("7".to_string(), "7\n".to_string()));
    }

    #[test]
    fn nonlocal_demo() {
        assert_eq!(run("nonlocal"), ("non-positive".to_string(), "positive\n".to_string()));
    }

    #[test]
    fn inheritance_demo() {
        assert_eq!(
            run("inheritance"),
            ("Tom says ...meow".to_string(), "Rex says woof\n".to_string())
        );
    }

    #[test]
    fn arrays_demo() {
        assert_eq!(
            run("arrays"),
            ("{10. nil. 'three'}".to_string(), "{10. nil. 'three'}\n$h\n3\n".to_string())
        );
    }

    #[test]
    fn factorial_demo() {
        assert_eq!(run("factorial").0, "3628800");
    }
}
