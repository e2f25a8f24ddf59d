mod common;

use std::rc::Rc;

use bytecode::{BytecodeBuilder, Instruction};
use object::{CompiledUnit, Value};
use pretty_assertions::assert_eq;
use syntax::builder::*;
use vm::{Compiler, CompilerOptions, ErrorKind, Vm};

use common::{compile, run, run_with_output};

#[test]
fn three_plus_four() {
    let file = script(body(&[], vec![stat(send(int(3), "+", vec![int(4)]))]));
    let program = compile(file.clone());
    let main = program.method("MainClass", "main").expect("main method");
    assert_eq!(
        main.decode().unwrap(),
        vec![
            Instruction::PushInt { value: 3 },
            Instruction::PushInt { value: 4 },
            Instruction::Send { argc: 1, selector: 0 },
            Instruction::Return,
        ]
    );
    assert_eq!(main.literals, vec!["+".to_string()]);

    let value = run(file).expect("interpret error");
    assert!(matches!(value, Value::Integer(7)));
}

#[test]
fn block_value_and_lexical_parent() {
    let value = run(script(body(&["b"], vec![
        stat(assign("b", block(&[], body(&[], vec![stat(int(10))])))),
        ret(send(var("b"), "value", vec![])),
    ])))
    .expect("interpret error");
    assert!(matches!(value, Value::Integer(10)));

    let value = run(script(body(&["b"], vec![
        stat(assign("b", block(&[], body(&[], vec![stat(int(10))])))),
        ret(var("b")),
    ])))
    .expect("interpret error");
    let Value::Closure(closure) = &value else {
        panic!("expected a closure, got {value:?}");
    };
    let frame = closure.frame.borrow();
    assert_eq!(frame.unit.qualified_name, "MainClass>>main");
    match &frame.locals[0] {
        Value::Closure(stored) => assert!(Rc::ptr_eq(stored, closure)),
        other => panic!("expected the closure in b, got {other:?}"),
    }
}

#[test]
fn non_local_return_through_nested_blocks() {
    let finder = class("Finder")
        .method(method("run", &[], body(&[], vec![
            stat(send(true_(), "ifTrue:", vec![block(&[], body(&[], vec![
                stat(send(block(&[], body(&[], vec![ret(int(5))])), "value", vec![])),
                stat(int(7)),
            ]))])),
            ret(int(0)),
        ])))
        .build();
    let value = run(script(body(&[], vec![ret(send(
        send(var("Finder"), "new", vec![]),
        "run",
        vec![],
    ))]))
    .with_class(finder))
    .expect("interpret error");
    assert!(matches!(value, Value::Integer(5)));
}

#[test]
fn non_local_return_resumes_the_caller() {
    let finder = class("Finder")
        .method(method("pick", &[], body(&[], vec![
            stat(send(false_(), "ifFalse:", vec![block(&[], body(&[], vec![ret(int(5))]))])),
            ret(int(0)),
        ])))
        .build();
    let value = run(script(body(&[], vec![ret(send(
        send(send(var("Finder"), "new", vec![]), "pick", vec![]),
        "+",
        vec![int(1)],
    ))]))
    .with_class(finder))
    .expect("interpret error");
    assert!(matches!(value, Value::Integer(6)));
}

#[test]
fn instance_method_sent_to_class() {
    let animal = class("Animal")
        .method(method("speak", &[], body(&[], vec![ret(string("hi"))])))
        .build();
    let err = run(script(body(&[], vec![stat(send(var("Animal"), "speak", vec![]))])).with_class(animal))
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::MessageNotUnderstood);
    assert_eq!(err.message, "speak is an instance method sent to class object Animal");
}

#[test]
fn class_method_sent_to_instance() {
    let counter = class("Counter")
        .method(class_method("make", &[], body(&[], vec![ret(send(self_(), "new", vec![]))])))
        .build();
    let file = script(body(&[], vec![stat(send(
        send(var("Counter"), "make", vec![]),
        "make",
        vec![],
    ))]))
    .with_class(counter);
    let err = run(file).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ClassMessageSentToInstance);
    assert_eq!(err.message, "make is a class method sent to instance of Counter");
}

#[test]
fn array_index_zero_is_out_of_range() {
    let err = run(script(body(&[], vec![stat(send(
        array(vec![int(1), int(2)]),
        "at:",
        vec![int(0)],
    ))])))
    .unwrap_err();
    assert_eq!(err.kind, ErrorKind::IndexOutOfRange);

    let value = run(script(body(&[], vec![ret(send(
        array(vec![int(1), int(2)]),
        "at:",
        vec![int(2)],
    ))])))
    .expect("interpret error");
    assert!(matches!(value, Value::Integer(2)));
}

#[test]
fn sibling_overrides_and_super() {
    let base = class("Shape")
        .method(method("name", &[], body(&[], vec![ret(string("shape"))])))
        .build();
    let circle = class("Circle")
        .extends("Shape")
        .method(method("name", &[], body(&[], vec![ret(string("circle"))])))
        .method(method("base", &[], body(&[], vec![ret(send(super_(), "name", vec![]))])))
        .build();
    let square = class("Square")
        .extends("Shape")
        .method(method("name", &[], body(&[], vec![ret(string("square"))])))
        .method(method("base", &[], body(&[], vec![ret(send(super_(), "name", vec![]))])))
        .build();
    let file = script(body(&["c", "s"], vec![
        stat(assign("c", send(var("Circle"), "new", vec![]))),
        stat(assign("s", send(var("Square"), "new", vec![]))),
        ret(array(vec![
            send(var("c"), "name", vec![]),
            send(var("s"), "name", vec![]),
            send(var("c"), "base", vec![]),
            send(var("s"), "base", vec![]),
        ])),
    ]))
    .with_class(base)
    .with_class(circle)
    .with_class(square);
    let value = run(file).expect("interpret error");
    assert_eq!(value.to_string(), "{'circle'. 'square'. 'shape'. 'shape'}");
}

#[test]
fn super_starts_above_the_declaring_class() {
    let a = class("A")
        .method(method("test", &[], body(&[], vec![ret(string("A"))])))
        .build();
    let b = class("B")
        .extends("A")
        .method(method("test", &[], body(&[], vec![ret(send(super_(), "test", vec![]))])))
        .build();
    let c = class("C").extends("B").build();
    let value = run(script(body(&[], vec![ret(send(
        send(var("C"), "new", vec![]),
        "test",
        vec![],
    ))]))
    .with_class(a)
    .with_class(b)
    .with_class(c))
    .expect("interpret error");
    assert_eq!(value.to_string(), "A");
}

#[test]
fn blocks_capture_variables_by_reference() {
    let value = run(script(body(&["x", "b"], vec![
        stat(assign("x", int(1))),
        stat(assign("b", block(&[], body(&[], vec![stat(var("x"))])))),
        stat(assign("x", int(42))),
        ret(send(var("b"), "value", vec![])),
    ])))
    .expect("interpret error");
    assert!(matches!(value, Value::Integer(42)));
}

#[test]
fn escaped_block_cannot_return() {
    let maker = class("Maker")
        .method(method("make", &[], body(&[], vec![ret(block(&[], body(&[], vec![ret(int(5))])))])))
        .build();
    let err = run(script(body(&[], vec![ret(send(
        send(send(var("Maker"), "new", vec![]), "make", vec![]),
        "value",
        vec![],
    ))]))
    .with_class(maker))
    .unwrap_err();
    assert_eq!(err.kind, ErrorKind::BlockCannotReturn);
}

#[test]
fn failed_return_keeps_its_value_in_the_trace() {
    let maker = class("Maker")
        .method(method("make", &[], body(&[], vec![ret(block(&[], body(&[], vec![ret(int(5))])))])))
        .build();
    let err = run(script(body(&[], vec![ret(send(
        send(send(var("Maker"), "new", vec![]), "make", vec![]),
        "value",
        vec![],
    ))]))
    .with_class(maker))
    .unwrap_err();
    assert_eq!(err.message, "Maker>>make has already returned");
    let innermost = err.trace.lines().next().expect("trace line");
    assert!(innermost.contains("stack=[5]"), "trace was {}", err.trace);
}

#[test]
fn block_of_unwound_method_cannot_return() {
    let keeper = class("Keeper")
        .fields(&["saved"])
        .method(method("saved", &[], body(&[], vec![ret(var("saved"))])))
        .method(method("outer", &[], body(&[], vec![
            stat(send(self_(), "inner:", vec![block(&[], body(&[], vec![ret(int(0))]))])),
            ret(int(1)),
        ])))
        .method(method("inner:", &["escape"], body(&[], vec![
            stat(assign("saved", block(&[], body(&[], vec![ret(int(7))])))),
            stat(send(var("escape"), "value", vec![])),
            ret(int(2)),
        ])))
        .build();
    let file = script(body(&["k"], vec![
        stat(assign("k", send(var("Keeper"), "new", vec![]))),
        stat(send(var("k"), "outer", vec![])),
        ret(send(send(var("k"), "saved", vec![]), "value", vec![])),
    ]))
    .with_class(keeper);
    let err = run(file).unwrap_err();
    assert_eq!(err.kind, ErrorKind::BlockCannotReturn);
    assert_eq!(err.message, "Keeper>>inner: was unwound by a non-local return");
}

#[test]
fn block_argument_count_must_match() {
    let err = run(script(body(&[], vec![stat(send(
        block(&["a"], body(&[], vec![stat(var("a"))])),
        "value",
        vec![],
    ))])))
    .unwrap_err();
    assert_eq!(err.kind, ErrorKind::MismatchedBlockArg);
}

#[test]
fn division_by_zero_is_an_error() {
    let err = run(script(body(&[], vec![stat(send(int(1), "/", vec![int(0)]))]))).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Other);
    assert_eq!(err.message, "division by zero");
}

#[test]
fn integer_remainders_by_zero_are_errors() {
    for selector in ["\\\\", "mod:"] {
        let err = run(script(body(&[], vec![stat(send(int(7), selector, vec![int(0)]))]))).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Other, "{selector}");
        assert_eq!(err.message, "division by zero");
    }
}

#[test]
fn additive_and_multiplicative_identities() {
    let value = run(script(body(&[], vec![ret(array(vec![
        send(int(9), "+", vec![int(0)]),
        send(int(9), "*", vec![int(1)]),
        send(float(2.5), "+", vec![float(0.0)]),
        send(float(2.5), "*", vec![float(1.0)]),
    ]))])))
    .expect("interpret error");
    assert_eq!(value.to_string(), "{9. 9. 2.5. 2.5}");
}

#[test]
fn remainder_sign_conventions() {
    let value = run(script(body(&[], vec![ret(array(vec![
        send(int(-7), "\\\\", vec![int(2)]),
        send(int(-7), "mod:", vec![int(2)]),
        send(int(7), "\\\\", vec![int(-2)]),
        send(int(7), "mod:", vec![int(-2)]),
        send(int(i32::MIN), "/", vec![int(-1)]),
    ]))])))
    .expect("interpret error");
    assert_eq!(value.to_string(), "{1. -1. -1. 1. -2147483648}");
}

#[test]
fn oversized_array_is_an_internal_error() {
    let err = run(script(body(&[], vec![stat(send(var("Array"), "new:", vec![int(2_000_000_000)]))])))
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InternalVmException);
}

#[test]
fn error_message_from_program() {
    let err = run(script(body(&[], vec![stat(send(self_(), "error:", vec![string("boom")]))])))
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Other);
    assert_eq!(err.message, "boom");
    assert!(err.trace.contains("MainClass>>main"));
}

#[test]
fn wrong_operand_kind_is_a_type_error() {
    let err = run(script(body(&[], vec![stat(send(int(1), "+", vec![string("x")]))]))).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeError);
}

#[test]
fn undefined_global_at_run_time() {
    let err = run(script(body(&[], vec![stat(var("Missing"))]))).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UndefinedGlobal);
}

#[test]
fn transcript_receives_output() {
    let (result, output) = run_with_output(script(body(&[], vec![
        stat(send(var("Transcript"), "show:", vec![string("hello")])),
        stat(send(var("Transcript"), "show:", vec![send(int(6), "*", vec![int(7)])])),
        stat(send(var("Transcript"), "cr", vec![])),
    ])));
    result.expect("interpret error");
    assert_eq!(output, "hello\n42\n\n");
}

#[test]
fn debug_locations_reach_the_trace() {
    let file = script(body(&[], vec![stat(
        send(int(1), "foo", vec![]).at(3, 7),
    )]));
    let program = Compiler::new(CompilerOptions::for_path("/tmp/demo/prog.st", true))
        .compile(file)
        .expect("compile error");
    let err = Vm::new(&program).and_then(|mut vm| vm.run_main()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::MessageNotUnderstood);
    assert!(err.trace.contains("(prog.st:3:7)"), "trace was {}", err.trace);
}

#[test]
fn redefinitions_are_collected() {
    let file = script(body(&["x", "x"], vec![stat(var("x"))])).with_class(
        class("Point").fields(&["x", "x"]).build(),
    );
    let err = Compiler::new(CompilerOptions::default()).compile(file).unwrap_err();
    assert_eq!(err.issues.len(), 2);
}

fn reemit(unit: &CompiledUnit) {
    let mut code = BytecodeBuilder::new();
    for instr in unit.decode().expect("decodable") {
        code.emit(instr);
    }
    assert_eq!(code.into_bytes(), unit.bytecode, "{}", unit.qualified_name);
    for block in &unit.blocks {
        reemit(block);
    }
}

#[test]
fn generated_code_round_trips() {
    let file = script(body(&["a", "b"], vec![
        stat(assign("a", array(vec![int(1), float(2.5), character('c'), string("d"), nil(), true_()]))),
        stat(assign("b", block(&["x"], body(&["y"], vec![
            stat(assign("y", send(var("x"), "+", vec![var("a")]))),
            stat(block(&[], body(&[], vec![ret(var("y"))]))),
        ])))),
        ret(send(var("b"), "value:", vec![int(-3)])),
    ]));
    let program = Compiler::new(CompilerOptions::for_path("rt.st", true))
        .compile(file)
        .expect("compile error");
    for class in &program.classes {
        for method in &class.methods {
            reemit(method);
        }
    }
}
