//! Helpers for building syntax trees in code.
//!
//! ```
//! use syntax::builder::*;
//!
//! let file = script(body(&[], vec![
//!     stat(send(var("Transcript"), "show:", vec![string("hello")])),
//! ]));
//! assert!(file.main.is_some());
//! ```
use crate::ast::{BlockExpr, Body, ClassDef, Expr, ExprKind, File, Ident, Main, MethodBody, MethodDef, Stat, VarRef};
use crate::resolve::ROOT_CLASS;
use crate::span::{Pos, Span};

fn expr(kind: ExprKind) -> Expr {
    Expr::new(kind, Span::default())
}

fn ident(name: &str) -> Ident {
    Ident::new(name, Span::default())
}

impl Expr {
    /// Place the expression at a source position.
    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.span = Span::at(line, column);
        self
    }
}

pub fn int(value: i32) -> Expr {
    expr(ExprKind::Integer(value))
}

pub fn float(value: f32) -> Expr {
    expr(ExprKind::Float(value))
}

pub fn character(value: char) -> Expr {
    expr(ExprKind::Character(value))
}

/// A string literal; `text` is the content without quotes.
pub fn string(text: &str) -> Expr {
    expr(ExprKind::String(format!("'{text}'")))
}

pub fn nil() -> Expr {
    expr(ExprKind::Nil)
}

pub fn true_() -> Expr {
    expr(ExprKind::True)
}

pub fn false_() -> Expr {
    expr(ExprKind::False)
}

pub fn self_() -> Expr {
    expr(ExprKind::SelfRef)
}

pub fn super_() -> Expr {
    expr(ExprKind::Super)
}

pub fn var(name: &str) -> Expr {
    expr(ExprKind::Var(VarRef::new(name, Span::default())))
}

pub fn array(items: Vec<Expr>) -> Expr {
    expr(ExprKind::Array(items))
}

pub fn block(args: &[&str], body: Body) -> Expr {
    expr(ExprKind::Block(Box::new(BlockExpr {
        args: args.iter().map(|a| ident(a)).collect(),
        body,
        scope: None,
    })))
}

pub fn assign(name: &str, value: Expr) -> Expr {
    expr(ExprKind::Assign {
        target: VarRef::new(name, Span::default()),
        value: Box::new(value),
    })
}

/// A message send; the shape (unary, binary, keyword) follows the selector.
pub fn send(receiver: Expr, selector: &str, args: Vec<Expr>) -> Expr {
    let receiver = Box::new(receiver);
    let kind = if selector.contains(':') {
        let parts = selector
            .split_inclusive(':')
            .map(ident)
            .zip(args)
            .collect();
        ExprKind::Keyword {
            receiver,
            pairs: parts,
        }
    } else if let Some(argument) = args.into_iter().next() {
        ExprKind::Binary {
            receiver,
            operator: ident(selector),
            argument: Box::new(argument),
        }
    } else {
        ExprKind::Unary {
            receiver,
            selector: ident(selector),
        }
    };
    expr(kind)
}

pub fn stat(expr: Expr) -> Stat {
    Stat::Expr(expr)
}

pub fn ret(value: Expr) -> Stat {
    Stat::Return {
        span: value.span,
        value,
    }
}

pub fn body(locals: &[&str], stats: Vec<Stat>) -> Body {
    Body {
        locals: locals.iter().map(|l| ident(l)).collect(),
        stats,
        end: Pos::origin(),
    }
}

pub fn method(selector: &str, args: &[&str], body: Body) -> MethodDef {
    MethodDef {
        selector: ident(selector),
        args: args.iter().map(|a| ident(a)).collect(),
        is_class_method: false,
        script: false,
        body: MethodBody::Code(body),
        scope: None,
        span: Span::default(),
    }
}

pub fn class_method(selector: &str, args: &[&str], body: Body) -> MethodDef {
    MethodDef {
        is_class_method: true,
        ..method(selector, args, body)
    }
}

/// A method whose body is the named built-in operation.
pub fn primitive(selector: &str, args: &[&str], name: &str, class_side: bool) -> MethodDef {
    MethodDef {
        is_class_method: class_side,
        body: MethodBody::Primitive(name.to_string()),
        ..method(selector, args, Body::default())
    }
}

pub struct ClassBuilder {
    def: ClassDef,
}

/// Start a class definition; the superclass defaults to `Object`.
pub fn class(name: &str) -> ClassBuilder {
    ClassBuilder {
        def: ClassDef {
            name: ident(name),
            superclass: Some(ident(ROOT_CLASS)),
            fields: Vec::new(),
            methods: Vec::new(),
            scope: None,
            span: Span::default(),
        },
    }
}

impl ClassBuilder {
    pub fn extends(mut self, superclass: &str) -> Self {
        self.def.superclass = Some(ident(superclass));
        self
    }

    pub fn root(mut self) -> Self {
        self.def.superclass = None;
        self
    }

    pub fn fields(mut self, names: &[&str]) -> Self {
        self.def.fields.extend(names.iter().map(|n| ident(n)));
        self
    }

    pub fn method(mut self, method: MethodDef) -> Self {
        self.def.methods.push(method);
        self
    }

    pub fn build(self) -> ClassDef {
        self.def
    }
}

/// A file with top-level code and no classes.
pub fn script(main: Body) -> File {
    File {
        main: Some(Main {
            body: main,
            span: Span::default(),
        }),
        classes: Vec::new(),
    }
}

impl File {
    pub fn with_class(mut self, class: ClassDef) -> Self {
        self.classes.push(class);
        self
    }
}
