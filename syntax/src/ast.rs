/// Syntax tree consumed by the code generator.
///
/// Nodes that open a lexical scope (methods, blocks, the main body) carry a
/// `scope` slot filled by [`define_symbols`](crate::define_symbols), and
/// every variable reference carries a `binding` slot filled by
/// [`resolve_symbols`](crate::resolve_symbols).
use crate::scope::ScopeId;
use crate::span::{Pos, Span};

/// One compilation unit: optional top-level code plus class definitions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct File {
    pub main: Option<Main>,
    pub classes: Vec<ClassDef>,
}

/// Top-level statements. They run as the `main` method of `MainClass`.
#[derive(Debug, Clone, PartialEq)]
pub struct Main {
    pub body: Body,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: Ident,
    /// `None` only for the root class.
    pub superclass: Option<Ident>,
    pub fields: Vec<Ident>,
    pub methods: Vec<MethodDef>,
    pub scope: Option<ScopeId>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDef {
    pub selector: Ident,
    pub args: Vec<Ident>,
    pub is_class_method: bool,
    /// Top-level code lowered into a method: it answers the value of its
    /// last statement instead of the receiver.
    pub script: bool,
    pub body: MethodBody,
    pub scope: Option<ScopeId>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MethodBody {
    /// `<primitive: Name>`; the name refers to a built-in operation.
    Primitive(String),
    Code(Body),
}

/// Declared locals plus statements. `end` is where the body closes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Body {
    pub locals: Vec<Ident>,
    pub stats: Vec<Stat>,
    pub end: Pos,
}

impl Body {
    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    pub fn ends_with_return(&self) -> bool {
        matches!(self.stats.last(), Some(Stat::Return { .. }))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stat {
    Expr(Expr),
    /// `^ value`
    Return { value: Expr, span: Span },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Integer(i32),
    Float(f32),
    Character(char),
    /// String literal as written, quotes included.
    String(String),
    Nil,
    True,
    False,
    SelfRef,
    /// `super`; only valid as the receiver of a message.
    Super,
    Var(VarRef),
    /// `{ a. b. c }`
    Array(Vec<Expr>),
    Block(Box<BlockExpr>),
    Assign {
        target: VarRef,
        value: Box<Expr>,
    },
    Unary {
        receiver: Box<Expr>,
        selector: Ident,
    },
    Binary {
        receiver: Box<Expr>,
        operator: Ident,
        argument: Box<Expr>,
    },
    Keyword {
        receiver: Box<Expr>,
        /// Each pair is (keyword part, argument).
        pairs: Vec<(Ident, Expr)>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockExpr {
    pub args: Vec<Ident>,
    pub body: Body,
    pub scope: Option<ScopeId>,
}

/// An identifier used as a variable.
#[derive(Debug, Clone, PartialEq)]
pub struct VarRef {
    pub name: String,
    pub span: Span,
    pub binding: Option<Binding>,
}

impl VarRef {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
            binding: None,
        }
    }
}

/// What a variable reference denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// Looked up by name in the global namespace at run time.
    Global,
    /// Receiver field at this object slot.
    Field { slot: u16 },
    /// Argument or local of the frame for `scope`.
    Local { scope: ScopeId, index: u16 },
}
