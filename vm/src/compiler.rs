use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use bytecode::BytecodeBuilder;
use object::{CompiledUnit, LiteralTable, Primitive};
use syntax::ast::{BlockExpr, Binding, Body, ClassDef, Expr, ExprKind, File, MethodBody, MethodDef, Stat, VarRef};
use syntax::{Pos, ScopeId, SemanticIssue, Span, SymbolTable};

use crate::error::CompileError;
use crate::prelude;

#[derive(Debug, Clone)]
pub struct CompilerOptions {
    /// Base name of the source file, recorded by debug markers.
    pub file_name: String,
    /// Emit `Dbg` instructions.
    pub gen_dbg: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            file_name: "<unknown>".to_string(),
            gen_dbg: false,
        }
    }
}

impl CompilerOptions {
    /// Options for a source path; only its base name is kept.
    pub fn for_path(path: impl AsRef<Path>, gen_dbg: bool) -> Self {
        let file_name = path
            .as_ref()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "<unknown>".to_string());
        Self { file_name, gen_dbg }
    }
}

/// Compiled form of one class, ready to be turned into a runtime class.
#[derive(Debug, Clone)]
pub struct CompiledClass {
    pub name: String,
    pub superclass: Option<String>,
    /// All fields, inherited first.
    pub fields: Vec<String>,
    pub methods: Vec<Rc<CompiledUnit>>,
}

/// Output of the compiler: classes ordered superclass first.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub classes: Vec<CompiledClass>,
}

impl Program {
    pub fn class(&self, name: &str) -> Option<&CompiledClass> {
        self.classes.iter().find(|c| c.name == name)
    }

    pub fn method(&self, class: &str, selector: &str) -> Option<&Rc<CompiledUnit>> {
        self.class(class)?
            .methods
            .iter()
            .find(|m| m.name == selector && !m.is_class_method)
    }

    pub fn class_method(&self, class: &str, selector: &str) -> Option<&Rc<CompiledUnit>> {
        self.class(class)?
            .methods
            .iter()
            .find(|m| m.name == selector && m.is_class_method)
    }
}

pub struct Compiler {
    options: CompilerOptions,
}

impl Compiler {
    pub fn new(options: CompilerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn compile(&self, mut file: File) -> Result<Program, CompileError> {
        let mut classes = prelude::kernel_classes();
        classes.append(&mut file.classes);
        file.classes = classes;
        let (table, issues) = syntax::analyze(&mut file);
        if !issues.is_empty() {
            return Err(CompileError { issues });
        }

        let mut generator = CodeGenerator::new(&table, &self.options);
        let program = generator.generate(&file);
        if !generator.issues.is_empty() {
            return Err(CompileError {
                issues: generator.issues,
            });
        }
        log::debug!(
            "compiled {} classes from {}",
            program.classes.len(),
            self.options.file_name
        );
        Ok(program)
    }
}

/// Code being generated for one method or block.
struct UnitState {
    scope: ScopeId,
    name: String,
    qualified_name: String,
    is_class_method: bool,
    code: BytecodeBuilder,
    blocks: Vec<Rc<CompiledUnit>>,
}

/// Walks analysed syntax trees and emits one [`CompiledUnit`] per method
/// and block. Units nest the way their scopes do: the innermost unit being
/// generated is the top of `units`.
pub(crate) struct CodeGenerator<'a> {
    table: &'a SymbolTable,
    options: &'a CompilerOptions,
    units: Vec<UnitState>,
    /// Literal table per scope, created on first use and moved into the
    /// scope's unit when it is sealed.
    literals: HashMap<ScopeId, LiteralTable>,
    class_name: String,
    issues: Vec<SemanticIssue>,
}

impl<'a> CodeGenerator<'a> {
    pub(crate) fn new(table: &'a SymbolTable, options: &'a CompilerOptions) -> Self {
        Self {
            table,
            options,
            units: Vec::new(),
            literals: HashMap::new(),
            class_name: String::new(),
            issues: Vec::new(),
        }
    }

    pub(crate) fn generate(&mut self, file: &File) -> Program {
        let by_scope: HashMap<ScopeId, &ClassDef> = file
            .classes
            .iter()
            .filter_map(|c| c.scope.map(|s| (s, c)))
            .collect();

        let table = self.table;
        let mut classes = Vec::new();
        for &id in table.classes() {
            let Some(class) = by_scope.get(&id) else {
                continue;
            };
            classes.push(self.class(id, class));
        }
        Program { classes }
    }

    fn class(&mut self, id: ScopeId, class: &ClassDef) -> CompiledClass {
        self.class_name = class.name.name.clone();
        let superclass = self
            .table
            .scope(id)
            .superclass
            .map(|s| self.table.scope(s).name.clone());
        let methods = class
            .methods
            .iter()
            .filter_map(|m| self.method(m))
            .collect();
        CompiledClass {
            name: class.name.name.clone(),
            superclass,
            fields: self.table.field_names(id),
            methods,
        }
    }

    fn method(&mut self, method: &MethodDef) -> Option<Rc<CompiledUnit>> {
        let selector = method.selector.name.as_str();
        let qualified_name = format!("{}>>{selector}", self.class_name);
        let Some(scope) = method.scope else {
            self.issue(format!("{qualified_name} has no scope"), method.span);
            return None;
        };

        let body = match &method.body {
            MethodBody::Primitive(name) => return self.primitive_method(method, name, qualified_name),
            MethodBody::Code(body) => body,
        };

        self.push_unit(scope, selector.to_string(), qualified_name, method.is_class_method);
        self.body(body);
        if body.is_empty() {
            self.code().self_ref();
            self.code().return_();
        } else if !body.ends_with_return() {
            self.dbg(body.end);
            if method.script {
                // top-level code answers its last value
                self.code().return_();
            } else {
                self.code().pop();
                self.code().self_ref();
                self.code().return_();
            }
        }
        Some(self.pop_unit())
    }

    fn primitive_method(
        &mut self,
        method: &MethodDef,
        name: &str,
        qualified_name: String,
    ) -> Option<Rc<CompiledUnit>> {
        let Some(primitive) = Primitive::from_name(name) else {
            self.issue(format!("unknown primitive {name} in {qualified_name}"), method.span);
            return None;
        };
        if primitive.arity() != method.args.len() {
            self.issue(
                format!(
                    "primitive {name} takes {} arguments, {qualified_name} declares {}",
                    primitive.arity(),
                    method.args.len()
                ),
                method.span,
            );
            return None;
        }
        Some(Rc::new(CompiledUnit {
            name: method.selector.name.clone(),
            qualified_name,
            owner: Some(self.class_name.clone()),
            num_args: method.args.len(),
            is_class_method: method.is_class_method,
            primitive: Some(primitive),
            ..CompiledUnit::default()
        }))
    }

    // ── unit stack ─────────────────────────────────────────────────

    fn push_unit(&mut self, scope: ScopeId, name: String, qualified_name: String, is_class_method: bool) {
        self.units.push(UnitState {
            scope,
            name,
            qualified_name,
            is_class_method,
            code: BytecodeBuilder::new(),
            blocks: Vec::new(),
        });
    }

    fn pop_unit(&mut self) -> Rc<CompiledUnit> {
        let Some(state) = self.units.pop() else {
            return Rc::new(CompiledUnit::default());
        };
        let literals = self
            .literals
            .remove(&state.scope)
            .map(LiteralTable::into_vec)
            .unwrap_or_default();
        let (num_args, num_locals) = self.table.frame_shape(state.scope);
        let unit = CompiledUnit {
            name: state.name,
            qualified_name: state.qualified_name,
            owner: Some(self.class_name.clone()),
            bytecode: state.code.into_bytes(),
            literals,
            blocks: state.blocks,
            num_args,
            num_locals,
            is_class_method: state.is_class_method,
            primitive: None,
        };
        log::debug!(
            "sealed {} ({} bytes, {} literals, {} blocks)",
            unit.qualified_name,
            unit.bytecode.len(),
            unit.literals.len(),
            unit.blocks.len()
        );
        Rc::new(unit)
    }

    fn current(&mut self) -> &mut UnitState {
        // Only called between push_unit and pop_unit.
        let last = self.units.len() - 1;
        &mut self.units[last]
    }

    fn code(&mut self) -> &mut BytecodeBuilder {
        &mut self.current().code
    }

    fn intern(&mut self, text: &str, span: Span) -> u16 {
        let scope = self.current().scope;
        match self.literals.entry(scope).or_default().intern(text) {
            Some(idx) => idx,
            None => {
                self.issue("too many literals in one method or block", span);
                0
            }
        }
    }

    fn issue(&mut self, message: impl Into<String>, span: Span) {
        self.issues.push(SemanticIssue::new(message, span));
    }

    fn dbg(&mut self, pos: Pos) {
        if !self.options.gen_dbg {
            return;
        }
        let file_name = self.options.file_name.clone();
        let file = self.intern(&file_name, Span::point(pos));
        let line = pos.line.min(0x00FF_FFFF) as u32;
        let column = pos.column.min(0xFF) as u32;
        self.code().dbg(file, line, column);
    }

    fn operand(&mut self, n: usize, what: &str, span: Span) -> u16 {
        match u16::try_from(n) {
            Ok(n) => n,
            Err(_) => {
                self.issue(format!("too many {what}"), span);
                0
            }
        }
    }

    // ── bodies ─────────────────────────────────────────────────────

    /// Statements separated by `Pop`; the last value stays on the stack.
    /// An empty body emits only its debug marker.
    fn body(&mut self, body: &Body) {
        if body.is_empty() {
            self.dbg(body.end);
            return;
        }
        for (i, stat) in body.stats.iter().enumerate() {
            if i > 0 {
                self.code().pop();
            }
            match stat {
                Stat::Expr(expr) => self.expr(expr),
                Stat::Return { value, span } => {
                    self.expr(value);
                    self.dbg(span.start);
                    self.code().return_();
                }
            }
        }
    }

    fn block(&mut self, block: &BlockExpr, span: Span) {
        let Some(scope) = block.scope else {
            self.issue("block has no scope", span);
            return;
        };
        let (idx, name, qualified_name, is_class_method) = {
            let parent = self.current();
            let idx = parent.blocks.len();
            (
                idx,
                format!("{}-block{idx}", parent.name),
                format!("{}-block{idx}", parent.qualified_name),
                parent.is_class_method,
            )
        };
        let idx = self.operand(idx, "blocks", span);

        self.push_unit(scope, name, qualified_name, is_class_method);
        self.body(&block.body);
        if block.body.is_empty() {
            self.code().nil();
        } else {
            self.dbg(block.body.end);
        }
        self.code().block_return();
        let unit = self.pop_unit();

        self.current().blocks.push(unit);
        self.code().block(idx);
    }

    // ── expressions ────────────────────────────────────────────────

    fn expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Integer(n) => self.code().push_int(*n),
            ExprKind::Float(f) => self.code().push_float(*f),
            ExprKind::Character(c) => match u16::try_from(*c as u32) {
                Ok(code) => self.code().push_char(code),
                Err(_) => self.issue(format!("character {c:?} does not fit a literal"), expr.span),
            },
            ExprKind::String(text) => {
                let idx = self.intern(&strip_quotes(text), expr.span);
                self.code().push_literal(idx);
            }
            ExprKind::Nil => self.code().nil(),
            ExprKind::True => self.code().true_(),
            ExprKind::False => self.code().false_(),
            ExprKind::SelfRef => self.code().self_ref(),
            ExprKind::Super => self.issue("super can only receive a message", expr.span),
            ExprKind::Var(var) => self.load(var),
            ExprKind::Array(items) => {
                for item in items {
                    self.expr(item);
                }
                let count = self.operand(items.len(), "array elements", expr.span);
                self.code().push_array(count);
            }
            ExprKind::Block(block) => self.block(block, expr.span),
            ExprKind::Assign { target, value } => {
                self.dbg(expr.span.start);
                self.expr(value);
                self.store(target);
            }
            ExprKind::Unary { receiver, selector } => {
                self.send(receiver, &selector.name, &[], expr.span)
            }
            ExprKind::Binary {
                receiver,
                operator,
                argument,
            } => self.send(receiver, &operator.name, &[&**argument], expr.span),
            ExprKind::Keyword { receiver, pairs } => {
                let selector: String = pairs.iter().map(|(k, _)| k.name.as_str()).collect();
                let args: Vec<&Expr> = pairs.iter().map(|(_, a)| a).collect();
                self.send(receiver, &selector, &args, expr.span)
            }
        }
    }

    fn send(&mut self, receiver: &Expr, selector: &str, args: &[&Expr], span: Span) {
        let is_super = matches!(receiver.kind, ExprKind::Super);
        if is_super {
            self.code().self_ref();
        } else {
            self.expr(receiver);
        }
        for arg in args {
            self.expr(arg);
        }
        let selector = self.intern(selector, span);
        self.dbg(span.start);
        let argc = self.operand(args.len(), "arguments", span);
        if is_super {
            self.code().send_super(argc, selector);
        } else {
            self.code().send(argc, selector);
        }
    }

    fn local_depth(&mut self, var: &VarRef, owner: ScopeId) -> u16 {
        let from = self.current().scope;
        match self.table.depth(from, owner) {
            Some(depth) => depth,
            None => {
                self.issue(format!("{} is not visible here", var.name), var.span);
                0
            }
        }
    }

    fn load(&mut self, var: &VarRef) {
        match var.binding {
            Some(Binding::Global) => {
                let idx = self.intern(&var.name, var.span);
                self.code().push_global(idx);
            }
            Some(Binding::Field { slot }) => self.code().push_field(slot),
            Some(Binding::Local { scope, index }) => {
                let depth = self.local_depth(var, scope);
                self.code().push_local(depth, index);
            }
            None => self.issue(format!("unresolved identifier {}", var.name), var.span),
        }
    }

    fn store(&mut self, var: &VarRef) {
        match var.binding {
            Some(Binding::Field { slot }) => self.code().store_field(slot),
            Some(Binding::Local { scope, index }) => {
                let depth = self.local_depth(var, scope);
                self.code().store_local(depth, index);
            }
            Some(Binding::Global) => {
                self.issue(format!("cannot assign to global {}", var.name), var.span)
            }
            None => self.issue(format!("unresolved identifier {}", var.name), var.span),
        }
    }
}

/// Literal text without its surrounding quotes; doubled quotes inside
/// collapse to one.
fn strip_quotes(text: &str) -> String {
    match text.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')) {
        Some(inner) => inner.replace("''", "'"),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytecode::Instruction;
    use pretty_assertions::assert_eq;
    use syntax::builder::*;

    fn compile(file: File) -> Program {
        Compiler::new(CompilerOptions::default())
            .compile(file)
            .expect("compile error")
    }

    fn main_unit(program: &Program) -> Rc<CompiledUnit> {
        program
            .method(syntax::MAIN_CLASS, syntax::MAIN_SELECTOR)
            .expect("main method")
            .clone()
    }

    #[test]
    fn addition_emits_pushes_and_send() {
        let program = compile(script(body(&[], vec![stat(send(int(3), "+", vec![int(4)]))])));
        let main = main_unit(&program);
        assert_eq!(main.decode().unwrap(), vec![
            Instruction::PushInt { value: 3 },
            Instruction::PushInt { value: 4 },
            Instruction::Send { argc: 1, selector: 0 },
            Instruction::Return,
        ]);
        assert_eq!(main.literals, vec!["+".to_string()]);
    }

    #[test]
    fn literals_are_interned_once() {
        let program = compile(script(body(&[], vec![
            stat(send(var("Transcript"), "show:", vec![string("hi")])),
            stat(send(var("Transcript"), "show:", vec![string("hi")])),
        ])));
        let main = main_unit(&program);
        assert_eq!(main.literals, vec!["Transcript".to_string(), "hi".to_string(), "show:".to_string()]);
        assert_eq!(main.decode().unwrap(), vec![
            Instruction::PushGlobal { literal: 0 },
            Instruction::PushLiteral { literal: 1 },
            Instruction::Send { argc: 1, selector: 2 },
            Instruction::Pop,
            Instruction::PushGlobal { literal: 0 },
            Instruction::PushLiteral { literal: 1 },
            Instruction::Send { argc: 1, selector: 2 },
            Instruction::Return,
        ]);
    }

    #[test]
    fn methods_fall_through_to_self() {
        let program = compile(File::default().with_class(
            class("Counter")
                .fields(&["count"])
                .method(method("reset", &[], body(&[], vec![stat(assign("count", int(0)))])))
                .method(method("count", &[], body(&[], vec![ret(var("count"))])))
                .method(method("noop", &[], body(&[], vec![])))
                .build(),
        ));
        assert_eq!(program.method("Counter", "reset").unwrap().decode().unwrap(), vec![
            Instruction::PushInt { value: 0 },
            Instruction::StoreField { slot: 0 },
            Instruction::Pop,
            Instruction::SelfRef,
            Instruction::Return,
        ]);
        assert_eq!(program.method("Counter", "count").unwrap().decode().unwrap(), vec![
            Instruction::PushField { slot: 0 },
            Instruction::Return,
        ]);
        assert_eq!(program.method("Counter", "noop").unwrap().decode().unwrap(), vec![
            Instruction::SelfRef,
            Instruction::Return,
        ]);
    }

    #[test]
    fn blocks_compile_to_nested_units() {
        let program = compile(script(body(&["x"], vec![
            stat(assign("x", int(1))),
            stat(block(&["y"], body(&[], vec![stat(send(var("x"), "+", vec![var("y")]))]))),
            stat(block(&[], body(&[], vec![]))),
        ])));
        let main = main_unit(&program);
        assert_eq!(main.blocks.len(), 2);
        assert_eq!(main.decode().unwrap(), vec![
            Instruction::PushInt { value: 1 },
            Instruction::StoreLocal { depth: 0, slot: 0 },
            Instruction::Pop,
            Instruction::Block { block: 0 },
            Instruction::Pop,
            Instruction::Block { block: 1 },
            Instruction::Return,
        ]);

        let adder = &main.blocks[0];
        assert_eq!(adder.name, "main-block0");
        assert_eq!(adder.qualified_name, "MainClass>>main-block0");
        assert_eq!((adder.num_args, adder.num_locals), (1, 0));
        assert_eq!(adder.decode().unwrap(), vec![
            Instruction::PushLocal { depth: 1, slot: 0 },
            Instruction::PushLocal { depth: 0, slot: 0 },
            Instruction::Send { argc: 1, selector: 0 },
            Instruction::BlockReturn,
        ]);

        assert_eq!(main.blocks[1].decode().unwrap(), vec![Instruction::Nil, Instruction::BlockReturn]);
    }

    #[test]
    fn super_sends_push_self() {
        let program = compile(File::default()
            .with_class(class("A").method(method("name", &[], body(&[], vec![ret(string("A"))]))).build())
            .with_class(class("B").extends("A").method(method("name", &[], body(&[], vec![ret(send(super_(), "name", vec![]))]))).build()));
        let unit = program.method("B", "name").unwrap();
        assert_eq!(unit.decode().unwrap(), vec![
            Instruction::SelfRef,
            Instruction::SendSuper { argc: 0, selector: 0 },
            Instruction::Return,
        ]);
        assert_eq!(unit.owner.as_deref(), Some("B"));
    }

    #[test]
    fn keyword_selectors_concatenate_parts() {
        let program = compile(script(body(&["a"], vec![
            stat(assign("a", send(var("Array"), "new:", vec![int(2)]))),
            stat(send(var("a"), "at:put:", vec![int(1), character('x')])),
        ])));
        let main = main_unit(&program);
        assert!(main.literals.contains(&"at:put:".to_string()));
        assert!(main.decode().unwrap().contains(&Instruction::PushChar { code: 'x' as u16 }));
    }

    #[test]
    fn debug_markers_precede_sends_and_returns() {
        let options = CompilerOptions::for_path("/tmp/demo/prog.st", true);
        assert_eq!(options.file_name, "prog.st");
        let program = Compiler::new(options)
            .compile(script(body(&[], vec![ret(send(int(3), "+", vec![int(4)]).at(2, 5))])))
            .unwrap();
        let main = main_unit(&program);
        let instrs = main.decode().unwrap();
        assert_eq!(instrs[2], Instruction::Dbg { file: 1, line: 2, column: 5 });
        assert_eq!(instrs[3], Instruction::Send { argc: 1, selector: 0 });
        assert_eq!(main.literals, vec!["+".to_string(), "prog.st".to_string()]);
        assert!(matches!(instrs.last(), Some(Instruction::Return)));
    }

    #[test]
    fn empty_body_with_debug_emits_marker_only() {
        let program = Compiler::new(CompilerOptions::for_path("x.st", true))
            .compile(File::default().with_class(class("A").method(method("noop", &[], body(&[], vec![]))).build()))
            .unwrap();
        let instrs = program.method("A", "noop").unwrap().decode().unwrap();
        assert!(matches!(instrs[0], Instruction::Dbg { .. }));
        assert_eq!(&instrs[1..], &[Instruction::SelfRef, Instruction::Return]);
    }

    #[test]
    fn primitives_are_bound_by_name() {
        let program = compile(File::default());
        let add = program.method("Integer", "+").expect("Integer>>+");
        assert_eq!(add.primitive, Some(Primitive::IntegerAdd));
        assert!(add.bytecode.is_empty());
        let new = program.class_method("Array", "new:").expect("Array class>>new:");
        assert_eq!(new.primitive, Some(Primitive::ArrayClassNewSize));
    }

    #[test]
    fn compile_errors_are_collected() {
        let err = Compiler::new(CompilerOptions::default())
            .compile(File::default()
                .with_class(class("A").method(primitive("frob", &[], "NoSuchPrimitive", false)).build())
                .with_class(class("B").method(method("m", &[], body(&[], vec![stat(super_())]))).build()))
            .unwrap_err();
        let messages: Vec<_> = err.issues.iter().map(|i| i.message.clone()).collect();
        assert_eq!(messages, vec![
            "unknown primitive NoSuchPrimitive in A>>frob".to_string(),
            "super can only receive a message".to_string(),
        ]);
    }

    #[test]
    fn quotes_are_stripped() {
        assert_eq!(strip_quotes("'hello'"), "hello");
        assert_eq!(strip_quotes("'it''s'"), "it's");
        assert_eq!(strip_quotes("plain"), "plain");
    }
}
