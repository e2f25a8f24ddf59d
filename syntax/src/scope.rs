use std::collections::HashMap;

use crate::ast::Binding;
use crate::issue::SemanticIssue;
use crate::span::Span;

/// Index of a scope in its [`SymbolTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u32);

impl ScopeId {
    pub const GLOBALS: ScopeId = ScopeId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Class,
    Method,
    Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Class,
    Field,
    Method,
    ClassMethod,
    Argument,
    Local,
}

impl SymbolKind {
    /// Symbols only clash with others in the same namespace.
    fn namespace(self) -> u8 {
        match self {
            SymbolKind::Method => 1,
            SymbolKind::ClassMethod => 2,
            _ => 0,
        }
    }

    fn is_variable(self) -> bool {
        matches!(self, SymbolKind::Field | SymbolKind::Argument | SymbolKind::Local)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Field slot, or position in the frame's locals (arguments first).
    pub index: u16,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    pub name: String,
    pub parent: Option<ScopeId>,
    /// Class scopes only.
    pub superclass: Option<ScopeId>,
    /// Method scopes only: the method runs with a class as receiver.
    pub class_side: bool,
    symbols: Vec<Symbol>,
    field_base: u16,
}

impl Scope {
    fn new(kind: ScopeKind, name: &str, parent: Option<ScopeId>) -> Self {
        Self {
            kind,
            name: name.to_string(),
            parent,
            superclass: None,
            class_side: false,
            symbols: Vec::new(),
            field_base: 0,
        }
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Variable (field, argument or local) defined directly in this scope.
    pub fn variable(&self, name: &str) -> Option<&Symbol> {
        self.symbols
            .iter()
            .find(|s| s.kind.is_variable() && s.name == name)
    }

    pub fn count(&self, kind: SymbolKind) -> usize {
        self.symbols.iter().filter(|s| s.kind == kind).count()
    }

    fn frame_slots(&self) -> usize {
        self.count(SymbolKind::Argument) + self.count(SymbolKind::Local)
    }
}

/// Scopes of a file, arena-allocated and linked by [`ScopeId`].
///
/// Scope 0 holds the global names (classes). Class scopes link to their
/// superclass's scope so inherited fields resolve; method and block scopes
/// link to their lexical parent.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    classes: Vec<ScopeId>,
    class_index: HashMap<String, ScopeId>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new(ScopeKind::Global, "Globals", None)],
            classes: Vec::new(),
            class_index: HashMap::new(),
        }
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    fn push(&mut self, scope: Scope) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(scope);
        id
    }

    /// Open a class scope. Field slots continue after the superclass's.
    pub fn push_class(&mut self, name: &str, superclass: Option<ScopeId>) -> ScopeId {
        let mut scope = Scope::new(ScopeKind::Class, name, Some(ScopeId::GLOBALS));
        scope.superclass = superclass;
        scope.field_base = superclass.map_or(0, |s| self.total_fields(s));
        let id = self.push(scope);
        self.classes.push(id);
        self.class_index.insert(name.to_string(), id);
        id
    }

    pub fn push_method(&mut self, selector: &str, class: ScopeId, class_side: bool) -> ScopeId {
        let mut scope = Scope::new(ScopeKind::Method, selector, Some(class));
        scope.class_side = class_side;
        self.push(scope)
    }

    pub fn push_block(&mut self, parent: ScopeId) -> ScopeId {
        self.push(Scope::new(ScopeKind::Block, "block", Some(parent)))
    }

    /// Define `name` in `scope`, answering its index.
    pub fn define(
        &mut self,
        scope: ScopeId,
        name: &str,
        kind: SymbolKind,
        span: Span,
    ) -> Result<u16, SemanticIssue> {
        let target = &self.scopes[scope.index()];
        if target
            .symbols
            .iter()
            .any(|s| s.name == name && s.kind.namespace() == kind.namespace())
        {
            return Err(SemanticIssue::new(
                format!("redefinition of {name} in {}", target.name),
                span,
            ));
        }
        let index = match kind {
            SymbolKind::Field => target.field_base as usize + target.count(SymbolKind::Field),
            SymbolKind::Argument | SymbolKind::Local => target.frame_slots(),
            other => target.count(other),
        };
        let index = u16::try_from(index)
            .map_err(|_| SemanticIssue::new(format!("too many symbols in {}", target.name), span))?;
        self.scopes[scope.index()].symbols.push(Symbol {
            name: name.to_string(),
            kind,
            index,
            span,
        });
        Ok(index)
    }

    pub fn class_scope(&self, name: &str) -> Option<ScopeId> {
        self.class_index.get(name).copied()
    }

    /// Class scopes, superclasses before subclasses.
    pub fn classes(&self) -> &[ScopeId] {
        &self.classes
    }

    pub fn total_fields(&self, class: ScopeId) -> u16 {
        let scope = self.scope(class);
        scope.field_base + scope.count(SymbolKind::Field) as u16
    }

    /// All field names of a class, inherited first, in slot order.
    pub fn field_names(&self, class: ScopeId) -> Vec<String> {
        let mut chain = Vec::new();
        let mut current = Some(class);
        while let Some(id) = current {
            chain.push(id);
            current = self.scope(id).superclass;
        }
        chain
            .iter()
            .rev()
            .flat_map(|&id| {
                self.scope(id)
                    .symbols
                    .iter()
                    .filter(|s| s.kind == SymbolKind::Field)
                    .map(|s| s.name.clone())
            })
            .collect()
    }

    /// Number of arguments and declared locals of a method or block scope.
    pub fn frame_shape(&self, scope: ScopeId) -> (usize, usize) {
        let s = self.scope(scope);
        (s.count(SymbolKind::Argument), s.count(SymbolKind::Local))
    }

    /// Bind `name` as seen from `from`: innermost frame variable first, then
    /// fields of the enclosing class and its superclasses, otherwise a
    /// global. Class-side methods see no fields.
    pub fn resolve(&self, from: ScopeId, name: &str) -> Binding {
        let mut class_side = false;
        let mut current = Some(from);
        while let Some(id) = current {
            let scope = self.scope(id);
            match scope.kind {
                ScopeKind::Method | ScopeKind::Block => {
                    if let Some(sym) = scope.variable(name) {
                        return Binding::Local {
                            scope: id,
                            index: sym.index,
                        };
                    }
                    class_side |= scope.class_side;
                }
                ScopeKind::Class if !class_side => {
                    if let Some(slot) = self.field_slot(id, name) {
                        return Binding::Field { slot };
                    }
                }
                ScopeKind::Class | ScopeKind::Global => {}
            }
            current = scope.parent;
        }
        Binding::Global
    }

    fn field_slot(&self, class: ScopeId, name: &str) -> Option<u16> {
        let mut current = Some(class);
        while let Some(id) = current {
            if let Some(sym) = self.scope(id).variable(name) {
                return Some(sym.index);
            }
            current = self.scope(id).superclass;
        }
        None
    }

    /// Number of frames between the code of `from` and the frame owning
    /// `to`, following lexical parents.
    pub fn depth(&self, from: ScopeId, to: ScopeId) -> Option<u16> {
        let mut depth = 0u16;
        let mut current = from;
        loop {
            if current == to {
                return Some(depth);
            }
            let scope = self.scope(current);
            if scope.kind != ScopeKind::Block {
                return None;
            }
            current = scope.parent?;
            depth = depth.checked_add(1)?;
        }
    }
}
