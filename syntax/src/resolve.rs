use std::collections::HashSet;

use crate::ast::{Binding, Body, ClassDef, Expr, ExprKind, File, Ident, MethodBody, MethodDef, Stat};
use crate::issue::SemanticIssue;
use crate::scope::{ScopeId, SymbolKind, SymbolTable};

pub const MAIN_CLASS: &str = "MainClass";
pub const MAIN_SELECTOR: &str = "main";
pub const ROOT_CLASS: &str = "Object";

/// Move top-level statements into `MainClass>>main`, creating the class
/// when the file does not declare it.
pub fn lower_main(file: &mut File) {
    let Some(main) = file.main.take() else {
        return;
    };
    let method = MethodDef {
        selector: Ident::new(MAIN_SELECTOR, main.span),
        args: Vec::new(),
        is_class_method: false,
        script: true,
        body: MethodBody::Code(main.body),
        scope: None,
        span: main.span,
    };
    match file.classes.iter_mut().find(|c| c.name.name == MAIN_CLASS) {
        Some(class) => class.methods.push(method),
        None => file.classes.push(ClassDef {
            name: Ident::new(MAIN_CLASS, main.span),
            superclass: Some(Ident::new(ROOT_CLASS, main.span)),
            fields: Vec::new(),
            methods: vec![method],
            scope: None,
            span: main.span,
        }),
    }
}

/// First pass: create scopes and define every class, field, method,
/// argument and local. Classes are processed superclass first.
pub fn define_symbols(file: &mut File, table: &mut SymbolTable) -> Vec<SemanticIssue> {
    let mut issues = Vec::new();
    let mut declared = HashSet::new();
    let mut pending = Vec::new();
    for (idx, class) in file.classes.iter().enumerate() {
        match table.define(ScopeId::GLOBALS, &class.name.name, SymbolKind::Class, class.name.span) {
            Ok(_) => {
                declared.insert(class.name.name.clone());
                pending.push(idx);
            }
            Err(issue) => issues.push(issue),
        }
    }

    let mut progress = true;
    while progress && !pending.is_empty() {
        progress = false;
        let mut i = 0;
        while i < pending.len() {
            let class = &file.classes[pending[i]];
            let superclass = match &class.superclass {
                None => Some(None),
                Some(sup) => match table.class_scope(&sup.name) {
                    Some(id) => Some(Some(id)),
                    None if !declared.contains(&sup.name) => {
                        issues.push(SemanticIssue::new(
                            format!("unknown superclass {} of {}", sup.name, class.name.name),
                            sup.span,
                        ));
                        Some(None)
                    }
                    None => None,
                },
            };
            match superclass {
                Some(superclass) => {
                    let idx = pending.remove(i);
                    define_class(&mut file.classes[idx], superclass, table, &mut issues);
                    progress = true;
                }
                None => i += 1,
            }
        }
    }
    for idx in pending {
        let class = &file.classes[idx];
        issues.push(SemanticIssue::new(
            format!("inheritance cycle through {}", class.name.name),
            class.name.span,
        ));
    }
    issues
}

fn define_class(
    class: &mut ClassDef,
    superclass: Option<ScopeId>,
    table: &mut SymbolTable,
    issues: &mut Vec<SemanticIssue>,
) {
    let id = table.push_class(&class.name.name, superclass);
    class.scope = Some(id);
    for field in &class.fields {
        if let Err(issue) = table.define(id, &field.name, SymbolKind::Field, field.span) {
            issues.push(issue);
        }
    }
    for method in &mut class.methods {
        let kind = if method.is_class_method {
            SymbolKind::ClassMethod
        } else {
            SymbolKind::Method
        };
        if let Err(issue) = table.define(id, &method.selector.name, kind, method.selector.span) {
            issues.push(issue);
        }
        let scope = table.push_method(&method.selector.name, id, method.is_class_method);
        method.scope = Some(scope);
        define_vars(scope, &method.args, SymbolKind::Argument, table, issues);
        if let MethodBody::Code(body) = &mut method.body {
            define_body(scope, body, table, issues);
        }
    }
}

fn define_vars(
    scope: ScopeId,
    names: &[Ident],
    kind: SymbolKind,
    table: &mut SymbolTable,
    issues: &mut Vec<SemanticIssue>,
) {
    for name in names {
        if let Err(issue) = table.define(scope, &name.name, kind, name.span) {
            issues.push(issue);
        }
    }
}

fn define_body(scope: ScopeId, body: &mut Body, table: &mut SymbolTable, issues: &mut Vec<SemanticIssue>) {
    define_vars(scope, &body.locals, SymbolKind::Local, table, issues);
    for stat in &mut body.stats {
        match stat {
            Stat::Expr(expr) | Stat::Return { value: expr, .. } => {
                define_in_expr(scope, expr, table, issues)
            }
        }
    }
}

fn define_in_expr(scope: ScopeId, expr: &mut Expr, table: &mut SymbolTable, issues: &mut Vec<SemanticIssue>) {
    match &mut expr.kind {
        ExprKind::Block(block) => {
            let id = table.push_block(scope);
            block.scope = Some(id);
            define_vars(id, &block.args, SymbolKind::Argument, table, issues);
            define_body(id, &mut block.body, table, issues);
        }
        ExprKind::Array(items) => {
            for item in items {
                define_in_expr(scope, item, table, issues);
            }
        }
        ExprKind::Assign { value, .. } => define_in_expr(scope, value, table, issues),
        ExprKind::Unary { receiver, .. } => define_in_expr(scope, receiver, table, issues),
        ExprKind::Binary { receiver, argument, .. } => {
            define_in_expr(scope, receiver, table, issues);
            define_in_expr(scope, argument, table, issues);
        }
        ExprKind::Keyword { receiver, pairs } => {
            define_in_expr(scope, receiver, table, issues);
            for (_, arg) in pairs {
                define_in_expr(scope, arg, table, issues);
            }
        }
        ExprKind::Integer(_)
        | ExprKind::Float(_)
        | ExprKind::Character(_)
        | ExprKind::String(_)
        | ExprKind::Nil
        | ExprKind::True
        | ExprKind::False
        | ExprKind::SelfRef
        | ExprKind::Super
        | ExprKind::Var(_) => {}
    }
}

/// Second pass: bind every variable reference. Names that match no frame
/// variable or field are globals, looked up when the code runs.
pub fn resolve_symbols(file: &mut File, table: &SymbolTable) -> Vec<SemanticIssue> {
    let mut issues = Vec::new();
    for class in &mut file.classes {
        for method in &mut class.methods {
            let (Some(scope), MethodBody::Code(body)) = (method.scope, &mut method.body) else {
                continue;
            };
            resolve_body(scope, body, table, &mut issues);
        }
    }
    issues
}

fn resolve_body(scope: ScopeId, body: &mut Body, table: &SymbolTable, issues: &mut Vec<SemanticIssue>) {
    for stat in &mut body.stats {
        match stat {
            Stat::Expr(expr) | Stat::Return { value: expr, .. } => {
                resolve_expr(scope, expr, table, issues)
            }
        }
    }
}

fn resolve_expr(scope: ScopeId, expr: &mut Expr, table: &SymbolTable, issues: &mut Vec<SemanticIssue>) {
    match &mut expr.kind {
        ExprKind::Var(var) => var.binding = Some(table.resolve(scope, &var.name)),
        ExprKind::Assign { target, value } => {
            let binding = table.resolve(scope, &target.name);
            if binding == Binding::Global {
                issues.push(SemanticIssue::new(
                    format!("cannot assign to {}: not a field or local", target.name),
                    target.span,
                ));
            }
            target.binding = Some(binding);
            resolve_expr(scope, value, table, issues);
        }
        ExprKind::Block(block) => {
            if let Some(id) = block.scope {
                resolve_body(id, &mut block.body, table, issues);
            }
        }
        ExprKind::Array(items) => {
            for item in items {
                resolve_expr(scope, item, table, issues);
            }
        }
        ExprKind::Unary { receiver, .. } => resolve_expr(scope, receiver, table, issues),
        ExprKind::Binary { receiver, argument, .. } => {
            resolve_expr(scope, receiver, table, issues);
            resolve_expr(scope, argument, table, issues);
        }
        ExprKind::Keyword { receiver, pairs } => {
            resolve_expr(scope, receiver, table, issues);
            for (_, arg) in pairs {
                resolve_expr(scope, arg, table, issues);
            }
        }
        ExprKind::Integer(_)
        | ExprKind::Float(_)
        | ExprKind::Character(_)
        | ExprKind::String(_)
        | ExprKind::Nil
        | ExprKind::True
        | ExprKind::False
        | ExprKind::SelfRef
        | ExprKind::Super => {}
    }
}

/// Run both passes over `file`, lowering top-level code first.
pub fn analyze(file: &mut File) -> (SymbolTable, Vec<SemanticIssue>) {
    lower_main(file);
    let mut table = SymbolTable::new();
    let mut issues = define_symbols(file, &mut table);
    issues.extend(resolve_symbols(file, &table));
    log::debug!(
        "analyzed {} classes into {} scopes, {} issues",
        file.classes.len(),
        table.len(),
        issues.len()
    );
    (table, issues)
}
