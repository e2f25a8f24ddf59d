//! Syntax trees for class-based message-passing programs, with the scope
//! analysis that prepares them for code generation.
pub mod ast;
pub mod builder;
pub mod span;
mod issue;
mod resolve;
mod scope;

pub use issue::SemanticIssue;
pub use resolve::{MAIN_CLASS, MAIN_SELECTOR, ROOT_CLASS, analyze, define_symbols, lower_main, resolve_symbols};
pub use scope::{Scope, ScopeId, ScopeKind, Symbol, SymbolKind, SymbolTable};
pub use span::{Pos, Span};

#[cfg(test)]
mod tests {
    use super::ast::*;
    use super::builder::*;
    use super::*;
    use pretty_assertions::assert_eq;

    fn main_method(file: &File) -> &MethodDef {
        let class = file
            .classes
            .iter()
            .find(|c| c.name.name == MAIN_CLASS)
            .expect("main class");
        &class.methods[0]
    }

    fn first_expr(method: &MethodDef) -> &Expr {
        match &method.body {
            MethodBody::Code(body) => match &body.stats[0] {
                Stat::Expr(e) | Stat::Return { value: e, .. } => e,
            },
            MethodBody::Primitive(_) => panic!("primitive"),
        }
    }

    #[test]
    fn main_is_lowered_into_main_class() {
        let mut file = script(body(&[], vec![stat(int(1))])).with_class(class("Object").root().build());
        let (_, issues) = analyze(&mut file);
        assert!(issues.is_empty(), "{issues:?}");
        assert!(file.main.is_none());
        let main = main_method(&file);
        assert!(main.script);
        assert_eq!(main.selector.name, MAIN_SELECTOR);
    }

    #[test]
    fn subclasses_may_precede_superclasses() {
        let mut file = File::default()
            .with_class(class("Dog").extends("Animal").fields(&["tricks"]).build())
            .with_class(class("Animal").root().fields(&["name"]).build());
        let (table, issues) = analyze(&mut file);
        assert!(issues.is_empty(), "{issues:?}");
        let names: Vec<_> = table.classes().iter().map(|&c| table.scope(c).name.clone()).collect();
        assert_eq!(names, vec!["Animal".to_string(), "Dog".to_string()]);
        let dog = table.class_scope("Dog").unwrap();
        assert_eq!(table.field_names(dog), vec!["name".to_string(), "tricks".to_string()]);
    }

    #[test]
    fn block_variables_bind_to_their_scopes() {
        let mut file = script(body(&["x"], vec![stat(block(
            &["y"],
            body(&[], vec![stat(send(var("x"), "+", vec![var("y")]))]),
        ))]))
        .with_class(class("Object").root().build());
        let (table, issues) = analyze(&mut file);
        assert!(issues.is_empty(), "{issues:?}");

        let main = main_method(&file);
        let ExprKind::Block(blk) = &first_expr(main).kind else {
            panic!("expected block");
        };
        let Stat::Expr(Expr { kind: ExprKind::Binary { receiver, argument, .. }, .. }) = &blk.body.stats[0] else {
            panic!("expected binary send");
        };
        let (ExprKind::Var(x), ExprKind::Var(y)) = (&receiver.kind, &argument.kind) else {
            panic!("expected vars");
        };
        let block_scope = blk.scope.unwrap();
        assert_eq!(y.binding, Some(Binding::Local { scope: block_scope, index: 0 }));
        assert_eq!(x.binding, Some(Binding::Local { scope: main.scope.unwrap(), index: 0 }));
        assert_eq!(table.depth(block_scope, main.scope.unwrap()), Some(1));
    }

    #[test]
    fn problems_are_collected() {
        let mut file = File::default()
            .with_class(class("Object").root().build())
            .with_class(class("A").extends("B").build())
            .with_class(class("B").extends("A").build())
            .with_class(class("C").extends("Missing").fields(&["f", "f"]).build())
            .with_class(class("Object").root().build())
            .with_class(class("D").method(method("m", &[], body(&[], vec![stat(assign("Undeclared", int(1)))]))).build());
        let (_, issues) = analyze(&mut file);
        let messages: Vec<_> = issues.iter().map(|i| i.message.as_str()).collect();
        assert_eq!(messages, vec![
            "redefinition of Object in Globals",
            "unknown superclass Missing of C",
            "redefinition of f in C",
            "inheritance cycle through A",
            "inheritance cycle through B",
            "cannot assign to Undeclared: not a field or local",
        ]);
    }

    #[test]
    fn keyword_sends_split_selector_parts() {
        let e = send(var("a"), "at:put:", vec![int(1), int(2)]);
        let ExprKind::Keyword { pairs, .. } = e.kind else {
            panic!("expected keyword send");
        };
        let parts: Vec<_> = pairs.iter().map(|(k, _)| k.name.as_str()).collect();
        assert_eq!(parts, vec!["at:", "put:"]);
    }
}
