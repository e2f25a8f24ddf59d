use std::rc::Rc;

use object::{ClassDescriptor, GlobalNamespace, Instance, Value};

use crate::compiler::Program;
use crate::error::{ErrorKind, Result, VmError};
use crate::prelude::{TRANSCRIPT, TRANSCRIPT_CLASS};

/// Turn compiled classes into runtime classes and bind them, together with
/// the well-known objects, in a fresh global namespace.
///
/// Classes must arrive superclass first, as the compiler orders them.
pub fn build_globals(program: &Program) -> Result<GlobalNamespace> {
    let mut globals = GlobalNamespace::new();
    for class in &program.classes {
        let superclass = match &class.superclass {
            None => None,
            Some(name) => Some(globals.lookup_class(name).cloned().ok_or_else(|| {
                VmError::new(
                    ErrorKind::UnknownClass,
                    format!("superclass {name} of {} is not defined", class.name),
                )
            })?),
        };
        let mut descriptor = ClassDescriptor::new(class.name.clone(), superclass, class.fields.clone());
        for method in &class.methods {
            descriptor.add_method(method.clone());
        }
        if globals
            .define(class.name.clone(), Value::Class(Rc::new(descriptor)))
            .is_some()
        {
            log::warn!("class {} defined twice, keeping the last", class.name);
        }
    }

    if let Some(stream) = globals.lookup_class(TRANSCRIPT_CLASS).cloned() {
        globals.define(TRANSCRIPT, Value::Object(Rc::new(Instance::new(stream))));
    }
    globals.define("nil", Value::Nil);
    globals.define("true", Value::Boolean(true));
    globals.define("false", Value::Boolean(false));

    log::debug!(
        "built {} classes, {} globals",
        program.classes.len(),
        globals.len()
    );
    Ok(globals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{CompiledClass, Compiler, CompilerOptions};
    use syntax::ast::File;
    use syntax::builder::*;

    #[test]
    fn classes_link_to_superclasses() {
        let program = Compiler::new(CompilerOptions::default())
            .compile(File::default()
                .with_class(class("Animal").fields(&["name"]).build())
                .with_class(class("Dog").extends("Animal").fields(&["tricks"]).build()))
            .unwrap();
        let globals = build_globals(&program).unwrap();

        let dog = globals.lookup_class("Dog").expect("Dog");
        assert_eq!(dog.superclass.as_ref().map(|s| s.name.as_str()), Some("Animal"));
        assert_eq!(dog.fields, vec!["name".to_string(), "tricks".to_string()]);
        assert!(dog.resolve_method("printString", false).is_some());
        assert!(matches!(globals.lookup(TRANSCRIPT), Some(Value::Object(_))));
        assert!(matches!(globals.lookup("true"), Some(Value::Boolean(true))));
    }

    #[test]
    fn missing_superclass_is_unknown_class() {
        let program = Program {
            classes: vec![CompiledClass {
                name: "Orphan".to_string(),
                superclass: Some("Nobody".to_string()),
                fields: vec![],
                methods: vec![],
            }],
        };
        let err = build_globals(&program).err().expect("error");
        assert_eq!(err.kind, ErrorKind::UnknownClass);
    }
}
