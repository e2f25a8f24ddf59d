//! Kernel classes every program is compiled against.
//!
//! Each kernel class declares its built-in operations as primitive
//! methods; user classes may add to or override them by subclassing.
use object::Primitive;
use syntax::ast::ClassDef;
use syntax::builder::{ClassBuilder, class, primitive};
use syntax::ROOT_CLASS;

pub const TRANSCRIPT: &str = "Transcript";
pub const TRANSCRIPT_CLASS: &str = "TranscriptStream";

/// Kernel classes with their superclass, root first.
pub const KERNEL: &[(&str, Option<&str>)] = &[
    (ROOT_CLASS, None),
    ("UndefinedObject", Some(ROOT_CLASS)),
    ("Boolean", Some(ROOT_CLASS)),
    ("Integer", Some(ROOT_CLASS)),
    ("Float", Some(ROOT_CLASS)),
    ("Character", Some(ROOT_CLASS)),
    ("String", Some(ROOT_CLASS)),
    ("Array", Some(ROOT_CLASS)),
    ("BlockDescriptor", Some(ROOT_CLASS)),
    (TRANSCRIPT_CLASS, Some(ROOT_CLASS)),
];

const ARG_NAMES: [&str; 3] = ["arg1", "arg2", "arg3"];

pub fn kernel_classes() -> Vec<ClassDef> {
    KERNEL
        .iter()
        .map(|&(name, superclass)| {
            let builder = match superclass {
                Some(sup) => class(name).extends(sup),
                None => class(name).root(),
            };
            with_primitives(builder, name).build()
        })
        .collect()
}

fn with_primitives(mut builder: ClassBuilder, class_name: &str) -> ClassBuilder {
    for &p in Primitive::ALL {
        if p.kind().class_name() != class_name {
            continue;
        }
        let args = &ARG_NAMES[..p.arity().min(ARG_NAMES.len())];
        builder = builder.method(primitive(p.selector(), args, p.name(), p.is_class_side()));
    }
    builder
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_primitive_has_a_kernel_home() {
        let classes = kernel_classes();
        let installed: usize = classes.iter().map(|c| c.methods.len()).sum();
        assert_eq!(installed, Primitive::ALL.len());
        assert_eq!(classes[0].name.name, ROOT_CLASS);
        assert!(classes[0].superclass.is_none());
    }
}
