use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::rc::Rc;

use crate::unit::CompiledUnit;

/// Runtime class: name, superclass link, field layout and two method tables
/// (instance side and class side).
#[derive(Debug)]
pub struct ClassDescriptor {
    pub name: String,
    pub superclass: Option<Rc<ClassDescriptor>>,
    /// Every field of an instance, inherited ones first. A field's position
    /// here is its object slot.
    pub fields: Vec<String>,
    methods: BTreeMap<String, Rc<CompiledUnit>>,
    class_methods: BTreeMap<String, Rc<CompiledUnit>>,
}

impl ClassDescriptor {
    pub fn new(
        name: impl Into<String>,
        superclass: Option<Rc<ClassDescriptor>>,
        fields: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            superclass,
            fields,
            methods: BTreeMap::new(),
            class_methods: BTreeMap::new(),
        }
    }

    /// Install a method on the side named by its `is_class_method` flag,
    /// replacing any previous definition.
    pub fn add_method(&mut self, unit: Rc<CompiledUnit>) {
        let table = if unit.is_class_method {
            &mut self.class_methods
        } else {
            &mut self.methods
        };
        table.insert(unit.name.clone(), unit);
    }

    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    /// Method defined directly in this class.
    pub fn local_method(&self, selector: &str, class_side: bool) -> Option<&Rc<CompiledUnit>> {
        if class_side {
            self.class_methods.get(selector)
        } else {
            self.methods.get(selector)
        }
    }

    /// Find `selector` on the given side, walking the superclass chain.
    pub fn resolve_method(&self, selector: &str, class_side: bool) -> Option<Rc<CompiledUnit>> {
        let mut class = Some(self);
        while let Some(c) = class {
            if let Some(unit) = c.local_method(selector, class_side) {
                return Some(unit.clone());
            }
            class = c.superclass.as_deref();
        }
        None
    }

    /// Multi-line summary of the class for listings.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        let _ = write!(out, "class {}", self.name);
        if let Some(sup) = &self.superclass {
            let _ = write!(out, " : {}", sup.name);
        }
        out.push('\n');
        if !self.fields.is_empty() {
            let _ = writeln!(out, "  fields: {}", self.fields.join(" "));
        }
        for (side, table) in [("class ", &self.class_methods), ("", &self.methods)] {
            for unit in table.values() {
                let kind = match unit.primitive {
                    Some(p) => format!("<{}>", p.name()),
                    None => format!("{} bytes", unit.bytecode.len()),
                };
                let _ = writeln!(out, "  {side}{} {kind}", unit.name);
            }
        }
        out
    }
}
