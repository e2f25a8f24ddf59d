use std::collections::HashMap;
use std::rc::Rc;

use crate::class::ClassDescriptor;
use crate::value::Value;

/// Name-to-value table for classes and well-known objects. Definition
/// order is preserved for listings.
#[derive(Default)]
pub struct GlobalNamespace {
    entries: HashMap<String, Value>,
    order: Vec<String>,
}

impl GlobalNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name`, answering the previous value if it was already bound.
    pub fn define(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        let name = name.into();
        if !self.entries.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.entries.insert(name, value)
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn lookup_class(&self, name: &str) -> Option<&Rc<ClassDescriptor>> {
        match self.entries.get(name) {
            Some(Value::Class(class)) => Some(class),
            _ => None,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn classes(&self) -> impl Iterator<Item = &Rc<ClassDescriptor>> {
        self.order.iter().filter_map(|name| self.lookup_class(name))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_and_lookup() {
        let mut globals = GlobalNamespace::new();
        let object = Rc::new(ClassDescriptor::new("Object", None, vec![]));
        assert!(globals.define("Object", Value::Class(object)).is_none());
        assert!(globals.define("nil", Value::Nil).is_none());
        assert!(globals.define("nil", Value::Nil).is_some());

        assert!(globals.lookup_class("Object").is_some());
        assert!(globals.lookup_class("nil").is_none());
        assert_eq!(globals.names().collect::<Vec<_>>(), vec!["Object", "nil"]);
        assert_eq!(globals.classes().count(), 1);
    }
}
