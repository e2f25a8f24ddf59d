use core::fmt;
use std::cell::RefCell;
use std::rc::Rc;

use crate::class::ClassDescriptor;
use crate::frame::FrameRef;
use crate::unit::CompiledUnit;

/// A runtime value.
///
/// Immediates are stored inline; everything with identity lives behind an
/// `Rc`, so cloning a `Value` never copies an object.
#[derive(Clone)]
pub enum Value {
    Nil,
    Boolean(bool),
    Integer(i32),
    Float(f32),
    Character(char),
    String(Rc<str>),
    Array(Rc<RefCell<Vec<Value>>>),
    Closure(Rc<Closure>),
    Object(Rc<Instance>),
    Class(Rc<ClassDescriptor>),
}

/// A block unit paired with the frame it was created in.
pub struct Closure {
    pub unit: Rc<CompiledUnit>,
    /// Lexically enclosing frame; captured variables are read through it.
    pub frame: FrameRef,
}

/// An instance of a user-defined class.
pub struct Instance {
    pub class: Rc<ClassDescriptor>,
    pub fields: RefCell<Vec<Value>>,
}

impl Instance {
    pub fn new(class: Rc<ClassDescriptor>) -> Self {
        let fields = vec![Value::Nil; class.num_fields()];
        Self {
            class,
            fields: RefCell::new(fields),
        }
    }
}

impl Value {
    pub fn string(text: impl Into<Rc<str>>) -> Self {
        Value::String(text.into())
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn is_class(&self) -> bool {
        matches!(self, Value::Class(_))
    }

    /// Name of the class that answers messages sent to this value. Classes
    /// answer their own name: class-side methods live in their own table.
    pub fn class_name(&self) -> &str {
        match self {
            Value::Nil => "UndefinedObject",
            Value::Boolean(_) => "Boolean",
            Value::Integer(_) => "Integer",
            Value::Float(_) => "Float",
            Value::Character(_) => "Character",
            Value::String(_) => "String",
            Value::Array(_) => "Array",
            Value::Closure(_) => "BlockDescriptor",
            Value::Object(inst) => &inst.class.name,
            Value::Class(class) => &class.name,
        }
    }

    /// Identity comparison (`==`). Immediates compare by value.
    pub fn is_identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Character(a), Value::Character(b)) => a == b,
            (Value::String(a), Value::String(b)) => Rc::ptr_eq(a, b),
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Identity hash consistent with [`is_identical`](Self::is_identical).
    pub fn identity_hash(&self) -> i32 {
        let addr = match self {
            Value::Nil => return 0,
            Value::Boolean(b) => return *b as i32 + 1,
            Value::Integer(n) => return *n,
            Value::Float(f) => return f.to_bits() as i32,
            Value::Character(c) => return *c as i32,
            Value::String(s) => Rc::as_ptr(s) as *const u8 as usize,
            Value::Array(a) => Rc::as_ptr(a) as usize,
            Value::Closure(c) => Rc::as_ptr(c) as usize,
            Value::Object(o) => Rc::as_ptr(o) as usize,
            Value::Class(c) => Rc::as_ptr(c) as usize,
        };
        (addr >> 3) as i32
    }

    /// Rendering used by traces: like [`Display`](fmt::Display) but with
    /// strings quoted.
    pub fn debug_string(&self) -> String {
        match self {
            Value::String(s) => format!("'{s}'"),
            other => other.to_string(),
        }
    }
}

/// At most five decimals, trailing zeros dropped.
fn format_float(f: f32) -> String {
    if !f.is_finite() {
        return f.to_string();
    }
    let text = format!("{f:.5}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    match text {
        "-0" => "0".to_string(),
        "" => "0".to_string(),
        t => t.to_string(),
    }
}

fn article(name: &str) -> &'static str {
    match name.chars().next() {
        Some(c) if "AEIOUaeiou".contains(c) => "an",
        _ => "a",
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Float(x) => f.write_str(&format_float(*x)),
            Value::Character(c) => write!(f, "${c}"),
            Value::String(s) => f.write_str(s),
            Value::Array(items) => {
                f.write_str("{")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(". ")?;
                    }
                    write!(f, "{}", item.debug_string())?;
                }
                f.write_str("}")
            }
            Value::Closure(c) => f.write_str(&c.unit.name),
            Value::Object(inst) => {
                write!(f, "{} {}", article(&inst.class.name), inst.class.name)
            }
            Value::Class(class) => write!(f, "class {}", class.name),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.debug_string())
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Float(f)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Character(c)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Rc::from(s))
    }
}
