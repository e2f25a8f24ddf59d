use std::cell::RefCell;
use std::rc::Rc;

use ::object::{ClassDescriptor, Closure, FrameRef, Primitive, PrimitiveKind, Value};

use crate::Vm;
use crate::error::{ErrorKind, Result, VmError};

pub mod array;
pub mod block;
pub mod boolean;
pub mod character;
pub mod float;
pub mod integer;
pub mod object;
pub mod string;
pub mod transcript;

/// What a primitive did with control.
#[derive(Debug)]
pub enum PrimitiveOutcome {
    /// Finished; the value is the result of the send.
    Value(Value),
    /// A block frame was made current. Its result arrives on the sender's
    /// stack when it returns.
    Activated,
}

pub type PrimitiveFn = fn(&mut Vm, &FrameRef, Value, &[Value]) -> Result<PrimitiveOutcome>;

#[derive(Clone, Copy)]
pub struct PrimitiveDesc {
    pub primitive: Primitive,
    pub func: PrimitiveFn,
}

impl PrimitiveDesc {
    pub const fn new(primitive: Primitive, func: PrimitiveFn) -> Self {
        Self { primitive, func }
    }
}

/// Dispatch table for the primitives of one kernel class.
pub fn table(kind: PrimitiveKind) -> &'static [PrimitiveDesc] {
    match kind {
        PrimitiveKind::Object => object::PRIMITIVES,
        PrimitiveKind::Boolean => boolean::PRIMITIVES,
        PrimitiveKind::Integer => integer::PRIMITIVES,
        PrimitiveKind::Float => float::PRIMITIVES,
        PrimitiveKind::Character => character::PRIMITIVES,
        PrimitiveKind::String => string::PRIMITIVES,
        PrimitiveKind::Array => array::PRIMITIVES,
        PrimitiveKind::Block => block::PRIMITIVES,
        PrimitiveKind::Transcript => transcript::PRIMITIVES,
    }
}

pub fn lookup(primitive: Primitive) -> Option<PrimitiveFn> {
    table(primitive.kind())
        .iter()
        .find(|desc| desc.primitive == primitive)
        .map(|desc| desc.func)
}

/// Pop the receiver and arguments of `primitive` off `frame` and run it.
pub(crate) fn perform(vm: &mut Vm, frame: &FrameRef, primitive: Primitive) -> Result<PrimitiveOutcome> {
    let func = lookup(primitive)
        .ok_or_else(|| VmError::internal(format!("no handler for primitive {}", primitive.name())))?;
    let (receiver, args) = {
        let mut f = frame.borrow_mut();
        let args = f.pop_n(primitive.arity()).ok_or_else(VmError::stack_underflow)?;
        let receiver = f.pop().ok_or_else(VmError::stack_underflow)?;
        (receiver, args)
    };
    func(vm, frame, receiver, &args)
}

pub(crate) fn answer(value: impl Into<Value>) -> Result<PrimitiveOutcome> {
    Ok(PrimitiveOutcome::Value(value.into()))
}

pub(crate) fn arg(args: &[Value], idx: usize) -> Result<&Value> {
    args.get(idx)
        .ok_or_else(|| VmError::internal(format!("missing primitive argument {idx}")))
}

pub(crate) fn expect_integer(value: &Value) -> Result<i32> {
    match value {
        Value::Integer(n) => Ok(*n),
        other => Err(VmError::type_error("Integer", other)),
    }
}

pub(crate) fn expect_float(value: &Value) -> Result<f32> {
    match value {
        Value::Float(f) => Ok(*f),
        other => Err(VmError::type_error("Float", other)),
    }
}

pub(crate) fn expect_bool(value: &Value) -> Result<bool> {
    match value {
        Value::Boolean(b) => Ok(*b),
        other => Err(VmError::type_error("Boolean", other)),
    }
}

pub(crate) fn expect_char(value: &Value) -> Result<char> {
    match value {
        Value::Character(c) => Ok(*c),
        other => Err(VmError::type_error("Character", other)),
    }
}

pub(crate) fn expect_string(value: &Value) -> Result<Rc<str>> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Err(VmError::type_error("String", other)),
    }
}

pub(crate) fn expect_array(value: &Value) -> Result<Rc<RefCell<Vec<Value>>>> {
    match value {
        Value::Array(items) => Ok(items.clone()),
        other => Err(VmError::type_error("Array", other)),
    }
}

pub(crate) fn expect_closure(value: &Value) -> Result<Rc<Closure>> {
    match value {
        Value::Closure(closure) => Ok(closure.clone()),
        other => Err(VmError::type_error("BlockDescriptor", other)),
    }
}

pub(crate) fn expect_class(value: &Value) -> Result<Rc<ClassDescriptor>> {
    match value {
        Value::Class(class) => Ok(class.clone()),
        other => Err(VmError::type_error("class", other)),
    }
}

/// Convert a 1-based index into a slot of a collection of `len` elements.
pub(crate) fn checked_index(index: i32, len: usize) -> Result<usize> {
    if index >= 1 && (index as usize) <= len {
        Ok(index as usize - 1)
    } else {
        Err(VmError::new(
            ErrorKind::IndexOutOfRange,
            format!("index {index} is out of bounds for size {len}"),
        ))
    }
}

/// Run `func` on a detached frame and answer its value.
#[cfg(test)]
pub(crate) fn call(func: PrimitiveFn, receiver: Value, args: &[Value]) -> Result<Value> {
    let mut vm = Vm::from_globals(::object::GlobalNamespace::new());
    let unit = Rc::new(::object::CompiledUnit::default());
    let frame = ::object::Frame::for_method(unit, receiver.clone(), Vec::new(), None);
    match func(&mut vm, &frame, receiver, args)? {
        PrimitiveOutcome::Value(value) => Ok(value),
        PrimitiveOutcome::Activated => panic!("primitive activated a block"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_primitive_has_a_handler() {
        for &primitive in Primitive::ALL {
            assert!(lookup(primitive).is_some(), "{} has no handler", primitive.name());
        }
    }

    #[test]
    fn tables_hold_only_their_kind() {
        for &primitive in Primitive::ALL {
            let kind = primitive.kind();
            for desc in table(kind) {
                assert_eq!(desc.primitive.kind(), kind);
            }
        }
    }

    #[test]
    fn indices_start_at_one() {
        assert_eq!(checked_index(1, 3).unwrap(), 0);
        assert_eq!(checked_index(3, 3).unwrap(), 2);
        assert_eq!(checked_index(0, 3).unwrap_err().kind, ErrorKind::IndexOutOfRange);
        assert_eq!(checked_index(4, 3).unwrap_err().kind, ErrorKind::IndexOutOfRange);
        assert_eq!(checked_index(-1, 3).unwrap_err().kind, ErrorKind::IndexOutOfRange);
    }
}
