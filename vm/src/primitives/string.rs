use object::{FrameRef, Primitive, Value};

use crate::Vm;
use crate::error::{Result, VmError};
use crate::primitives::{PrimitiveDesc, PrimitiveOutcome, answer, arg, checked_index, expect_integer, expect_string};

pub const PRIMITIVES: &[PrimitiveDesc] = &[
    PrimitiveDesc::new(Primitive::StringClassNew, string_class_new),
    PrimitiveDesc::new(Primitive::StringConcat, string_concat),
    PrimitiveDesc::new(Primitive::StringEq, string_eq),
    PrimitiveDesc::new(Primitive::StringSize, string_size),
    PrimitiveDesc::new(Primitive::StringAt, string_at),
    PrimitiveDesc::new(Primitive::StringAsArray, string_as_array),
    PrimitiveDesc::new(Primitive::StringAsString, string_as_string),
];

/// `String new: 'abc'` copies a string; `String new: $a` answers `'a'`.
pub fn string_class_new(_vm: &mut Vm, _frame: &FrameRef, _receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    match arg(args, 0)? {
        Value::String(s) => answer(Value::string(&**s)),
        Value::Character(c) => answer(Value::string(c.to_string())),
        other => Err(VmError::type_error("String or Character", other)),
    }
}

/// Appends the display form of any argument.
pub fn string_concat(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    let head = expect_string(&receiver)?;
    let tail = arg(args, 0)?;
    answer(Value::string(format!("{head}{tail}")))
}

pub fn string_eq(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    let a = expect_string(&receiver)?;
    answer(matches!(arg(args, 0)?, Value::String(b) if **b == *a))
}

pub fn string_size(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, _args: &[Value]) -> Result<PrimitiveOutcome> {
    let s = expect_string(&receiver)?;
    answer(s.chars().count() as i32)
}

pub fn string_at(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    let s = expect_string(&receiver)?;
    let index = expect_integer(arg(args, 0)?)?;
    let len = s.chars().count();
    let pos = checked_index(index, len)?;
    let c = s
        .chars()
        .nth(pos)
        .ok_or_else(|| VmError::internal("string index past end"))?;
    answer(c)
}

pub fn string_as_array(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, _args: &[Value]) -> Result<PrimitiveOutcome> {
    let s = expect_string(&receiver)?;
    answer(Value::array(s.chars().map(Value::Character).collect()))
}

pub fn string_as_string(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, _args: &[Value]) -> Result<PrimitiveOutcome> {
    expect_string(&receiver)?;
    answer(receiver)
}
