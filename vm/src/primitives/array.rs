use object::{FrameRef, Primitive, Value};

use crate::Vm;
use crate::error::{ErrorKind, Result, VmError};
use crate::primitives::{PrimitiveDesc, PrimitiveOutcome, answer, arg, checked_index, expect_array, expect_integer};

pub const PRIMITIVES: &[PrimitiveDesc] = &[
    PrimitiveDesc::new(Primitive::ArrayClassNew, array_class_new),
    PrimitiveDesc::new(Primitive::ArrayClassNewSize, array_class_new_size),
    PrimitiveDesc::new(Primitive::ArraySize, array_size),
    PrimitiveDesc::new(Primitive::ArrayAt, array_at),
    PrimitiveDesc::new(Primitive::ArrayAtPut, array_at_put),
];

pub fn array_class_new(_vm: &mut Vm, _frame: &FrameRef, _receiver: Value, _args: &[Value]) -> Result<PrimitiveOutcome> {
    answer(Value::array(Vec::new()))
}

/// Largest array `Array new:` will allocate.
pub const MAX_ARRAY_SIZE: usize = 1 << 24;

/// `Array new: n` answers `n` nils.
pub fn array_class_new_size(_vm: &mut Vm, _frame: &FrameRef, _receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    let size = expect_integer(arg(args, 0)?)?;
    let size = usize::try_from(size).map_err(|_| {
        VmError::new(ErrorKind::IndexOutOfRange, format!("negative array size {size}"))
    })?;
    if size > MAX_ARRAY_SIZE {
        return Err(VmError::internal(format!(
            "array size {size} exceeds the limit of {MAX_ARRAY_SIZE}"
        )));
    }
    let mut items = Vec::new();
    items
        .try_reserve_exact(size)
        .map_err(|err| VmError::internal(format!("cannot allocate array of size {size}: {err}")))?;
    items.resize(size, Value::Nil);
    answer(Value::array(items))
}


pub fn array_size(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, _args: &[Value]) -> Result<PrimitiveOutcome> {
    let items = expect_array(&receiver)?;
    let len = items.borrow().len();
    answer(len as i32)
}

pub fn array_at(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    let items = expect_array(&receiver)?;
    let index = expect_integer(arg(args, 0)?)?;
    let items = items.borrow();
    let pos = checked_index(index, items.len())?;
    answer(items[pos].clone())
}

/// Answers the stored value.
pub fn array_at_put(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    let items = expect_array(&receiver)?;
    let index = expect_integer(arg(args, 0)?)?;
    let value = arg(args, 1)?.clone();
    let mut items = items.borrow_mut();
    let pos = checked_index(index, items.len())?;
    items[pos] = value.clone();
    answer(value)
}
