use object::{FrameRef, Primitive, Value};

use crate::Vm;
use crate::error::Result;
use crate::primitives::{PrimitiveDesc, PrimitiveOutcome, answer, expect_closure};

pub const PRIMITIVES: &[PrimitiveDesc] = &[
    PrimitiveDesc::new(Primitive::BlockValue, block_value),
    PrimitiveDesc::new(Primitive::BlockValue1, block_value),
    PrimitiveDesc::new(Primitive::BlockValue2, block_value),
    PrimitiveDesc::new(Primitive::BlockValue3, block_value),
    PrimitiveDesc::new(Primitive::BlockNumArgs, block_num_args),
];

/// Shared by every `value...` arity; the selector already fixed how many
/// arguments were popped.
pub fn block_value(vm: &mut Vm, frame: &FrameRef, receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    let closure = expect_closure(&receiver)?;
    vm.activate_block(frame, &closure, args.to_vec())
}

pub fn block_num_args(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, _args: &[Value]) -> Result<PrimitiveOutcome> {
    let closure = expect_closure(&receiver)?;
    answer(closure.unit.num_args as i32)
}
