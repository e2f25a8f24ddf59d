use object::{FrameRef, Primitive, Value};

use crate::Vm;
use crate::error::Result;
use crate::primitives::{PrimitiveDesc, PrimitiveOutcome, answer, arg, expect_bool, expect_closure};

pub const PRIMITIVES: &[PrimitiveDesc] = &[
    PrimitiveDesc::new(Primitive::BooleanIfTrue, boolean_if_true),
    PrimitiveDesc::new(Primitive::BooleanIfFalse, boolean_if_false),
    PrimitiveDesc::new(Primitive::BooleanIfTrueIfFalse, boolean_if_true_if_false),
    PrimitiveDesc::new(Primitive::BooleanIfFalseIfTrue, boolean_if_false_if_true),
    PrimitiveDesc::new(Primitive::BooleanNot, boolean_not),
    PrimitiveDesc::new(Primitive::BooleanAnd, boolean_and),
    PrimitiveDesc::new(Primitive::BooleanOr, boolean_or),
    PrimitiveDesc::new(Primitive::BooleanEq, boolean_eq),
];

/// Activate `branch` as a zero-argument block. The block's value becomes
/// the result of the conditional.
fn take_branch(vm: &mut Vm, frame: &FrameRef, branch: &Value) -> Result<PrimitiveOutcome> {
    let closure = expect_closure(branch)?;
    vm.activate_block(frame, &closure, Vec::new())
}

pub fn boolean_if_true(vm: &mut Vm, frame: &FrameRef, receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    if expect_bool(&receiver)? {
        take_branch(vm, frame, arg(args, 0)?)
    } else {
        answer(Value::Nil)
    }
}

pub fn boolean_if_false(vm: &mut Vm, frame: &FrameRef, receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    if expect_bool(&receiver)? {
        answer(Value::Nil)
    } else {
        take_branch(vm, frame, arg(args, 0)?)
    }
}

pub fn boolean_if_true_if_false(vm: &mut Vm, frame: &FrameRef, receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    let branch = if expect_bool(&receiver)? { 0 } else { 1 };
    take_branch(vm, frame, arg(args, branch)?)
}

pub fn boolean_if_false_if_true(vm: &mut Vm, frame: &FrameRef, receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    let branch = if expect_bool(&receiver)? { 1 } else { 0 };
    take_branch(vm, frame, arg(args, branch)?)
}

pub fn boolean_not(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, _args: &[Value]) -> Result<PrimitiveOutcome> {
    answer(!expect_bool(&receiver)?)
}

pub fn boolean_and(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    let a = expect_bool(&receiver)?;
    let b = expect_bool(arg(args, 0)?)?;
    answer(a & b)
}

pub fn boolean_or(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    let a = expect_bool(&receiver)?;
    let b = expect_bool(arg(args, 0)?)?;
    answer(a | b)
}

pub fn boolean_eq(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    let a = expect_bool(&receiver)?;
    answer(matches!(arg(args, 0)?, Value::Boolean(b) if *b == a))
}
