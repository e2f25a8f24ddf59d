use object::{FrameRef, Primitive, Value};

use crate::Vm;
use crate::error::{Result, VmError};
use crate::primitives::{PrimitiveDesc, PrimitiveOutcome, answer, arg, expect_char, expect_integer};

pub const PRIMITIVES: &[PrimitiveDesc] = &[
    PrimitiveDesc::new(Primitive::CharacterClassValue, character_class_value),
    PrimitiveDesc::new(Primitive::CharacterAsInteger, character_as_integer),
    PrimitiveDesc::new(Primitive::CharacterEq, character_eq),
];

/// `Character value: 65` answers `$A`.
pub fn character_class_value(_vm: &mut Vm, _frame: &FrameRef, _receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    let code = arg(args, 0)?;
    let c = u32::try_from(expect_integer(code)?)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| VmError::type_error("character code", code))?;
    answer(c)
}

pub fn character_as_integer(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, _args: &[Value]) -> Result<PrimitiveOutcome> {
    answer(expect_char(&receiver)? as i32)
}

pub fn character_eq(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    let a = expect_char(&receiver)?;
    answer(matches!(arg(args, 0)?, Value::Character(b) if *b == a))
}
