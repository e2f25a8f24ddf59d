use object::{FrameRef, Primitive, Value};

use crate::Vm;
use crate::error::{ErrorKind, Result, VmError};
use crate::primitives::{PrimitiveDesc, PrimitiveOutcome, answer, arg, expect_integer};

pub const PRIMITIVES: &[PrimitiveDesc] = &[
    PrimitiveDesc::new(Primitive::IntegerAdd, integer_add),
    PrimitiveDesc::new(Primitive::IntegerSub, integer_sub),
    PrimitiveDesc::new(Primitive::IntegerMul, integer_mul),
    PrimitiveDesc::new(Primitive::IntegerDiv, integer_div),
    PrimitiveDesc::new(Primitive::IntegerModulo, integer_modulo),
    PrimitiveDesc::new(Primitive::IntegerMod, integer_mod),
    PrimitiveDesc::new(Primitive::IntegerLt, integer_lt),
    PrimitiveDesc::new(Primitive::IntegerLe, integer_le),
    PrimitiveDesc::new(Primitive::IntegerGt, integer_gt),
    PrimitiveDesc::new(Primitive::IntegerGe, integer_ge),
    PrimitiveDesc::new(Primitive::IntegerEq, integer_eq),
    PrimitiveDesc::new(Primitive::IntegerNe, integer_ne),
    PrimitiveDesc::new(Primitive::IntegerAsFloat, integer_as_float),
    PrimitiveDesc::new(Primitive::IntegerAsCharacter, integer_as_character),
    PrimitiveDesc::new(Primitive::IntegerNegated, integer_negated),
    PrimitiveDesc::new(Primitive::IntegerPrintString, integer_print_string),
];

fn operands(receiver: &Value, args: &[Value]) -> Result<(i32, i32)> {
    Ok((expect_integer(receiver)?, expect_integer(arg(args, 0)?)?))
}

fn nonzero(divisor: i32) -> Result<i32> {
    if divisor == 0 {
        Err(VmError::new(ErrorKind::Other, "division by zero"))
    } else {
        Ok(divisor)
    }
}

pub fn integer_add(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    let (a, b) = operands(&receiver, args)?;
    answer(a.wrapping_add(b))
}

pub fn integer_sub(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    let (a, b) = operands(&receiver, args)?;
    answer(a.wrapping_sub(b))
}

pub fn integer_mul(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    let (a, b) = operands(&receiver, args)?;
    answer(a.wrapping_mul(b))
}

/// Truncating division.
pub fn integer_div(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    let (a, b) = operands(&receiver, args)?;
    answer(a.wrapping_div(nonzero(b)?))
}

/// `\\`: modulo with the sign of the divisor.
pub fn integer_modulo(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    let (a, b) = operands(&receiver, args)?;
    let r = a.wrapping_rem(nonzero(b)?);
    if r != 0 && (r < 0) != (b < 0) {
        answer(r + b)
    } else {
        answer(r)
    }
}

/// `mod:`: remainder with the sign of the dividend.
pub fn integer_mod(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    let (a, b) = operands(&receiver, args)?;
    answer(a.wrapping_rem(nonzero(b)?))
}

pub fn integer_lt(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    let (a, b) = operands(&receiver, args)?;
    answer(a < b)
}

pub fn integer_le(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    let (a, b) = operands(&receiver, args)?;
    answer(a <= b)
}

pub fn integer_gt(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    let (a, b) = operands(&receiver, args)?;
    answer(a > b)
}

pub fn integer_ge(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    let (a, b) = operands(&receiver, args)?;
    answer(a >= b)
}

/// Equality with any value; non-integers are simply unequal.
pub fn integer_eq(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    let a = expect_integer(&receiver)?;
    answer(matches!(arg(args, 0)?, Value::Integer(b) if *b == a))
}

pub fn integer_ne(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    let a = expect_integer(&receiver)?;
    answer(!matches!(arg(args, 0)?, Value::Integer(b) if *b == a))
}

pub fn integer_as_float(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, _args: &[Value]) -> Result<PrimitiveOutcome> {
    answer(expect_integer(&receiver)? as f32)
}

pub fn integer_as_character(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, _args: &[Value]) -> Result<PrimitiveOutcome> {
    let code = expect_integer(&receiver)?;
    let c = u32::try_from(code)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| VmError::type_error("character code", &receiver))?;
    answer(c)
}

pub fn integer_negated(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, _args: &[Value]) -> Result<PrimitiveOutcome> {
    answer(expect_integer(&receiver)?.wrapping_neg())
}

pub fn integer_print_string(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, _args: &[Value]) -> Result<PrimitiveOutcome> {
    answer(Value::string(expect_integer(&receiver)?.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{PrimitiveFn, call};

    fn int(func: PrimitiveFn, a: i32, b: i32) -> Result<i32> {
        match call(func, Value::Integer(a), &[Value::Integer(b)])? {
            Value::Integer(n) => Ok(n),
            other => panic!("expected an integer, got {other:?}"),
        }
    }

    #[test]
    fn zero_and_one_are_identities() {
        for x in [0, 9, -9, i32::MAX, i32::MIN] {
            assert_eq!(int(integer_add, x, 0).unwrap(), x);
            assert_eq!(int(integer_mul, x, 1).unwrap(), x);
        }
    }

    #[test]
    fn zero_divisor_is_an_error() {
        for func in [integer_div as PrimitiveFn, integer_modulo, integer_mod] {
            let err = int(func, 7, 0).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Other);
            assert_eq!(err.message, "division by zero");
        }
    }

    #[test]
    fn modulo_follows_the_divisor_sign() {
        assert_eq!(int(integer_modulo, 7, 2).unwrap(), 1);
        assert_eq!(int(integer_modulo, -7, 2).unwrap(), 1);
        assert_eq!(int(integer_modulo, 7, -2).unwrap(), -1);
        assert_eq!(int(integer_modulo, -7, -2).unwrap(), -1);
        assert_eq!(int(integer_modulo, -6, 2).unwrap(), 0);
    }

    #[test]
    fn mod_follows_the_dividend_sign() {
        assert_eq!(int(integer_mod, 7, 2).unwrap(), 1);
        assert_eq!(int(integer_mod, -7, 2).unwrap(), -1);
        assert_eq!(int(integer_mod, 7, -2).unwrap(), 1);
        assert_eq!(int(integer_mod, -7, -2).unwrap(), -1);
    }

    #[test]
    fn division_truncates_and_wraps() {
        assert_eq!(int(integer_div, -7, 2).unwrap(), -3);
        assert_eq!(int(integer_div, i32::MIN, -1).unwrap(), i32::MIN);
        assert_eq!(int(integer_mod, i32::MIN, -1).unwrap(), 0);
        assert_eq!(int(integer_add, i32::MAX, 1).unwrap(), i32::MIN);
    }

    #[test]
    fn arithmetic_needs_an_integer_argument() {
        let err = call(integer_add, Value::Integer(1), &[Value::Float(1.0)]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeError);
    }
}
