use object::{FrameRef, Primitive, Value};

use crate::Vm;
use crate::error::Result;
use crate::primitives::{PrimitiveDesc, PrimitiveOutcome, answer, arg, expect_float};

pub const PRIMITIVES: &[PrimitiveDesc] = &[
    PrimitiveDesc::new(Primitive::FloatAdd, float_add),
    PrimitiveDesc::new(Primitive::FloatSub, float_sub),
    PrimitiveDesc::new(Primitive::FloatMul, float_mul),
    PrimitiveDesc::new(Primitive::FloatDiv, float_div),
    PrimitiveDesc::new(Primitive::FloatLt, float_lt),
    PrimitiveDesc::new(Primitive::FloatLe, float_le),
    PrimitiveDesc::new(Primitive::FloatGt, float_gt),
    PrimitiveDesc::new(Primitive::FloatGe, float_ge),
    PrimitiveDesc::new(Primitive::FloatEq, float_eq),
    PrimitiveDesc::new(Primitive::FloatAsInteger, float_as_integer),
    PrimitiveDesc::new(Primitive::FloatNegated, float_negated),
    PrimitiveDesc::new(Primitive::FloatPrintString, float_print_string),
];

fn operands(receiver: &Value, args: &[Value]) -> Result<(f32, f32)> {
    Ok((expect_float(receiver)?, expect_float(arg(args, 0)?)?))
}

pub fn float_add(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    let (a, b) = operands(&receiver, args)?;
    answer(a + b)
}

pub fn float_sub(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    let (a, b) = operands(&receiver, args)?;
    answer(a - b)
}

pub fn float_mul(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    let (a, b) = operands(&receiver, args)?;
    answer(a * b)
}

/// IEEE division: a zero divisor gives an infinity or NaN.
pub fn float_div(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    let (a, b) = operands(&receiver, args)?;
    answer(a / b)
}

pub fn float_lt(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    let (a, b) = operands(&receiver, args)?;
    answer(a < b)
}

pub fn float_le(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    let (a, b) = operands(&receiver, args)?;
    answer(a <= b)
}

pub fn float_gt(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    let (a, b) = operands(&receiver, args)?;
    answer(a > b)
}

pub fn float_ge(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    let (a, b) = operands(&receiver, args)?;
    answer(a >= b)
}

pub fn float_eq(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    let a = expect_float(&receiver)?;
    answer(matches!(arg(args, 0)?, Value::Float(b) if *b == a))
}

/// Truncates toward zero, saturating at the integer range.
pub fn float_as_integer(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, _args: &[Value]) -> Result<PrimitiveOutcome> {
    answer(expect_float(&receiver)? as i32)
}

pub fn float_negated(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, _args: &[Value]) -> Result<PrimitiveOutcome> {
    answer(-expect_float(&receiver)?)
}

pub fn float_print_string(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, _args: &[Value]) -> Result<PrimitiveOutcome> {
    expect_float(&receiver)?;
    answer(Value::string(receiver.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::primitives::{PrimitiveFn, call};

    fn float(func: PrimitiveFn, a: f32, b: f32) -> f32 {
        match call(func, Value::Float(a), &[Value::Float(b)]).expect("float primitive") {
            Value::Float(f) => f,
            other => panic!("expected a float, got {other:?}"),
        }
    }

    #[test]
    fn zero_and_one_are_identities() {
        for x in [0.0, 2.5, -2.5, f32::MAX, f32::MIN_POSITIVE] {
            assert_eq!(float(float_add, x, 0.0), x);
            assert_eq!(float(float_mul, x, 1.0), x);
        }
    }

    #[test]
    fn zero_divisor_follows_ieee() {
        assert_eq!(float(float_div, 1.0, 0.0), f32::INFINITY);
        assert_eq!(float(float_div, -1.0, 0.0), f32::NEG_INFINITY);
        assert!(float(float_div, 0.0, 0.0).is_nan());
    }

    #[test]
    fn conversions_and_printing() {
        let value = call(float_as_integer, Value::Float(-2.75), &[]).unwrap();
        assert!(matches!(value, Value::Integer(-2)));
        let value = call(float_print_string, Value::Float(1.5), &[]).unwrap();
        assert_eq!(value.to_string(), "1.5");
    }

    #[test]
    fn integer_argument_is_a_type_error() {
        let err = call(float_add, Value::Float(1.0), &[Value::Integer(1)]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeError);
    }
}
