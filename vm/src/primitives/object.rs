use std::rc::Rc;

use object::{FrameRef, Instance, Primitive, Value};

use crate::Vm;
use crate::error::{ErrorKind, Result, VmError};
use crate::primitives::{PrimitiveDesc, PrimitiveOutcome, answer, arg, expect_class};

pub const PRIMITIVES: &[PrimitiveDesc] = &[
    PrimitiveDesc::new(Primitive::ObjectClassBasicNew, class_basic_new),
    PrimitiveDesc::new(Primitive::ObjectClassNew, class_basic_new),
    PrimitiveDesc::new(Primitive::ObjectClassError, object_error),
    PrimitiveDesc::new(Primitive::ObjectError, object_error),
    PrimitiveDesc::new(Primitive::ObjectIdentical, object_identical),
    PrimitiveDesc::new(Primitive::ObjectNotIdentical, object_not_identical),
    PrimitiveDesc::new(Primitive::ObjectAsString, object_as_string),
    PrimitiveDesc::new(Primitive::ObjectPrintString, object_print_string),
    PrimitiveDesc::new(Primitive::ObjectClass, object_class),
    PrimitiveDesc::new(Primitive::ObjectIsNil, object_is_nil),
    PrimitiveDesc::new(Primitive::ObjectNotNil, object_not_nil),
    PrimitiveDesc::new(Primitive::ObjectHash, object_hash),
];

/// A fresh instance with every field nil.
pub fn class_basic_new(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, _args: &[Value]) -> Result<PrimitiveOutcome> {
    let class = expect_class(&receiver)?;
    answer(Value::Object(Rc::new(Instance::new(class))))
}

pub fn object_error(_vm: &mut Vm, _frame: &FrameRef, _receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    let message = arg(args, 0)?;
    Err(VmError::new(ErrorKind::Other, message.to_string()))
}

pub fn object_identical(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    answer(receiver.is_identical(arg(args, 0)?))
}

pub fn object_not_identical(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    answer(!receiver.is_identical(arg(args, 0)?))
}

pub fn object_as_string(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, _args: &[Value]) -> Result<PrimitiveOutcome> {
    answer(Value::string(receiver.to_string()))
}

pub fn object_print_string(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, _args: &[Value]) -> Result<PrimitiveOutcome> {
    answer(Value::string(receiver.debug_string()))
}

pub fn object_class(vm: &mut Vm, _frame: &FrameRef, receiver: Value, _args: &[Value]) -> Result<PrimitiveOutcome> {
    answer(Value::Class(vm.class_of(&receiver)?))
}

pub fn object_is_nil(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, _args: &[Value]) -> Result<PrimitiveOutcome> {
    answer(receiver.is_nil())
}

pub fn object_not_nil(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, _args: &[Value]) -> Result<PrimitiveOutcome> {
    answer(!receiver.is_nil())
}

pub fn object_hash(_vm: &mut Vm, _frame: &FrameRef, receiver: Value, _args: &[Value]) -> Result<PrimitiveOutcome> {
    answer(receiver.identity_hash())
}
