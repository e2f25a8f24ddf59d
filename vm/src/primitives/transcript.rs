use object::{FrameRef, Primitive, Value};

use crate::Vm;
use crate::error::Result;
use crate::primitives::{PrimitiveDesc, PrimitiveOutcome, answer, arg};

pub const PRIMITIVES: &[PrimitiveDesc] = &[
    PrimitiveDesc::new(Primitive::TranscriptShow, transcript_show),
    PrimitiveDesc::new(Primitive::TranscriptCr, transcript_cr),
];

/// Print the argument and a newline.
pub fn transcript_show(vm: &mut Vm, _frame: &FrameRef, receiver: Value, args: &[Value]) -> Result<PrimitiveOutcome> {
    let text = arg(args, 0)?.to_string();
    vm.write_transcript(&text)?;
    vm.write_transcript("\n")?;
    answer(receiver)
}

pub fn transcript_cr(vm: &mut Vm, _frame: &FrameRef, receiver: Value, _args: &[Value]) -> Result<PrimitiveOutcome> {
    vm.write_transcript("\n")?;
    answer(receiver)
}
