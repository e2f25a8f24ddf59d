mod op;
mod instruction;
mod builder;
mod decoder;

pub use op::Op;
pub use instruction::Instruction;
pub use builder::BytecodeBuilder;
pub use decoder::{BytecodeDecoder, DecodeError, decode_at};

/// Pack a source position into the 32-bit `Dbg` operand: the line in the
/// upper 24 bits, the column in the low 8.
pub const fn pack_location(line: u32, column: u32) -> u32 {
    (line << 8) | (column & 0xFF)
}

pub const fn unpack_location(packed: u32) -> (u32, u32) {
    (packed >> 8, packed & 0xFF)
}

/// Decode a whole unit, stopping at the first malformed instruction.
pub fn decode_all(bytes: &[u8]) -> Result<Vec<Instruction>, DecodeError> {
    BytecodeDecoder::new(bytes).collect()
}
