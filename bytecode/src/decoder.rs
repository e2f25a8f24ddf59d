use thiserror::Error;

use crate::instruction::Instruction;
use crate::op::Op;
use crate::unpack_location;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid opcode 0x{byte:02x} at offset {offset}")]
    InvalidOpcode { byte: u8, offset: usize },
    #[error("truncated {op:?} operands at offset {offset}")]
    Truncated { op: Op, offset: usize },
    #[error("no instruction at offset {offset}")]
    EndOfCode { offset: usize },
}

/// Decodes a bytecode byte slice into [`Instruction`]s.
///
/// Malformed input is reported as a [`DecodeError`]; after an error the
/// decoder stops yielding.
pub struct BytecodeDecoder<'a> {
    bytes: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> BytecodeDecoder<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            failed: false,
        }
    }

    /// Start decoding at byte offset `pos`.
    pub fn at(bytes: &'a [u8], pos: usize) -> Self {
        Self {
            bytes,
            pos,
            failed: false,
        }
    }

    /// Current byte offset in the stream.
    #[inline(always)]
    pub fn offset(&self) -> usize {
        self.pos
    }

    #[inline(always)]
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// Decode the next instruction, or `None` at end-of-stream.
    pub fn decode_next(&mut self) -> Option<Result<Instruction, DecodeError>> {
        if self.is_at_end() || self.failed {
            return None;
        }
        let result = self.decode();
        self.failed = result.is_err();
        Some(result)
    }

    fn decode(&mut self) -> Result<Instruction, DecodeError> {
        let offset = self.pos;
        let byte = self.bytes[offset];
        let op = Op::try_from(byte)
            .map_err(|byte| DecodeError::InvalidOpcode { byte, offset })?;
        let end = offset + 1 + op.operand_size();
        if end > self.bytes.len() {
            return Err(DecodeError::Truncated { op, offset });
        }
        self.pos += 1;

        let instr = match op {
            Op::Nil => Instruction::Nil,
            Op::SelfRef => Instruction::SelfRef,
            Op::True => Instruction::True,
            Op::False => Instruction::False,
            Op::PushChar => Instruction::PushChar {
                code: self.read_u16(),
            },
            Op::PushInt => Instruction::PushInt {
                value: self.read_u32() as i32,
            },
            Op::PushFloat => Instruction::PushFloat {
                value: f32::from_bits(self.read_u32()),
            },
            Op::PushField => Instruction::PushField {
                slot: self.read_u16(),
            },
            Op::PushLocal => {
                let depth = self.read_u16();
                let slot = self.read_u16();
                Instruction::PushLocal { depth, slot }
            }
            Op::PushLiteral => Instruction::PushLiteral {
                literal: self.read_u16(),
            },
            Op::PushGlobal => Instruction::PushGlobal {
                literal: self.read_u16(),
            },
            Op::PushArray => Instruction::PushArray {
                count: self.read_u16(),
            },
            Op::StoreField => Instruction::StoreField {
                slot: self.read_u16(),
            },
            Op::StoreLocal => {
                let depth = self.read_u16();
                let slot = self.read_u16();
                Instruction::StoreLocal { depth, slot }
            }
            Op::Pop => Instruction::Pop,
            Op::Send => {
                let argc = self.read_u16();
                let selector = self.read_u16();
                Instruction::Send { argc, selector }
            }
            Op::SendSuper => {
                let argc = self.read_u16();
                let selector = self.read_u16();
                Instruction::SendSuper { argc, selector }
            }
            Op::Block => Instruction::Block {
                block: self.read_u16(),
            },
            Op::BlockReturn => Instruction::BlockReturn,
            Op::Return => Instruction::Return,
            Op::Dbg => {
                let file = self.read_u16();
                let (line, column) = unpack_location(self.read_u32());
                Instruction::Dbg { file, line, column }
            }
        };
        Ok(instr)
    }

    // Callers have checked that the operands fit.
    fn read_u16(&mut self) -> u16 {
        let v = u16::from_le_bytes([self.bytes[self.pos], self.bytes[self.pos + 1]]);
        self.pos += 2;
        v
    }

    fn read_u32(&mut self) -> u32 {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&self.bytes[self.pos..self.pos + 4]);
        self.pos += 4;
        u32::from_le_bytes(raw)
    }
}

impl<'a> Iterator for BytecodeDecoder<'a> {
    type Item = Result<Instruction, DecodeError>;

    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        self.decode_next()
    }
}

/// Decode the single instruction starting at `pos`, returning it with the
/// offset of the instruction that follows.
pub fn decode_at(bytes: &[u8], pos: usize) -> Result<(Instruction, usize), DecodeError> {
    let mut decoder = BytecodeDecoder::at(bytes, pos);
    match decoder.decode_next() {
        Some(result) => result.map(|instr| (instr, decoder.offset())),
        None => Err(DecodeError::EndOfCode { offset: pos }),
    }
}
