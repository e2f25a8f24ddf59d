use core::fmt;

use crate::op::Op;

/// A decoded instruction.
///
/// Operands keep their encoded widths. [`Dbg`](Instruction::Dbg) is stored
/// unpacked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Instruction {
    Nil,
    SelfRef,
    True,
    False,
    PushChar { code: u16 },
    PushInt { value: i32 },
    PushFloat { value: f32 },
    PushField { slot: u16 },
    PushLocal { depth: u16, slot: u16 },
    PushLiteral { literal: u16 },
    PushGlobal { literal: u16 },
    PushArray { count: u16 },
    StoreField { slot: u16 },
    StoreLocal { depth: u16, slot: u16 },
    Pop,
    Send { argc: u16, selector: u16 },
    SendSuper { argc: u16, selector: u16 },
    Block { block: u16 },
    BlockReturn,
    Return,
    Dbg { file: u16, line: u32, column: u32 },
}

impl Instruction {
    pub const fn op(&self) -> Op {
        match self {
            Self::Nil => Op::Nil,
            Self::SelfRef => Op::SelfRef,
            Self::True => Op::True,
            Self::False => Op::False,
            Self::PushChar { .. } => Op::PushChar,
            Self::PushInt { .. } => Op::PushInt,
            Self::PushFloat { .. } => Op::PushFloat,
            Self::PushField { .. } => Op::PushField,
            Self::PushLocal { .. } => Op::PushLocal,
            Self::PushLiteral { .. } => Op::PushLiteral,
            Self::PushGlobal { .. } => Op::PushGlobal,
            Self::PushArray { .. } => Op::PushArray,
            Self::StoreField { .. } => Op::StoreField,
            Self::StoreLocal { .. } => Op::StoreLocal,
            Self::Pop => Op::Pop,
            Self::Send { .. } => Op::Send,
            Self::SendSuper { .. } => Op::SendSuper,
            Self::Block { .. } => Op::Block,
            Self::BlockReturn => Op::BlockReturn,
            Self::Return => Op::Return,
            Self::Dbg { .. } => Op::Dbg,
        }
    }

    /// Encoded size in bytes, opcode included.
    pub const fn size(&self) -> usize {
        1 + self.op().operand_size()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.op().mnemonic();
        match *self {
            Self::Nil
            | Self::SelfRef
            | Self::True
            | Self::False
            | Self::Pop
            | Self::BlockReturn
            | Self::Return => f.write_str(name),
            Self::PushChar { code } => match char::from_u32(code as u32) {
                Some(c) => write!(f, "{name} ${c}"),
                None => write!(f, "{name} {code}"),
            },
            Self::PushInt { value } => write!(f, "{name} {value}"),
            Self::PushFloat { value } => write!(f, "{name} {value}"),
            Self::PushField { slot } | Self::StoreField { slot } => {
                write!(f, "{name} {slot}")
            }
            Self::PushLocal { depth, slot } | Self::StoreLocal { depth, slot } => {
                write!(f, "{name} {depth}:{slot}")
            }
            Self::PushLiteral { literal } | Self::PushGlobal { literal } => {
                write!(f, "{name} #{literal}")
            }
            Self::PushArray { count } => write!(f, "{name} {count}"),
            Self::Send { argc, selector } | Self::SendSuper { argc, selector } => {
                write!(f, "{name} {argc}, #{selector}")
            }
            Self::Block { block } => write!(f, "{name} {block}"),
            Self::Dbg { file, line, column } => {
                write!(f, "{name} #{file}, {line}:{column}")
            }
        }
    }
}
