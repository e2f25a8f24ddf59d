/// Bytecode opcodes.
///
/// Every opcode is a single byte followed by fixed-width little-endian
/// operands. Index and count operands are `u16`; [`PushInt`](Op::PushInt)
/// carries an `i32`, [`PushFloat`](Op::PushFloat) the raw bits of an `f32`
/// and [`Dbg`](Op::Dbg) a packed source location (see
/// [`pack_location`](crate::pack_location)).
///
/// Numbering starts at 1 so that a zeroed buffer never decodes as a valid
/// instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Op {
    /// Push nil.
    Nil = 1,

    /// Push the receiver of the current frame.
    SelfRef,

    /// Push true.
    True,

    /// Push false.
    False,

    /// Push a character literal.
    /// Operands: `code:u16`
    PushChar,

    /// Push an integer literal.
    /// Operands: `value:i32`
    PushInt,

    /// Push a float literal.
    /// Operands: `bits:u32`
    PushFloat,

    /// Push a field of the receiver.
    /// Operands: `slot:u16`
    PushField,

    /// Push a local of the frame `depth` lexical levels up.
    /// Operands: `depth:u16`, `slot:u16`
    PushLocal,

    /// Push a string literal from the unit's literal table.
    /// Operands: `literal:u16`
    PushLiteral,

    /// Push the global named by a literal.
    /// Operands: `literal:u16`
    PushGlobal,

    /// Pop `count` values and push them as a new array, first pushed first.
    /// Operands: `count:u16`
    PushArray,

    /// Store top of stack into a receiver field. The value stays on the stack.
    /// Operands: `slot:u16`
    StoreField,

    /// Store top of stack into a local `depth` levels up. The value stays on
    /// the stack.
    /// Operands: `depth:u16`, `slot:u16`
    StoreLocal,

    /// Discard the top of stack.
    Pop,

    /// Send the message named by a literal. The receiver sits below the
    /// `argc` arguments.
    /// Operands: `argc:u16`, `selector:u16`
    Send,

    /// Like [`Send`](Op::Send), but lookup starts in the superclass of the
    /// class that owns the executing code.
    /// Operands: `argc:u16`, `selector:u16`
    SendSuper,

    /// Push a closure over the current frame for a nested unit.
    /// Operands: `block:u16`
    Block,

    /// Return top of stack to the block's invoker.
    BlockReturn,

    /// Return top of stack from the home method.
    Return,

    /// Record the source location of the following code.
    /// Operands: `file:u16`, `location:u32`
    Dbg,
}

impl Op {
    pub const FIRST: u8 = Op::Nil as u8;
    pub const LAST: u8 = Op::Dbg as u8;
    pub const COUNT: usize = (Self::LAST - Self::FIRST + 1) as usize;

    pub const ALL: [Op; Self::COUNT] = [
        Op::Nil,
        Op::SelfRef,
        Op::True,
        Op::False,
        Op::PushChar,
        Op::PushInt,
        Op::PushFloat,
        Op::PushField,
        Op::PushLocal,
        Op::PushLiteral,
        Op::PushGlobal,
        Op::PushArray,
        Op::StoreField,
        Op::StoreLocal,
        Op::Pop,
        Op::Send,
        Op::SendSuper,
        Op::Block,
        Op::BlockReturn,
        Op::Return,
        Op::Dbg,
    ];

    /// Total size of the operands following the opcode byte.
    pub const fn operand_size(self) -> usize {
        match self {
            Op::Nil
            | Op::SelfRef
            | Op::True
            | Op::False
            | Op::Pop
            | Op::BlockReturn
            | Op::Return => 0,
            Op::PushChar
            | Op::PushField
            | Op::PushLiteral
            | Op::PushGlobal
            | Op::PushArray
            | Op::StoreField
            | Op::Block => 2,
            Op::PushInt
            | Op::PushFloat
            | Op::PushLocal
            | Op::StoreLocal
            | Op::Send
            | Op::SendSuper => 4,
            Op::Dbg => 6,
        }
    }

    /// Lower-case mnemonic used by listings and traces.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Op::Nil => "nil",
            Op::SelfRef => "self",
            Op::True => "true",
            Op::False => "false",
            Op::PushChar => "push_char",
            Op::PushInt => "push_int",
            Op::PushFloat => "push_float",
            Op::PushField => "push_field",
            Op::PushLocal => "push_local",
            Op::PushLiteral => "push_literal",
            Op::PushGlobal => "push_global",
            Op::PushArray => "push_array",
            Op::StoreField => "store_field",
            Op::StoreLocal => "store_local",
            Op::Pop => "pop",
            Op::Send => "send",
            Op::SendSuper => "send_super",
            Op::Block => "block",
            Op::BlockReturn => "block_return",
            Op::Return => "return",
            Op::Dbg => "dbg",
        }
    }
}

impl TryFrom<u8> for Op {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, u8> {
        if (Self::FIRST..=Self::LAST).contains(&byte) {
            Ok(Self::ALL[(byte - Self::FIRST) as usize])
        } else {
            Err(byte)
        }
    }
}
