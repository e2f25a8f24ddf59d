use crate::instruction::Instruction;
use crate::op::Op;
use crate::pack_location;

/// Builds a bytecode byte sequence.
///
/// Instructions are appended in emission order; [`append`](Self::append)
/// concatenates another buffer after everything emitted so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BytecodeBuilder {
    buf: Vec<u8>,
}

impl BytecodeBuilder {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Current byte offset in the bytecode stream.
    pub fn current_offset(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Concatenate `other` after the code emitted so far.
    pub fn append(&mut self, other: BytecodeBuilder) {
        self.buf.extend_from_slice(&other.buf);
    }

    // ── emit helpers ───────────────────────────────────────────────

    fn emit_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn emit_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn emit_op(&mut self, op: Op) {
        self.buf.push(op as u8);
    }

    /// Emit an already decoded instruction.
    pub fn emit(&mut self, instr: Instruction) {
        match instr {
            Instruction::Nil => self.nil(),
            Instruction::SelfRef => self.self_ref(),
            Instruction::True => self.true_(),
            Instruction::False => self.false_(),
            Instruction::PushChar { code } => self.push_char(code),
            Instruction::PushInt { value } => self.push_int(value),
            Instruction::PushFloat { value } => self.push_float(value),
            Instruction::PushField { slot } => self.push_field(slot),
            Instruction::PushLocal { depth, slot } => self.push_local(depth, slot),
            Instruction::PushLiteral { literal } => self.push_literal(literal),
            Instruction::PushGlobal { literal } => self.push_global(literal),
            Instruction::PushArray { count } => self.push_array(count),
            Instruction::StoreField { slot } => self.store_field(slot),
            Instruction::StoreLocal { depth, slot } => self.store_local(depth, slot),
            Instruction::Pop => self.pop(),
            Instruction::Send { argc, selector } => self.send(argc, selector),
            Instruction::SendSuper { argc, selector } => {
                self.send_super(argc, selector)
            }
            Instruction::Block { block } => self.block(block),
            Instruction::BlockReturn => self.block_return(),
            Instruction::Return => self.return_(),
            Instruction::Dbg { file, line, column } => self.dbg(file, line, column),
        }
    }

    pub fn nil(&mut self) {
        self.emit_op(Op::Nil);
    }

    pub fn self_ref(&mut self) {
        self.emit_op(Op::SelfRef);
    }

    pub fn true_(&mut self) {
        self.emit_op(Op::True);
    }

    pub fn false_(&mut self) {
        self.emit_op(Op::False);
    }

    /// `PushChar <code:u16>`
    pub fn push_char(&mut self, code: u16) {
        self.emit_op(Op::PushChar);
        self.emit_u16(code);
    }

    /// `PushInt <value:i32>`
    pub fn push_int(&mut self, value: i32) {
        self.emit_op(Op::PushInt);
        self.emit_u32(value as u32);
    }

    /// `PushFloat <bits:u32>`
    pub fn push_float(&mut self, value: f32) {
        self.emit_op(Op::PushFloat);
        self.emit_u32(value.to_bits());
    }

    pub fn push_field(&mut self, slot: u16) {
        self.emit_op(Op::PushField);
        self.emit_u16(slot);
    }

    pub fn push_local(&mut self, depth: u16, slot: u16) {
        self.emit_op(Op::PushLocal);
        self.emit_u16(depth);
        self.emit_u16(slot);
    }

    pub fn push_literal(&mut self, literal: u16) {
        self.emit_op(Op::PushLiteral);
        self.emit_u16(literal);
    }

    pub fn push_global(&mut self, literal: u16) {
        self.emit_op(Op::PushGlobal);
        self.emit_u16(literal);
    }

    pub fn push_array(&mut self, count: u16) {
        self.emit_op(Op::PushArray);
        self.emit_u16(count);
    }

    pub fn store_field(&mut self, slot: u16) {
        self.emit_op(Op::StoreField);
        self.emit_u16(slot);
    }

    pub fn store_local(&mut self, depth: u16, slot: u16) {
        self.emit_op(Op::StoreLocal);
        self.emit_u16(depth);
        self.emit_u16(slot);
    }

    pub fn pop(&mut self) {
        self.emit_op(Op::Pop);
    }

    /// `Send <argc:u16> <selector:u16>`
    pub fn send(&mut self, argc: u16, selector: u16) {
        self.emit_op(Op::Send);
        self.emit_u16(argc);
        self.emit_u16(selector);
    }

    /// `SendSuper <argc:u16> <selector:u16>`
    pub fn send_super(&mut self, argc: u16, selector: u16) {
        self.emit_op(Op::SendSuper);
        self.emit_u16(argc);
        self.emit_u16(selector);
    }

    /// `Block <block:u16>`: index into the unit's nested-unit table.
    pub fn block(&mut self, block: u16) {
        self.emit_op(Op::Block);
        self.emit_u16(block);
    }

    pub fn block_return(&mut self) {
        self.emit_op(Op::BlockReturn);
    }

    pub fn return_(&mut self) {
        self.emit_op(Op::Return);
    }

    /// `Dbg <file:u16> <location:u32>`. Columns past 255 are truncated.
    pub fn dbg(&mut self, file: u16, line: u32, column: u32) {
        self.emit_op(Op::Dbg);
        self.emit_u16(file);
        self.emit_u32(pack_location(line, column));
    }
}
