use std::collections::HashMap;
use std::rc::Rc;

use bytecode::{BytecodeDecoder, DecodeError, Instruction};

use crate::primitive::Primitive;

/// Executable artifact for one method or block.
///
/// Built once by the code generator and shared immutably through `Rc`
/// by class method tables, closures and frames.
#[derive(Debug, Clone, Default)]
pub struct CompiledUnit {
    /// Selector for methods, `<method>-block<N>` for blocks.
    pub name: String,
    /// `Class>>name`, used in traces.
    pub qualified_name: String,
    /// Class whose source defines this unit. Lookup for `SendSuper` starts
    /// at this class's superclass.
    pub owner: Option<String>,
    pub bytecode: Vec<u8>,
    pub literals: Vec<String>,
    /// Nested block units, addressed by the `Block` instruction.
    pub blocks: Vec<Rc<CompiledUnit>>,
    pub num_args: usize,
    pub num_locals: usize,
    pub is_class_method: bool,
    pub primitive: Option<Primitive>,
}

impl CompiledUnit {
    pub fn primitive(owner: &str, primitive: Primitive) -> Self {
        Self {
            name: primitive.selector().to_string(),
            qualified_name: format!("{owner}>>{}", primitive.selector()),
            owner: Some(owner.to_string()),
            num_args: primitive.arity(),
            is_class_method: primitive.is_class_side(),
            primitive: Some(primitive),
            ..Self::default()
        }
    }

    /// Arguments followed by declared locals.
    pub fn frame_size(&self) -> usize {
        self.num_args + self.num_locals
    }

    pub fn is_primitive(&self) -> bool {
        self.primitive.is_some()
    }

    pub fn literal(&self, idx: u16) -> Option<&str> {
        self.literals.get(idx as usize).map(String::as_str)
    }

    pub fn block(&self, idx: u16) -> Option<&Rc<CompiledUnit>> {
        self.blocks.get(idx as usize)
    }

    pub fn instructions(&self) -> BytecodeDecoder<'_> {
        BytecodeDecoder::new(&self.bytecode)
    }

    pub fn decode(&self) -> Result<Vec<Instruction>, DecodeError> {
        bytecode::decode_all(&self.bytecode)
    }
}

/// Interned string table. Each distinct string gets the index of its first
/// occurrence.
#[derive(Debug, Clone, Default)]
pub struct LiteralTable {
    entries: Vec<String>,
    index: HashMap<String, u16>,
}

impl LiteralTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `text`, answering its index. `None` once the table is full.
    pub fn intern(&mut self, text: &str) -> Option<u16> {
        if let Some(&idx) = self.index.get(text) {
            return Some(idx);
        }
        let idx = u16::try_from(self.entries.len()).ok()?;
        self.entries.push(text.to_string());
        self.index.insert(text.to_string(), idx);
        Some(idx)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.entries
    }
}
