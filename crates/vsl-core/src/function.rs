use crate::block::{BasicBlock, BlockId};
use crate::types::Type;
use crate::values::{SlotId, TempId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    pub signature: FunctionSignature,
    pub body: FunctionBody,
}

impl Function {
    pub fn new(signature: FunctionSignature) -> Self {
        Self {
            signature,
            body: FunctionBody::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.signature.name
    }

    pub fn arity(&self) -> usize {
        self.signature.params.len()
    }

    pub fn entry_block(&self) -> BlockId {
        self.body.entry_block()
    }

    pub fn instruction_count(&self) -> usize {
        self.body
            .blocks
            .values()
            .map(|block| block.instructions.len())
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSignature {
    pub name: String,
    pub params: Vec<Parameter>,
    pub returns: Type,
}

impl FunctionSignature {
    /// `N` numbers in, one number out: the only function shape VSL has.
    pub fn numeric<S: Into<String>>(name: impl Into<String>, params: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            params: params
                .into_iter()
                .map(|p| Parameter::new(p, Type::Number))
                .collect(),
            returns: Type::Number,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub param_type: Type,
}

impl Parameter {
    pub fn new(name: impl Into<String>, param_type: Type) -> Self {
        Self {
            name: name.into(),
            param_type,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionBody {
    pub entry_block: BlockId,
    pub blocks: IndexMap<BlockId, BasicBlock>,
    pub slots: Vec<StackSlot>,
    next_block_id: u32,
    next_temp_id: u32,
}

impl FunctionBody {
    pub fn new() -> Self {
        let entry_block = BlockId(0);
        let mut blocks = IndexMap::new();
        blocks.insert(entry_block, BasicBlock::new(entry_block));

        Self {
            entry_block,
            blocks,
            slots: Vec::new(),
            next_block_id: 1,
            next_temp_id: 0,
        }
    }

    pub fn create_block(&mut self) -> BlockId {
        let id = BlockId(self.next_block_id);
        self.next_block_id += 1;
        self.blocks.insert(id, BasicBlock::new(id));
        id
    }

    pub fn get_block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.get(&id)
    }

    pub fn get_block_mut(&mut self, id: BlockId) -> Option<&mut BasicBlock> {
        self.blocks.get_mut(&id)
    }

    pub fn entry_block(&self) -> BlockId {
        self.entry_block
    }

    pub fn create_slot(&mut self, name: impl Into<String>) -> SlotId {
        let id = SlotId(self.slots.len() as u32);
        self.slots.push(StackSlot {
            id,
            name: name.into(),
        });
        id
    }

    pub fn slot(&self, id: SlotId) -> Option<&StackSlot> {
        self.slots.get(id.0 as usize)
    }

    pub fn next_temp(&mut self) -> TempId {
        let id = TempId(self.next_temp_id);
        self.next_temp_id += 1;
        id
    }

    pub fn temp_count(&self) -> u32 {
        self.next_temp_id
    }
}

impl Default for FunctionBody {
    fn default() -> Self {
        Self::new()
    }
}

/// One 8-byte numeric slot in the function's frame, named after the variable it holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackSlot {
    pub id: SlotId,
    pub name: String,
}
