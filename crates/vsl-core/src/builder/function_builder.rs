use super::InstBuilder;
use crate::{
    block::BlockId,
    function::{Function, FunctionSignature},
    values::{ParamId, SlotId, Value},
    IrError, Result,
};

#[derive(Debug, Clone)]
pub struct FunctionBuilder {
    function: Function,
    current_block: BlockId,
}

impl FunctionBuilder {
    pub fn new(signature: FunctionSignature) -> Self {
        let function = Function::new(signature);
        let current_block = function.entry_block();
        Self {
            function,
            current_block,
        }
    }

    pub fn name(&self) -> &str {
        self.function.name()
    }

    pub fn signature(&self) -> &FunctionSignature {
        &self.function.signature
    }

    pub fn function(&self) -> &Function {
        &self.function
    }

    pub fn entry_block(&self) -> BlockId {
        self.function.entry_block()
    }

    pub fn create_block(&mut self) -> BlockId {
        self.function.body.create_block()
    }

    pub fn create_labeled_block(&mut self, label: &str) -> BlockId {
        let id = self.function.body.create_block();
        if let Some(block) = self.function.body.get_block_mut(id) {
            block.metadata.label = Some(label.to_string());
        }
        id
    }

    pub fn mark_loop_header(&mut self, block_id: BlockId) -> Result<()> {
        let block = self
            .function
            .body
            .get_block_mut(block_id)
            .ok_or_else(|| IrError::BuilderError(format!("Block {} does not exist", block_id)))?;
        block.metadata.is_loop_header = true;
        Ok(())
    }

    pub fn switch_to_block(&mut self, block_id: BlockId) -> Result<()> {
        if self.function.body.get_block(block_id).is_none() {
            return Err(IrError::BuilderError(format!(
                "Block {} does not exist",
                block_id
            )));
        }
        self.current_block = block_id;
        Ok(())
    }

    pub fn current_block(&self) -> BlockId {
        self.current_block
    }

    pub fn is_terminated(&self) -> bool {
        self.function
            .body
            .get_block(self.current_block)
            .map(|b| b.is_terminated())
            .unwrap_or(false)
    }

    pub fn create_slot(&mut self, name: &str) -> SlotId {
        self.function.body.create_slot(name)
    }

    pub fn param(&self, index: usize) -> Result<Value> {
        if index >= self.function.arity() {
            return Err(IrError::BuilderError(format!(
                "Function '{}' has no parameter {}",
                self.name(),
                index
            )));
        }
        Ok(Value::Param(ParamId(index as u32)))
    }

    pub fn ins(&mut self) -> Result<InstBuilder<'_>> {
        if self.is_terminated() {
            return Err(IrError::BuilderError(format!(
                "{} in '{}' is already terminated",
                self.current_block,
                self.name()
            )));
        }
        Ok(InstBuilder::new(&mut self.function, self.current_block))
    }

    /// Finishes the function. Fails if any block is still open.
    pub fn build(self) -> Result<Function> {
        if let Some(open) = self
            .function
            .body
            .blocks
            .values()
            .find(|b| !b.is_terminated())
        {
            return Err(IrError::BuilderError(format!(
                "{} in '{}' has no terminator",
                open.id,
                self.function.name()
            )));
        }
        Ok(self.function)
    }
}
