use crate::{
    block::{BlockId, Terminator},
    function::Function,
    instructions::Instruction,
    values::{Location, TempId, Value},
};

/// Appends to one block of a function. Obtained from `FunctionBuilder::ins`.
pub struct InstBuilder<'a> {
    function: &'a mut Function,
    block: BlockId,
}

impl<'a> InstBuilder<'a> {
    pub(crate) fn new(function: &'a mut Function, block: BlockId) -> Self {
        Self { function, block }
    }

    fn temp(&mut self) -> TempId {
        self.function.body.next_temp()
    }

    fn push(&mut self, inst: Instruction) {
        if let Some(block) = self.function.body.get_block_mut(self.block) {
            block.add_instruction(inst);
        }
    }

    fn terminate(&mut self, term: Terminator) {
        if let Some(block) = self.function.body.get_block_mut(self.block) {
            block.set_terminator(term);
        }
    }

    pub fn fadd(mut self, left: Value, right: Value) -> Value {
        let result = self.temp();
        self.push(Instruction::Add { result, left, right });
        Value::Temp(result)
    }

    pub fn fsub(mut self, left: Value, right: Value) -> Value {
        let result = self.temp();
        self.push(Instruction::Sub { result, left, right });
        Value::Temp(result)
    }

    pub fn fmul(mut self, left: Value, right: Value) -> Value {
        let result = self.temp();
        self.push(Instruction::Mul { result, left, right });
        Value::Temp(result)
    }

    pub fn fdiv(mut self, left: Value, right: Value) -> Value {
        let result = self.temp();
        self.push(Instruction::Div { result, left, right });
        Value::Temp(result)
    }

    pub fn fneg(mut self, operand: Value) -> Value {
        let result = self.temp();
        self.push(Instruction::Neg { result, operand });
        Value::Temp(result)
    }

    pub fn fcmp_gt(mut self, left: Value, right: Value) -> Value {
        let result = self.temp();
        self.push(Instruction::Gt { result, left, right });
        Value::Temp(result)
    }

    pub fn load(mut self, location: Location) -> Value {
        let result = self.temp();
        self.push(Instruction::Load { result, location });
        Value::Temp(result)
    }

    pub fn store(mut self, location: Location, value: Value) {
        self.push(Instruction::Store { location, value });
    }

    pub fn call(mut self, callee: &str, args: Vec<Value>) -> Value {
        let result = self.temp();
        self.push(Instruction::Call {
            result,
            callee: callee.to_string(),
            args,
        });
        Value::Temp(result)
    }

    pub fn call_external(mut self, callee: &str, args: Vec<Value>) {
        self.push(Instruction::CallExternal {
            callee: callee.to_string(),
            args,
        });
    }

    pub fn jump(mut self, target: BlockId) {
        self.terminate(Terminator::Jump(target));
    }

    pub fn branch(mut self, condition: Value, then_block: BlockId, else_block: BlockId) {
        self.terminate(Terminator::Branch {
            condition,
            then_block,
            else_block,
        });
    }

    pub fn ret(mut self, value: Value) {
        self.terminate(Terminator::Return(value));
    }
}
