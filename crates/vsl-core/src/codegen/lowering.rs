use cranelift::prelude::EntityRef;
use cranelift_codegen::ir::condcodes::FloatCC;
use cranelift_codegen::ir::{
    self as clif_ir, types, InstBuilder, MemFlags, StackSlotData, StackSlotKind,
};
use cranelift_frontend::{FunctionBuilder, FunctionBuilderContext, Variable};
use std::collections::HashMap;

use super::module::FunctionRefs;
use crate::{
    block::{BlockId, Terminator},
    function::Function,
    instructions::Instruction,
    values::{GlobalId, Location, SlotId, TempId, Value},
    ExecutionError, IrError, Result,
};

/// Lowers one IR function into `func`, whose signature and name are already set.
pub fn lower_function(
    function: &Function,
    func: &mut clif_ir::Function,
    builder_context: &mut FunctionBuilderContext,
    refs: &FunctionRefs,
    pointer_type: types::Type,
) -> Result<()> {
    let mut builder = FunctionBuilder::new(func, builder_context);

    let mut blocks = HashMap::new();
    for block_id in function.body.blocks.keys() {
        blocks.insert(*block_id, builder.create_block());
    }
    let entry = clif_block(&blocks, function.body.entry_block)?;
    builder.append_block_params_for_function_params(entry);
    builder.switch_to_block(entry);
    let params = builder.block_params(entry).to_vec();

    let mut slots = HashMap::new();
    for slot in &function.body.slots {
        let var = Variable::new(slot.id.0 as usize);
        builder.declare_var(var, types::F64);
        slots.insert(slot.id, var);
    }

    let mut lowering = FunctionLowering {
        builder,
        blocks,
        params,
        slots,
        temps: HashMap::new(),
        refs,
        pointer_type,
    };

    for block in function.body.blocks.values() {
        let clif = clif_block(&lowering.blocks, block.id)?;
        lowering.builder.switch_to_block(clif);
        for inst in &block.instructions {
            lowering.lower_instruction(inst)?;
        }
        lowering.lower_terminator(&block.terminator)?;
    }

    lowering.builder.seal_all_blocks();
    lowering.builder.finalize();
    Ok(())
}

fn clif_block(blocks: &HashMap<BlockId, clif_ir::Block>, id: BlockId) -> Result<clif_ir::Block> {
    blocks
        .get(&id)
        .copied()
        .ok_or_else(|| ExecutionError::Malformed(format!("branch to unknown {}", id)).into())
}

struct FunctionLowering<'a, 'f> {
    builder: FunctionBuilder<'f>,
    blocks: HashMap<BlockId, clif_ir::Block>,
    params: Vec<clif_ir::Value>,
    slots: HashMap<SlotId, Variable>,
    temps: HashMap<TempId, clif_ir::Value>,
    refs: &'a FunctionRefs,
    pointer_type: types::Type,
}

impl FunctionLowering<'_, '_> {
    fn value(&mut self, value: &Value) -> Result<clif_ir::Value> {
        match value {
            Value::Temp(t) => self.temps.get(t).copied().ok_or_else(|| {
                ExecutionError::Malformed(format!("{} used before definition", t)).into()
            }),
            Value::Param(p) => self.params.get(p.0 as usize).copied().ok_or_else(|| {
                ExecutionError::Malformed(format!("parameter {} out of range", p)).into()
            }),
            Value::Constant(c) => Ok(self.builder.ins().f64const(*c)),
            Value::GlobalAddress(g) => self.global_address(*g),
        }
    }

    fn global_address(&mut self, id: GlobalId) -> Result<clif_ir::Value> {
        let gv = self.refs.globals.get(&id).copied().ok_or_else(|| {
            IrError::CraneliftError(format!("Global {} was not imported", id))
        })?;
        Ok(self.builder.ins().symbol_value(self.pointer_type, gv))
    }

    fn slot(&self, id: SlotId) -> Result<Variable> {
        self.slots.get(&id).copied().ok_or_else(|| {
            ExecutionError::Malformed(format!("unknown stack slot {}", id)).into()
        })
    }

    fn binary(
        &mut self,
        result: TempId,
        left: &Value,
        right: &Value,
        op: impl FnOnce(&mut FunctionBuilder<'_>, clif_ir::Value, clif_ir::Value) -> clif_ir::Value,
    ) -> Result<()> {
        let left = self.value(left)?;
        let right = self.value(right)?;
        let res = op(&mut self.builder, left, right);
        self.temps.insert(result, res);
        Ok(())
    }

    fn lower_instruction(&mut self, inst: &Instruction) -> Result<()> {
        match inst {
            Instruction::Add {
                result,
                left,
                right,
            } => self.binary(*result, left, right, |b, l, r| b.ins().fadd(l, r)),
            Instruction::Sub {
                result,
                left,
                right,
            } => self.binary(*result, left, right, |b, l, r| b.ins().fsub(l, r)),
            Instruction::Mul {
                result,
                left,
                right,
            } => self.binary(*result, left, right, |b, l, r| b.ins().fmul(l, r)),
            Instruction::Div {
                result,
                left,
                right,
            } => self.binary(*result, left, right, |b, l, r| b.ins().fdiv(l, r)),
            Instruction::Gt {
                result,
                left,
                right,
            } => self.binary(*result, left, right, |b, l, r| {
                b.ins().fcmp(FloatCC::GreaterThan, l, r)
            }),
            Instruction::Neg { result, operand } => {
                let operand = self.value(operand)?;
                let res = self.builder.ins().fneg(operand);
                self.temps.insert(*result, res);
                Ok(())
            }
            Instruction::Load { result, location } => {
                let res = match location {
                    Location::Slot(slot) => {
                        let var = self.slot(*slot)?;
                        self.builder.use_var(var)
                    }
                    Location::Global(global) => {
                        let addr = self.global_address(*global)?;
                        self.builder
                            .ins()
                            .load(types::F64, MemFlags::trusted(), addr, 0)
                    }
                };
                self.temps.insert(*result, res);
                Ok(())
            }
            Instruction::Store { location, value } => {
                let value = self.value(value)?;
                match location {
                    Location::Slot(slot) => {
                        let var = self.slot(*slot)?;
                        self.builder.def_var(var, value);
                    }
                    Location::Global(global) => {
                        let addr = self.global_address(*global)?;
                        self.builder.ins().store(MemFlags::trusted(), value, addr, 0);
                    }
                }
                Ok(())
            }
            Instruction::Call {
                result,
                callee,
                args,
            } => {
                let func_ref = self
                    .refs
                    .functions
                    .get(callee)
                    .copied()
                    .ok_or_else(|| IrError::FunctionNotFound(callee.clone()))?;
                let args = args
                    .iter()
                    .map(|arg| self.value(arg))
                    .collect::<Result<Vec<_>>>()?;
                let call = self.builder.ins().call(func_ref, &args);
                let res = self.builder.inst_results(call)[0];
                self.temps.insert(*result, res);
                Ok(())
            }
            Instruction::CallExternal { callee, args } => self.lower_printf(callee, args),
        }
    }

    /// `printf(fmt, a, b, ...)` becomes `vsl_printf(fmt, &[a, b, ...], n)` with the arguments
    /// spilled to an explicit stack slot, 8 bytes each.
    fn lower_printf(&mut self, callee: &str, args: &[Value]) -> Result<()> {
        let runtime = self.refs.runtime_printf.ok_or_else(|| {
            IrError::CraneliftError(format!("No runtime binding for external '{}'", callee))
        })?;
        let (format, rest) = args.split_first().ok_or_else(|| {
            IrError::InvalidInstruction(format!("call to '{}' without a format string", callee))
        })?;
        let format = self.value(format)?;

        let (packed, count) = if rest.is_empty() {
            let null = self.builder.ins().iconst(self.pointer_type, 0);
            (null, 0)
        } else {
            let size = u32::try_from(rest.len() * 8).map_err(|_| {
                IrError::InvalidInstruction(format!("too many arguments to '{}'", callee))
            })?;
            let slot = self.builder.create_sized_stack_slot(StackSlotData::new(
                StackSlotKind::ExplicitSlot,
                size,
                3,
            ));
            for (i, arg) in rest.iter().enumerate() {
                let value = self.value(arg)?;
                self.builder.ins().stack_store(value, slot, (i * 8) as i32);
            }
            let addr = self.builder.ins().stack_addr(self.pointer_type, slot, 0);
            (addr, rest.len() as i64)
        };
        let count = self.builder.ins().iconst(self.pointer_type, count);
        self.builder.ins().call(runtime, &[format, packed, count]);
        Ok(())
    }

    fn lower_terminator(&mut self, term: &Terminator) -> Result<()> {
        match term {
            Terminator::Jump(target) => {
                let target = clif_block(&self.blocks, *target)?;
                self.builder.ins().jump(target, &[]);
            }
            Terminator::Branch {
                condition,
                then_block,
                else_block,
            } => {
                let condition = self.value(condition)?;
                let then_block = clif_block(&self.blocks, *then_block)?;
                let else_block = clif_block(&self.blocks, *else_block)?;
                self.builder
                    .ins()
                    .brif(condition, then_block, &[], else_block, &[]);
            }
            Terminator::Return(value) => {
                let value = self.value(value)?;
                self.builder.ins().return_(&[value]);
            }
            Terminator::Invalid => {
                return Err(IrError::InvalidInstruction(
                    "cannot lower a block without terminator".to_string(),
                ))
            }
        }
        Ok(())
    }
}
