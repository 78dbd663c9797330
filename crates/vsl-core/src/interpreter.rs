/*! Reference evaluator for the IR.
 *
 * Executes a module block by block without generating machine code. It observes the same
 * semantics as the JIT (IEEE arithmetic, ordered comparison, zero-initialized globals, output
 * through the runtime sink) and is what the test suites use on every platform.
 */

use std::collections::HashMap;
use tracing::trace;

use crate::{
    block::Terminator,
    codegen::ExecutionBackend,
    config::PRINTF_NAME,
    function::Function,
    instructions::Instruction,
    module::{GlobalData, Module},
    runtime::{self, FormatArg},
    values::{GlobalId, Location, SlotId, TempId, Value},
    ExecutionError, IrError, Result,
};

pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq)]
enum RtValue {
    Number(f64),
    Bool(bool),
    Address(GlobalId),
}

impl RtValue {
    fn as_number(self) -> Result<f64> {
        match self {
            RtValue::Number(n) => Ok(n),
            other => Err(malformed(format!("expected a number, found {:?}", other))),
        }
    }

    fn as_bool(self) -> Result<bool> {
        match self {
            RtValue::Bool(b) => Ok(b),
            other => Err(malformed(format!("expected a condition, found {:?}", other))),
        }
    }
}

fn malformed(msg: String) -> IrError {
    ExecutionError::Malformed(msg).into()
}

#[derive(Debug, Clone)]
pub struct Interpreter {
    max_call_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Runs `main` with fresh globals.
    pub fn run(&self, module: &Module) -> Result<f64> {
        let entry = module.entry_function()?;
        let mut machine = Machine::new(module, self.max_call_depth);
        machine.call(entry, Vec::new())
    }

    /// Runs any function of the module with explicit arguments.
    pub fn call(&self, module: &Module, name: &str, args: &[f64]) -> Result<f64> {
        let function = module
            .get_function(name)
            .ok_or_else(|| IrError::FunctionNotFound(name.to_string()))?;
        if function.arity() != args.len() {
            return Err(malformed(format!(
                "'{}' takes {} arguments, {} given",
                name,
                function.arity(),
                args.len()
            )));
        }
        let mut machine = Machine::new(module, self.max_call_depth);
        machine.call(function, args.to_vec())
    }
}

impl ExecutionBackend for Interpreter {
    fn name(&self) -> &'static str {
        "interpreter"
    }

    fn execute(&mut self, module: &Module) -> Result<f64> {
        module.validate()?;
        self.run(module)
    }
}

struct Machine<'m> {
    module: &'m Module,
    globals: HashMap<GlobalId, f64>,
    depth: usize,
    max_depth: usize,
}

struct Frame {
    args: Vec<f64>,
    slots: HashMap<SlotId, f64>,
    temps: HashMap<TempId, RtValue>,
}

impl<'m> Machine<'m> {
    fn new(module: &'m Module, max_depth: usize) -> Self {
        let globals = module
            .globals
            .iter()
            .filter_map(|g| match g.data {
                GlobalData::Number(init) => Some((g.id, init)),
                GlobalData::CString(_) => None,
            })
            .collect();
        Self {
            module,
            globals,
            depth: 0,
            max_depth,
        }
    }

    fn call(&mut self, function: &'m Function, args: Vec<f64>) -> Result<f64> {
        if self.depth >= self.max_depth {
            return Err(ExecutionError::StackOverflow(self.max_depth).into());
        }
        self.depth += 1;
        let result = self.run_body(function, args);
        self.depth -= 1;
        result
    }

    fn run_body(&mut self, function: &'m Function, args: Vec<f64>) -> Result<f64> {
        trace!(function = function.name(), depth = self.depth, "enter");
        let mut frame = Frame {
            args,
            slots: HashMap::new(),
            temps: HashMap::new(),
        };
        let mut current = function.entry_block();

        loop {
            let block = function
                .body
                .get_block(current)
                .ok_or_else(|| malformed(format!("jump to missing {}", current)))?;

            for inst in &block.instructions {
                self.execute_instruction(&mut frame, inst)?;
            }

            match &block.terminator {
                Terminator::Jump(target) => current = *target,
                Terminator::Branch {
                    condition,
                    then_block,
                    else_block,
                } => {
                    current = if self.eval(&frame, condition)?.as_bool()? {
                        *then_block
                    } else {
                        *else_block
                    };
                }
                Terminator::Return(value) => return self.eval(&frame, value)?.as_number(),
                Terminator::Invalid => {
                    return Err(malformed(format!(
                        "{} in '{}' has no terminator",
                        current,
                        function.name()
                    )))
                }
            }
        }
    }

    fn eval(&self, frame: &Frame, value: &Value) -> Result<RtValue> {
        match value {
            Value::Temp(t) => frame
                .temps
                .get(t)
                .copied()
                .ok_or_else(|| malformed(format!("{} used before definition", t))),
            Value::Param(p) => frame
                .args
                .get(p.0 as usize)
                .map(|n| RtValue::Number(*n))
                .ok_or_else(|| malformed(format!("parameter {} out of range", p))),
            Value::Constant(c) => Ok(RtValue::Number(*c)),
            Value::GlobalAddress(g) => Ok(RtValue::Address(*g)),
        }
    }

    fn number(&self, frame: &Frame, value: &Value) -> Result<f64> {
        self.eval(frame, value)?.as_number()
    }

    fn execute_instruction(&mut self, frame: &mut Frame, inst: &Instruction) -> Result<()> {
        let (result, value) = match inst {
            Instruction::Add {
                result,
                left,
                right,
            } => (
                *result,
                RtValue::Number(self.number(frame, left)? + self.number(frame, right)?),
            ),
            Instruction::Sub {
                result,
                left,
                right,
            } => (
                *result,
                RtValue::Number(self.number(frame, left)? - self.number(frame, right)?),
            ),
            Instruction::Mul {
                result,
                left,
                right,
            } => (
                *result,
                RtValue::Number(self.number(frame, left)? * self.number(frame, right)?),
            ),
            Instruction::Div {
                result,
                left,
                right,
            } => (
                *result,
                RtValue::Number(self.number(frame, left)? / self.number(frame, right)?),
            ),
            Instruction::Neg { result, operand } => {
                (*result, RtValue::Number(-self.number(frame, operand)?))
            }
            Instruction::Gt {
                result,
                left,
                right,
            } => (
                *result,
                RtValue::Bool(self.number(frame, left)? > self.number(frame, right)?),
            ),
            Instruction::Load { result, location } => {
                let value = match location {
                    // Slots are zeroed on declaration; an unwritten slot reads as zero like the JIT.
                    Location::Slot(slot) => frame.slots.get(slot).copied().unwrap_or(0.0),
                    Location::Global(global) => self
                        .globals
                        .get(global)
                        .copied()
                        .ok_or_else(|| malformed(format!("unknown numeric global {}", global)))?,
                };
                (*result, RtValue::Number(value))
            }
            Instruction::Store { location, value } => {
                let value = self.number(frame, value)?;
                match location {
                    Location::Slot(slot) => {
                        frame.slots.insert(*slot, value);
                    }
                    Location::Global(global) => {
                        self.globals.insert(*global, value);
                    }
                }
                return Ok(());
            }
            Instruction::Call {
                result,
                callee,
                args,
            } => {
                let function = self
                    .module
                    .get_function(callee)
                    .ok_or_else(|| IrError::FunctionNotFound(callee.clone()))?;
                let args = args
                    .iter()
                    .map(|arg| self.number(frame, arg))
                    .collect::<Result<Vec<_>>>()?;
                (*result, RtValue::Number(self.call(function, args)?))
            }
            Instruction::CallExternal { callee, args } => {
                self.call_external(frame, callee, args)?;
                return Ok(());
            }
        };
        frame.temps.insert(result, value);
        Ok(())
    }

    fn call_external(&self, frame: &Frame, callee: &str, args: &[Value]) -> Result<()> {
        if callee != PRINTF_NAME {
            return Err(IrError::FunctionNotFound(callee.to_string()));
        }
        let values = args
            .iter()
            .map(|arg| self.eval(frame, arg))
            .collect::<Result<Vec<_>>>()?;
        let (format, rest) = values
            .split_first()
            .ok_or_else(|| malformed(format!("'{}' called without a format string", callee)))?;

        let format = self.cstring(*format)?;
        let format_args = rest
            .iter()
            .map(|value| match value {
                RtValue::Number(n) => Ok(FormatArg::Number(*n)),
                RtValue::Address(g) => self.cstring(RtValue::Address(*g)).map(FormatArg::Text),
                RtValue::Bool(b) => Ok(FormatArg::Number(if *b { 1.0 } else { 0.0 })),
            })
            .collect::<Result<Vec<_>>>()?;

        runtime::write_output(&runtime::format_printf(format, &format_args));
        Ok(())
    }

    fn cstring(&self, value: RtValue) -> Result<&'m str> {
        let RtValue::Address(id) = value else {
            return Err(malformed(format!("expected a string address, found {:?}", value)));
        };
        match self.module.global(id).map(|g| &g.data) {
            Some(GlobalData::CString(text)) => Ok(text.as_str()),
            _ => Err(malformed(format!("{} is not a string", id))),
        }
    }
}
