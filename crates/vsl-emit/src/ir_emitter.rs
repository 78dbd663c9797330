use anyhow::Result;
use std::io::Write;
use vsl_core::{
    block::{BasicBlock, Terminator},
    function::Function,
    instructions::Instruction,
    module::{ExternalFunction, GlobalData, GlobalValue, Module},
    values::Value,
};

use crate::{
    config::EmitterConfig,
    emitter::{EmitContext, EmitHelper, EmitResult, Emitter, Highlight},
};

/// Cranelift-style text listing of a module.
pub struct IrEmitter {
    config: EmitterConfig,
}

impl IrEmitter {
    pub fn new(config: EmitterConfig) -> Self {
        Self { config }
    }

    pub fn plain() -> Self {
        Self::new(EmitterConfig::plain())
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    pub fn emit_function<W: Write>(
        &self,
        function: &Function,
        writer: &mut W,
        context: &mut EmitContext,
    ) -> EmitResult {
        let params = function
            .signature
            .params
            .iter()
            .map(|p| p.param_type.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let header = format!(
            "{} {}({}) -> {}",
            EmitHelper::paint(context, "function", Highlight::Keyword),
            EmitHelper::paint(context, &format!("%{}", function.name()), Highlight::Name),
            params,
            function.signature.returns
        );

        if self.config.verbosity.should_print_details() {
            let names = function
                .signature
                .params
                .iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>();
            EmitHelper::write_comment(
                writer,
                context,
                &format!(
                    "params ({}), {} instructions",
                    names.join(", "),
                    function.instruction_count()
                ),
            )?;
        }

        EmitHelper::write_block(writer, context, &header, |w, ctx| {
            for slot in &function.body.slots {
                EmitHelper::write_line(w, ctx, &format!("{} = slot {}", slot.id, slot.name))?;
            }
            for (index, block) in function.body.blocks.values().enumerate() {
                if index > 0 || !function.body.slots.is_empty() {
                    writeln!(w)?;
                }
                self.emit_block(block, w, ctx)?;
            }
            Ok(())
        })
    }

    fn emit_block<W: Write>(
        &self,
        block: &BasicBlock,
        writer: &mut W,
        context: &mut EmitContext,
    ) -> EmitResult {
        let mut notes = Vec::new();
        if self.config.include_labels {
            if let Some(label) = &block.metadata.label {
                notes.push(label.clone());
            }
        }
        if block.metadata.is_loop_header {
            notes.push("loop header".to_string());
        }

        let mut header = EmitHelper::paint(context, &format!("{}:", block.id), Highlight::Label);
        if !notes.is_empty() {
            header.push_str("  ");
            header.push_str(&EmitHelper::paint(
                context,
                &format!("; {}", notes.join(", ")),
                Highlight::Comment,
            ));
        }

        // Block headers sit one level left of their instructions.
        context.dedent();
        EmitHelper::write_line(writer, context, &header)?;
        context.indent();

        for inst in &block.instructions {
            EmitHelper::write_line(writer, context, &self.format_instruction(inst, context))?;
        }
        EmitHelper::write_line(
            writer,
            context,
            &self.format_terminator(&block.terminator, context),
        )
    }

    pub fn format_instruction(&self, inst: &Instruction, context: &EmitContext) -> String {
        let opcode = EmitHelper::paint(context, inst.opcode(), Highlight::Opcode);
        match inst {
            Instruction::Add {
                result,
                left,
                right,
            }
            | Instruction::Sub {
                result,
                left,
                right,
            }
            | Instruction::Mul {
                result,
                left,
                right,
            }
            | Instruction::Div {
                result,
                left,
                right,
            }
            | Instruction::Gt {
                result,
                left,
                right,
            } => format!(
                "{} = {} {}, {}",
                result,
                opcode,
                self.format_value(left, context),
                self.format_value(right, context)
            ),
            Instruction::Neg { result, operand } => {
                format!("{} = {} {}", result, opcode, self.format_value(operand, context))
            }
            Instruction::Load { result, location } => {
                format!("{} = {} {}", result, opcode, location)
            }
            Instruction::Store { location, value } => {
                format!("{} {}, {}", opcode, location, self.format_value(value, context))
            }
            Instruction::Call {
                result,
                callee,
                args,
            } => format!(
                "{} = {} %{}({})",
                result,
                opcode,
                callee,
                self.format_args(args, context)
            ),
            Instruction::CallExternal { callee, args } => format!(
                "{} @{}({})",
                EmitHelper::paint(context, "call", Highlight::Opcode),
                callee,
                self.format_args(args, context)
            ),
        }
    }

    pub fn format_terminator(&self, term: &Terminator, context: &EmitContext) -> String {
        let keyword = |text: &str| EmitHelper::paint(context, text, Highlight::Opcode);
        match term {
            Terminator::Jump(target) => format!("{} {}", keyword("jump"), target),
            Terminator::Branch {
                condition,
                then_block,
                else_block,
            } => format!(
                "{} {}, {}, {}",
                keyword("brif"),
                self.format_value(condition, context),
                then_block,
                else_block
            ),
            Terminator::Return(value) => {
                format!("{} {}", keyword("return"), self.format_value(value, context))
            }
            Terminator::Invalid => keyword("unreachable"),
        }
    }

    fn format_value(&self, value: &Value, context: &EmitContext) -> String {
        match value {
            Value::Constant(_) => EmitHelper::paint(context, &value.to_string(), Highlight::Literal),
            _ => value.to_string(),
        }
    }

    fn format_args(&self, args: &[Value], context: &EmitContext) -> String {
        args.iter()
            .map(|arg| self.format_value(arg, context))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn format_global(&self, global: &GlobalValue, context: &EmitContext) -> String {
        let data = match &global.data {
            GlobalData::Number(value) => format!("f64 {:?}", value),
            GlobalData::CString(text) => format!("cstring {:?}", text),
        };
        format!(
            "{} = {} {} {}{}",
            global.id,
            EmitHelper::paint(context, "data", Highlight::Keyword),
            EmitHelper::paint(context, &format!("\"{}\"", global.name), Highlight::Name),
            data,
            if global.readonly { " readonly" } else { "" }
        )
    }

    fn format_external(&self, external: &ExternalFunction, context: &EmitContext) -> String {
        let mut params: Vec<String> = external.params.iter().map(|t| t.to_string()).collect();
        if external.variadic {
            params.push("...".to_string());
        }
        format!(
            "{} {} {}({})",
            EmitHelper::paint(context, "declare", Highlight::Keyword),
            external.returns,
            EmitHelper::paint(context, &format!("@{}", external.name), Highlight::Name),
            params.join(", ")
        )
    }

    pub fn emit_module_to_string(&self, module: &Module) -> Result<String> {
        self.emit_to_string(module)
    }
}

impl Emitter for IrEmitter {
    type Item = Module;

    fn emit<W: Write>(
        &self,
        module: &Module,
        writer: &mut W,
        context: &mut EmitContext,
    ) -> EmitResult {
        let mut first = true;

        if self.config.verbosity.should_print_module_header() {
            EmitHelper::write_comment(writer, context, &format!("module {}", module.name))?;
            for global in &module.globals {
                EmitHelper::write_line(writer, context, &self.format_global(global, context))?;
            }
            for external in module.externals.values() {
                EmitHelper::write_line(writer, context, &self.format_external(external, context))?;
            }
            first = false;
        }

        for function in module.functions.values() {
            if !first {
                writeln!(writer)?;
            }
            first = false;
            self.emit_function(function, writer, context)?;
        }
        Ok(())
    }

    fn context(&self) -> EmitContext {
        EmitContext::from_config(&self.config)
    }
}

impl Default for IrEmitter {
    fn default() -> Self {
        Self::new(EmitterConfig::default())
    }
}
