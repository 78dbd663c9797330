use cranelift_codegen::isa::{self, OwnedTargetIsa};
use cranelift_codegen::settings::{self, Configurable};
use cranelift_codegen::Context;
use cranelift_frontend::FunctionBuilderContext;

use super::cranelift_error;
use crate::{config::CodegenConfig, Result};

/// Per-module scratch state reused across every function definition.
pub struct CodegenContext {
    pub ctx: Context,
    pub builder_context: FunctionBuilderContext,
}

impl CodegenContext {
    pub fn new(ctx: Context) -> Self {
        Self {
            ctx,
            builder_context: FunctionBuilderContext::new(),
        }
    }
}

/// Builds the target ISA: the host unless `config.target` names a triple.
/// `pic` is required for relocatable objects and must be off for the JIT.
pub fn build_isa(config: &CodegenConfig, pic: bool) -> Result<OwnedTargetIsa> {
    let mut flag_builder = settings::builder();
    let flags = [
        ("opt_level", config.opt_level.as_cranelift_setting()),
        ("enable_verifier", if config.verify { "true" } else { "false" }),
        ("is_pic", if pic { "true" } else { "false" }),
        ("use_colocated_libcalls", "false"),
    ];
    for (name, value) in flags {
        flag_builder
            .set(name, value)
            .map_err(|e| cranelift_error(&format!("Failed to set '{}'", name), e))?;
    }
    let flags = settings::Flags::new(flag_builder);

    let isa_builder = match &config.target {
        Some(triple) => isa::lookup_by_name(triple)
            .map_err(|e| cranelift_error(&format!("Failed to lookup ISA '{}'", triple), e))?,
        None => cranelift_native::builder()
            .map_err(|msg| cranelift_error("Host machine is not supported", msg))?,
    };

    isa_builder
        .finish(flags)
        .map_err(|e| cranelift_error("Failed to create ISA", e))
}
