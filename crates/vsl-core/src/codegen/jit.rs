use cranelift_jit::{JITBuilder, JITModule};
use cranelift_module::{default_libcall_names, Module as ClifModule};
use tracing::debug;

use super::{context::build_isa, cranelift_error, define_module, ExecutionBackend};
use crate::{
    config::{CodegenConfig, RUNTIME_PRINTF_NAME},
    module::Module,
    runtime, IrError, Result,
};

/// Compiles modules in-process and runs their entry function.
#[derive(Debug, Clone, Default)]
pub struct JitBackend {
    config: CodegenConfig,
}

impl JitBackend {
    pub fn new(config: CodegenConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodegenConfig {
        &self.config
    }

    /// Compiles every function of `module`. Each call builds a fresh JIT module, so globals start
    /// from their initial values on every compilation.
    pub fn compile(&self, module: &Module) -> Result<CompiledModule> {
        let entry = module.entry_function()?;
        let isa = build_isa(&self.config, false)?;

        let mut builder = JITBuilder::with_isa(isa, default_libcall_names());
        builder.symbol(RUNTIME_PRINTF_NAME, runtime::vsl_printf as *const u8);
        let mut jit = JITModule::new(builder);

        let decls = define_module(&mut jit, module)?;
        jit.finalize_definitions()
            .map_err(|e| cranelift_error("Failed to finalize definitions", e))?;

        let entry_id = decls
            .functions
            .get(entry.name())
            .copied()
            .ok_or_else(|| IrError::FunctionNotFound(entry.name().to_string()))?;
        let entry = jit.get_finalized_function(entry_id);
        debug!(module = %module.name, functions = decls.functions.len(), "jit compiled");

        Ok(CompiledModule {
            jit: Some(jit),
            entry,
        })
    }
}

impl ExecutionBackend for JitBackend {
    fn name(&self) -> &'static str {
        "jit"
    }

    fn execute(&mut self, module: &Module) -> Result<f64> {
        let compiled = self.compile(module)?;
        Ok(compiled.run())
    }
}

/// Finalized machine code for one module. The code is freed when this is dropped.
pub struct CompiledModule {
    jit: Option<JITModule>,
    entry: *const u8,
}

impl CompiledModule {
    /// Calls the entry function `main`.
    pub fn run(&self) -> f64 {
        // SAFETY: `entry` was produced by `get_finalized_function` for the function named
        // ENTRY_FUNCTION_NAME, which `Module::entry_function` checked takes no parameters and
        // returns one f64; the code stays mapped while `self.jit` is alive.
        let entry: extern "C" fn() -> f64 = unsafe { std::mem::transmute(self.entry) };
        entry()
    }
}

impl Drop for CompiledModule {
    fn drop(&mut self) {
        if let Some(jit) = self.jit.take() {
            // SAFETY: no function pointer obtained from this module outlives `self`.
            unsafe { jit.free_memory() };
        }
    }
}
