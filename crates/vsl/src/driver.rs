use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, warn};
use vsl_core::{
    module::Module, CodegenConfig, ExecutionBackend, Interpreter, JitBackend, ObjectBackend,
};
use vsl_parser::parse_program;
use vsl_transform::lower_program;

/// Where a module's `main` runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Jit,
    Interpreter,
}

impl Backend {
    pub fn instantiate(self, config: &CodegenConfig) -> Box<dyn ExecutionBackend> {
        match self {
            Backend::Jit => Box::new(JitBackend::new(config.clone())),
            Backend::Interpreter => Box::new(Interpreter::new()),
        }
    }
}

impl FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "jit" => Ok(Backend::Jit),
            "interpreter" | "interp" => Ok(Backend::Interpreter),
            other => anyhow::bail!("Unknown backend '{}'", other),
        }
    }
}

/// Parses and lowers a whole program.
pub fn lower_source(source: &str, module_name: &str) -> Result<Module> {
    let program = parse_program(source).context("Failed to parse program")?;
    debug!(
        module = module_name,
        functions = program.functions.len(),
        "parsed program"
    );
    let module = lower_program(&program, module_name).context("Failed to lower program")?;
    Ok(module)
}

/// Runs `main` of a finished module and returns its result.
pub fn run_module(module: &Module, backend: Backend, config: &CodegenConfig) -> Result<f64> {
    let mut executor = backend.instantiate(config);
    debug!(module = %module.name, backend = executor.name(), "executing module");
    let result = executor
        .execute(module)
        .with_context(|| format!("Execution with the {} backend failed", executor.name()))?;
    Ok(result)
}

/// Like `run_module` with the JIT, falling back to the interpreter when the JIT cannot compile
/// the module (for instance on a host Cranelift has no backend for).
pub fn run_module_with_fallback(module: &Module, config: &CodegenConfig) -> Result<f64> {
    match run_module(module, Backend::Jit, config) {
        Ok(result) => Ok(result),
        Err(err) if is_compile_failure(&err) => {
            warn!(error = %format!("{err:#}"), "JIT unavailable, falling back to the interpreter");
            run_module(module, Backend::Interpreter, config)
        }
        Err(err) => Err(err),
    }
}

fn is_compile_failure(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<vsl_core::IrError>(),
        Some(vsl_core::IrError::CraneliftError(_))
    )
}

pub fn run_source(source: &str, backend: Backend, config: &CodegenConfig) -> Result<f64> {
    let module = lower_source(source, "main")?;
    run_module(&module, backend, config)
}

/// Relocatable object bytes for a whole program.
pub fn emit_object(source: &str, module_name: &str, config: &CodegenConfig) -> Result<Vec<u8>> {
    let module = lower_source(source, module_name)?;
    ObjectBackend::new(config.clone())
        .emit_object(&module)
        .context("Failed to emit object code")
}
