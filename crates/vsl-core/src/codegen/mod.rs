/*! Lower the IR to Cranelift and run or serialize the result.
 *
 * Both backends share one lowering: numbers are `f64`, stack slots become frontend variables,
 * globals become data objects, and `printf` calls go through the runtime's `vsl_printf`. The JIT
 * binds that symbol to the in-process runtime; object files leave it as an import for the linker.
 */

pub mod context;
pub mod jit;
pub mod lowering;
pub mod module;
pub mod object;

pub use context::CodegenContext;
pub use jit::{CompiledModule, JitBackend};
pub use lowering::lower_function;
pub use module::{define_module, Declarations};
pub use object::ObjectBackend;

use crate::{module::Module, Result};

/// Runs a module's entry function and returns its numeric result.
pub trait ExecutionBackend {
    fn name(&self) -> &'static str;

    fn execute(&mut self, module: &Module) -> Result<f64>;
}

pub(crate) fn cranelift_error(what: &str, err: impl std::fmt::Display) -> crate::IrError {
    crate::IrError::CraneliftError(format!("{}: {}", what, err))
}
