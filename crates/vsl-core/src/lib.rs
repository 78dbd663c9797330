/*! Core types for the VSL compiler: the AST, the IR it is lowered to, and the backends that run it.
 *
 * The IR is deliberately small. Every user-visible value is an `f64`, variables live in stack slots
 * or module globals, and control flow is explicit blocks with one terminator each. A finished
 * module can be JIT-compiled and executed, interpreted, or written out as an object file.
 */

pub mod ast;
pub mod block;
pub mod builder;
pub mod codegen;
pub mod config;
pub mod function;
pub mod instructions;
pub mod interpreter;
pub mod module;
pub mod runtime;
pub mod types;
pub mod values;

pub use block::{BasicBlock, BlockId, BlockMetadata, Terminator};
pub use builder::{FunctionBuilder, InstBuilder};
pub use codegen::{ExecutionBackend, JitBackend, ObjectBackend};
pub use config::{CodegenConfig, OptLevel, ENTRY_FUNCTION_NAME};
pub use function::{Function, FunctionBody, FunctionSignature, Parameter, StackSlot};
pub use instructions::Instruction;
pub use interpreter::Interpreter;
pub use module::{ExternalFunction, GlobalData, GlobalValue, Module};
pub use types::Type;
pub use values::{GlobalId, Location, ParamId, SlotId, TempId, Value};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IrError {
    #[error("Invalid instruction: {0}")]
    InvalidInstruction(String),
    #[error("Builder error: {0}")]
    BuilderError(String),
    #[error("Function not found: {0}")]
    FunctionNotFound(String),
    #[error("Invalid module: {0}")]
    ValidationError(String),
    #[error("Cranelift error: {0}")]
    CraneliftError(String),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Entry function '{0}' is not defined")]
    MissingEntry(String),
    #[error("Entry function '{name}' must take no arguments, it takes {arity}")]
    EntryArity { name: String, arity: usize },
    #[error("Call depth limit of {0} exceeded")]
    StackOverflow(usize),
    #[error("Malformed IR: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, IrError>;

#[cfg(test)]
mod tests;
