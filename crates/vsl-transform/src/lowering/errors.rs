use thiserror::Error;
use vsl_core::IrError;

use super::Mode;

#[derive(Error, Debug)]
pub enum LoweringError {
    #[error("Name '{name}' is not defined")]
    UndefinedName { name: String },

    #[error("Unknown function '{name}'")]
    UnknownFunction { name: String },

    #[error("Function '{name}' takes {expected} arguments, {found} given")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Redefinition of function '{name}'")]
    Redefinition { name: String },

    #[error("{mode} lowering does not accept {input}")]
    UnsupportedInput { mode: Mode, input: &'static str },

    #[error("IR builder error: {0}")]
    Ir(#[from] IrError),
}

impl LoweringError {
    pub fn undefined_name(name: impl Into<String>) -> Self {
        LoweringError::UndefinedName { name: name.into() }
    }

    pub fn unknown_function(name: impl Into<String>) -> Self {
        LoweringError::UnknownFunction { name: name.into() }
    }
}

pub type LoweringResult<T> = std::result::Result<T, LoweringError>;
