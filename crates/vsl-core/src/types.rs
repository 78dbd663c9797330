use cranelift::codegen::ir::types as clif_types;
use serde::{Deserialize, Serialize};
use std::fmt;

/// VSL has one user-visible type, `Number`. The others only appear inside the IR:
/// comparison results, addresses of globals and the `printf` return code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Number,
    Bool,
    Pointer,
    I32,
}

impl Type {
    pub fn to_cranelift(self, pointer_type: clif_types::Type) -> clif_types::Type {
        match self {
            Type::Number => clif_types::F64,
            Type::Bool => clif_types::I8,
            Type::Pointer => pointer_type,
            Type::I32 => clif_types::I32,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Number => write!(f, "f64"),
            Type::Bool => write!(f, "i8"),
            Type::Pointer => write!(f, "ptr"),
            Type::I32 => write!(f, "i32"),
        }
    }
}
