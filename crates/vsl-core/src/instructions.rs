use crate::values::{Location, TempId, Value};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    Add {
        result: TempId,
        left: Value,
        right: Value,
    },
    Sub {
        result: TempId,
        left: Value,
        right: Value,
    },
    Mul {
        result: TempId,
        left: Value,
        right: Value,
    },
    Div {
        result: TempId,
        left: Value,
        right: Value,
    },
    Neg {
        result: TempId,
        operand: Value,
    },
    /// Ordered `left > right`; false when either side is NaN.
    Gt {
        result: TempId,
        left: Value,
        right: Value,
    },

    Load {
        result: TempId,
        location: Location,
    },
    Store {
        location: Location,
        value: Value,
    },

    Call {
        result: TempId,
        callee: String,
        args: Vec<Value>,
    },
    /// Call to a declared external; its return value is discarded.
    CallExternal {
        callee: String,
        args: Vec<Value>,
    },
}

impl Instruction {
    pub fn result(&self) -> Option<TempId> {
        match self {
            Instruction::Add { result, .. }
            | Instruction::Sub { result, .. }
            | Instruction::Mul { result, .. }
            | Instruction::Div { result, .. }
            | Instruction::Neg { result, .. }
            | Instruction::Gt { result, .. }
            | Instruction::Load { result, .. }
            | Instruction::Call { result, .. } => Some(*result),
            Instruction::Store { .. } | Instruction::CallExternal { .. } => None,
        }
    }

    pub fn operands(&self) -> Vec<&Value> {
        match self {
            Instruction::Add { left, right, .. }
            | Instruction::Sub { left, right, .. }
            | Instruction::Mul { left, right, .. }
            | Instruction::Div { left, right, .. }
            | Instruction::Gt { left, right, .. } => vec![left, right],
            Instruction::Neg { operand, .. } => vec![operand],
            Instruction::Load { .. } => Vec::new(),
            Instruction::Store { value, .. } => vec![value],
            Instruction::Call { args, .. } | Instruction::CallExternal { args, .. } => {
                args.iter().collect()
            }
        }
    }

    pub fn location(&self) -> Option<Location> {
        match self {
            Instruction::Load { location, .. } | Instruction::Store { location, .. } => {
                Some(*location)
            }
            _ => None,
        }
    }

    pub fn is_call(&self) -> bool {
        matches!(
            self,
            Instruction::Call { .. } | Instruction::CallExternal { .. }
        )
    }

    pub fn opcode(&self) -> &'static str {
        match self {
            Instruction::Add { .. } => "fadd",
            Instruction::Sub { .. } => "fsub",
            Instruction::Mul { .. } => "fmul",
            Instruction::Div { .. } => "fdiv",
            Instruction::Neg { .. } => "fneg",
            Instruction::Gt { .. } => "fcmp gt",
            Instruction::Load { .. } => "load",
            Instruction::Store { .. } => "store",
            Instruction::Call { .. } => "call",
            Instruction::CallExternal { .. } => "call_external",
        }
    }
}
