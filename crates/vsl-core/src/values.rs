use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Temp(TempId),
    Param(ParamId),
    Constant(f64),
    GlobalAddress(GlobalId),
}

impl Value {
    pub fn number(value: f64) -> Self {
        Value::Constant(value)
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Value::Constant(_))
    }

    pub fn as_constant(&self) -> Option<f64> {
        match self {
            Value::Constant(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_temp(&self) -> Option<TempId> {
        match self {
            Value::Temp(t) => Some(*t),
            _ => None,
        }
    }
}

impl From<TempId> for Value {
    fn from(temp: TempId) -> Self {
        Value::Temp(temp)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Temp(t) => write!(f, "{}", t),
            Value::Param(p) => write!(f, "{}", p),
            Value::Constant(c) => write!(f, "{:?}", c),
            Value::GlobalAddress(g) => write!(f, "{}", g),
        }
    }
}

/// Where a named variable lives: a stack slot of the enclosing function, or a module global.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    Slot(SlotId),
    Global(GlobalId),
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::Slot(s) => write!(f, "{}", s),
            Location::Global(g) => write!(f, "{}", g),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TempId(pub u32);

impl std::fmt::Display for TempId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParamId(pub u32);

impl std::fmt::Display for ParamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "p{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(pub u32);

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ss{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GlobalId(pub u32);

impl std::fmt::Display for GlobalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gv{}", self.0)
    }
}
