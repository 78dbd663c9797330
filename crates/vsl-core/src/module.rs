use crate::block::Terminator;
use crate::config::ENTRY_FUNCTION_NAME;
use crate::function::Function;
use crate::instructions::Instruction;
use crate::types::Type;
use crate::values::{GlobalId, Location, Value};
use crate::{ExecutionError, IrError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub functions: IndexMap<String, Function>,
    pub externals: IndexMap<String, ExternalFunction>,
    pub globals: Vec<GlobalValue>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: IndexMap::new(),
            externals: IndexMap::new(),
            globals: Vec::new(),
        }
    }

    /// Inserts or replaces the function with the same name, keeping its original position.
    pub fn add_function(&mut self, function: Function) {
        self.functions
            .insert(function.signature.name.clone(), function);
    }

    pub fn get_function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn declare_external(&mut self, external: ExternalFunction) {
        self.externals
            .entry(external.name.clone())
            .or_insert(external);
    }

    pub fn global(&self, id: GlobalId) -> Option<&GlobalValue> {
        self.globals.get(id.0 as usize)
    }

    pub fn global_by_name(&self, name: &str) -> Option<&GlobalValue> {
        self.globals.iter().find(|g| g.name == name)
    }

    /// Mutable numeric global, zero-initialized.
    pub fn add_number_global(&mut self, name: impl Into<String>) -> GlobalId {
        self.push_global(name.into(), GlobalData::Number(0.0), false)
    }

    /// Read-only internal NUL-terminated string. The name is `prefix.N` with `N` unique in the module.
    /// Read-only C string global. Anything after an interior NUL is dropped.
    pub fn add_cstring(&mut self, prefix: &str, text: impl Into<String>) -> GlobalId {
        let name = format!("{}.{}", prefix, self.globals.len());
        let mut text = text.into();
        if let Some(end) = text.find('\0') {
            text.truncate(end);
        }
        self.push_global(name, GlobalData::CString(text), true)
    }

    fn push_global(&mut self, name: String, data: GlobalData, readonly: bool) -> GlobalId {
        let id = GlobalId(self.globals.len() as u32);
        self.globals.push(GlobalValue {
            id,
            name,
            data,
            readonly,
        });
        id
    }

    pub fn entry_function(&self) -> Result<&Function> {
        let entry = self
            .get_function(ENTRY_FUNCTION_NAME)
            .ok_or_else(|| ExecutionError::MissingEntry(ENTRY_FUNCTION_NAME.to_string()))?;
        if entry.arity() != 0 {
            return Err(ExecutionError::EntryArity {
                name: ENTRY_FUNCTION_NAME.to_string(),
                arity: entry.arity(),
            }
            .into());
        }
        Ok(entry)
    }

    /// Checks the module is structurally complete: every block terminated, every branch target,
    /// slot, global and callee defined, every call's argument count matching its callee.
    pub fn validate(&self) -> Result<()> {
        for function in self.functions.values() {
            let body = &function.body;
            for block in body.blocks.values() {
                let ctx = |msg: String| {
                    IrError::ValidationError(format!("{}: {}: {}", function.name(), block.id, msg))
                };

                for inst in &block.instructions {
                    if let Some(location) = inst.location() {
                        self.check_location(function, location).map_err(ctx)?;
                    }
                    for operand in inst.operands() {
                        self.check_value(function, operand).map_err(ctx)?;
                    }
                    match inst {
                        Instruction::Call { callee, args, .. } => {
                            let target = self
                                .get_function(callee)
                                .ok_or_else(|| ctx(format!("call to undefined function '{}'", callee)))?;
                            if target.arity() != args.len() {
                                return Err(ctx(format!(
                                    "call to '{}' passes {} arguments, expected {}",
                                    callee,
                                    args.len(),
                                    target.arity()
                                )));
                            }
                        }
                        Instruction::CallExternal { callee, .. } => {
                            if !self.externals.contains_key(callee) {
                                return Err(ctx(format!("call to undeclared external '{}'", callee)));
                            }
                        }
                        _ => {}
                    }
                }

                match &block.terminator {
                    Terminator::Invalid => return Err(ctx("block is not terminated".to_string())),
                    Terminator::Return(value) => self.check_value(function, value).map_err(ctx)?,
                    Terminator::Branch { condition, .. } => {
                        self.check_value(function, condition).map_err(ctx)?
                    }
                    Terminator::Jump(_) => {}
                }
                for successor in block.successors() {
                    if body.get_block(successor).is_none() {
                        return Err(ctx(format!("branch to missing {}", successor)));
                    }
                }
            }
        }
        Ok(())
    }

    fn check_location(&self, function: &Function, location: Location) -> std::result::Result<(), String> {
        match location {
            Location::Slot(slot) if function.body.slot(slot).is_none() => {
                Err(format!("unknown stack slot {}", slot))
            }
            Location::Global(global) => match self.global(global) {
                Some(g) if matches!(g.data, GlobalData::Number(_)) && !g.readonly => Ok(()),
                Some(g) => Err(format!("global @{} is not a numeric variable", g.name)),
                None => Err(format!("unknown global {}", global)),
            },
            Location::Slot(_) => Ok(()),
        }
    }

    fn check_value(&self, function: &Function, value: &Value) -> std::result::Result<(), String> {
        match value {
            Value::Param(p) if p.0 as usize >= function.arity() => {
                Err(format!("parameter {} out of range", p))
            }
            Value::GlobalAddress(g) if self.global(*g).is_none() => {
                Err(format!("unknown global {}", g))
            }
            Value::Temp(t) if t.0 >= function.body.temp_count() => {
                Err(format!("temporary {} was never allocated", t))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalFunction {
    pub name: String,
    pub params: Vec<Type>,
    pub variadic: bool,
    pub returns: Type,
}

impl ExternalFunction {
    /// `int printf(const char *fmt, ...)`
    pub fn printf() -> Self {
        Self {
            name: crate::config::PRINTF_NAME.to_string(),
            params: vec![Type::Pointer],
            variadic: true,
            returns: Type::I32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalValue {
    pub id: GlobalId,
    pub name: String,
    pub data: GlobalData,
    pub readonly: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GlobalData {
    Number(f64),
    CString(String),
}

impl GlobalData {
    /// Bytes as laid out in memory; strings get their terminating NUL.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            GlobalData::Number(value) => value.to_ne_bytes().to_vec(),
            GlobalData::CString(text) => {
                let mut bytes = text.as_bytes().to_vec();
                bytes.push(0);
                bytes
            }
        }
    }
}
