use std::collections::HashMap;
use vsl_core::{
    ast::Identifier,
    builder::FunctionBuilder,
    module::Module,
    values::{Location, Value},
};

use super::{
    errors::{LoweringError, LoweringResult},
    scope::{ScopeManager, Tier},
};

/// Arity of every function callable so far, including the one being lowered.
#[derive(Debug, Clone, Default)]
pub struct FunctionTable {
    arities: HashMap<String, usize>,
}

impl FunctionTable {
    pub fn register(&mut self, name: &str, arity: usize) {
        self.arities.insert(name.to_string(), arity);
    }

    pub fn unregister(&mut self, name: &str) {
        self.arities.remove(name);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.arities.contains_key(name)
    }

    pub fn arity(&self, name: &str) -> Option<usize> {
        self.arities.get(name).copied()
    }

    /// Fails unless `name` is callable with exactly `found` arguments.
    pub fn check_call(&self, name: &str, found: usize) -> LoweringResult<()> {
        let expected = self
            .arity(name)
            .ok_or_else(|| LoweringError::unknown_function(name))?;
        if expected != found {
            return Err(LoweringError::ArityMismatch {
                name: name.to_string(),
                expected,
                found,
            });
        }
        Ok(())
    }
}

/// Everything one function body is lowered against.
pub struct LoweringContext<'a> {
    pub module: &'a mut Module,
    pub scopes: &'a mut ScopeManager,
    pub functions: &'a FunctionTable,
    pub builder: &'a mut FunctionBuilder,
}

impl<'a> LoweringContext<'a> {
    pub fn new(
        module: &'a mut Module,
        scopes: &'a mut ScopeManager,
        functions: &'a FunctionTable,
        builder: &'a mut FunctionBuilder,
    ) -> Self {
        Self {
            module,
            scopes,
            functions,
            builder,
        }
    }

    /// Binds `name` in the active tier and zeroes its storage. Function-tier names get a stack
    /// slot, global-tier names a module global.
    pub fn declare_variable(&mut self, name: &Identifier) -> LoweringResult<Location> {
        let Self {
            module,
            scopes,
            builder,
            ..
        } = self;
        let location = scopes.declare(name.as_str(), |tier| match tier {
            Tier::Function => Location::Slot(builder.create_slot(name.as_str())),
            Tier::Global => Location::Global(module.add_number_global(format!("var.{}", name))),
        });
        self.builder.ins()?.store(location, Value::number(0.0));
        Ok(location)
    }
}
