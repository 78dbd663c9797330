use std::collections::HashMap;
use vsl_core::values::Location;

use super::errors::{LoweringError, LoweringResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Global,
    Function,
}

/// Name to storage location map with exactly two tiers.
///
/// The global tier belongs to the interactive entry function and survives across lowering calls.
/// The function tier exists only while a user function is being lowered. Lookups try the
/// function tier first. There is no block-level nesting.
#[derive(Debug, Clone, Default)]
pub struct ScopeManager {
    global: HashMap<String, Location>,
    function: Option<HashMap<String, Location>>,
}

impl ScopeManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_tier(&self) -> Tier {
        if self.function.is_some() {
            Tier::Function
        } else {
            Tier::Global
        }
    }

    pub fn in_function(&self) -> bool {
        self.function.is_some()
    }

    /// Binds `name` in the active tier and returns its location. A name already bound in that
    /// tier keeps its location; otherwise `allocate` creates one. The caller zeroes it.
    pub fn declare(&mut self, name: &str, allocate: impl FnOnce(Tier) -> Location) -> Location {
        let tier = self.active_tier();
        let table = match self.function.as_mut() {
            Some(table) => table,
            None => &mut self.global,
        };
        *table
            .entry(name.to_string())
            .or_insert_with(|| allocate(tier))
    }

    pub fn lookup(&self, name: &str) -> Option<Location> {
        self.function
            .as_ref()
            .and_then(|table| table.get(name))
            .or_else(|| self.global.get(name))
            .copied()
    }

    pub fn resolve(&self, name: &str) -> LoweringResult<Location> {
        self.lookup(name)
            .ok_or_else(|| LoweringError::undefined_name(name))
    }

    /// Opens a fresh function tier seeded with the parameters. A later duplicate parameter name
    /// replaces the earlier binding.
    pub fn enter_function<I, S>(&mut self, parameters: I)
    where
        I: IntoIterator<Item = (S, Location)>,
        S: Into<String>,
    {
        self.function = Some(
            parameters
                .into_iter()
                .map(|(name, location)| (name.into(), location))
                .collect(),
        );
    }

    pub fn exit_function(&mut self) {
        self.function = None;
    }

    pub fn global_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.global.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn function_len(&self) -> usize {
        self.function.as_ref().map_or(0, HashMap::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vsl_core::values::{GlobalId, SlotId};

    #[test]
    fn test_function_tier_shadows_global() {
        let mut scopes = ScopeManager::new();
        let global = scopes.declare("x", |_| Location::Global(GlobalId(0)));
        assert_eq!(global, Location::Global(GlobalId(0)));

        scopes.enter_function([("x", Location::Slot(SlotId(0)))]);
        assert_eq!(scopes.resolve("x").unwrap(), Location::Slot(SlotId(0)));

        scopes.exit_function();
        assert_eq!(scopes.resolve("x").unwrap(), Location::Global(GlobalId(0)));
    }

    #[test]
    fn test_redeclaration_keeps_location() {
        let mut scopes = ScopeManager::new();
        scopes.enter_function(Vec::<(String, Location)>::new());
        let first = scopes.declare("a", |tier| {
            assert_eq!(tier, Tier::Function);
            Location::Slot(SlotId(3))
        });
        let second = scopes.declare("a", |_| panic!("must not allocate twice"));
        assert_eq!(first, second);
        assert_eq!(scopes.function_len(), 1);
    }

    #[test]
    fn test_exit_clears_function_tier() {
        let mut scopes = ScopeManager::new();
        scopes.enter_function([("p", Location::Slot(SlotId(0)))]);
        scopes.declare("local", |_| Location::Slot(SlotId(1)));
        scopes.exit_function();

        assert!(!scopes.in_function());
        assert!(matches!(
            scopes.resolve("p"),
            Err(LoweringError::UndefinedName { .. })
        ));
        assert!(scopes.resolve("local").is_err());
    }

    #[test]
    fn test_global_tier_reachable_from_function() {
        let mut scopes = ScopeManager::new();
        scopes.declare("g", |tier| {
            assert_eq!(tier, Tier::Global);
            Location::Global(GlobalId(1))
        });
        scopes.enter_function(Vec::<(String, Location)>::new());
        assert_eq!(scopes.resolve("g").unwrap(), Location::Global(GlobalId(1)));
        assert_eq!(scopes.global_names(), vec!["g"]);
    }

    #[test]
    fn test_duplicate_parameters_last_wins() {
        let mut scopes = ScopeManager::new();
        scopes.enter_function([
            ("a", Location::Slot(SlotId(0))),
            ("a", Location::Slot(SlotId(1))),
        ]);
        assert_eq!(scopes.resolve("a").unwrap(), Location::Slot(SlotId(1)));
    }
}
