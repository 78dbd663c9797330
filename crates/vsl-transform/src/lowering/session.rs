use std::fmt;
use tracing::{debug, info, warn};
use vsl_core::{
    ast::{Block, FunctionDefinition, Program},
    builder::FunctionBuilder,
    config::ENTRY_FUNCTION_NAME,
    function::FunctionSignature,
    module::Module,
    values::{Location, Value},
};

use super::{
    context::{FunctionTable, LoweringContext},
    errors::{LoweringError, LoweringResult},
    scope::ScopeManager,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Top-level blocks accumulate in an implicit entry function `main`.
    Interactive,
    /// Only function definitions; the program supplies its own `main`.
    WholeProgram,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Interactive => write!(f, "Interactive"),
            Mode::WholeProgram => write!(f, "Whole-program"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum LoweringInput<'a> {
    Program(&'a Program),
    Functions(&'a [FunctionDefinition]),
    Block(&'a Block),
}

impl LoweringInput<'_> {
    fn describe(&self) -> &'static str {
        match self {
            LoweringInput::Program(_) => "a program",
            LoweringInput::Functions(_) => "a function list",
            LoweringInput::Block(_) => "a top-level block",
        }
    }
}

impl<'a> From<&'a Program> for LoweringInput<'a> {
    fn from(program: &'a Program) -> Self {
        LoweringInput::Program(program)
    }
}

impl<'a> From<&'a [FunctionDefinition]> for LoweringInput<'a> {
    fn from(functions: &'a [FunctionDefinition]) -> Self {
        LoweringInput::Functions(functions)
    }
}

impl<'a> From<&'a Vec<FunctionDefinition>> for LoweringInput<'a> {
    fn from(functions: &'a Vec<FunctionDefinition>) -> Self {
        LoweringInput::Functions(functions)
    }
}

impl<'a> From<&'a Block> for LoweringInput<'a> {
    fn from(block: &'a Block) -> Self {
        LoweringInput::Block(block)
    }
}

/// Session state before an interactive block.
#[derive(Debug, Clone)]
struct Checkpoint {
    module: Module,
    scopes: ScopeManager,
    functions: FunctionTable,
    entry: Option<FunctionBuilder>,
}

/// Module sizes before a function definition. A failed definition leaves at most string
/// globals, the `printf` declaration and its own name behind.
#[derive(Debug, Clone, Copy)]
struct Watermark {
    globals: usize,
    externals: usize,
}

/// One lowering session: one module, one mode, and the state that outlives single inputs.
///
/// Each top-level unit (a function definition or an interactive block) is lowered
/// atomically. If it fails, the module, the function table, the global tier and the entry
/// function are restored to what they were before the unit, so an interactive session keeps
/// working after a bad input.
#[derive(Debug, Clone)]
pub struct LoweringSession {
    mode: Mode,
    module: Module,
    scopes: ScopeManager,
    functions: FunctionTable,
    entry: Option<FunctionBuilder>,
}

impl LoweringSession {
    pub fn new(mode: Mode, module_name: impl Into<String>) -> Self {
        let mut functions = FunctionTable::default();
        let entry = match mode {
            Mode::Interactive => {
                functions.register(ENTRY_FUNCTION_NAME, 0);
                Some(FunctionBuilder::new(FunctionSignature::numeric(
                    ENTRY_FUNCTION_NAME,
                    Vec::<String>::new(),
                )))
            }
            Mode::WholeProgram => None,
        };

        Self {
            mode,
            module: Module::new(module_name),
            scopes: ScopeManager::new(),
            functions,
            entry,
        }
    }

    pub fn interactive(module_name: impl Into<String>) -> Self {
        Self::new(Mode::Interactive, module_name)
    }

    pub fn whole_program(module_name: impl Into<String>) -> Self {
        Self::new(Mode::WholeProgram, module_name)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn scopes(&self) -> &ScopeManager {
        &self.scopes
    }

    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    pub fn lower<'a>(&mut self, input: impl Into<LoweringInput<'a>>) -> LoweringResult<()> {
        match input.into() {
            LoweringInput::Program(program) => self.lower_functions(&program.functions),
            LoweringInput::Functions(functions) => self.lower_functions(functions),
            LoweringInput::Block(block) => self.lower_block(block),
        }
    }

    pub fn lower_program(&mut self, program: &Program) -> LoweringResult<()> {
        self.lower_functions(&program.functions)
    }

    /// Lowers functions in order, stopping at the first failure. Functions lowered before the
    /// failing one stay in the module.
    pub fn lower_functions(&mut self, functions: &[FunctionDefinition]) -> LoweringResult<()> {
        for function in functions {
            let watermark = Watermark {
                globals: self.module.globals.len(),
                externals: self.module.externals.len(),
            };
            if let Err(err) = self.lower_function(function) {
                warn!(
                    function = function.name.as_str(),
                    error = %err,
                    "lowering failed, function discarded"
                );
                self.module.globals.truncate(watermark.globals);
                self.module.externals.truncate(watermark.externals);
                if !matches!(err, LoweringError::Redefinition { .. }) {
                    self.functions.unregister(function.name.as_str());
                }
                return Err(err);
            }
        }
        Ok(())
    }

    /// Appends a top-level block to the entry function. Interactive mode only.
    pub fn lower_block(&mut self, block: &Block) -> LoweringResult<()> {
        if self.mode != Mode::Interactive {
            return Err(LoweringError::UnsupportedInput {
                mode: self.mode,
                input: LoweringInput::Block(block).describe(),
            });
        }
        self.transaction(|session| session.lower_fragment(block))
    }

    /// The module as it stands, with the entry function closed by `return 0.0` if its tail is
    /// still open. The session itself is unchanged and can keep lowering.
    pub fn module(&self) -> LoweringResult<Module> {
        let mut module = self.module.clone();
        if let Some(entry) = &self.entry {
            let mut entry = entry.clone();
            if !entry.is_terminated() {
                entry.ins()?.ret(Value::number(0.0));
            }
            module.add_function(entry.build()?);
        }
        Ok(module)
    }

    pub fn finish(self) -> LoweringResult<Module> {
        let module = self.module()?;
        info!(
            module = %module.name,
            functions = module.functions.len(),
            globals = module.globals.len(),
            "lowering finished"
        );
        Ok(module)
    }

    fn transaction<T>(
        &mut self,
        unit: impl FnOnce(&mut Self) -> LoweringResult<T>,
    ) -> LoweringResult<T> {
        let checkpoint = Checkpoint {
            module: self.module.clone(),
            scopes: self.scopes.clone(),
            functions: self.functions.clone(),
            entry: self.entry.clone(),
        };
        let result = unit(self);
        if let Err(err) = &result {
            warn!(error = %err, "lowering failed, session state restored");
            self.module = checkpoint.module;
            self.scopes = checkpoint.scopes;
            self.functions = checkpoint.functions;
            self.entry = checkpoint.entry;
        }
        result
    }

    fn lower_function(&mut self, definition: &FunctionDefinition) -> LoweringResult<()> {
        let name = definition.name.as_str();
        if self.functions.contains(name) {
            return Err(LoweringError::Redefinition {
                name: name.to_string(),
            });
        }
        debug!(function = name, arity = definition.arity(), "lowering function");

        // Registered before the body so the function can call itself.
        self.functions.register(name, definition.arity());

        let mut builder = FunctionBuilder::new(FunctionSignature::numeric(
            name,
            definition.parameters.iter().map(|p| p.as_str()),
        ));
        let mut parameters = Vec::with_capacity(definition.arity());
        for (index, param) in definition.parameters.iter().enumerate() {
            let slot = builder.create_slot(param.as_str());
            let incoming = builder.param(index)?;
            builder.ins()?.store(Location::Slot(slot), incoming);
            parameters.push((param.as_str(), Location::Slot(slot)));
        }

        self.scopes.enter_function(parameters);
        let body = LoweringContext::new(
            &mut self.module,
            &mut self.scopes,
            &self.functions,
            &mut builder,
        )
        .lower_block(&definition.body);
        self.scopes.exit_function();
        body?;

        if !builder.is_terminated() {
            builder.ins()?.ret(Value::number(0.0));
        }
        self.module.add_function(builder.build()?);
        Ok(())
    }

    fn lower_fragment(&mut self, block: &Block) -> LoweringResult<()> {
        let entry = self.entry.as_mut().ok_or(LoweringError::UnsupportedInput {
            mode: self.mode,
            input: "a top-level block",
        })?;
        // A fragment after a top-level RETURN starts a fresh, unreachable tail.
        if entry.is_terminated() {
            let tail = entry.create_labeled_block("fragment");
            entry.switch_to_block(tail)?;
        }
        debug!(
            declarations = block.declarations.len(),
            statements = block.statements.len(),
            "lowering top-level block"
        );

        LoweringContext::new(&mut self.module, &mut self.scopes, &self.functions, entry)
            .lower_block(block)
    }
}
