/*! Line-oriented interactive session.
 *
 * `Shell` owns an interactive `LoweringSession` and interprets input one line at a time. It does
 * no terminal I/O itself; the caller reads lines, feeds them in and shows the `Reply`. Each
 * complete input is either a list of functions (when it starts with `FUNC`) or a block of
 * top-level statements appended to `main`.
 *
 * Single-letter lines are commands:
 *
 * | Line | Effect                                   |
 * |------|------------------------------------------|
 * | `H`  | help text                                |
 * | `P`  | IR listing of the current module         |
 * | `E`  | run `main` and report its result         |
 * | `Q`  | quit                                     |
 *
 * A line ending in `\` starts multi-line input, which ends at the next empty line.
 */

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use vsl_core::{module::Module, CodegenConfig};
use vsl_emit::{EmitterConfig, Emitter, IrEmitter};
use vsl_parser::{parse_shell_input, ShellInput};
use vsl_transform::LoweringSession;

use crate::driver::{run_module, run_module_with_fallback, Backend};

pub const PROMPT: &str = ">>> ";
pub const CONTINUATION_PROMPT: &str = "... ";

pub const HELP: &str = "\
Usage:
    (H)elp for this message
    (P)rint the IR of the module
    (E)xecute the module
    (Q)uit shell
";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub module_name: String,
    pub backend: Backend,
    pub codegen: CodegenConfig,
    pub emitter: EmitterConfig,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            module_name: "<stdin>".to_string(),
            backend: Backend::Jit,
            codegen: CodegenConfig::default(),
            emitter: EmitterConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Empty line, nothing to do.
    Idle,
    /// Waiting for the rest of a multi-line input.
    More,
    /// The input was lowered into the session.
    Accepted,
    /// Text to show the user.
    Output(String),
    /// `main` ran and returned this value.
    Executed(f64),
    Quit,
}

pub struct Shell {
    config: ShellConfig,
    session: LoweringSession,
    pending: Option<String>,
}

impl Shell {
    pub fn new(config: ShellConfig) -> Self {
        let session = LoweringSession::interactive(config.module_name.clone());
        Self {
            config,
            session,
            pending: None,
        }
    }

    pub fn banner() -> String {
        format!(
            "VSLC v{} shell mode\nType '\\' at the end of line for multi-line input.\nType 'H' for more help.",
            env!("CARGO_PKG_VERSION")
        )
    }

    pub fn prompt(&self) -> &'static str {
        if self.pending.is_some() {
            CONTINUATION_PROMPT
        } else {
            PROMPT
        }
    }

    pub fn session(&self) -> &LoweringSession {
        &self.session
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// Drops any half-entered multi-line input.
    pub fn interrupt(&mut self) {
        self.pending = None;
    }

    /// Handles one line of input. An error means the input was rejected; the session is left as
    /// it was before the input.
    pub fn feed_line(&mut self, line: &str) -> Result<Reply> {
        let line = line.trim_end_matches(['\r', '\n']);

        if let Some(mut code) = self.pending.take() {
            if line.trim().is_empty() {
                return self.submit(&code);
            }
            code.push_str(line.strip_suffix('\\').unwrap_or(line));
            code.push('\n');
            self.pending = Some(code);
            return Ok(Reply::More);
        }

        if let Some(first) = line.strip_suffix('\\') {
            self.pending = Some(format!("{}\n", first));
            return Ok(Reply::More);
        }

        match line.trim() {
            "" => Ok(Reply::Idle),
            "H" => Ok(Reply::Output(HELP.to_string())),
            "P" => self.listing().map(Reply::Output),
            "E" => self.execute().map(Reply::Executed),
            "Q" => Ok(Reply::Quit),
            _ => self.submit(line),
        }
    }

    /// Parses and lowers one complete input.
    pub fn submit(&mut self, code: &str) -> Result<Reply> {
        match parse_shell_input(code).context("Syntax error")? {
            ShellInput::Functions(functions) => {
                debug!(count = functions.len(), "shell input: functions");
                self.session.lower_functions(&functions)?;
            }
            ShellInput::Block(block) => {
                debug!(statements = block.statements.len(), "shell input: block");
                self.session.lower_block(&block)?;
            }
        }
        Ok(Reply::Accepted)
    }

    pub fn module(&self) -> Result<Module> {
        Ok(self.session.module()?)
    }

    pub fn listing(&self) -> Result<String> {
        let module = self.module()?;
        IrEmitter::new(self.config.emitter.clone()).emit_to_string(&module)
    }

    /// Runs everything entered so far. The session keeps going afterwards; each run starts
    /// from freshly initialized globals.
    pub fn execute(&self) -> Result<f64> {
        let module = self.module()?;
        let result = match self.config.backend {
            Backend::Jit => run_module_with_fallback(&module, &self.config.codegen)?,
            Backend::Interpreter => run_module(&module, Backend::Interpreter, &self.config.codegen)?,
        };
        info!(result, "executed main");
        Ok(result)
    }
}

impl Default for Shell {
    fn default() -> Self {
        Self::new(ShellConfig::default())
    }
}
