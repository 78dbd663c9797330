/*! The VSL compiler in one crate.
 *
 * Re-exports the pipeline crates and adds the pieces that tie them together: `driver` for the
 * source-to-result paths used by the command line, and `shell` for the interactive session where
 * functions and top-level statements accumulate in one module.
 */

pub use vsl_core as core;
pub use vsl_emit as emit;
pub use vsl_parser as parser;
pub use vsl_transform as transform;

pub mod driver;
pub mod shell;

pub use vsl_core::{
    ast::{Block, FunctionDefinition, Program},
    module::Module,
    CodegenConfig, Interpreter, JitBackend, ObjectBackend, OptLevel,
};

pub use vsl_emit::{EmitterConfig, IrEmitter, OutputFormat};

pub use vsl_parser::{parse_fragment, parse_program, parse_shell_input, ShellInput};

pub use vsl_transform::{lower_program, LoweringSession, Mode};

pub use driver::{
    emit_object, lower_source, run_module, run_module_with_fallback, run_source, Backend,
};
pub use shell::{Reply, Shell, ShellConfig};
