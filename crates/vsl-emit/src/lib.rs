/*! Turn IR modules back into readable listings.
 *
 * The text listing follows Cranelift's layout: one `function %name(...) -> f64 { ... }` per
 * function, stack slots first, then labelled blocks. The JSON listing is the serde form of the
 * module and is meant for tools rather than people.
 */

pub mod config;
pub mod emitter;
pub mod ir_emitter;
pub mod output;

pub use config::{EmitterConfig, IndentStyle, VerbosityLevel};
pub use emitter::{EmitContext, EmitHelper, EmitResult, Emitter};
pub use ir_emitter::IrEmitter;
pub use output::{render_module, OutputFormat};
