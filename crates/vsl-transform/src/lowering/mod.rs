/*! Lower VSL syntax trees to IR.
 *
 * A single top-down walk per function. Names resolve through the two-tier `ScopeManager`,
 * calls are checked against the functions lowered so far, and control flow becomes explicit
 * blocks: `test > 0` decides every branch, a missing else is a direct edge to the join block,
 * and a loop is a header, a body and an exit.
 */

mod context;
mod control_flow;
mod errors;
mod expression;
mod scope;
mod session;
mod statement;

pub use context::{FunctionTable, LoweringContext};
pub use errors::{LoweringError, LoweringResult};
pub use scope::{ScopeManager, Tier};
pub use session::{LoweringInput, LoweringSession, Mode};

use vsl_core::{ast::Program, module::Module};

/// Lowers a complete program to a module in whole-program mode.
pub fn lower_program(program: &Program, module_name: &str) -> LoweringResult<Module> {
    let mut session = LoweringSession::whole_program(module_name);
    session.lower_program(program)?;
    session.finish()
}
