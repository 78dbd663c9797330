/*! Turn VSL syntax trees into IR modules.
 *
 * The lowering engine works in one of two modes fixed when the session is created: whole-program,
 * where a list of functions becomes a module, and interactive, where top-level blocks keep being
 * appended to an implicit `main` that can be executed at any point.
 */

pub mod lowering;

pub use lowering::{
    lower_program, LoweringError, LoweringInput, LoweringResult, LoweringSession, Mode,
    ScopeManager,
};
