/*! Cursor-style construction of IR functions.
 *
 * A `FunctionBuilder` owns the function under construction and a current block. Instructions are
 * appended through `ins()`, which refuses to touch a block that already has a terminator, so a
 * finished block can never silently grow.
 */

pub mod function_builder;
pub mod inst_builder;

pub use function_builder::FunctionBuilder;
pub use inst_builder::InstBuilder;
