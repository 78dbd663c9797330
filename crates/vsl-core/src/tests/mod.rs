/*! Unit tests for the AST constructors, the IR builders and the interpreter. */

mod ast_tests;
mod interpreter_tests;
mod module_tests;
