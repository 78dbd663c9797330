/*! Parse VSL source text into syntax trees.
 *
 * The grammar lives in `grammar.pest`. Parsing happens in two steps: pest checks the text against
 * the grammar and produces a pair tree, then `builder` turns that tree into `vsl_core::ast`
 * nodes, whose constructors reject anything structurally invalid.
 */

use pest::Parser;
use pest_derive::Parser;
use std::path::Path;
use vsl_core::ast::{Block, FunctionDefinition, Program};

mod builder;
mod error;

pub use error::{ParseError, ParseResult};

#[derive(Parser)]
#[grammar = "grammar.pest"]
pub struct VslParser;

/// What one chunk of shell input turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellInput {
    Functions(Vec<FunctionDefinition>),
    Block(Block),
}

/// A whole source file: one or more function definitions.
pub fn parse_program(input: &str) -> ParseResult<Program> {
    let pair = parse_rule(Rule::program, input)?;
    builder::build_program(pair)
}

pub fn parse_functions(input: &str) -> ParseResult<Vec<FunctionDefinition>> {
    parse_program(input).map(|program| program.functions)
}

/// A top-level block: declarations followed by statements. Empty input is an empty block.
pub fn parse_fragment(input: &str) -> ParseResult<Block> {
    let pair = parse_rule(Rule::fragment, input)?;
    builder::build_fragment(pair)
}

/// Input starting with `FUNC` is a list of function definitions, anything else is a block.
pub fn parse_shell_input(input: &str) -> ParseResult<ShellInput> {
    let pair = parse_rule(Rule::shell_input, input)?;
    builder::build_shell_input(pair)
}

pub fn parse_file<P: AsRef<Path>>(path: P) -> ParseResult<Program> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_program(&source)
}

pub fn check(input: &str) -> bool {
    VslParser::parse(Rule::program, input).is_ok()
}

fn parse_rule(rule: Rule, input: &str) -> ParseResult<pest::iterators::Pair<'_, Rule>> {
    let mut pairs = VslParser::parse(rule, input).map_err(ParseError::from_pest)?;
    pairs
        .next()
        .ok_or_else(|| ParseError::malformed((1, 1), "empty parse tree"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vsl_core::ast::{Expression, Statement};

    #[test]
    fn test_empty_fragment() {
        let block = parse_fragment("").unwrap();
        assert!(block.is_empty());
    }

    #[test]
    fn test_empty_program_is_rejected() {
        assert!(!check(""));
        assert!(!check("// only a comment\n"));
    }

    #[test]
    fn test_simple_function() {
        let input = r"
FUNC add(a, b)
{
    RETURN a + b
}
";
        assert!(check(input));
        let program = parse_program(input).unwrap();
        assert_eq!(program.functions.len(), 1);
        assert_eq!(program.functions[0].name.as_str(), "add");
        assert_eq!(program.functions[0].arity(), 2);
    }

    #[test]
    fn test_keyword_prefix_is_an_identifier() {
        let block = parse_fragment("VAR DOne, FIx, IFFY\nDOne := 1").unwrap();
        assert_eq!(block.declarations[0].names.len(), 3);
        assert!(matches!(block.statements[0], Statement::Assign(_)));
    }

    #[test]
    fn test_keywords_are_not_identifiers() {
        assert!(parse_fragment("VAR DONE").is_err());
        assert!(parse_fragment("FI := 1").is_err());
    }

    #[test]
    fn test_shell_input_predicts_start_symbol() {
        assert!(matches!(
            parse_shell_input("FUNC f() { RETURN 1 }").unwrap(),
            ShellInput::Functions(ref f) if f.len() == 1
        ));
        assert!(matches!(
            parse_shell_input("PRINT 1").unwrap(),
            ShellInput::Block(_)
        ));
        assert!(parse_shell_input("FUNC f() { RETURN 1 } PRINT 1").is_err());
    }

    #[test]
    fn test_call_in_return() {
        let block = parse_fragment("RETURN f(1, g())").unwrap();
        match &block.statements[0] {
            Statement::Return(Expression::Call(call)) => {
                assert_eq!(call.callee.as_str(), "f");
                assert_eq!(call.arguments.len(), 2);
            }
            other => panic!("unexpected statement: {other:?}"),
        }
    }
}
