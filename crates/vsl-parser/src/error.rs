use pest::error::{Error as PestError, LineColLocation};
use std::path::PathBuf;
use thiserror::Error;
use vsl_core::ast::AstError;

use crate::Rule;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Syntax error at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Invalid syntax tree at line {line}, column {column}: {source}")]
    Ast {
        line: usize,
        column: usize,
        #[source]
        source: AstError,
    },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ParseError {
    pub(crate) fn from_pest(err: PestError<Rule>) -> Self {
        let (line, column) = match err.line_col {
            LineColLocation::Pos(pos) => pos,
            LineColLocation::Span(start, _) => start,
        };
        let err = err.renamed_rules(|rule| describe(rule).to_string());
        ParseError::Syntax {
            line,
            column,
            message: err.variant.message().into_owned(),
        }
    }

    pub(crate) fn ast((line, column): (usize, usize), source: AstError) -> Self {
        ParseError::Ast {
            line,
            column,
            source,
        }
    }

    /// The pair tree did not have the shape the grammar guarantees.
    pub(crate) fn malformed((line, column): (usize, usize), what: &str) -> Self {
        ParseError::Syntax {
            line,
            column,
            message: format!("malformed parse tree: {what}"),
        }
    }

    /// Line and column of the error, when it has one.
    pub fn location(&self) -> Option<(usize, usize)> {
        match self {
            ParseError::Syntax { line, column, .. } | ParseError::Ast { line, column, .. } => {
                Some((*line, *column))
            }
            ParseError::Io { .. } => None,
        }
    }
}

fn describe(rule: &Rule) -> &'static str {
    match rule {
        Rule::EOI => "end of input",
        Rule::function | Rule::function_list => "function definition",
        Rule::parameters => "parameter list",
        Rule::block => "block",
        Rule::declaration => "declaration",
        Rule::statement => "statement",
        Rule::assign => "assignment",
        Rule::return_stmt => "RETURN statement",
        Rule::print_stmt => "PRINT statement",
        Rule::print_item => "print item",
        Rule::if_stmt => "IF statement",
        Rule::while_stmt => "WHILE statement",
        Rule::expression | Rule::term | Rule::factor => "expression",
        Rule::negate => "negation",
        Rule::call => "function call",
        Rule::arguments => "argument list",
        Rule::add_op => "'+' or '-'",
        Rule::mul_op => "'*' or '/'",
        Rule::number => "number",
        Rule::identifier => "identifier",
        Rule::text | Rule::text_inner => "text",
        Rule::keyword => "keyword",
        Rule::kw_func => "FUNC",
        Rule::kw_var => "VAR",
        Rule::kw_print => "PRINT",
        Rule::kw_return => "RETURN",
        Rule::kw_if => "IF",
        Rule::kw_then => "THEN",
        Rule::kw_else => "ELSE",
        Rule::kw_fi => "FI",
        Rule::kw_while => "WHILE",
        Rule::kw_do => "DO",
        Rule::kw_done => "DONE",
        Rule::program | Rule::fragment | Rule::shell_input => "input",
        _ => "token",
    }
}

pub type ParseResult<T> = std::result::Result<T, ParseError>;
