/*! Abstract syntax tree for VSL programs.
 *
 * Every node is checked when it is built: identifiers are well formed, numbers are finite,
 * print statements are never empty. A tree that exists is therefore structurally valid, and the
 * lowering engine only has to deal with name resolution and arity.
 */

use serde::Serialize;
use std::fmt;
use thiserror::Error;

pub const RESERVED_WORDS: &[&str] = &[
    "FUNC", "VAR", "PRINT", "RETURN", "IF", "THEN", "ELSE", "FI", "WHILE", "DO", "DONE",
];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AstError {
    #[error("Invalid identifier: '{0}'")]
    InvalidIdentifier(String),
    #[error("'{0}' is a reserved word")]
    ReservedWord(String),
    #[error("Number literal must be finite, got {0}")]
    NonFiniteNumber(f64),
    #[error("Invalid number literal: '{0}'")]
    InvalidNumber(String),
    #[error("Unsupported binary operator: '{0}'")]
    UnsupportedOperator(String),
    #[error("Print statement needs at least one item")]
    EmptyPrint,
    #[error("Text literal must not contain a line break")]
    MultilineText,
}

pub type AstResult<T> = std::result::Result<T, AstError>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(name: impl Into<String>) -> AstResult<Self> {
        let name = name.into();
        let mut chars = name.chars();
        let well_formed = match chars.next() {
            Some(first) if first.is_ascii_alphabetic() || first == '_' => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        };

        if !well_formed {
            return Err(AstError::InvalidIdentifier(name));
        }
        if RESERVED_WORDS.contains(&name.as_str()) {
            return Err(AstError::ReservedWord(name));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Program {
    pub functions: Vec<FunctionDefinition>,
}

impl Program {
    pub fn new(functions: Vec<FunctionDefinition>) -> Self {
        Self { functions }
    }

    pub fn function(&self, name: &str) -> Option<&FunctionDefinition> {
        self.functions.iter().find(|f| f.name.as_str() == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDefinition {
    pub name: Identifier,
    pub parameters: Vec<Identifier>,
    pub body: Block,
}

impl FunctionDefinition {
    pub fn new(name: Identifier, parameters: Vec<Identifier>, body: Block) -> Self {
        Self {
            name,
            parameters,
            body,
        }
    }

    pub fn arity(&self) -> usize {
        self.parameters.len()
    }
}

/// Declarations always precede statements; there is no nested block scope.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Block {
    pub declarations: Vec<VariableDeclaration>,
    pub statements: Vec<Statement>,
}

impl Block {
    pub fn new(declarations: Vec<VariableDeclaration>, statements: Vec<Statement>) -> Self {
        Self {
            declarations,
            statements,
        }
    }

    pub fn from_statements(statements: Vec<Statement>) -> Self {
        Self::new(Vec::new(), statements)
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty() && self.statements.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableDeclaration {
    pub names: Vec<Identifier>,
}

impl VariableDeclaration {
    pub fn new(names: Vec<Identifier>) -> Self {
        Self { names }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Statement {
    Assign(Assignment),
    If(IfStatement),
    While(WhileStatement),
    Return(Expression),
    Print(PrintStatement),
}

impl Statement {
    pub fn assign(target: Identifier, value: Expression) -> Self {
        Statement::Assign(Assignment { target, value })
    }

    pub fn if_then(test: Expression, then_block: Block, else_block: Option<Block>) -> Self {
        Statement::If(IfStatement {
            test,
            then_block,
            else_block,
        })
    }

    pub fn while_do(test: Expression, body: Block) -> Self {
        Statement::While(WhileStatement { test, body })
    }

    pub fn ret(value: Expression) -> Self {
        Statement::Return(value)
    }

    pub fn print(items: Vec<PrintItem>) -> AstResult<Self> {
        PrintStatement::new(items).map(Statement::Print)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assignment {
    pub target: Identifier,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IfStatement {
    pub test: Expression,
    pub then_block: Block,
    pub else_block: Option<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WhileStatement {
    pub test: Expression,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrintStatement {
    items: Vec<PrintItem>,
}

impl PrintStatement {
    pub fn new(items: Vec<PrintItem>) -> AstResult<Self> {
        if items.is_empty() {
            return Err(AstError::EmptyPrint);
        }
        Ok(Self { items })
    }

    pub fn items(&self) -> &[PrintItem] {
        &self.items
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PrintItem {
    Expression(Expression),
    Text(Text),
}

/// A text literal as written between the quotes, escapes still in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Text(String);

impl Text {
    pub fn new(raw: impl Into<String>) -> AstResult<Self> {
        let raw = raw.into();
        if raw.contains(['\n', '\r']) {
            return Err(AstError::MultilineText);
        }
        Ok(Self(raw))
    }

    pub fn raw(&self) -> &str {
        &self.0
    }

    /// Resolves backslash escapes (`\n`, `\t`, `\xhh`, `\uXXXX`, octal, ...).
    /// Unknown escapes are kept verbatim, backslash included. An escaped NUL ends the text,
    /// as it would in the emitted C string.
    pub fn unescaped(&self) -> String {
        let mut text = unescape(&self.0);
        if let Some(end) = text.find('\0') {
            text.truncate(end);
        }
        text
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        let Some(escape) = chars.next() else {
            out.push('\\');
            break;
        };

        match escape {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0c}'),
            'v' => out.push('\u{0b}'),
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            '\'' => out.push('\''),
            'x' | 'u' | 'U' => {
                let width = match escape {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let digits: String = (0..width)
                    .map_while(|_| chars.next_if(|d| d.is_ascii_hexdigit()))
                    .collect();
                let decoded = (digits.len() == width)
                    .then(|| u32::from_str_radix(&digits, 16).ok())
                    .flatten()
                    .and_then(char::from_u32);
                match decoded {
                    Some(ch) => out.push(ch),
                    None => {
                        out.push('\\');
                        out.push(escape);
                        out.push_str(&digits);
                    }
                }
            }
            '0'..='7' => {
                let mut code = escape as u32 - '0' as u32;
                for _ in 0..2 {
                    match chars.next_if(|d| ('0'..='7').contains(d)) {
                        Some(d) => code = code * 8 + (d as u32 - '0' as u32),
                        None => break,
                    }
                }
                out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }

    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expression {
    Binary {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Negate(Box<Expression>),
    Number(Number),
    Identifier(Identifier),
    Call(FunctionCall),
}

impl Expression {
    pub fn binary(op: BinaryOperator, left: Expression, right: Expression) -> Self {
        Expression::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn negate(operand: Expression) -> Self {
        Expression::Negate(Box::new(operand))
    }

    pub fn number(value: f64) -> AstResult<Self> {
        Number::new(value).map(Expression::Number)
    }

    pub fn identifier(name: impl Into<String>) -> AstResult<Self> {
        Identifier::new(name).map(Expression::Identifier)
    }

    pub fn call(callee: Identifier, arguments: Vec<Expression>) -> Self {
        Expression::Call(FunctionCall { callee, arguments })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Number(f64);

impl Number {
    pub fn new(value: f64) -> AstResult<Self> {
        if !value.is_finite() {
            return Err(AstError::NonFiniteNumber(value));
        }
        Ok(Self(value))
    }

    /// Parses a literal of the form `digits[.digits]`.
    pub fn parse(literal: &str) -> AstResult<Self> {
        let value = literal
            .parse::<f64>()
            .map_err(|_| AstError::InvalidNumber(literal.to_string()))?;
        Self::new(value)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionCall {
    pub callee: Identifier,
    pub arguments: Vec<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOperator {
    pub fn from_symbol(symbol: &str) -> AstResult<Self> {
        match symbol {
            "+" => Ok(BinaryOperator::Add),
            "-" => Ok(BinaryOperator::Sub),
            "*" => Ok(BinaryOperator::Mul),
            "/" => Ok(BinaryOperator::Div),
            other => Err(AstError::UnsupportedOperator(other.to_string())),
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
