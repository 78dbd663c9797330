use pest::iterators::Pair;
use vsl_core::ast::{
    BinaryOperator, Block, Expression, FunctionDefinition, Identifier, Number, PrintItem,
    Program, Statement, Text, VariableDeclaration,
};

use crate::{ParseError, ParseResult, Rule, ShellInput};

type Node<'i> = Pair<'i, Rule>;

/// Children of `pair` that carry meaning: keyword tokens and `EOI` are dropped.
struct Children<'i> {
    at: (usize, usize),
    inner: std::iter::Peekable<std::vec::IntoIter<Node<'i>>>,
}

impl<'i> Children<'i> {
    fn of(pair: Node<'i>) -> Self {
        let at = pair.line_col();
        let inner: Vec<_> = pair
            .into_inner()
            .filter(|p| !is_keyword(p.as_rule()) && p.as_rule() != Rule::EOI)
            .collect();
        Self {
            at,
            inner: inner.into_iter().peekable(),
        }
    }

    fn expect(&mut self, what: &str) -> ParseResult<Node<'i>> {
        self.inner
            .next()
            .ok_or_else(|| ParseError::malformed(self.at, what))
    }

    fn next_if(&mut self, rule: Rule) -> Option<Node<'i>> {
        self.inner.next_if(|p| p.as_rule() == rule)
    }
}

impl<'i> Iterator for Children<'i> {
    type Item = Node<'i>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

fn is_keyword(rule: Rule) -> bool {
    matches!(
        rule,
        Rule::kw_func
            | Rule::kw_var
            | Rule::kw_print
            | Rule::kw_return
            | Rule::kw_if
            | Rule::kw_then
            | Rule::kw_else
            | Rule::kw_fi
            | Rule::kw_while
            | Rule::kw_do
            | Rule::kw_done
    )
}

fn unexpected(pair: &Node<'_>) -> ParseError {
    ParseError::malformed(pair.line_col(), &format!("unexpected {:?}", pair.as_rule()))
}

pub(crate) fn build_program(pair: Node<'_>) -> ParseResult<Program> {
    Children::of(pair)
        .map(build_function)
        .collect::<ParseResult<Vec<_>>>()
        .map(Program::new)
}

pub(crate) fn build_fragment(pair: Node<'_>) -> ParseResult<Block> {
    let mut children = Children::of(pair);
    build_block(children.expect("block")?)
}

pub(crate) fn build_shell_input(pair: Node<'_>) -> ParseResult<ShellInput> {
    let mut children = Children::of(pair);
    let body = children.expect("shell input")?;
    match body.as_rule() {
        Rule::function_list => Children::of(body)
            .map(build_function)
            .collect::<ParseResult<Vec<_>>>()
            .map(ShellInput::Functions),
        Rule::block => build_block(body).map(ShellInput::Block),
        _ => Err(unexpected(&body)),
    }
}

fn build_function(pair: Node<'_>) -> ParseResult<FunctionDefinition> {
    let mut children = Children::of(pair);
    let name = build_identifier(children.expect("function name")?)?;
    let parameters = Children::of(children.expect("parameter list")?)
        .map(build_identifier)
        .collect::<ParseResult<Vec<_>>>()?;
    let body = build_block(children.expect("function body")?)?;
    Ok(FunctionDefinition::new(name, parameters, body))
}

fn build_identifier(pair: Node<'_>) -> ParseResult<Identifier> {
    Identifier::new(pair.as_str()).map_err(|e| ParseError::ast(pair.line_col(), e))
}

fn build_block(pair: Node<'_>) -> ParseResult<Block> {
    let mut declarations = Vec::new();
    let mut statements = Vec::new();
    for child in Children::of(pair) {
        match child.as_rule() {
            Rule::declaration => {
                let names = Children::of(child)
                    .map(build_identifier)
                    .collect::<ParseResult<Vec<_>>>()?;
                declarations.push(VariableDeclaration::new(names));
            }
            Rule::statement => statements.push(build_statement(child)?),
            _ => return Err(unexpected(&child)),
        }
    }
    Ok(Block::new(declarations, statements))
}

fn build_statement(pair: Node<'_>) -> ParseResult<Statement> {
    let at = pair.line_col();
    let stmt = Children::of(pair).expect("statement")?;
    let rule = stmt.as_rule();
    let mut children = Children::of(stmt);

    match rule {
        Rule::assign => {
            let target = build_identifier(children.expect("assignment target")?)?;
            let value = build_expression(children.expect("assigned value")?)?;
            Ok(Statement::assign(target, value))
        }
        Rule::return_stmt => {
            let value = build_expression(children.expect("return value")?)?;
            Ok(Statement::ret(value))
        }
        Rule::print_stmt => {
            let items = children
                .map(build_print_item)
                .collect::<ParseResult<Vec<_>>>()?;
            Statement::print(items).map_err(|e| ParseError::ast(at, e))
        }
        Rule::if_stmt => {
            let test = build_expression(children.expect("condition")?)?;
            let then_block = build_block(children.expect("THEN block")?)?;
            let else_block = children.next_if(Rule::block).map(build_block).transpose()?;
            Ok(Statement::if_then(test, then_block, else_block))
        }
        Rule::while_stmt => {
            let test = build_expression(children.expect("condition")?)?;
            let body = build_block(children.expect("loop body")?)?;
            Ok(Statement::while_do(test, body))
        }
        _ => Err(ParseError::malformed(at, &format!("unexpected {rule:?}"))),
    }
}

fn build_print_item(pair: Node<'_>) -> ParseResult<PrintItem> {
    let item = Children::of(pair).expect("print item")?;
    match item.as_rule() {
        Rule::text => {
            let at = item.line_col();
            let raw = Children::of(item)
                .next()
                .map(|inner| inner.as_str())
                .unwrap_or_default();
            Text::new(raw)
                .map(PrintItem::Text)
                .map_err(|e| ParseError::ast(at, e))
        }
        Rule::expression => build_expression(item).map(PrintItem::Expression),
        _ => Err(unexpected(&item)),
    }
}

/// `expression` and `term` share one shape: an operand followed by (operator, operand) pairs,
/// folded to the left.
fn build_expression(pair: Node<'_>) -> ParseResult<Expression> {
    match pair.as_rule() {
        Rule::expression | Rule::term => {
            let mut children = Children::of(pair);
            let mut left = build_expression(children.expect("operand")?)?;
            while let Some(op) = children.next() {
                let op = BinaryOperator::from_symbol(op.as_str())
                    .map_err(|e| ParseError::ast(op.line_col(), e))?;
                let right = build_expression(children.expect("right operand")?)?;
                left = Expression::binary(op, left, right);
            }
            Ok(left)
        }
        Rule::factor => build_expression(Children::of(pair).expect("factor")?),
        Rule::negate => {
            let operand = build_expression(Children::of(pair).expect("negated operand")?)?;
            Ok(Expression::negate(operand))
        }
        Rule::number => Number::parse(pair.as_str())
            .map(Expression::Number)
            .map_err(|e| ParseError::ast(pair.line_col(), e)),
        Rule::identifier => build_identifier(pair).map(Expression::Identifier),
        Rule::call => {
            let mut children = Children::of(pair);
            let callee = build_identifier(children.expect("callee")?)?;
            let arguments = Children::of(children.expect("argument list")?)
                .map(build_expression)
                .collect::<ParseResult<Vec<_>>>()?;
            Ok(Expression::call(callee, arguments))
        }
        _ => Err(unexpected(&pair)),
    }
}
