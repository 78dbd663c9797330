use pretty_assertions::assert_eq;
use vsl_core::ast::{BinaryOperator, Expression, PrintItem, Statement};
use vsl_parser::{parse_file, parse_fragment, parse_functions, parse_program, ParseError};

const FIBONACCI: &str = r#"
// Iterative Fibonacci numbers
FUNC main()
{
    VAR n
    n := 10
    PRINT "fib(", n, ") = ", fib(n), "\n"
    RETURN 0
}

FUNC fib(n)
{
    VAR a, b, t
    a := 0
    b := 1
    WHILE n DO
    {
        t := a + b
        a := b
        b := t
        n := n - 1
    }
    DONE
    RETURN a
}
"#;

fn binary(expr: &Expression) -> (BinaryOperator, &Expression, &Expression) {
    match expr {
        Expression::Binary { op, left, right } => (*op, &**left, &**right),
        other => panic!("expected a binary expression, got {other:?}"),
    }
}

fn returned(source: &str) -> Expression {
    let block = parse_fragment(source).unwrap();
    match block.statements.into_iter().next() {
        Some(Statement::Return(expr)) => expr,
        other => panic!("expected RETURN, got {other:?}"),
    }
}

#[test]
fn test_program_with_loop_and_print() {
    let program = parse_program(FIBONACCI).unwrap();
    let names: Vec<_> = program.functions.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["main", "fib"]);

    let main = program.function("main").unwrap();
    assert_eq!(main.arity(), 0);
    assert_eq!(main.body.declarations.len(), 1);
    match &main.body.statements[1] {
        Statement::Print(print) => {
            assert_eq!(print.items().len(), 5);
            assert!(matches!(&print.items()[0], PrintItem::Text(t) if t.raw() == "fib("));
            assert!(matches!(&print.items()[3], PrintItem::Expression(Expression::Call(_))));
            assert!(matches!(&print.items()[4], PrintItem::Text(t) if t.unescaped() == "\n"));
        }
        other => panic!("expected PRINT, got {other:?}"),
    }

    let fib = program.function("fib").unwrap();
    assert_eq!(fib.body.declarations[0].names.len(), 3);
    match &fib.body.statements[2] {
        Statement::While(stmt) => assert_eq!(stmt.body.statements.len(), 4),
        other => panic!("expected WHILE, got {other:?}"),
    }
}

#[test]
fn test_function_list_keeps_order_and_arity() {
    let functions = parse_functions("FUNC sq(v) { RETURN v * v } FUNC add(a, b) { RETURN a + b }")
        .unwrap();
    let shapes: Vec<_> = functions
        .iter()
        .map(|f| (f.name.as_str(), f.arity()))
        .collect();
    assert_eq!(shapes, vec![("sq", 1), ("add", 2)]);

    assert!(matches!(
        parse_functions("VAR x"),
        Err(ParseError::Syntax { .. })
    ));
}

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    let expr = returned("RETURN 1 + 2 * 3");
    let (op, left, right) = binary(&expr);
    assert_eq!(op, BinaryOperator::Add);
    assert!(matches!(left, Expression::Number(n) if n.value() == 1.0));
    assert_eq!(binary(right).0, BinaryOperator::Mul);
}

#[test]
fn test_operators_are_left_associative() {
    let expr = returned("RETURN 8 - 4 - 2");
    let (op, left, right) = binary(&expr);
    assert_eq!(op, BinaryOperator::Sub);
    assert_eq!(binary(left).0, BinaryOperator::Sub);
    assert!(matches!(right, Expression::Number(n) if n.value() == 2.0));

    let expr = returned("RETURN 8 / 4 / 2");
    assert_eq!(binary(binary(&expr).1).0, BinaryOperator::Div);
}

#[test]
fn test_unary_minus_binds_tightest() {
    let expr = returned("RETURN -a * b");
    let (op, left, _) = binary(&expr);
    assert_eq!(op, BinaryOperator::Mul);
    assert!(matches!(left, Expression::Negate(_)));

    let expr = returned("RETURN --3");
    match expr {
        Expression::Negate(inner) => assert!(matches!(*inner, Expression::Negate(_))),
        other => panic!("expected negation, got {other:?}"),
    }
}

#[test]
fn test_parentheses_group() {
    let expr = returned("RETURN (1 + 2) * 3");
    let (op, left, _) = binary(&expr);
    assert_eq!(op, BinaryOperator::Mul);
    assert_eq!(binary(left).0, BinaryOperator::Add);
}

#[test]
fn test_number_literals() {
    for (literal, value) in [("42", 42.0), ("3.", 3.0), ("0.25", 0.25)] {
        let expr = returned(&format!("RETURN {literal}"));
        assert!(matches!(expr, Expression::Number(n) if n.value() == value), "{literal}");
    }
    assert!(parse_fragment("RETURN .5").is_err());
}

#[test]
fn test_if_with_and_without_else() {
    let block = parse_fragment(
        "IF x THEN PRINT \"yes\" FI\nIF x - 1 THEN y := 1 ELSE VAR z z := 2 FI",
    )
    .unwrap();
    match &block.statements[0] {
        Statement::If(stmt) => assert!(stmt.else_block.is_none()),
        other => panic!("expected IF, got {other:?}"),
    }
    match &block.statements[1] {
        Statement::If(stmt) => {
            let else_block = stmt.else_block.as_ref().unwrap();
            assert_eq!(else_block.declarations.len(), 1);
            assert_eq!(else_block.statements.len(), 1);
        }
        other => panic!("expected IF, got {other:?}"),
    }
}

#[test]
fn test_text_keeps_escapes_raw() {
    let block = parse_fragment(r#"PRINT "tab\there \"quoted\"""#).unwrap();
    match &block.statements[0] {
        Statement::Print(print) => match &print.items()[0] {
            PrintItem::Text(text) => {
                assert_eq!(text.raw(), r#"tab\there \"quoted\""#);
                assert_eq!(text.unescaped(), "tab\there \"quoted\"");
            }
            other => panic!("expected text, got {other:?}"),
        },
        other => panic!("expected PRINT, got {other:?}"),
    }
}

#[test]
fn test_comments_are_ignored() {
    let block = parse_fragment("// header\nVAR x // trailing\nx := 1 // done").unwrap();
    assert_eq!(block.declarations.len(), 1);
    assert_eq!(block.statements.len(), 1);
}

#[test]
fn test_syntax_error_reports_position() {
    let err = parse_program("FUNC f()\n{\n    RETURN 1 +\n}\n").unwrap_err();
    match err {
        ParseError::Syntax { line, .. } => assert!(line >= 3, "line {line}"),
        other => panic!("expected a syntax error, got {other:?}"),
    }

    let err = parse_fragment("x := ").unwrap_err();
    assert_eq!(err.location().map(|(line, _)| line), Some(1));
}

#[test]
fn test_multiline_text_is_rejected() {
    assert!(parse_fragment("PRINT \"a\nb\"").is_err());
}

#[test]
fn test_while_needs_braces() {
    assert!(parse_fragment("WHILE x DO x := x - 1 DONE").is_err());
    assert!(parse_fragment("WHILE x DO { x := x - 1 } DONE").is_ok());
}

#[test]
fn test_parse_file() {
    let path = std::env::temp_dir().join(format!("vsl-parser-{}.vsl", std::process::id()));
    std::fs::write(&path, FIBONACCI).unwrap();
    let program = parse_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(program.functions.len(), 2);

    let err = parse_file(path.with_extension("missing")).unwrap_err();
    assert!(matches!(err, ParseError::Io { .. }));
    assert_eq!(err.location(), None);
}
