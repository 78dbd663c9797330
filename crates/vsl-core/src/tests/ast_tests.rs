use crate::ast::*;

#[test]
fn test_identifier_validation() {
    assert!(Identifier::new("x").is_ok());
    assert!(Identifier::new("_tmp1").is_ok());
    assert_eq!(
        Identifier::new("1abc"),
        Err(AstError::InvalidIdentifier("1abc".to_string()))
    );
    assert_eq!(
        Identifier::new(""),
        Err(AstError::InvalidIdentifier(String::new()))
    );
    assert_eq!(
        Identifier::new("WHILE"),
        Err(AstError::ReservedWord("WHILE".to_string()))
    );
    assert!(Identifier::new("While").is_ok());
}

#[test]
fn test_number_must_be_finite() {
    assert!(Number::new(1.5).is_ok());
    assert!(matches!(
        Number::new(f64::INFINITY),
        Err(AstError::NonFiniteNumber(_))
    ));
    assert!(matches!(
        Number::new(f64::NAN),
        Err(AstError::NonFiniteNumber(_))
    ));
    assert_eq!(Number::parse("42.").unwrap().value(), 42.0);
    assert_eq!(Number::parse("3.25").unwrap().value(), 3.25);
    assert!(Number::parse("abc").is_err());
}

#[test]
fn test_operator_symbols() {
    for (symbol, op) in [
        ("+", BinaryOperator::Add),
        ("-", BinaryOperator::Sub),
        ("*", BinaryOperator::Mul),
        ("/", BinaryOperator::Div),
    ] {
        assert_eq!(BinaryOperator::from_symbol(symbol), Ok(op));
        assert_eq!(op.symbol(), symbol);
    }
    assert_eq!(
        BinaryOperator::from_symbol("%"),
        Err(AstError::UnsupportedOperator("%".to_string()))
    );
}

#[test]
fn test_print_requires_items() {
    assert_eq!(PrintStatement::new(Vec::new()), Err(AstError::EmptyPrint));
    let item = PrintItem::Text(Text::new("hi").unwrap());
    assert_eq!(PrintStatement::new(vec![item]).unwrap().items().len(), 1);
}

#[test]
fn test_text_unescaping() {
    let text = Text::new(r#"a\tb\n\"q\" \x41é \101 \z"#).unwrap();
    assert_eq!(text.unescaped(), "a\tb\n\"q\" A\u{e9} A \\z");
    assert_eq!(text.raw(), r#"a\tb\n\"q\" \x41é \101 \z"#);
    assert_eq!(Text::new("line\nbreak"), Err(AstError::MultilineText));
}

#[test]
fn test_escaped_nul_ends_text() {
    assert_eq!(Text::new(r"a\0b").unwrap().unescaped(), "a");
    assert_eq!(Text::new(r"\x00tail").unwrap().unescaped(), "");
    assert_eq!(Text::new(r"a\0b").unwrap().raw(), r"a\0b");
}

#[test]
fn test_trailing_backslash_is_kept() {
    assert_eq!(Text::new("end\\").unwrap().unescaped(), "end\\");
}

#[test]
fn test_program_lookup_and_arity() {
    let f = FunctionDefinition::new(
        Identifier::new("f").unwrap(),
        vec![Identifier::new("a").unwrap(), Identifier::new("b").unwrap()],
        Block::default(),
    );
    let program = Program::new(vec![f]);
    assert_eq!(program.function("f").map(|f| f.arity()), Some(2));
    assert!(program.function("g").is_none());
}

#[test]
fn test_ast_serializes_to_json() {
    let expr = Expression::binary(
        BinaryOperator::Add,
        Expression::number(1.0).unwrap(),
        Expression::negate(Expression::identifier("x").unwrap()),
    );
    let json = serde_json::to_value(&expr).unwrap();
    assert_eq!(json["Binary"]["op"], "Add");
    assert_eq!(json["Binary"]["left"]["Number"], 1.0);
    assert_eq!(json["Binary"]["right"]["Negate"]["Identifier"], "x");
}
