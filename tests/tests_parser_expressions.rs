//! Parser Tests - Expressions
//!
//! Precedence, associativity, implicit multiplication and literal
//! round-trips, checked through the fully parenthesized rendering.

use rstest::rstest;
use topas::parser::parse_source;
use topas::syntax::{Expr, ItemKind, Literal};

/// Body of `= source;`
fn equation_body(source: &str) -> Expr {
    let input = format!("= {source};");
    let parse = parse_source(&input);
    assert!(parse.ok(), "Failed to parse {input}: {:?}", parse.errors);
    match &parse.items[..] {
        [item] => match &item.kind {
            ItemKind::Equation(equation) => equation.body.clone(),
            other => panic!("expected equation, got {other:?}"),
        },
        items => panic!("expected one item, got {items:?}"),
    }
}

fn structure(source: &str) -> String {
    format!("{:#}", equation_body(source))
}

// ============================================================================
// Precedence and associativity
// ============================================================================

#[rstest]
#[case("1 + 2 * 3", "(1 + (2 * 3))")]
#[case("1 * 2 + 3", "((1 * 2) + 3)")]
#[case("aa ^ bb ^ cc", "((aa ^ bb) ^ cc)")]
#[case("(aa ^ bb) ^ cc", "((aa ^ bb) ^ cc)")]
#[case("aa ^ (bb ^ cc)", "(aa ^ (bb ^ cc))")]
#[case("-2^2", "(-(2 ^ 2))")]
#[case("pk1 - 1", "(pk1 - 1)")]
#[case("1 < 2 + 3", "(1 < (2 + 3))")]
#[case("pk1 == pk2 * 2", "(pk1 == (pk2 * 2))")]
#[case("pk1 / pk2 / pk3", "((pk1 / pk2) / pk3)")]
#[case("7 % 4 ^ 2", "(7 % (4 ^ 2))")]
fn test_operator_structure(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(structure(input), expected, "input: {input}");
}

// ============================================================================
// Implicit multiplication and call detection
// ============================================================================

#[rstest]
#[case("2x", "(2 x)")]
#[case("2 x", "(2 x)")]
#[case("2 (3 + 1)", "(2 (3 + 1))")]
#[case("ff (pk1)", "(ff pk1)")]
#[case("pk1 pk2 pk3", "((pk1 pk2) pk3)")]
#[case("2 pk1 ^ 2", "(2 (pk1 ^ 2))")]
#[case("pk1 pk2 + 1", "((pk1 pk2) + 1)")]
fn test_implicit_multiplication(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(structure(input), expected, "input: {input}");
}

#[rstest]
#[case("ff(pk1)", "ff", 1)]
#[case("ff()", "ff", 0)]
#[case("Max(1, 2, 3)", "Max", 3)]
#[case("ff(,)", "ff", 2)]
fn test_adjacent_paren_is_call(#[case] input: &str, #[case] name: &str, #[case] arguments: usize) {
    let Expr::Call(invocation) = equation_body(input) else {
        panic!("expected call for {input}");
    };
    assert_eq!(invocation.name, name);
    assert_eq!(invocation.arguments.len(), arguments);
}

// ============================================================================
// Literals
// ============================================================================

#[rstest]
#[case("0")]
#[case("42")]
#[case("1.5")]
#[case(".25")]
#[case("1e-7")]
#[case("2.5e3")]
#[case("6.02E23")]
#[case("\"pattern.xy\"")]
fn test_literal_round_trip(#[case] input: &str) {
    let Expr::Literal(literal) = equation_body(input) else {
        panic!("expected literal for {input}");
    };
    let reparsed = equation_body(&literal.to_string());
    assert_eq!(reparsed, Expr::Literal(literal), "input: {input}");
}

#[rstest]
#[case("-3", Literal::Integer(-3))]
#[case("-0.5", Literal::Float(-0.5))]
#[case("1e0.5", Literal::Float(10f64.powf(0.5)))]
fn test_literal_values(#[case] input: &str, #[case] expected: Literal) {
    assert_eq!(equation_body(input), Expr::Literal(expected));
}

// ============================================================================
// Errors
// ============================================================================

#[rstest]
#[case("= 1 +;")]
#[case("= (1 + 2;")]
#[case("= 1 + 2")]
#[case("= 99999999999999999999;")]
fn test_malformed_expressions_report_errors(#[case] input: &str) {
    let parse = parse_source(input);
    assert!(!parse.ok(), "expected errors for {input}");
}
