use super::*;
use text_size::{TextRange, TextSize};

fn int(value: i64) -> Expr {
    Expr::Literal(Literal::Integer(value))
}

#[test]
fn test_literal_display() {
    assert_eq!(Literal::Integer(-3).to_string(), "-3");
    assert_eq!(Literal::Float(5.0).to_string(), "5.0");
    assert_eq!(Literal::Float(1e-7).to_string(), "1e-7");
    assert_eq!(Literal::String("a.xy".into()).to_string(), "\"a.xy\"");
}

#[test]
fn test_literal_from_number() {
    assert_eq!(Literal::from_number(3.0), Literal::Integer(3));
    assert_eq!(Literal::from_number(-0.5), Literal::Float(-0.5));
}

#[test]
fn test_alternate_display_ignores_source_parens() {
    let left = Expr::binary(
        BinaryOp::Pow,
        Expr::Paren(Box::new(Expr::binary(BinaryOp::Pow, Expr::ident("a"), Expr::ident("b")))),
        Expr::ident("c"),
    );
    assert_eq!(left.to_string(), "(a ^ b) ^ c");
    assert_eq!(format!("{left:#}"), "((a ^ b) ^ c)");
}

#[test]
fn test_implicit_multiplication_display() {
    let expr = Expr::binary(BinaryOp::ImplicitMul, int(2), Expr::ident("x"));
    assert_eq!(expr.to_string(), "2 x");
    assert_eq!(format!("{expr:#}"), "(2 x)");
}

#[test]
fn test_call_with_holes() {
    let call = Invocation {
        name: "f".into(),
        arguments: vec![
            Argument::Expr(Expr::ident("a")),
            Argument::Empty,
            Argument::Param(Parameter {
                refinement: Refinement::Refined,
                ..Parameter::default()
            }),
        ],
        range: TextRange::empty(TextSize::new(0)),
    };
    assert_eq!(call.to_string(), "f(a,, @)");
}

#[test]
fn test_compound_form() {
    let assignment = VariableAssignment {
        refinement: Refinement::Plain,
        name: "foo".into(),
        equation: Equation::assign(Expr::binary(BinaryOp::Add, Expr::ident("foo"), int(1))),
    };
    let compound = assignment.compound_form();
    assert_eq!(compound.op, AssignOp::Add);
    assert_eq!(compound.to_string(), "+= 1;");
}

#[test]
fn test_compound_form_other_name_is_unchanged() {
    let assignment = VariableAssignment {
        refinement: Refinement::Plain,
        name: "foo".into(),
        equation: Equation::assign(Expr::binary(BinaryOp::Add, Expr::ident("bar"), int(1))),
    };
    assert_eq!(assignment.compound_form(), assignment.equation);
}

#[test]
fn test_parameter_display() {
    let param = Parameter {
        refinement: Refinement::Refined,
        name: Some("b1".into()),
        value: Some(Value::Literal(Literal::Float(0.5))),
    };
    assert_eq!(param.to_string(), "@ b1 0.5");
    assert_eq!(Parameter::literal(Literal::Integer(1)).to_string(), "1");
}

#[test]
fn test_conditional_display() {
    let range = TextRange::empty(TextSize::new(0));
    let conditional = Conditional {
        family: ConditionFamily::Document,
        branches: vec![Branch {
            condition: Condition::Expr(int(1)),
            items: vec![Item::new(ItemKind::Expr(Expr::ident("a")), range)],
        }],
        otherwise: Some(vec![Item::new(ItemKind::Expr(Expr::ident("b")), range)]),
    };
    assert_eq!(conditional.to_string(), "#if 1; a #else b #endif");
}
