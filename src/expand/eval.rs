//! Numeric evaluation of preprocessor expressions
//!
//! Used for `#if` / `#m_if` conditions, `#prm`, `#out` and `#m_out`. Macros
//! must already be expanded; identifiers resolve against the `#prm`
//! variables.

use text_size::TextRange;

use super::context::VariableTable;
use crate::parser::ParseError;
use crate::syntax::{Argument, BinaryOp, Expr, Invocation, Literal, UnaryOp};

/// Evaluate `expr`. Errors are reported at `range`.
pub fn evaluate(expr: &Expr, variables: &VariableTable, range: TextRange) -> Result<f64, ParseError> {
    let value = match expr {
        Expr::Literal(Literal::String(text)) => {
            return Err(ParseError::condition(
                format!("string \"{text}\" has no numeric value"),
                range,
            ));
        }
        Expr::Literal(literal) => literal.as_f64().unwrap_or(f64::NAN),
        Expr::Ident(name) => variables
            .get(name)
            .ok_or_else(|| ParseError::unresolved(name.clone(), range))?,
        Expr::Call(invocation) => call(invocation, variables, range)?,
        Expr::Paren(inner) => evaluate(inner, variables, range)?,
        Expr::Unary { op, operand } => {
            let value = evaluate(operand, variables, range)?;
            match op {
                UnaryOp::Plus => value,
                UnaryOp::Minus => -value,
            }
        }
        Expr::Binary { op, lhs, rhs } => {
            let lhs = evaluate(lhs, variables, range)?;
            let rhs = evaluate(rhs, variables, range)?;
            binary(*op, lhs, rhs, range)?
        }
    };
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ParseError::condition(format!("`{expr}` is not a finite number"), range))
    }
}

fn truth(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

fn binary(op: BinaryOp, lhs: f64, rhs: f64, range: TextRange) -> Result<f64, ParseError> {
    let value = match op {
        BinaryOp::Eq => truth(lhs == rhs),
        BinaryOp::Lt => truth(lhs < rhs),
        BinaryOp::Gt => truth(lhs > rhs),
        BinaryOp::LtEq => truth(lhs <= rhs),
        BinaryOp::GtEq => truth(lhs >= rhs),
        BinaryOp::Add => lhs + rhs,
        BinaryOp::Sub => lhs - rhs,
        BinaryOp::Mul | BinaryOp::ImplicitMul => lhs * rhs,
        BinaryOp::Div | BinaryOp::Rem if rhs == 0.0 => {
            return Err(ParseError::condition("division by zero", range));
        }
        BinaryOp::Div => lhs / rhs,
        BinaryOp::Rem => lhs % rhs,
        BinaryOp::Pow => lhs.powf(rhs),
    };
    Ok(value)
}

fn call(invocation: &Invocation, variables: &VariableTable, range: TextRange) -> Result<f64, ParseError> {
    let name = invocation.name.as_str();
    let arity = match name {
        "Abs" | "Sqrt" | "Exp" | "Ln" | "Sin" | "Cos" | "Tan" => Some(1),
        "Min" | "Max" => None,
        _ => return Err(ParseError::unresolved(invocation.name.clone(), range)),
    };

    let mut args = Vec::with_capacity(invocation.arguments.len());
    for argument in &invocation.arguments {
        match argument {
            Argument::Expr(expr) => args.push(evaluate(expr, variables, range)?),
            other => {
                return Err(ParseError::condition(
                    format!("argument `{other}` of {name} is not an expression"),
                    range,
                ));
            }
        }
    }
    if arity.is_some_and(|n| n != args.len()) || args.is_empty() {
        return Err(ParseError::condition(
            format!("{name} called with {} argument(s)", args.len()),
            range,
        ));
    }

    let x = args[0];
    let value = match name {
        "Abs" => x.abs(),
        "Sqrt" => x.sqrt(),
        "Exp" => x.exp(),
        "Ln" => x.ln(),
        "Sin" => x.sin(),
        "Cos" => x.cos(),
        "Tan" => x.tan(),
        "Min" => args.iter().copied().fold(f64::INFINITY, f64::min),
        _ => args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{ErrorCode, parse_source};
    use crate::syntax::ItemKind;
    use text_size::TextSize;

    fn eval_with(source: &str, variables: &VariableTable) -> Result<f64, ParseError> {
        let parse = parse_source(&format!("= {source};"));
        assert!(parse.ok(), "{:?}", parse.errors);
        let ItemKind::Equation(equation) = &parse.items[0].kind else {
            panic!("expected equation");
        };
        evaluate(&equation.body, variables, TextRange::empty(TextSize::new(0)))
    }

    fn eval(source: &str) -> Result<f64, ParseError> {
        eval_with(source, &VariableTable::new())
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("1 + 2 * 3").unwrap(), 7.0);
        assert_eq!(eval("2^3^2").unwrap(), 64.0);
        assert_eq!(eval("-2^2").unwrap(), -4.0);
        assert_eq!(eval("2 (3 + 1)").unwrap(), 8.0);
        assert_eq!(eval("7 % 4").unwrap(), 3.0);
    }

    #[test]
    fn test_comparisons_yield_one_or_zero() {
        assert_eq!(eval("1 < 2").unwrap(), 1.0);
        assert_eq!(eval("1 == 2").unwrap(), 0.0);
        assert_eq!(eval("2 >= 2").unwrap(), 1.0);
    }

    #[test]
    fn test_functions() {
        assert_eq!(eval("Sqrt(16)").unwrap(), 4.0);
        assert_eq!(eval("Max(1, 5, 3)").unwrap(), 5.0);
        assert_eq!(eval("Abs(-2)").unwrap(), 2.0);
    }

    #[test]
    fn test_variables() {
        let mut variables = VariableTable::new();
        variables.set("n".into(), 3.0);
        assert_eq!(eval_with("n n", &variables).unwrap(), 9.0);
    }

    #[test]
    fn test_errors() {
        assert_eq!(eval("missing + 1").unwrap_err().code(), ErrorCode::E0501);
        assert_eq!(eval("Foo(1)").unwrap_err().code(), ErrorCode::E0501);
        assert_eq!(eval("1 / 0").unwrap_err().code(), ErrorCode::E0504);
        assert_eq!(eval("\"text\"").unwrap_err().code(), ErrorCode::E0504);
        assert_eq!(eval("Sqrt(-1)").unwrap_err().code(), ErrorCode::E0504);
        assert_eq!(eval("Sin(1, 2)").unwrap_err().code(), ErrorCode::E0504);
    }
}
