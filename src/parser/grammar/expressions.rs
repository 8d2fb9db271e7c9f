//! Expression parsing
//!
//! Precedence climbing over the binary levels, with unary signs and
//! exponentiation handled below them:
//!
//! ```text
//! comparative (== < > <= >=)       1   left
//! additive    (+ -)                2   left
//! multiplicative (* / % juxtaposition) 3 left
//! unary       (+ -)                4   prefix, applies to a power
//! exponentiation (^)               5   left: a^b^c == (a^b)^c
//! ```
//!
//! Juxtaposition (`2x`, `a (b+c)`) is only read as multiplication where the
//! caller allows it: inside equations, conditions, argument lists and
//! parentheses. Between block items two operands are two items.
//!
//! An identifier is a call only when `(` touches it: `f(x)` calls `f`,
//! `f (x)` multiplies.

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

use crate::base::Name;
use crate::parser::errors::{ErrorCode, ParseError};
use crate::parser::syntax_kind::SyntaxKind;
use crate::syntax::{
    Argument, AssignOp, BinaryOp, Equation, Expr, Invocation, Literal, Parameter, Refinement,
    UNIQUE_PLACEHOLDER, UnaryOp, Uncertainty, Value,
};

/// Trait for expression parsing operations
///
/// This trait defines the interface between the expression parser and the main parser.
/// The main parser implements this trait to provide the necessary infrastructure.
pub trait ExpressionParser {
    // Token inspection
    fn current_kind(&self) -> SyntaxKind;
    fn current_text(&self) -> &str;
    /// Range of the current token; an empty range at end of input
    fn current_range(&self) -> TextRange;

    /// Kind of the nth significant token ahead (0 is the current one)
    fn peek_kind(&self, n: usize) -> SyntaxKind;

    /// Whether whitespace or a comment precedes the nth token ahead
    fn is_spaced(&self, n: usize) -> bool;

    /// End of the last consumed token
    fn prev_end(&self) -> TextSize;

    // Token consumption
    fn bump(&mut self);

    /// Words that cannot name a parameter: vocabulary and site keywords
    fn is_reserved(&self, word: &str) -> bool;

    /// Descend one nesting level, failing once the nesting limit is reached
    fn enter_nested(&mut self) -> Result<(), ParseError>;
    fn exit_nested(&mut self);

    fn at(&self, kind: SyntaxKind) -> bool {
        self.current_kind() == kind
    }

    fn at_any(&self, kinds: &[SyntaxKind]) -> bool {
        kinds.contains(&self.current_kind())
    }

    fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Consume `kind` or fail at the current token
    fn expect(&mut self, kind: SyntaxKind, expected: &str, code: ErrorCode) -> Result<TextRange, ParseError> {
        if self.at(kind) {
            let range = self.current_range();
            self.bump();
            Ok(range)
        } else {
            Err(ParseError::syntax(
                format!("expected {}, found {}", expected, describe_current(&*self)),
                self.current_range(),
                code,
            ))
        }
    }
}

/// Human-readable description of the current token for messages
pub fn describe_current<P: ExpressionParser + ?Sized>(p: &P) -> String {
    match p.current_kind() {
        SyntaxKind::EOF => "end of input".to_string(),
        _ => format!("'{}'", p.current_text()),
    }
}

// =============================================================================
// EXPRESSIONS
// =============================================================================

/// Run `parse` one nesting level deeper
pub fn nested<P, T>(p: &mut P, parse: impl FnOnce(&mut P) -> Result<T, ParseError>) -> Result<T, ParseError>
where
    P: ExpressionParser,
{
    p.enter_nested()?;
    let result = parse(p);
    p.exit_nested();
    result
}

/// Parse an expression. `juxtapose` enables implicit multiplication.
pub fn parse_expression<P: ExpressionParser>(p: &mut P, juxtapose: bool) -> Result<Expr, ParseError> {
    nested(p, |p| parse_binary(p, 1, juxtapose))
}

fn parse_binary<P: ExpressionParser>(p: &mut P, min_precedence: u8, juxtapose: bool) -> Result<Expr, ParseError> {
    let mut lhs = parse_unary(p)?;
    while let Some(op) = binary_op(p, juxtapose) {
        let precedence = op.precedence();
        if precedence < min_precedence {
            break;
        }
        if op != BinaryOp::ImplicitMul {
            p.bump();
        }
        let rhs = parse_binary(p, precedence + 1, juxtapose)?;
        lhs = Expr::binary(op, lhs, rhs);
    }
    Ok(lhs)
}

fn binary_op<P: ExpressionParser>(p: &P, juxtapose: bool) -> Option<BinaryOp> {
    let op = match p.current_kind() {
        SyntaxKind::EQ_EQ => BinaryOp::Eq,
        SyntaxKind::LT => BinaryOp::Lt,
        SyntaxKind::GT => BinaryOp::Gt,
        SyntaxKind::LT_EQ => BinaryOp::LtEq,
        SyntaxKind::GT_EQ => BinaryOp::GtEq,
        SyntaxKind::PLUS => BinaryOp::Add,
        // `1 -2` between items is two numbers, not a subtraction
        SyntaxKind::MINUS if !juxtapose && at_detached_negative(p) => return None,
        SyntaxKind::MINUS => BinaryOp::Sub,
        SyntaxKind::STAR => BinaryOp::Mul,
        SyntaxKind::SLASH => BinaryOp::Div,
        SyntaxKind::PERCENT => BinaryOp::Rem,
        kind if juxtapose && starts_operand(kind) => BinaryOp::ImplicitMul,
        _ => return None,
    };
    Some(op)
}

/// Tokens that can begin an operand
pub fn starts_operand(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::IDENT
            | SyntaxKind::INTEGER
            | SyntaxKind::FLOAT
            | SyntaxKind::L_PAREN
            | SyntaxKind::M_UNIQUE_DIR
    )
}

/// Tokens that can begin an expression
pub fn starts_expression(kind: SyntaxKind) -> bool {
    starts_operand(kind) || matches!(kind, SyntaxKind::STRING | SyntaxKind::PLUS | SyntaxKind::MINUS)
}

/// `-` touching a number, with whitespace before the sign
fn at_detached_negative<P: ExpressionParser>(p: &P) -> bool {
    p.is_spaced(0) && p.peek_kind(1).is_number() && !p.is_spaced(1)
}

/// `-` that folds into the numeric literal it touches. `-2^2` stays a
/// negated power.
fn at_negative_literal<P: ExpressionParser>(p: &P) -> bool {
    p.at(SyntaxKind::MINUS)
        && p.peek_kind(1).is_number()
        && !p.is_spaced(1)
        && p.peek_kind(2) != SyntaxKind::CARET
}

fn unary_op(kind: SyntaxKind) -> Option<UnaryOp> {
    match kind {
        SyntaxKind::PLUS => Some(UnaryOp::Plus),
        SyntaxKind::MINUS => Some(UnaryOp::Minus),
        _ => None,
    }
}

fn parse_unary<P: ExpressionParser>(p: &mut P) -> Result<Expr, ParseError> {
    if at_negative_literal(p) {
        p.bump();
        return Ok(Expr::Literal(parse_literal(p, true)?));
    }
    match unary_op(p.current_kind()) {
        Some(op) => {
            p.bump();
            let operand = parse_power(p)?;
            Ok(Expr::unary(op, operand))
        }
        None => parse_power(p),
    }
}

fn parse_power<P: ExpressionParser>(p: &mut P) -> Result<Expr, ParseError> {
    let mut base = parse_primary(p)?;
    while p.eat(SyntaxKind::CARET) {
        // the exponent may carry its own sign: a^-b
        let exponent = if at_negative_literal(p) {
            p.bump();
            Expr::Literal(parse_literal(p, true)?)
        } else if let Some(op) = unary_op(p.current_kind()) {
            p.bump();
            Expr::unary(op, parse_primary(p)?)
        } else {
            parse_primary(p)?
        };
        base = Expr::binary(BinaryOp::Pow, base, exponent);
    }
    Ok(base)
}

fn parse_primary<P: ExpressionParser>(p: &mut P) -> Result<Expr, ParseError> {
    match p.current_kind() {
        SyntaxKind::INTEGER | SyntaxKind::FLOAT | SyntaxKind::STRING => {
            Ok(Expr::Literal(parse_literal(p, false)?))
        }
        SyntaxKind::IDENT => {
            let name = Name::new(p.current_text());
            let start = p.current_range().start();
            p.bump();
            if p.at(SyntaxKind::L_PAREN) && !p.is_spaced(0) {
                parse_call(p, name, start)
            } else {
                Ok(Expr::Ident(name))
            }
        }
        SyntaxKind::M_UNIQUE_DIR => {
            p.bump();
            Ok(Expr::ident(UNIQUE_PLACEHOLDER))
        }
        SyntaxKind::L_PAREN => {
            p.bump();
            let inner = parse_expression(p, true)?;
            if !p.eat(SyntaxKind::R_PAREN) {
                return Err(ParseError::syntax(
                    format!("expected ')', found {}", describe_current(p)),
                    p.current_range(),
                    ErrorCode::E0203,
                ));
            }
            Ok(Expr::Paren(Box::new(inner)))
        }
        _ => Err(ParseError::syntax(
            format!("expected expression, found {}", describe_current(p)),
            p.current_range(),
            ErrorCode::E0406,
        )),
    }
}

// =============================================================================
// LITERALS
// =============================================================================

/// Parse the literal at the current token, negated if a `-` was folded
/// into it
pub fn parse_literal<P: ExpressionParser>(p: &mut P, negative: bool) -> Result<Literal, ParseError> {
    let text = p.current_text();
    let range = p.current_range();
    let literal = match p.current_kind() {
        SyntaxKind::INTEGER => {
            let parsed = if negative {
                format!("-{text}").parse::<i64>()
            } else {
                text.parse::<i64>()
            };
            match parsed {
                Ok(value) => Literal::Integer(value),
                Err(_) => {
                    return Err(ParseError::lex(
                        format!("integer literal '{text}' is out of range"),
                        range,
                        ErrorCode::E0104,
                    ));
                }
            }
        }
        SyntaxKind::FLOAT => match parse_float(text) {
            Some(value) if negative => Literal::Float(-value),
            Some(value) => Literal::Float(value),
            None => {
                return Err(ParseError::lex(
                    format!("float literal '{text}' is out of range"),
                    range,
                    ErrorCode::E0104,
                ));
            }
        },
        SyntaxKind::STRING => {
            let inner = text
                .strip_prefix('"')
                .and_then(|rest| rest.strip_suffix('"'))
                .unwrap_or(text);
            Literal::String(SmolStr::new(inner))
        }
        _ => {
            return Err(ParseError::syntax(
                format!("expected literal, found {}", describe_current(p)),
                range,
                ErrorCode::E0406,
            ));
        }
    };
    p.bump();
    Ok(literal)
}

/// Float text to value. An exponent with a fraction (`2e5.5`) is applied
/// as a real power of ten. Infinite results are rejected.
pub fn parse_float(text: &str) -> Option<f64> {
    let value = match text.find(['e', 'E']) {
        Some(split) if text[split + 1..].contains('.') => {
            let mantissa: f64 = text[..split].parse().ok()?;
            let exponent: f64 = text[split + 1..].parse().ok()?;
            mantissa * 10f64.powf(exponent)
        }
        _ => text.parse().ok()?,
    };
    value.is_finite().then_some(value)
}

/// A literal with an optional touching `-`, as written in value slots.
/// Returns `None` without consuming anything if no literal follows.
pub fn parse_signed_literal<P: ExpressionParser>(p: &mut P) -> Result<Option<Literal>, ParseError> {
    if p.at(SyntaxKind::MINUS) && p.peek_kind(1).is_number() && !p.is_spaced(1) {
        p.bump();
        return parse_literal(p, true).map(Some);
    }
    if p.current_kind().is_literal() {
        return parse_literal(p, false).map(Some);
    }
    Ok(None)
}

// =============================================================================
// PARAMETERS, EQUATIONS, ARGUMENTS
// =============================================================================

/// Identifier usable as a parameter name: not a keyword. `#m_unique` is a
/// name too.
pub fn at_parameter_name<P: ExpressionParser>(p: &P) -> bool {
    match p.current_kind() {
        SyntaxKind::IDENT => !p.is_reserved(p.current_text()),
        SyntaxKind::M_UNIQUE_DIR => true,
        _ => false,
    }
}

/// Take the current token as a name. Callers check the token kind first.
pub fn take_name<P: ExpressionParser>(p: &mut P) -> Name {
    let name = match p.current_kind() {
        SyntaxKind::M_UNIQUE_DIR => Name::new_static(UNIQUE_PLACEHOLDER),
        _ => Name::new(p.current_text()),
    };
    p.bump();
    name
}

/// Eat an optional `@` or `!`
pub fn parse_refinement_flag<P: ExpressionParser>(p: &mut P) -> Refinement {
    if p.eat(SyntaxKind::AT) {
        Refinement::Refined
    } else if p.eat(SyntaxKind::BANG) {
        Refinement::Unrefined
    } else {
        Refinement::Plain
    }
}

/// `@ [name] [value]` or `! [name] [value]`
pub fn parse_parameter_marker<P: ExpressionParser>(p: &mut P) -> Result<Parameter, ParseError> {
    let refinement = parse_refinement_flag(p);
    if refinement == Refinement::Plain {
        return Err(ParseError::syntax(
            format!("expected '@' or '!', found {}", describe_current(p)),
            p.current_range(),
            ErrorCode::E0902,
        ));
    }
    let name = at_parameter_name(p).then(|| take_name(p));
    let value = parse_signed_literal(p)?.map(Value::Literal);
    Ok(Parameter {
        refinement,
        name,
        value,
    })
}

pub fn assign_op(kind: SyntaxKind) -> Option<AssignOp> {
    match kind {
        SyntaxKind::EQ => Some(AssignOp::Assign),
        SyntaxKind::PLUS_EQ => Some(AssignOp::Add),
        SyntaxKind::MINUS_EQ => Some(AssignOp::Sub),
        SyntaxKind::STAR_EQ => Some(AssignOp::Mul),
        SyntaxKind::SLASH_EQ => Some(AssignOp::Div),
        SyntaxKind::CARET_EQ => Some(AssignOp::Pow),
        _ => None,
    }
}

/// `op expr ; [: uncertainty]`
pub fn parse_equation<P: ExpressionParser>(p: &mut P) -> Result<Equation, ParseError> {
    let Some(op) = assign_op(p.current_kind()) else {
        return Err(ParseError::syntax(
            format!("expected '=', found {}", describe_current(p)),
            p.current_range(),
            ErrorCode::E0902,
        ));
    };
    p.bump();
    let body = parse_expression(p, true)?;
    p.expect(SyntaxKind::SEMICOLON, "';' to end the equation", ErrorCode::E0201)?;

    let uncertainty = if p.eat(SyntaxKind::COLON) {
        Some(parse_uncertainty(p)?)
    } else {
        None
    };
    Ok(Equation {
        op,
        body,
        uncertainty,
    })
}

fn parse_uncertainty<P: ExpressionParser>(p: &mut P) -> Result<Uncertainty, ParseError> {
    if p.at(SyntaxKind::IDENT) {
        return Ok(Uncertainty::Name(take_name(p)));
    }
    match parse_signed_literal(p)? {
        Some(literal @ (Literal::Integer(_) | Literal::Float(_))) => Ok(Uncertainty::Literal(literal)),
        _ => Err(ParseError::syntax(
            "expected a number or name after ':'",
            p.current_range(),
            ErrorCode::E0304,
        )),
    }
}

/// The argument list after `name`, with `(` as the current token
fn parse_call<P: ExpressionParser>(p: &mut P, name: Name, start: TextSize) -> Result<Expr, ParseError> {
    p.bump();
    let mut arguments = Vec::new();
    if !p.eat(SyntaxKind::R_PAREN) {
        loop {
            arguments.push(parse_argument(p)?);
            if p.eat(SyntaxKind::COMMA) {
                continue;
            }
            if p.eat(SyntaxKind::R_PAREN) {
                break;
            }
            return Err(ParseError::syntax(
                format!("expected ',' or ')' in argument list, found {}", describe_current(p)),
                p.current_range(),
                ErrorCode::E0404,
            ));
        }
    }
    Ok(Expr::Call(Invocation {
        name,
        arguments,
        range: TextRange::new(start, p.prev_end()),
    }))
}

fn parse_argument<P: ExpressionParser>(p: &mut P) -> Result<Argument, ParseError> {
    match p.current_kind() {
        SyntaxKind::COMMA | SyntaxKind::R_PAREN => Ok(Argument::Empty),
        SyntaxKind::AT | SyntaxKind::BANG => Ok(Argument::Param(parse_parameter_marker(p)?)),
        kind if kind.is_assignment_op() => Ok(Argument::Equation(parse_equation(p)?)),
        kind if starts_expression(kind) => Ok(Argument::Expr(parse_expression(p, true)?)),
        _ => Err(ParseError::syntax(
            format!("invalid argument {}", describe_current(p)),
            p.current_range(),
            ErrorCode::E0405,
        )),
    }
}
