//! Expression nodes

use smol_str::SmolStr;
use text_size::TextRange;

use super::item::{Equation, Parameter};
use crate::base::Name;

/// Identifier that stands for the per-expansion unique name (`#m_unique`)
pub const UNIQUE_PLACEHOLDER: &str = "#m_unique";

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    /// String contents without the quotes
    String(SmolStr),
}

impl Literal {
    /// Numeric value, if this is a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            Self::String(_) => None,
        }
    }

    /// The literal that prints a preprocessor value: an integer when the
    /// value is integral and fits, a float otherwise.
    pub fn from_number(value: f64) -> Self {
        if value.fract() == 0.0 && value.abs() < 9.007_199_254_740_992e15 {
            Self::Integer(value as i64)
        } else {
            Self::Float(value)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Plus,
    Minus,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    // Comparative
    Eq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    // Additive
    Add,
    Sub,
    // Multiplicative
    Mul,
    Div,
    Rem,
    /// Two operands written next to each other: `2x`, `a (b+c)`
    ImplicitMul,
    // Exponentiation
    Pow,
}

impl BinaryOp {
    /// Binding power, low to high
    pub fn precedence(&self) -> u8 {
        match self {
            Self::Eq | Self::Lt | Self::Gt | Self::LtEq | Self::GtEq => 1,
            Self::Add | Self::Sub => 2,
            Self::Mul | Self::Div | Self::Rem | Self::ImplicitMul => 3,
            Self::Pow => 5,
        }
    }

    /// Source spelling; implicit multiplication has none
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::LtEq => "<=",
            Self::GtEq => ">=",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::ImplicitMul => "",
            Self::Pow => "^",
        }
    }
}

/// A call-shaped expression `name(args...)`.
///
/// Whether it expands as a macro or stays a plain function call is decided
/// by the expander, not the parser.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub name: Name,
    pub arguments: Vec<Argument>,
    pub range: TextRange,
}

/// One slot of an argument list
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    /// `f(a,,c)`: the middle slot
    Empty,
    /// `@`, `@ name 1.0`, `!name`, `! 1.5`
    Param(Parameter),
    Expr(Expr),
    /// `= expr;`
    Equation(Equation),
}

impl Argument {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Ident(Name),
    Call(Invocation),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Parentheses as written in source
    Paren(Box<Expr>),
}

impl Expr {
    pub fn ident(name: impl Into<Name>) -> Self {
        Self::Ident(name.into())
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Self::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Self::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    /// Operator nodes; anything else is already atomic when spliced into
    /// another expression
    pub fn is_compound(&self) -> bool {
        matches!(self, Self::Unary { .. } | Self::Binary { .. })
    }

    /// Wrap operator nodes in parentheses so that splicing them into a
    /// larger tree keeps their grouping.
    pub fn parenthesized(self) -> Self {
        if self.is_compound() {
            Self::Paren(Box::new(self))
        } else {
            self
        }
    }

    /// The expression with all source parentheses removed
    pub fn strip_parens(&self) -> &Expr {
        match self {
            Self::Paren(inner) => inner.strip_parens(),
            other => other,
        }
    }

    pub fn as_ident(&self) -> Option<&Name> {
        match self {
            Self::Ident(name) => Some(name),
            _ => None,
        }
    }
}
