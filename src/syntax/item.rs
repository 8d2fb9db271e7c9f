//! Block items: the statements of a control file, macro body or site

use std::sync::Arc;

use smol_str::SmolStr;
use text_size::TextRange;

use super::expr::{BinaryOp, Expr, Literal};
use crate::base::Name;
use crate::keywords::SiteKeyword;

// =============================================================================
// PARAMETERS AND EQUATIONS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Refinement {
    #[default]
    Plain,
    /// `@`
    Refined,
    /// `!`
    Unrefined,
}

impl Refinement {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Plain => "",
            Self::Refined => "@",
            Self::Unrefined => "!",
        }
    }
}

/// A value-bearing slot: optional refinement flag, optional name, optional
/// literal or equation. A bare `@` is a refined parameter with neither.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Parameter {
    pub refinement: Refinement,
    pub name: Option<Name>,
    pub value: Option<Value>,
}

impl Parameter {
    pub fn literal(value: Literal) -> Self {
        Self {
            value: Some(Value::Literal(value)),
            ..Self::default()
        }
    }

    pub fn named(name: impl Into<Name>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Literal(Literal),
    Equation(Equation),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl AssignOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Assign => "=",
            Self::Add => "+=",
            Self::Sub => "-=",
            Self::Mul => "*=",
            Self::Div => "/=",
            Self::Pow => "^=",
        }
    }

    /// The compound operator equivalent to `name = name <op> rhs`
    pub fn from_binary(op: BinaryOp) -> Option<Self> {
        match op {
            BinaryOp::Add => Some(Self::Add),
            BinaryOp::Sub => Some(Self::Sub),
            BinaryOp::Mul => Some(Self::Mul),
            BinaryOp::Div => Some(Self::Div),
            BinaryOp::Pow => Some(Self::Pow),
            _ => None,
        }
    }
}

/// Error estimate after an equation: `= a + b; : 0.01`
#[derive(Debug, Clone, PartialEq)]
pub enum Uncertainty {
    Literal(Literal),
    Name(Name),
}

/// `op body ; [: uncertainty]`
#[derive(Debug, Clone, PartialEq)]
pub struct Equation {
    pub op: AssignOp,
    pub body: Expr,
    pub uncertainty: Option<Uncertainty>,
}

impl Equation {
    pub fn assign(body: Expr) -> Self {
        Self {
            op: AssignOp::Assign,
            body,
            uncertainty: None,
        }
    }
}

// =============================================================================
// DECLARATIONS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableScope {
    Prm,
    Local,
}

/// `prm name value` / `local name value`
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecl {
    pub scope: VariableScope,
    pub param: Parameter,
}

impl VariableDecl {
    pub fn name(&self) -> Option<&Name> {
        self.param.name.as_ref()
    }
}

/// `existing_prm name op expr;`
#[derive(Debug, Clone, PartialEq)]
pub struct VariableAssignment {
    pub refinement: Refinement,
    pub name: Name,
    pub equation: Equation,
}

impl VariableAssignment {
    /// `foo = foo + 1;` viewed as `foo += 1;`. Equations that are not of the
    /// form `name = name <op> rhs` are returned unchanged.
    pub fn compound_form(&self) -> Equation {
        if self.equation.op == AssignOp::Assign {
            if let Expr::Binary { op, lhs, rhs } = self.equation.body.strip_parens() {
                let same_name = lhs.strip_parens().as_ident() == Some(&self.name);
                if let (true, Some(compound)) = (same_name, AssignOp::from_binary(*op)) {
                    return Equation {
                        op: compound,
                        body: (**rhs).clone(),
                        uncertainty: self.equation.uncertainty.clone(),
                    };
                }
            }
        }
        self.equation.clone()
    }
}

// =============================================================================
// SITES
// =============================================================================

/// `site name` followed by its statements
#[derive(Debug, Clone, PartialEq)]
pub struct SiteDecl {
    pub name: Name,
    pub members: Vec<Item>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OccModifier {
    /// `beq` or `scale_occ`
    pub keyword: SiteKeyword,
    pub value: Parameter,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Occupancy {
    pub atom: Name,
    pub value: Parameter,
    pub modifiers: Vec<OccModifier>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SiteStatement {
    Coordinate { axis: Axis, value: Parameter },
    Occupancy(Occupancy),
    NumPosns(Parameter),
    RandXyz(Parameter),
    Inter(Parameter),
    /// `u11 u22 u33 u12 u13 u23`, in that order
    Adps(Box<[Parameter; 6]>),
    MinR(Parameter),
    MaxR(Parameter),
}

// =============================================================================
// PREPROCESSOR
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    Define(Name),
    Undef(Name),
    /// Recorded only; seeding is up to the consumer
    Seed,
    Include(SmolStr),
    DeleteMacros(Vec<Name>),
    Prm { name: Name, equation: Equation },
    Out(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MacroParam {
    pub name: Option<Name>,
    pub by_reference: bool,
}

/// One `name(params)` of a `macro` or `#list` declaration
#[derive(Debug, Clone, PartialEq)]
pub struct MacroSignature {
    pub name: Name,
    /// `macro & name(...)`: every parameter is by reference
    pub by_reference: bool,
    pub params: Vec<MacroParam>,
    /// Written with a parameter list, which may be empty: `name()`
    pub parenthesized: bool,
    pub range: TextRange,
}

impl MacroSignature {
    pub fn param_is_by_reference(&self, index: usize) -> bool {
        self.by_reference || self.params.get(index).is_some_and(|p| p.by_reference)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MacroBody {
    pub items: Vec<Item>,
}

/// `macro name(...) { ... }` or `#list a(...) b(...) { ... }`.
/// Every signature shares the same body.
#[derive(Debug, Clone, PartialEq)]
pub struct MacroDecl {
    pub signatures: Vec<MacroSignature>,
    pub body: Arc<MacroBody>,
    pub is_list: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionFamily {
    /// `#if` / `#ifdef` / `#ifndef`
    Document,
    /// `#m_if` / `#m_ifarg`
    Macro,
}

/// What `#m_ifarg p <test>` checks the bound argument for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgTest {
    /// `#m_code`: the argument carries a refinement flag (`@` or `!`)
    Code,
    /// `#m_eqn` / `#_eqn`: the argument is an equation
    Eqn,
    /// `#m_code_refine`: the argument is refined (`@`)
    CodeRefine,
    /// `#m_one_word`: the argument is a single word
    OneWord,
    /// `"text"`: the argument renders exactly as the text
    Text(SmolStr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Expr(Expr),
    /// `#ifdef sym`, `#ifdef !sym`, `#ifndef sym`
    Defined { symbol: Name, negated: bool },
    Argument { param: Name, test: ArgTest },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub condition: Condition,
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conditional {
    pub family: ConditionFamily,
    pub branches: Vec<Branch>,
    /// `#else` / `#m_else` items
    pub otherwise: Option<Vec<Item>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacroOpKind {
    /// `#m_argu`
    Argu,
    /// `#m_first_word`
    FirstWord,
    /// `#m_unique_not_refine`
    UniqueNotRefine,
    /// `#m_out`
    Out,
}

impl MacroOpKind {
    pub fn directive(&self) -> &'static str {
        match self {
            Self::Argu => "#m_argu",
            Self::FirstWord => "#m_first_word",
            Self::UniqueNotRefine => "#m_unique_not_refine",
            Self::Out => "#m_out",
        }
    }
}

/// A substitution directive applied to a macro parameter
#[derive(Debug, Clone, PartialEq)]
pub struct MacroOp {
    pub kind: MacroOpKind,
    pub param: Name,
}

// =============================================================================
// ITEMS
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ItemKind {
    /// Vocabulary keyword, optionally `keyword = expr;`
    Keyword {
        keyword: Name,
        equation: Option<Equation>,
    },
    Expr(Expr),
    /// `@ name 1.0`, `!name`, ...
    Param(Parameter),
    /// Standalone `= expr;` or compound `+= expr;`
    Equation(Equation),
    /// `name = expr;`, `name += expr;`, ...
    Assignment { name: Name, equation: Equation },
    Variable(VariableDecl),
    ExistingPrm(VariableAssignment),
    Site(SiteDecl),
    SiteStatement(SiteStatement),
    Directive(Directive),
    Macro(MacroDecl),
    Conditional(Conditional),
    MacroOp(MacroOp),
    /// Items spliced in place (`{ ... }` blocks of `#list` bodies)
    Block(Vec<Item>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub kind: ItemKind,
    pub range: TextRange,
}

impl Item {
    pub fn new(kind: ItemKind, range: TextRange) -> Self {
        Self { kind, range }
    }

    pub fn as_expr(&self) -> Option<&Expr> {
        match &self.kind {
            ItemKind::Expr(expr) => Some(expr),
            _ => None,
        }
    }
}
