//! Source rendering
//!
//! `Display` writes every node back as control-language source that parses to
//! the same tree. Expressions also support the alternate flag: `{:#}` renders
//! every operator node fully parenthesized and drops source parentheses, so
//! two trees with the same structure print identically.

use std::fmt::{self, Display, Formatter};

use super::expr::{Argument, Expr, Invocation, Literal};
use super::item::*;

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            // `{:?}` keeps a fraction or exponent so the text lexes as a float
            Self::Float(value) => write!(f, "{value:?}"),
            Self::String(text) => write!(f, "\"{text}\""),
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let full = f.alternate();
        match self {
            Self::Literal(literal) => literal.fmt(f),
            Self::Ident(name) => f.write_str(name),
            Self::Call(invocation) => invocation.fmt(f),
            Self::Unary { op, operand } if full => write!(f, "({}{:#})", op.symbol(), operand),
            Self::Unary { op, operand } => write!(f, "{}{}", op.symbol(), operand),
            Self::Binary { op, lhs, rhs } if full => match op.symbol() {
                "" => write!(f, "({lhs:#} {rhs:#})"),
                symbol => write!(f, "({lhs:#} {symbol} {rhs:#})"),
            },
            Self::Binary { op, lhs, rhs } => match op.symbol() {
                "" => write!(f, "{lhs} {rhs}"),
                symbol => write!(f, "{lhs} {symbol} {rhs}"),
            },
            Self::Paren(inner) if full => write!(f, "{inner:#}"),
            Self::Paren(inner) => write!(f, "({inner})"),
        }
    }
}

impl Display for Invocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (index, argument) in self.arguments.iter().enumerate() {
            if index > 0 {
                f.write_str(if argument.is_empty() { "," } else { ", " })?;
            }
            if f.alternate() {
                write!(f, "{argument:#}")?;
            } else {
                write!(f, "{argument}")?;
            }
        }
        f.write_str(")")
    }
}

impl Display for Argument {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Param(param) => param.fmt(f),
            Self::Expr(expr) if f.alternate() => write!(f, "{expr:#}"),
            Self::Expr(expr) => expr.fmt(f),
            Self::Equation(equation) => equation.fmt(f),
        }
    }
}

impl Display for Parameter {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut sep = "";
        if self.refinement != Refinement::Plain {
            f.write_str(self.refinement.symbol())?;
            sep = " ";
        }
        if let Some(name) = &self.name {
            write!(f, "{sep}{name}")?;
            sep = " ";
        }
        match &self.value {
            Some(Value::Literal(literal)) => write!(f, "{sep}{literal}"),
            Some(Value::Equation(equation)) => write!(f, "{sep}{equation}"),
            None => Ok(()),
        }
    }
}

impl Display for Uncertainty {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(literal) => literal.fmt(f),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl Display for Equation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {};", self.op.symbol(), self.body)?;
        if let Some(uncertainty) = &self.uncertainty {
            write!(f, " : {uncertainty}")?;
        }
        Ok(())
    }
}

impl Display for VariableDecl {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let keyword = match self.scope {
            VariableScope::Prm => "prm",
            VariableScope::Local => "local",
        };
        write!(f, "{keyword} {}", self.param)
    }
}

impl Display for VariableAssignment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "existing_prm {}{} {}",
            self.refinement.symbol(),
            self.name,
            self.equation
        )
    }
}

impl Display for SiteStatement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coordinate { axis, value } => write!(f, "{} {value}", axis.as_str()),
            Self::Occupancy(occ) => {
                write!(f, "occ {} {}", occ.atom, occ.value)?;
                for modifier in &occ.modifiers {
                    write!(f, " {} {}", modifier.keyword.as_str(), modifier.value)?;
                }
                Ok(())
            }
            Self::NumPosns(value) => write!(f, "num_posns {value}"),
            Self::RandXyz(value) => write!(f, "rand_xyz {value}"),
            Self::Inter(value) => write!(f, "inter {value}"),
            Self::Adps(components) => {
                f.write_str("adps")?;
                for (keyword, value) in crate::keywords::ADPS_ORDER.iter().zip(components.iter()) {
                    write!(f, " {} {value}", keyword.as_str())?;
                }
                Ok(())
            }
            Self::MinR(value) => write!(f, "min_r {value}"),
            Self::MaxR(value) => write!(f, "max_r {value}"),
        }
    }
}

impl Display for Directive {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Define(name) => write!(f, "#define {name}"),
            Self::Undef(name) => write!(f, "#undef {name}"),
            Self::Seed => f.write_str("#seed"),
            Self::Include(path) => write!(f, "#include \"{path}\""),
            Self::DeleteMacros(names) => {
                f.write_str("#delete_macros {")?;
                for name in names {
                    write!(f, " {name}")?;
                }
                f.write_str(" }")
            }
            Self::Prm { name, equation } => write!(f, "#prm {name} {equation}"),
            Self::Out(expr) => write!(f, "#out {expr}"),
        }
    }
}

impl Display for MacroSignature {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.by_reference {
            f.write_str("& ")?;
        }
        f.write_str(&self.name)?;
        if !self.parenthesized {
            return Ok(());
        }
        f.write_str("(")?;
        for (index, param) in self.params.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            if param.by_reference {
                f.write_str("&")?;
            }
            if let Some(name) = &param.name {
                f.write_str(name)?;
            }
        }
        f.write_str(")")
    }
}

impl Display for MacroDecl {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(if self.is_list { "#list " } else { "macro " })?;
        for (index, signature) in self.signatures.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{signature}")?;
        }
        f.write_str(" ")?;
        write_block(f, &self.body.items)
    }
}

impl Display for ArgTest {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code => f.write_str("#m_code"),
            Self::Eqn => f.write_str("#m_eqn"),
            Self::CodeRefine => f.write_str("#m_code_refine"),
            Self::OneWord => f.write_str("#m_one_word"),
            Self::Text(text) => write!(f, "\"{text}\""),
        }
    }
}

impl Display for Conditional {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let (prefix, end) = match self.family {
            ConditionFamily::Document => ("#", "#endif"),
            ConditionFamily::Macro => ("#m_", "#m_endif"),
        };
        for (index, branch) in self.branches.iter().enumerate() {
            let keyword = if index == 0 { "if" } else { "elseif" };
            match &branch.condition {
                Condition::Expr(expr) => write!(f, "{prefix}{keyword} {expr};")?,
                Condition::Defined { symbol, negated: false } => write!(f, "#ifdef {symbol}")?,
                Condition::Defined { symbol, negated: true } => write!(f, "#ifndef {symbol}")?,
                Condition::Argument { param, test } => write!(f, "#m_ifarg {param} {test}")?,
            }
            write_items(f, &branch.items)?;
            f.write_str(" ")?;
        }
        if let Some(items) = &self.otherwise {
            write!(f, "{prefix}else")?;
            write_items(f, items)?;
            f.write_str(" ")?;
        }
        f.write_str(end)
    }
}

impl Display for MacroOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.directive(), self.param)
    }
}

impl Display for ItemKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyword { keyword, equation: None } => f.write_str(keyword),
            Self::Keyword {
                keyword,
                equation: Some(equation),
            } => write!(f, "{keyword} {equation}"),
            Self::Expr(expr) => expr.fmt(f),
            Self::Param(param) => param.fmt(f),
            Self::Equation(equation) => equation.fmt(f),
            Self::Assignment { name, equation } => write!(f, "{name} {equation}"),
            Self::Variable(decl) => decl.fmt(f),
            Self::ExistingPrm(assignment) => assignment.fmt(f),
            Self::Site(site) => {
                write!(f, "site {}", site.name)?;
                write_items(f, &site.members)
            }
            Self::SiteStatement(statement) => statement.fmt(f),
            Self::Directive(directive) => directive.fmt(f),
            Self::Macro(decl) => decl.fmt(f),
            Self::Conditional(conditional) => conditional.fmt(f),
            Self::MacroOp(op) => op.fmt(f),
            Self::Block(items) => write_block(f, items),
        }
    }
}

impl Display for Item {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

/// Each item preceded by a space
fn write_items(f: &mut Formatter<'_>, items: &[Item]) -> fmt::Result {
    for item in items {
        write!(f, " {item}")?;
    }
    Ok(())
}

fn write_block(f: &mut Formatter<'_>, items: &[Item]) -> fmt::Result {
    f.write_str("{")?;
    write_items(f, items)?;
    f.write_str(" }")
}

/// Render a sequence of top-level items, one per line
pub fn render_items(items: &[Item]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
