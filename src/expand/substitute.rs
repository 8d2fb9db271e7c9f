//! Parameter substitution in macro bodies
//!
//! Substitution is purely syntactic: it copies a body item with every bound
//! parameter replaced by its argument, `#m_unique` replaced by the name of
//! this expansion, `#m_ifarg` tests decided, and the `#m_argu` family
//! applied. Nested invocations, conditions and directives are handled by the
//! expander afterwards.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use text_size::TextRange;

use super::context::ParseContext;
use crate::base::Name;
use crate::parser::grammar::expressions::parse_float;
use crate::parser::{ErrorCode, ParseError};
use crate::syntax::{
    ArgTest, Argument, Branch, Condition, Conditional, Directive, Equation, Expr, Invocation,
    Item, ItemKind, Literal, MacroOp, MacroOpKind, Occupancy, OccModifier, Parameter, Refinement,
    SiteDecl, SiteStatement, UNIQUE_PLACEHOLDER, Uncertainty, Value, VariableAssignment,
    VariableDecl,
};

/// Arguments bound to parameter names for one expansion
pub type Bindings = FxHashMap<Name, Argument>;

pub struct Substituter<'a> {
    bound: &'a Bindings,
    /// Name `#m_unique` stands for in this expansion
    unique: &'a Name,
    ctx: &'a mut ParseContext,
    /// Invocation being expanded, for errors
    range: TextRange,
}

impl<'a> Substituter<'a> {
    pub fn new(bound: &'a Bindings, unique: &'a Name, ctx: &'a mut ParseContext, range: TextRange) -> Self {
        Self {
            bound,
            unique,
            ctx,
            range,
        }
    }

    fn lookup(&self, name: &str) -> Option<&'a Argument> {
        self.bound.get(name)
    }

    fn invalid(&self, message: String) -> ParseError {
        ParseError::syntax(message, self.range, ErrorCode::E0405)
    }

    pub fn items(&mut self, items: &[Item]) -> Result<Vec<Item>, ParseError> {
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            if let Some(item) = self.item(item)? {
                out.push(item);
            }
        }
        Ok(out)
    }

    /// Substitute one item. `None` when a parameter bound to an empty
    /// argument stood alone.
    pub fn item(&mut self, item: &Item) -> Result<Option<Item>, ParseError> {
        let kind = match &item.kind {
            ItemKind::Expr(Expr::Ident(name)) if self.lookup(name).is_some() => {
                return Ok(self.lookup(name).and_then(argument_item).map(|kind| Item::new(kind, item.range)));
            }
            ItemKind::Expr(expr) => ItemKind::Expr(self.expr(expr)?),
            ItemKind::Keyword { keyword, equation } => ItemKind::Keyword {
                keyword: keyword.clone(),
                equation: equation.as_ref().map(|e| self.equation(e)).transpose()?,
            },
            ItemKind::Param(param) => ItemKind::Param(self.parameter(param)?),
            ItemKind::Equation(equation) => ItemKind::Equation(self.equation(equation)?),
            ItemKind::Assignment { name, equation } => ItemKind::Assignment {
                name: self.name(name)?,
                equation: self.equation(equation)?,
            },
            ItemKind::Variable(decl) => ItemKind::Variable(VariableDecl {
                scope: decl.scope,
                param: self.parameter(&decl.param)?,
            }),
            ItemKind::ExistingPrm(assignment) => ItemKind::ExistingPrm(VariableAssignment {
                refinement: assignment.refinement,
                name: self.name(&assignment.name)?,
                equation: self.equation(&assignment.equation)?,
            }),
            ItemKind::Site(site) => ItemKind::Site(SiteDecl {
                name: self.name(&site.name)?,
                members: self.items(&site.members)?,
            }),
            ItemKind::SiteStatement(statement) => ItemKind::SiteStatement(self.site_statement(statement)?),
            ItemKind::Directive(directive) => ItemKind::Directive(self.directive(directive)?),
            ItemKind::Macro(decl) => ItemKind::Macro(decl.clone()),
            ItemKind::Conditional(conditional) => ItemKind::Conditional(self.conditional(conditional)?),
            ItemKind::MacroOp(op) => match self.macro_op(op)? {
                Some(kind) => kind,
                None => return Ok(None),
            },
            ItemKind::Block(items) => ItemKind::Block(self.items(items)?),
        };
        Ok(Some(Item::new(kind, item.range)))
    }

    // =========================================================================
    // Slots
    // =========================================================================

    /// A name slot: site names, atom types, declared names, symbols
    fn name(&mut self, name: &Name) -> Result<Name, ParseError> {
        if name == UNIQUE_PLACEHOLDER {
            return Ok(self.unique.clone());
        }
        match self.lookup(name) {
            Some(argument) => argument_word(argument)
                .ok_or_else(|| self.invalid(format!("argument for `{name}` is not a name"))),
            None => Ok(name.clone()),
        }
    }

    fn expr(&mut self, expr: &Expr) -> Result<Expr, ParseError> {
        Ok(match expr {
            Expr::Literal(_) => expr.clone(),
            Expr::Ident(name) if name == UNIQUE_PLACEHOLDER => Expr::Ident(self.unique.clone()),
            Expr::Ident(name) => match self.lookup(name) {
                Some(argument) => argument_expr(argument)
                    .ok_or_else(|| self.invalid(format!("argument for `{name}` is not an expression")))?,
                None => expr.clone(),
            },
            Expr::Call(invocation) => Expr::Call(self.invocation(invocation)?),
            Expr::Unary { op, operand } => Expr::unary(*op, self.expr(operand)?),
            Expr::Binary { op, lhs, rhs } => Expr::binary(*op, self.expr(lhs)?, self.expr(rhs)?),
            Expr::Paren(inner) => Expr::Paren(Box::new(self.expr(inner)?)),
        })
    }

    fn invocation(&mut self, invocation: &Invocation) -> Result<Invocation, ParseError> {
        let mut arguments = Vec::with_capacity(invocation.arguments.len());
        for argument in &invocation.arguments {
            let substituted = match argument {
                // a parameter passed straight through keeps its argument form
                Argument::Expr(expr) => match expr.as_ident().and_then(|name| self.lookup(name)) {
                    Some(bound) => bound.clone(),
                    None => Argument::Expr(self.expr(expr)?),
                },
                Argument::Param(param) => Argument::Param(self.parameter(param)?),
                Argument::Equation(equation) => Argument::Equation(self.equation(equation)?),
                Argument::Empty => Argument::Empty,
            };
            arguments.push(substituted);
        }
        Ok(Invocation {
            name: self.name(&invocation.name)?,
            arguments,
            range: invocation.range,
        })
    }

    fn equation(&mut self, equation: &Equation) -> Result<Equation, ParseError> {
        let uncertainty = match &equation.uncertainty {
            Some(Uncertainty::Name(name)) => Some(match self.lookup(name) {
                Some(Argument::Expr(Expr::Literal(literal))) => Uncertainty::Literal(literal.clone()),
                Some(_) => Uncertainty::Name(self.name(name)?),
                None => Uncertainty::Name(name.clone()),
            }),
            other => other.clone(),
        };
        Ok(Equation {
            op: equation.op,
            body: self.expr(&equation.body)?,
            uncertainty,
        })
    }

    /// A value slot. A parameter standing alone in the slot takes the whole
    /// argument; a refinement flag written in the body wins over the
    /// argument's own.
    fn parameter(&mut self, param: &Parameter) -> Result<Parameter, ParseError> {
        if param.value.is_none() {
            if let Some(argument) = param.name.as_ref().and_then(|name| self.lookup(name)) {
                let mut converted = argument_parameter(argument);
                if param.refinement != Refinement::Plain {
                    converted.refinement = param.refinement;
                }
                return Ok(converted);
            }
        }
        let name = match &param.name {
            Some(name) => Some(self.name(name)?),
            None => None,
        };
        let value = match &param.value {
            Some(Value::Equation(equation)) => Some(Value::Equation(self.equation(equation)?)),
            other => other.clone(),
        };
        Ok(Parameter {
            refinement: param.refinement,
            name,
            value,
        })
    }

    fn site_statement(&mut self, statement: &SiteStatement) -> Result<SiteStatement, ParseError> {
        Ok(match statement {
            SiteStatement::Coordinate { axis, value } => SiteStatement::Coordinate {
                axis: *axis,
                value: self.parameter(value)?,
            },
            SiteStatement::Occupancy(occ) => {
                let mut modifiers = Vec::with_capacity(occ.modifiers.len());
                for modifier in &occ.modifiers {
                    modifiers.push(OccModifier {
                        keyword: modifier.keyword,
                        value: self.parameter(&modifier.value)?,
                    });
                }
                SiteStatement::Occupancy(Occupancy {
                    atom: self.name(&occ.atom)?,
                    value: self.parameter(&occ.value)?,
                    modifiers,
                })
            }
            SiteStatement::NumPosns(value) => SiteStatement::NumPosns(self.parameter(value)?),
            SiteStatement::RandXyz(value) => SiteStatement::RandXyz(self.parameter(value)?),
            SiteStatement::Inter(value) => SiteStatement::Inter(self.parameter(value)?),
            SiteStatement::MinR(value) => SiteStatement::MinR(self.parameter(value)?),
            SiteStatement::MaxR(value) => SiteStatement::MaxR(self.parameter(value)?),
            SiteStatement::Adps(components) => {
                let mut substituted: [Parameter; 6] = Default::default();
                for (slot, component) in substituted.iter_mut().zip(components.iter()) {
                    *slot = self.parameter(component)?;
                }
                SiteStatement::Adps(Box::new(substituted))
            }
        })
    }

    fn directive(&mut self, directive: &Directive) -> Result<Directive, ParseError> {
        Ok(match directive {
            Directive::Define(name) => Directive::Define(self.name(name)?),
            Directive::Undef(name) => Directive::Undef(self.name(name)?),
            Directive::Seed => Directive::Seed,
            Directive::Include(path) => Directive::Include(path.clone()),
            Directive::DeleteMacros(names) => {
                let mut substituted = Vec::with_capacity(names.len());
                for name in names {
                    substituted.push(self.name(name)?);
                }
                Directive::DeleteMacros(substituted)
            }
            Directive::Prm { name, equation } => Directive::Prm {
                name: self.name(name)?,
                equation: self.equation(equation)?,
            },
            Directive::Out(expr) => Directive::Out(self.expr(expr)?),
        })
    }

    fn conditional(&mut self, conditional: &Conditional) -> Result<Conditional, ParseError> {
        let mut branches = Vec::with_capacity(conditional.branches.len());
        for branch in &conditional.branches {
            let condition = match &branch.condition {
                Condition::Expr(expr) => Condition::Expr(self.expr(expr)?),
                Condition::Defined { symbol, negated } => Condition::Defined {
                    symbol: self.name(symbol)?,
                    negated: *negated,
                },
                Condition::Argument { param, test } => {
                    let argument = self
                        .lookup(param)
                        .ok_or_else(|| ParseError::unresolved(param.clone(), self.range))?;
                    let holds = argument_passes(argument, test);
                    Condition::Expr(Expr::Literal(Literal::Integer(i64::from(holds))))
                }
            };
            branches.push(Branch {
                condition,
                items: self.items(&branch.items)?,
            });
        }
        let otherwise = match &conditional.otherwise {
            Some(items) => Some(self.items(items)?),
            None => None,
        };
        Ok(Conditional {
            family: conditional.family,
            branches,
            otherwise,
        })
    }

    /// Apply `#m_argu` and friends. Unbound parameters are left in place for
    /// the expander to report.
    fn macro_op(&mut self, op: &MacroOp) -> Result<Option<ItemKind>, ParseError> {
        let Some(argument) = self.lookup(&op.param) else {
            return Ok(Some(ItemKind::MacroOp(op.clone())));
        };
        Ok(match op.kind {
            MacroOpKind::Argu => argument_item(argument),
            MacroOpKind::FirstWord => argument
                .to_string()
                .split_whitespace()
                .next()
                .map(word_item),
            MacroOpKind::UniqueNotRefine => {
                let mut param = argument_parameter(argument);
                if param.refinement == Refinement::Refined {
                    param.refinement = Refinement::Unrefined;
                }
                if param.name.is_none() {
                    param.name = Some(self.ctx.next_unique());
                }
                Some(ItemKind::Param(param))
            }
            MacroOpKind::Out => {
                let expr = argument_expr(argument)
                    .ok_or_else(|| self.invalid(format!("argument for `{}` has no value", op.param)))?;
                Some(ItemKind::Directive(Directive::Out(expr)))
            }
        })
    }
}

// =============================================================================
// Argument conversions
// =============================================================================

/// The argument standing alone as a block item
fn argument_item(argument: &Argument) -> Option<ItemKind> {
    match argument {
        Argument::Empty => None,
        Argument::Param(param) => Some(ItemKind::Param(param.clone())),
        Argument::Expr(expr) => Some(ItemKind::Expr(expr.clone())),
        Argument::Equation(equation) => Some(ItemKind::Equation(equation.clone())),
    }
}

/// The argument in expression position; compound expressions are
/// parenthesized so they bind as one operand
fn argument_expr(argument: &Argument) -> Option<Expr> {
    match argument {
        Argument::Expr(expr) => Some(expr.clone().parenthesized()),
        Argument::Param(param) => match (&param.name, &param.value) {
            (Some(name), _) => Some(Expr::Ident(name.clone())),
            (None, Some(Value::Literal(literal))) => Some(Expr::Literal(literal.clone())),
            _ => None,
        },
        Argument::Equation(equation) => Some(equation.body.clone().parenthesized()),
        Argument::Empty => None,
    }
}

/// The argument in a value slot
fn argument_parameter(argument: &Argument) -> Parameter {
    match argument {
        Argument::Param(param) => param.clone(),
        Argument::Expr(Expr::Literal(literal)) => Parameter::literal(literal.clone()),
        Argument::Expr(Expr::Ident(name)) => Parameter::named(name.clone()),
        Argument::Expr(expr) => Parameter {
            value: Some(Value::Equation(Equation::assign(expr.clone()))),
            ..Parameter::default()
        },
        Argument::Equation(equation) => Parameter {
            value: Some(Value::Equation(equation.clone())),
            ..Parameter::default()
        },
        Argument::Empty => Parameter::default(),
    }
}

/// The argument in a name slot: its name, or its text with whitespace
/// removed (`Fe + 3` names the atom `Fe+3`)
fn argument_word(argument: &Argument) -> Option<Name> {
    match argument {
        Argument::Param(Parameter { name: Some(name), .. }) | Argument::Expr(Expr::Ident(name)) => {
            Some(name.clone())
        }
        Argument::Expr(Expr::Literal(Literal::String(text))) => Some(text.clone()),
        Argument::Param(_) | Argument::Expr(_) => {
            let word: String = argument.to_string().split_whitespace().collect();
            (!word.is_empty()).then(|| Name::from(word))
        }
        Argument::Equation(_) | Argument::Empty => None,
    }
}

fn argument_passes(argument: &Argument, test: &ArgTest) -> bool {
    match test {
        ArgTest::Code => matches!(argument, Argument::Param(p) if p.refinement != Refinement::Plain),
        ArgTest::CodeRefine => matches!(argument, Argument::Param(p) if p.refinement == Refinement::Refined),
        ArgTest::Eqn => matches!(argument, Argument::Equation(_)),
        ArgTest::OneWord => {
            let text = argument.to_string();
            text.split_whitespace().count() == 1
        }
        ArgTest::Text(expected) => argument.to_string().trim() == expected.as_str(),
    }
}

/// A single rendered word read back as an item
fn word_item(word: &str) -> ItemKind {
    let refined = |refinement| {
        ItemKind::Param(Parameter {
            refinement,
            ..Parameter::default()
        })
    };
    match word {
        "@" => refined(Refinement::Refined),
        "!" => refined(Refinement::Unrefined),
        _ => {
            let literal = if let Ok(value) = word.parse::<i64>() {
                Some(Literal::Integer(value))
            } else if word.starts_with(|c: char| c.is_ascii_digit() || c == '.' || c == '-') {
                parse_float(word).map(Literal::Float)
            } else if let Some(text) = word.strip_prefix('"').and_then(|w| w.strip_suffix('"')) {
                Some(Literal::String(SmolStr::new(text)))
            } else {
                None
            };
            match literal {
                Some(literal) => ItemKind::Expr(Expr::Literal(literal)),
                None => ItemKind::Expr(Expr::ident(word)),
            }
        }
    }
}
