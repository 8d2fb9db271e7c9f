//! The expander walks parsed items in source order, updating the
//! preprocessor tables and replacing directives, conditionals and macro
//! invocations by the items they stand for.

use std::{mem, panic, thread};

use text_size::TextRange;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::context::ParseContext;
use super::eval::evaluate;
use super::substitute::{Bindings, Substituter};
use crate::base::Name;
use crate::document::{Document, ErrorSource};
use crate::include::IncludeResolver;
use crate::keywords::Vocabulary;
use crate::options::ParseOptions;
use crate::parser::{Comment, ErrorCode, Parse, ParseError, parse_source_with};
use crate::syntax::{
    Argument, Condition, Conditional, Directive, Equation, Expr, Invocation, Item, ItemKind,
    Literal, Parameter, SiteDecl, SiteStatement, Value, VariableAssignment, VariableDecl,
};

/// Native stack reserved for each level of macro or include nesting
const STACK_PER_LEVEL: usize = 64 * 1024;
const BASE_STACK: usize = 4 * 1024 * 1024;
const MAX_STACK: usize = 1024 * 1024 * 1024;

fn stack_size_for(depth: usize) -> usize {
    depth
        .saturating_mul(STACK_PER_LEVEL)
        .saturating_add(BASE_STACK)
        .min(MAX_STACK)
}

pub struct Expander<'s> {
    ctx: ParseContext,
    options: &'s ParseOptions,
    vocabulary: &'s dyn Vocabulary,
    resolver: &'s dyn IncludeResolver,
    cancel: Option<&'s CancellationToken>,
    /// Current nesting of macro expansions and includes
    depth: usize,
    /// Text the items being processed come from
    source: ErrorSource,
    /// Outermost macro call in progress
    call_site: Option<TextRange>,
    errors: Vec<ParseError>,
    sources: Vec<ErrorSource>,
    comments: Vec<Comment>,
}

impl<'s> Expander<'s> {
    pub fn new(options: &'s ParseOptions, vocabulary: &'s dyn Vocabulary, resolver: &'s dyn IncludeResolver) -> Self {
        Self {
            ctx: ParseContext::new(),
            options,
            vocabulary,
            resolver,
            cancel: None,
            depth: 0,
            source: ErrorSource::Root,
            call_site: None,
            errors: Vec::new(),
            sources: Vec::new(),
            comments: Vec::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: &'s CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Expand a parsed document. A cancelled expansion yields no items and
    /// a single `Cancelled` error.
    ///
    /// Expansion recurses once per level of macro and include nesting, so it
    /// runs on its own thread with a stack sized for `max_expansion_depth`.
    pub fn expand(mut self, mut parse: Parse) -> Document {
        let stack_size = stack_size_for(self.options.max_expansion_depth);
        let expanded = thread::scope(|scope| {
            let spawned = thread::Builder::new()
                .name("topas-expand".to_string())
                .stack_size(stack_size)
                .spawn_scoped(scope, || self.run(&mut parse));
            match spawned {
                Ok(handle) => Some(handle.join().unwrap_or_else(|payload| panic::resume_unwind(payload))),
                Err(error) => {
                    warn!(%error, stack_size, "cannot spawn expansion thread, expanding in place");
                    None
                }
            }
        });
        expanded.unwrap_or_else(|| self.run(&mut parse))
    }

    fn run(&mut self, parse: &mut Parse) -> Document {
        for error in mem::take(&mut parse.errors) {
            self.report(error);
        }
        if self.options.collect_comments {
            self.comments.append(&mut parse.comments);
        }

        let mut items = Vec::new();
        if let Err(cancelled) = self.process_all(mem::take(&mut parse.items), &mut items) {
            debug!("expansion cancelled");
            return Document::new(
                Vec::new(),
                vec![(cancelled, ErrorSource::Root)],
                Vec::new(),
                mem::take(&mut self.ctx),
            );
        }

        let errors = mem::take(&mut self.errors).into_iter().zip(mem::take(&mut self.sources));
        Document::new(
            items,
            errors.collect(),
            mem::take(&mut self.comments),
            mem::take(&mut self.ctx),
        )
    }

    fn report(&mut self, error: ParseError) {
        self.errors.push(error);
        self.sources.push(self.source.clone());
    }

    /// Process items as independent top-level items: an item that fails is
    /// reported and contributes nothing. Only cancellation stops the loop.
    fn process_all(&mut self, items: Vec<Item>, out: &mut Vec<Item>) -> Result<(), ParseError> {
        for item in items {
            let mut produced = Vec::new();
            match self.process(item, &mut produced) {
                Ok(()) => out.append(&mut produced),
                Err(error @ ParseError::Cancelled { .. }) => return Err(error),
                Err(error) => {
                    debug!(%error, "item dropped");
                    self.report(error);
                }
            }
        }
        Ok(())
    }

    fn check_cancelled(&self, range: TextRange) -> Result<(), ParseError> {
        match self.cancel {
            Some(token) if token.is_cancelled() => Err(ParseError::Cancelled { range }),
            _ => Ok(()),
        }
    }

    fn process(&mut self, item: Item, out: &mut Vec<Item>) -> Result<(), ParseError> {
        self.check_cancelled(item.range)?;
        let range = item.range;

        let kind = match item.kind {
            ItemKind::Directive(directive) => return self.directive(directive, range, out),
            ItemKind::Conditional(conditional) => {
                if let Some(items) = self.select_branch(conditional, range)? {
                    for item in items {
                        self.process(item, out)?;
                    }
                }
                return Ok(());
            }
            ItemKind::Block(items) => {
                for item in items {
                    self.process(item, out)?;
                }
                return Ok(());
            }
            ItemKind::Expr(expr) => return self.expr_item(expr, range, out),
            ItemKind::MacroOp(op) => return Err(ParseError::unresolved(op.param, range)),
            ItemKind::Macro(decl) => {
                self.ctx.macros.register(&decl);
                for signature in &decl.signatures {
                    debug!(name = %signature.name, arity = signature.params.len(), "registered macro");
                }
                ItemKind::Macro(decl)
            }
            ItemKind::Variable(decl) => {
                if let Some(name) = decl.name() {
                    self.ctx.declare(name.clone());
                }
                ItemKind::Variable(VariableDecl {
                    scope: decl.scope,
                    param: self.expand_parameter(&decl.param, range)?,
                })
            }
            ItemKind::ExistingPrm(assignment) => {
                if !self.ctx.is_declared(&assignment.name) {
                    return Err(ParseError::unresolved(assignment.name, range));
                }
                ItemKind::ExistingPrm(VariableAssignment {
                    equation: self.expand_equation(&assignment.equation, range)?,
                    ..assignment
                })
            }
            ItemKind::Site(site) => {
                let mut members = Vec::with_capacity(site.members.len());
                for member in site.members {
                    self.process(member, &mut members)?;
                }
                ItemKind::Site(SiteDecl {
                    name: site.name,
                    members,
                })
            }
            ItemKind::SiteStatement(statement) => ItemKind::SiteStatement(self.expand_site_statement(statement, range)?),
            ItemKind::Keyword { keyword, equation } => ItemKind::Keyword {
                keyword,
                equation: match equation {
                    Some(equation) => Some(self.expand_equation(&equation, range)?),
                    None => None,
                },
            },
            ItemKind::Param(param) => ItemKind::Param(self.expand_parameter(&param, range)?),
            ItemKind::Equation(equation) => ItemKind::Equation(self.expand_equation(&equation, range)?),
            ItemKind::Assignment { name, equation } => ItemKind::Assignment {
                name,
                equation: self.expand_equation(&equation, range)?,
            },
        };
        out.push(Item::new(kind, range));
        Ok(())
    }

    // =========================================================================
    // Directives and conditionals
    // =========================================================================

    fn directive(&mut self, directive: Directive, range: TextRange, out: &mut Vec<Item>) -> Result<(), ParseError> {
        let directive = match directive {
            Directive::Include(path) => return self.include(&path, range, out),
            Directive::Out(expr) => {
                let value = self.evaluate(&expr, range)?;
                out.push(Item::new(ItemKind::Expr(Expr::Literal(Literal::from_number(value))), range));
                return Ok(());
            }
            Directive::Define(name) => {
                debug!(symbol = %name, "defined symbol");
                self.ctx.symbols.define(name.clone());
                Directive::Define(name)
            }
            Directive::Undef(name) => {
                debug!(symbol = %name, "undefined symbol");
                self.ctx.symbols.undef(&name);
                Directive::Undef(name)
            }
            Directive::DeleteMacros(names) => {
                for name in &names {
                    if self.ctx.macros.delete(name) {
                        debug!(name = %name, "deleted macro");
                    }
                }
                Directive::DeleteMacros(names)
            }
            Directive::Prm { name, equation } => {
                let value = self.evaluate(&equation.body, range)?;
                debug!(name = %name, value, "assigned preprocessor variable");
                self.ctx.variables.set(name.clone(), value);
                Directive::Prm { name, equation }
            }
            Directive::Seed => Directive::Seed,
        };
        out.push(Item::new(ItemKind::Directive(directive), range));
        Ok(())
    }

    fn include(&mut self, path: &str, range: TextRange, out: &mut Vec<Item>) -> Result<(), ParseError> {
        if self.depth >= self.options.max_expansion_depth {
            return Err(ParseError::RecursionLimitExceeded {
                name: Name::new(path),
                limit: self.options.max_expansion_depth,
                range,
            });
        }
        let Some(text) = self.resolver.resolve(path) else {
            return Err(ParseError::IncludeNotFound {
                path: path.to_string(),
                range,
            });
        };
        debug!(path, depth = self.depth, "including file");

        let directive = match &self.source {
            ErrorSource::Root => self.call_site.unwrap_or(range),
            ErrorSource::Included { directive, .. } => *directive,
        };
        let outer = mem::replace(
            &mut self.source,
            ErrorSource::Included {
                path: path.to_string(),
                directive,
            },
        );

        let parse = parse_source_with(&text, self.vocabulary);
        for error in parse.errors {
            self.report(error);
        }
        if self.options.collect_comments {
            self.comments.extend(parse.comments);
        }

        self.depth += 1;
        let result = self.process_all(parse.items, out);
        self.depth -= 1;
        self.source = outer;
        result.map_err(|error| error.relocated(range))
    }

    /// Items of the first branch whose condition holds, or of `#else`
    fn select_branch(&mut self, conditional: Conditional, range: TextRange) -> Result<Option<Vec<Item>>, ParseError> {
        for (index, branch) in conditional.branches.into_iter().enumerate() {
            if self.condition_holds(&branch.condition, range)? {
                trace!(branch = index, "conditional branch taken");
                return Ok(Some(branch.items));
            }
        }
        trace!(otherwise = conditional.otherwise.is_some(), "no conditional branch taken");
        Ok(conditional.otherwise)
    }

    fn condition_holds(&mut self, condition: &Condition, range: TextRange) -> Result<bool, ParseError> {
        match condition {
            Condition::Defined { symbol, negated } => Ok(self.ctx.symbols.is_defined(symbol) != *negated),
            Condition::Expr(expr) => Ok(self.evaluate(expr, range)? != 0.0),
            // only meaningful once substituted inside an expansion
            Condition::Argument { param, .. } => Err(ParseError::unresolved(param.clone(), range)),
        }
    }

    /// Expand macros in `expr`, then evaluate it
    fn evaluate(&mut self, expr: &Expr, range: TextRange) -> Result<f64, ParseError> {
        let expanded = self.expand_expr(expr, range)?;
        evaluate(&expanded, &self.ctx.variables, range)
    }

    // =========================================================================
    // Macro invocation
    // =========================================================================

    /// An expression standing as a block item: macro invocations are
    /// replaced by their expansion, anything else is kept
    fn expr_item(&mut self, expr: Expr, range: TextRange, out: &mut Vec<Item>) -> Result<(), ParseError> {
        match expr {
            Expr::Call(invocation) if self.ctx.macros.contains(&invocation.name) => {
                let items = self.expand_call(&invocation.name, invocation.arguments, range)?;
                out.extend(items);
                Ok(())
            }
            Expr::Ident(name) if self.ctx.macros.contains(&name) => {
                let items = self.expand_call(&name, Vec::new(), range)?;
                out.extend(items);
                Ok(())
            }
            expr => {
                let expanded = self.expand_expr(&expr, range)?;
                out.push(Item::new(ItemKind::Expr(expanded), range));
                Ok(())
            }
        }
    }

    /// Bind `arguments` to the macro `name` and expand its body
    fn expand_call(&mut self, name: &Name, arguments: Vec<Argument>, range: TextRange) -> Result<Vec<Item>, ParseError> {
        let Some(entry) = self.ctx.macros.get(name).cloned() else {
            return Err(ParseError::unresolved(name.clone(), range));
        };

        // `f()` passes one empty argument to a one-parameter macro
        let arguments = if arguments.is_empty() && entry.arity() == 1 {
            vec![Argument::Empty]
        } else {
            arguments
        };
        if arguments.len() != entry.arity() {
            return Err(ParseError::ArityMismatch {
                name: name.clone(),
                expected: entry.arity(),
                found: arguments.len(),
                range,
            });
        }
        if self.depth >= self.options.max_expansion_depth {
            return Err(ParseError::RecursionLimitExceeded {
                name: name.clone(),
                limit: self.options.max_expansion_depth,
                range,
            });
        }

        let mut bound = Bindings::default();
        for (index, (param, argument)) in entry.signature.params.iter().zip(arguments).enumerate() {
            // by-reference arguments stay unexpanded until the body uses them
            let argument = if entry.signature.param_is_by_reference(index) {
                argument
            } else {
                self.expand_argument(argument, range)?
            };
            if let Some(param) = &param.name {
                bound.insert(param.clone(), argument);
            }
        }

        self.depth += 1;
        let outer_call = self.call_site;
        self.call_site = outer_call.or(Some(range));
        debug!(name = %name, depth = self.depth, "expanding macro");
        let unique = self.ctx.next_unique();
        let result = self.expand_body(&entry.body.items, &bound, &unique, range);
        self.call_site = outer_call;
        self.depth -= 1;
        // body ranges point into the declaration; report at the call
        result.map_err(|error| error.relocated(range))
    }

    fn expand_body(
        &mut self,
        body: &[Item],
        bound: &Bindings,
        unique: &Name,
        range: TextRange,
    ) -> Result<Vec<Item>, ParseError> {
        let mut out = Vec::new();
        for item in body {
            let substituted = Substituter::new(bound, unique, &mut self.ctx, range).item(item)?;
            if let Some(item) = substituted {
                self.process(item, &mut out)?;
            }
        }
        for item in &mut out {
            item.range = range;
        }
        Ok(out)
    }

    // =========================================================================
    // Expressions and values
    // =========================================================================

    fn expand_expr(&mut self, expr: &Expr, range: TextRange) -> Result<Expr, ParseError> {
        Ok(match expr {
            Expr::Call(invocation) if self.ctx.macros.contains(&invocation.name) => {
                self.inline_macro(&invocation.name, invocation.arguments.clone(), range)?
            }
            Expr::Call(invocation) if self.ctx.macros.is_deleted(&invocation.name) => {
                return Err(ParseError::unresolved(invocation.name.clone(), range));
            }
            Expr::Call(invocation) => {
                let mut arguments = Vec::with_capacity(invocation.arguments.len());
                for argument in &invocation.arguments {
                    arguments.push(self.expand_argument(argument.clone(), range)?);
                }
                Expr::Call(Invocation {
                    name: invocation.name.clone(),
                    arguments,
                    range: invocation.range,
                })
            }
            Expr::Ident(name) if self.ctx.macros.contains(name) => self.inline_macro(name, Vec::new(), range)?,
            Expr::Literal(_) | Expr::Ident(_) => expr.clone(),
            Expr::Unary { op, operand } => Expr::unary(*op, self.expand_expr(operand, range)?),
            Expr::Binary { op, lhs, rhs } => {
                Expr::binary(*op, self.expand_expr(lhs, range)?, self.expand_expr(rhs, range)?)
            }
            Expr::Paren(inner) => Expr::Paren(Box::new(self.expand_expr(inner, range)?)),
        })
    }

    /// A macro used inside an expression must expand to one expression
    fn inline_macro(&mut self, name: &Name, arguments: Vec<Argument>, range: TextRange) -> Result<Expr, ParseError> {
        let mut items = self.expand_call(name, arguments, range)?;
        match (items.pop(), items.is_empty()) {
            (Some(Item { kind: ItemKind::Expr(expr), .. }), true) => Ok(expr.parenthesized()),
            _ => Err(ParseError::syntax(
                format!("macro `{name}` does not expand to a single expression"),
                range,
                ErrorCode::E0405,
            )),
        }
    }

    fn expand_argument(&mut self, argument: Argument, range: TextRange) -> Result<Argument, ParseError> {
        Ok(match argument {
            Argument::Expr(expr) => Argument::Expr(self.expand_expr(&expr, range)?),
            Argument::Param(param) => Argument::Param(self.expand_parameter(&param, range)?),
            Argument::Equation(equation) => Argument::Equation(self.expand_equation(&equation, range)?),
            Argument::Empty => Argument::Empty,
        })
    }

    fn expand_equation(&mut self, equation: &Equation, range: TextRange) -> Result<Equation, ParseError> {
        Ok(Equation {
            op: equation.op,
            body: self.expand_expr(&equation.body, range)?,
            uncertainty: equation.uncertainty.clone(),
        })
    }

    fn expand_parameter(&mut self, param: &Parameter, range: TextRange) -> Result<Parameter, ParseError> {
        let value = match &param.value {
            Some(Value::Equation(equation)) => Some(Value::Equation(self.expand_equation(equation, range)?)),
            other => other.clone(),
        };
        Ok(Parameter {
            refinement: param.refinement,
            name: param.name.clone(),
            value,
        })
    }

    fn expand_site_statement(&mut self, statement: SiteStatement, range: TextRange) -> Result<SiteStatement, ParseError> {
        Ok(match statement {
            SiteStatement::Coordinate { axis, value } => SiteStatement::Coordinate {
                axis,
                value: self.expand_parameter(&value, range)?,
            },
            SiteStatement::Occupancy(mut occ) => {
                occ.value = self.expand_parameter(&occ.value, range)?;
                for modifier in &mut occ.modifiers {
                    modifier.value = self.expand_parameter(&modifier.value, range)?;
                }
                SiteStatement::Occupancy(occ)
            }
            SiteStatement::NumPosns(value) => SiteStatement::NumPosns(self.expand_parameter(&value, range)?),
            SiteStatement::RandXyz(value) => SiteStatement::RandXyz(self.expand_parameter(&value, range)?),
            SiteStatement::Inter(value) => SiteStatement::Inter(self.expand_parameter(&value, range)?),
            SiteStatement::MinR(value) => SiteStatement::MinR(self.expand_parameter(&value, range)?),
            SiteStatement::MaxR(value) => SiteStatement::MaxR(self.expand_parameter(&value, range)?),
            SiteStatement::Adps(mut components) => {
                for component in components.iter_mut() {
                    *component = self.expand_parameter(component, range)?;
                }
                SiteStatement::Adps(components)
            }
        })
    }
}
