//! Block item parsing
//!
//! A block is a flat sequence of items: the document itself, a macro body,
//! a conditional branch, or the members of a site. Each item is parsed
//! independently; a failing item is reported and the parser resynchronizes
//! at the next `;`, the enclosing `}` or a branch terminator.

use text_size::TextRange;

use super::expressions::{
    ExpressionParser, describe_current, nested, parse_equation, parse_expression,
    parse_parameter_marker, parse_refinement_flag, parse_signed_literal, starts_expression, take_name,
};
use super::{preprocessor, site};
use crate::base::Name;
use crate::keywords::SiteKeyword;
use crate::parser::errors::{BodyContext, ErrorCode, ParseError};
use crate::parser::syntax_kind::SyntaxKind;
use crate::syntax::{
    Item, ItemKind, Parameter, Value, VariableAssignment, VariableDecl, VariableScope,
};

/// Trait for block-level parsing operations
pub trait BlockParser: ExpressionParser {
    /// Whether `word` is a keyword of the control-language vocabulary
    fn is_vocabulary(&self, word: &str) -> bool;

    /// Inside a `macro` or `#list` body (at any depth)
    fn in_macro_body(&self) -> bool;

    fn enter_macro_body(&mut self);
    fn exit_macro_body(&mut self);

    /// Record an error and keep going
    fn error(&mut self, error: ParseError);

    /// Token position, for progress checks
    fn get_pos(&self) -> usize;
}

/// Parse a whole document
pub fn parse_document<P: BlockParser>(p: &mut P) -> Vec<Item> {
    parse_items(p, BodyContext::TopLevel, |_| false)
}

/// Parse items until `stop` matches the current token or input ends
pub fn parse_items<P: BlockParser>(
    p: &mut P,
    ctx: BodyContext,
    stop: impl Fn(SyntaxKind) -> bool,
) -> Vec<Item> {
    let mut items = Vec::new();
    while !p.at(SyntaxKind::EOF) && !stop(p.current_kind()) {
        let start_pos = p.get_pos();
        match parse_item(p, ctx) {
            Ok(Some(item)) => items.push(item),
            Ok(None) => {}
            Err(error) => {
                p.error(error);
                recover(p);
            }
        }

        // Safety: if we didn't make progress, skip the token to avoid infinite loop
        if p.get_pos() == start_pos {
            p.bump();
        }
    }
    items
}

/// Skip to a point where parsing can resume: after `;`, or before `}`,
/// a branch terminator or end of input
pub fn recover<P: BlockParser>(p: &mut P) {
    loop {
        match p.current_kind() {
            SyntaxKind::EOF | SyntaxKind::R_BRACE => break,
            SyntaxKind::SEMICOLON => {
                p.bump();
                break;
            }
            kind if kind.closes_branch() => break,
            _ => p.bump(),
        }
    }
}

/// Parse one item. `Ok(None)` means the tokens were consumed and any
/// problem already reported.
pub fn parse_item<P: BlockParser>(p: &mut P, ctx: BodyContext) -> Result<Option<Item>, ParseError> {
    let start = p.current_range().start();
    let kind = match p.current_kind() {
        SyntaxKind::PRM_KW | SyntaxKind::LOCAL_KW => parse_variable_decl(p)?,
        SyntaxKind::EXISTING_PRM_KW => parse_existing_prm(p)?,
        SyntaxKind::SITE_KW => site::parse_site(p)?,
        SyntaxKind::MACRO_KW | SyntaxKind::LIST_DIR => {
            let inside_macro = p.in_macro_body();
            let range = p.current_range();
            let decl = nested(p, preprocessor::parse_macro)?;
            if inside_macro {
                p.error(ParseError::syntax(
                    "macros cannot be declared inside a macro body",
                    range,
                    ErrorCode::E0307,
                ));
                return Ok(None);
            }
            decl
        }
        kind if kind.is_directive() => match preprocessor::parse_directive(p, ctx)? {
            Some(kind) => kind,
            None => return Ok(None),
        },
        SyntaxKind::AT | SyntaxKind::BANG => ItemKind::Param(parse_parameter_marker(p)?),
        kind if kind.is_assignment_op() => ItemKind::Equation(parse_equation(p)?),
        SyntaxKind::IDENT => parse_word_item(p, ctx)?,
        SyntaxKind::L_BRACE if ctx == BodyContext::ListBody => nested(p, parse_delimited_block)?,
        kind if starts_expression(kind) => ItemKind::Expr(parse_expression(p, false)?),
        SyntaxKind::R_BRACE => {
            let range = p.current_range();
            p.bump();
            p.error(ParseError::syntax("unexpected '}'", range, ErrorCode::E0205));
            return Ok(None);
        }
        _ => {
            let error = ParseError::unexpected(&describe_current(p), ctx, p.current_range());
            p.bump();
            p.error(error);
            return Ok(None);
        }
    };
    Ok(Some(Item::new(kind, TextRange::new(start, p.prev_end()))))
}

/// An item starting with an identifier
fn parse_word_item<P: BlockParser>(p: &mut P, ctx: BodyContext) -> Result<ItemKind, ParseError> {
    let text = p.current_text();

    // `word(` is an invocation whatever the word
    if p.peek_kind(1) == SyntaxKind::L_PAREN && !p.is_spaced(1) {
        return Ok(ItemKind::Expr(parse_expression(p, false)?));
    }

    if let Some(keyword) = SiteKeyword::from_word(text) {
        if ctx == BodyContext::SiteBody || p.in_macro_body() {
            return site::parse_site_statement(p, keyword);
        }
    }

    if p.is_vocabulary(text) {
        let keyword = Name::new(text);
        p.bump();
        let equation = if p.at(SyntaxKind::EQ) {
            Some(parse_equation(p)?)
        } else {
            None
        };
        return Ok(ItemKind::Keyword { keyword, equation });
    }

    if p.peek_kind(1).is_assignment_op() {
        let name = take_name(p);
        let equation = parse_equation(p)?;
        return Ok(ItemKind::Assignment { name, equation });
    }

    Ok(ItemKind::Expr(parse_expression(p, false)?))
}

/// Any identifier (keywords included) or `#m_unique`
pub fn expect_name<P: BlockParser>(p: &mut P, what: &str) -> Result<Name, ParseError> {
    if p.at(SyntaxKind::IDENT) || p.at(SyntaxKind::M_UNIQUE_DIR) {
        Ok(take_name(p))
    } else {
        Err(ParseError::syntax(
            format!("expected {what}, found {}", describe_current(p)),
            p.current_range(),
            ErrorCode::E0301,
        ))
    }
}

/// `prm [@|!] name (= expr; | literal)`, same for `local`
fn parse_variable_decl<P: BlockParser>(p: &mut P) -> Result<ItemKind, ParseError> {
    let scope = if p.at(SyntaxKind::PRM_KW) {
        VariableScope::Prm
    } else {
        VariableScope::Local
    };
    p.bump();
    let refinement = parse_refinement_flag(p);
    let name = expect_name(p, "variable name")?;

    let value = if p.at(SyntaxKind::EQ) {
        Some(Value::Equation(parse_equation(p)?))
    } else if let Some(literal) = parse_signed_literal(p)? {
        Some(Value::Literal(literal))
    } else if p.in_macro_body() {
        // the value may arrive through a macro parameter
        None
    } else {
        return Err(ParseError::syntax(
            format!("expected a value for '{name}', found {}", describe_current(p)),
            p.current_range(),
            ErrorCode::E0304,
        ));
    };

    Ok(ItemKind::Variable(VariableDecl {
        scope,
        param: Parameter {
            refinement,
            name: Some(name),
            value,
        },
    }))
}

/// `existing_prm [@|!] name op expr;`
fn parse_existing_prm<P: BlockParser>(p: &mut P) -> Result<ItemKind, ParseError> {
    p.bump();
    let refinement = parse_refinement_flag(p);
    let name = expect_name(p, "parameter name")?;
    if !p.current_kind().is_assignment_op() {
        return Err(ParseError::syntax(
            format!("expected '=' or compound assignment after '{name}', found {}", describe_current(p)),
            p.current_range(),
            ErrorCode::E0902,
        ));
    }
    let equation = parse_equation(p)?;
    Ok(ItemKind::ExistingPrm(VariableAssignment {
        refinement,
        name,
        equation,
    }))
}

/// `{ items }` inside a `#list` body
fn parse_delimited_block<P: BlockParser>(p: &mut P) -> Result<ItemKind, ParseError> {
    let open = p.current_range();
    p.bump();
    let items = parse_items(p, BodyContext::DelimitedBlock, |kind| kind == SyntaxKind::R_BRACE);
    if !p.eat(SyntaxKind::R_BRACE) {
        return Err(ParseError::syntax("'{' is never closed", open, ErrorCode::E0202));
    }
    Ok(ItemKind::Block(items))
}

