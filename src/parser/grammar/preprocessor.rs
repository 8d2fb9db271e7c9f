//! Preprocessor directives, conditionals and macro declarations
//!
//! Two conditional families exist and must not be mixed: the document
//! family (`#if`, `#ifdef`, `#ifndef` ... `#endif`) and the macro family
//! (`#m_if`, `#m_ifarg` ... `#m_endif`). Macro-family directives, along
//! with `#m_argu`, `#m_first_word`, `#m_unique_not_refine` and `#m_out`,
//! are only meaningful inside a macro body.

use std::sync::Arc;

use smol_str::SmolStr;
use text_size::TextRange;

use super::expressions::{describe_current, nested, parse_equation, parse_expression, take_name};
use super::items::{BlockParser, expect_name, parse_items};
use crate::parser::errors::{BodyContext, ErrorCode, ParseError};
use crate::parser::syntax_kind::SyntaxKind;
use crate::syntax::{
    ArgTest, Branch, Condition, ConditionFamily, Conditional, Directive, ItemKind, MacroBody,
    MacroDecl, MacroOp, MacroOpKind, MacroParam, MacroSignature,
};

/// Parse the directive at the current token. Returns `Ok(None)` when the
/// directive was consumed and reported as misplaced.
pub fn parse_directive<P: BlockParser>(p: &mut P, ctx: BodyContext) -> Result<Option<ItemKind>, ParseError> {
    let kind = p.current_kind();
    let range = p.current_range();

    let argument_test = matches!(
        kind,
        SyntaxKind::M_CODE_DIR | SyntaxKind::M_EQN_DIR | SyntaxKind::M_CODE_REFINE_DIR | SyntaxKind::M_ONE_WORD_DIR
    );
    if kind.is_macro_directive() && !p.in_macro_body() && !kind.closes_branch() && !argument_test {
        // consume the whole construct so parsing resumes after it
        let text = p.current_text().to_string();
        parse_directive_kind(p, ctx)?;
        p.error(ParseError::syntax(
            format!("'{text}' is only allowed inside a macro body"),
            range,
            ErrorCode::E0306,
        ));
        return Ok(None);
    }
    parse_directive_kind(p, ctx)
}

fn parse_directive_kind<P: BlockParser>(p: &mut P, ctx: BodyContext) -> Result<Option<ItemKind>, ParseError> {
    let directive = match p.current_kind() {
        SyntaxKind::INCLUDE_DIR => {
            p.bump();
            if !p.at(SyntaxKind::STRING) {
                return Err(ParseError::syntax(
                    format!("expected file name string after '#include', found {}", describe_current(p)),
                    p.current_range(),
                    ErrorCode::E0902,
                ));
            }
            let text = p.current_text();
            let path = SmolStr::new(text.trim_matches('"'));
            p.bump();
            Directive::Include(path)
        }
        SyntaxKind::DELETE_MACROS_DIR => {
            p.bump();
            p.expect(SyntaxKind::L_BRACE, "'{' after '#delete_macros'", ErrorCode::E0902)?;
            let mut names = Vec::new();
            while p.at(SyntaxKind::IDENT) {
                names.push(take_name(p));
                p.eat(SyntaxKind::COMMA);
            }
            p.expect(SyntaxKind::R_BRACE, "'}' to close '#delete_macros'", ErrorCode::E0202)?;
            Directive::DeleteMacros(names)
        }
        SyntaxKind::DEFINE_DIR => {
            p.bump();
            Directive::Define(expect_name(p, "symbol after '#define'")?)
        }
        SyntaxKind::UNDEF_DIR => {
            p.bump();
            Directive::Undef(expect_name(p, "symbol after '#undef'")?)
        }
        SyntaxKind::SEED_DIR => {
            p.bump();
            Directive::Seed
        }
        SyntaxKind::PRM_DIR => {
            p.bump();
            let name = expect_name(p, "name after '#prm'")?;
            if !p.at(SyntaxKind::EQ) {
                return Err(ParseError::syntax(
                    format!("expected '=' after '#prm {name}', found {}", describe_current(p)),
                    p.current_range(),
                    ErrorCode::E0902,
                ));
            }
            let equation = parse_equation(p)?;
            Directive::Prm { name, equation }
        }
        SyntaxKind::OUT_DIR => {
            p.bump();
            Directive::Out(parse_expression(p, false)?)
        }
        SyntaxKind::IF_DIR | SyntaxKind::IFDEF_DIR | SyntaxKind::IFNDEF_DIR => {
            return nested(p, |p| parse_conditional(p, ctx, ConditionFamily::Document)).map(Some);
        }
        SyntaxKind::M_IF_DIR | SyntaxKind::M_IFARG_DIR => {
            return nested(p, |p| parse_conditional(p, ctx, ConditionFamily::Macro)).map(Some);
        }
        SyntaxKind::M_ARGU_DIR
        | SyntaxKind::M_FIRST_WORD_DIR
        | SyntaxKind::M_UNIQUE_NOT_REFINE_DIR
        | SyntaxKind::M_OUT_DIR => return parse_macro_op(p).map(Some),
        SyntaxKind::M_UNIQUE_DIR => return Ok(Some(ItemKind::Expr(parse_expression(p, false)?))),
        SyntaxKind::UNKNOWN_DIR => {
            let error = ParseError::syntax(
                format!("unknown directive '{}'", p.current_text()),
                p.current_range(),
                ErrorCode::E0901,
            );
            p.bump();
            p.error(error);
            return Ok(None);
        }
        _ => {
            // stray branch terminators and `#m_ifarg` tests out of place
            let error = ParseError::unexpected(&describe_current(p), ctx, p.current_range());
            p.bump();
            p.error(error);
            return Ok(None);
        }
    };
    Ok(Some(ItemKind::Directive(directive)))
}

fn parse_macro_op<P: BlockParser>(p: &mut P) -> Result<ItemKind, ParseError> {
    let kind = match p.current_kind() {
        SyntaxKind::M_ARGU_DIR => MacroOpKind::Argu,
        SyntaxKind::M_FIRST_WORD_DIR => MacroOpKind::FirstWord,
        SyntaxKind::M_UNIQUE_NOT_REFINE_DIR => MacroOpKind::UniqueNotRefine,
        _ => MacroOpKind::Out,
    };
    p.bump();
    let param = expect_name(p, "macro parameter name")?;
    Ok(ItemKind::MacroOp(MacroOp { kind, param }))
}

// =============================================================================
// CONDITIONALS
// =============================================================================

struct Terminators {
    elseif: SyntaxKind,
    otherwise: SyntaxKind,
    endif: SyntaxKind,
    foreign_endif: SyntaxKind,
}

impl Terminators {
    fn of(family: ConditionFamily) -> Self {
        match family {
            ConditionFamily::Document => Self {
                elseif: SyntaxKind::ELSEIF_DIR,
                otherwise: SyntaxKind::ELSE_DIR,
                endif: SyntaxKind::ENDIF_DIR,
                foreign_endif: SyntaxKind::M_ENDIF_DIR,
            },
            ConditionFamily::Macro => Self {
                elseif: SyntaxKind::M_ELSEIF_DIR,
                otherwise: SyntaxKind::M_ELSE_DIR,
                endif: SyntaxKind::M_ENDIF_DIR,
                foreign_endif: SyntaxKind::ENDIF_DIR,
            },
        }
    }
}

fn ends_branch(kind: SyntaxKind) -> bool {
    kind.closes_branch() || kind == SyntaxKind::R_BRACE
}

fn parse_conditional<P: BlockParser>(
    p: &mut P,
    ctx: BodyContext,
    family: ConditionFamily,
) -> Result<ItemKind, ParseError> {
    let opening = p.current_range();
    let opening_text = p.current_text().to_string();
    let terminators = Terminators::of(family);

    let condition = parse_opening_condition(p)?;
    let items = parse_items(p, ctx, ends_branch);
    let mut branches = vec![Branch { condition, items }];
    let mut otherwise = None;

    loop {
        let kind = p.current_kind();
        if kind == terminators.endif {
            p.bump();
            break;
        }
        if kind == terminators.elseif && otherwise.is_none() {
            let condition = parse_expr_condition(p)?;
            let items = parse_items(p, ctx, ends_branch);
            branches.push(Branch { condition, items });
            continue;
        }
        if kind == terminators.otherwise && otherwise.is_none() {
            p.bump();
            otherwise = Some(parse_items(p, ctx, ends_branch));
            continue;
        }
        if kind == terminators.foreign_endif {
            let error = ParseError::syntax(
                format!("'{}' cannot close '{opening_text}'", p.current_text()),
                p.current_range(),
                ErrorCode::E0207,
            );
            p.bump();
            p.error(error);
            break;
        }
        if kind.closes_branch() {
            // out of order or foreign branch: left for the enclosing block to report
            break;
        }
        p.error(ParseError::syntax(
            format!("'{opening_text}' is never closed"),
            opening,
            ErrorCode::E0206,
        ));
        break;
    }

    Ok(ItemKind::Conditional(Conditional {
        family,
        branches,
        otherwise,
    }))
}

fn parse_opening_condition<P: BlockParser>(p: &mut P) -> Result<Condition, ParseError> {
    match p.current_kind() {
        SyntaxKind::IFDEF_DIR => {
            p.bump();
            let negated = p.eat(SyntaxKind::BANG);
            let symbol = expect_name(p, "symbol after '#ifdef'")?;
            Ok(Condition::Defined { symbol, negated })
        }
        SyntaxKind::IFNDEF_DIR => {
            p.bump();
            let symbol = expect_name(p, "symbol after '#ifndef'")?;
            Ok(Condition::Defined { symbol, negated: true })
        }
        SyntaxKind::M_IFARG_DIR => {
            p.bump();
            let param = expect_name(p, "macro parameter after '#m_ifarg'")?;
            let test = match p.current_kind() {
                SyntaxKind::M_CODE_DIR => ArgTest::Code,
                SyntaxKind::M_EQN_DIR => ArgTest::Eqn,
                SyntaxKind::M_CODE_REFINE_DIR => ArgTest::CodeRefine,
                SyntaxKind::M_ONE_WORD_DIR => ArgTest::OneWord,
                SyntaxKind::STRING => ArgTest::Text(SmolStr::new(p.current_text().trim_matches('"'))),
                _ => {
                    return Err(ParseError::syntax(
                        format!(
                            "expected '#m_code', '#m_eqn', '#m_code_refine', '#m_one_word' or a string, found {}",
                            describe_current(p)
                        ),
                        p.current_range(),
                        ErrorCode::E0902,
                    ));
                }
            };
            p.bump();
            Ok(Condition::Argument { param, test })
        }
        _ => parse_expr_condition(p),
    }
}

/// `#if [=] expr ;` and the `#elseif` / `#m_if` / `#m_elseif` forms,
/// with the directive as the current token
fn parse_expr_condition<P: BlockParser>(p: &mut P) -> Result<Condition, ParseError> {
    p.bump();
    p.eat(SyntaxKind::EQ);
    let expr = parse_expression(p, true)?;
    p.expect(SyntaxKind::SEMICOLON, "';' after condition", ErrorCode::E0201)?;
    Ok(Condition::Expr(expr))
}

// =============================================================================
// MACROS
// =============================================================================

/// `macro [&] name [(params)] { body }` or `#list sig, sig ... { body }`
pub fn parse_macro<P: BlockParser>(p: &mut P) -> Result<ItemKind, ParseError> {
    let is_list = p.at(SyntaxKind::LIST_DIR);
    p.bump();

    let mut signatures = Vec::new();
    loop {
        signatures.push(parse_signature(p)?);
        if !is_list {
            break;
        }
        p.eat(SyntaxKind::COMMA);
        if !p.at_any(&[SyntaxKind::IDENT, SyntaxKind::AMP]) {
            break;
        }
    }

    let open = p.expect(SyntaxKind::L_BRACE, "'{' to open the macro body", ErrorCode::E0902)?;
    p.enter_macro_body();
    let ctx = if is_list {
        BodyContext::ListBody
    } else {
        BodyContext::MacroBody
    };
    let items = parse_items(p, ctx, |kind| kind == SyntaxKind::R_BRACE);
    p.exit_macro_body();
    if !p.eat(SyntaxKind::R_BRACE) {
        p.error(ParseError::syntax("macro body is never closed", open, ErrorCode::E0202));
    }

    Ok(ItemKind::Macro(MacroDecl {
        signatures,
        body: Arc::new(MacroBody { items }),
        is_list,
    }))
}

fn parse_signature<P: BlockParser>(p: &mut P) -> Result<MacroSignature, ParseError> {
    let start = p.current_range().start();
    let by_reference = p.eat(SyntaxKind::AMP);
    if !p.at(SyntaxKind::IDENT) {
        return Err(ParseError::syntax(
            format!("expected macro name, found {}", describe_current(p)),
            p.current_range(),
            ErrorCode::E0301,
        ));
    }
    let name = take_name(p);
    let parenthesized = p.at(SyntaxKind::L_PAREN) && !p.is_spaced(0);
    let params = if parenthesized { parse_params(p)? } else { Vec::new() };
    Ok(MacroSignature {
        name,
        by_reference,
        params,
        parenthesized,
        range: TextRange::new(start, p.prev_end()),
    })
}

/// `(a, &b, , c)`; `()` declares no parameters
fn parse_params<P: BlockParser>(p: &mut P) -> Result<Vec<MacroParam>, ParseError> {
    p.bump();
    let mut params = Vec::new();
    if p.eat(SyntaxKind::R_PAREN) {
        return Ok(params);
    }
    loop {
        let by_reference = p.eat(SyntaxKind::AMP);
        let name = p.at(SyntaxKind::IDENT).then(|| take_name(p));
        params.push(MacroParam { name, by_reference });
        if p.eat(SyntaxKind::COMMA) {
            continue;
        }
        if p.eat(SyntaxKind::R_PAREN) {
            break;
        }
        return Err(ParseError::syntax(
            format!("expected ',' or ')' in parameter list, found {}", describe_current(p)),
            p.current_range(),
            ErrorCode::E0902,
        ));
    }
    Ok(params)
}
