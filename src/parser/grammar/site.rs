//! Site declarations
//!
//! ```text
//! site O1 x @ 0.25 y 0.5 z = 1/3; occ O-2 1 beq @ 0.8
//!     adps u11 0.01 u22 0.01 u33 0.01 u12 0 u13 0 u23 0
//! ```
//!
//! A site has no closing token: it extends while the next token is a site
//! keyword, a directive, or a call (macros emitting site statements).

use text_size::TextSize;

use super::expressions::{
    ExpressionParser, at_parameter_name, describe_current, parse_equation, parse_refinement_flag,
    parse_signed_literal, take_name,
};
use super::items::{BlockParser, parse_item, recover};
use crate::base::Name;
use crate::keywords::{ADPS_ORDER, SiteKeyword};
use crate::parser::errors::{BodyContext, ErrorCode, ParseError};
use crate::parser::syntax_kind::SyntaxKind;
use crate::syntax::{
    Axis, ItemKind, OccModifier, Occupancy, Parameter, Refinement, SiteDecl, SiteStatement, Value,
};

pub fn parse_site<P: BlockParser>(p: &mut P) -> Result<ItemKind, ParseError> {
    let keyword_end = p.current_range().end();
    p.bump();
    let name = parse_free_word(p, &[SyntaxKind::IDENT, SyntaxKind::INTEGER, SyntaxKind::FLOAT])
        .ok_or_else(|| ParseError::at_offset("expected site name after 'site'", keyword_end, ErrorCode::E0301))?;

    let mut members = Vec::new();
    while at_site_member(p) {
        let start_pos = p.get_pos();
        match parse_item(p, BodyContext::SiteBody) {
            Ok(Some(item)) => members.push(item),
            Ok(None) => {}
            Err(error) => {
                p.error(error);
                recover(p);
            }
        }
        if p.get_pos() == start_pos {
            break;
        }
    }

    Ok(ItemKind::Site(SiteDecl { name, members }))
}

fn current_site_keyword<P: ExpressionParser>(p: &P) -> Option<SiteKeyword> {
    match p.current_kind() {
        SyntaxKind::IDENT => SiteKeyword::from_word(p.current_text()),
        _ => None,
    }
}

fn at_site_member<P: BlockParser>(p: &P) -> bool {
    match p.current_kind() {
        SyntaxKind::IDENT => {
            current_site_keyword(p).is_some()
                || (p.peek_kind(1) == SyntaxKind::L_PAREN && !p.is_spaced(1))
        }
        kind => kind.is_directive() && !kind.closes_branch(),
    }
}

/// A word made of touching tokens, such as `O1`, `Fe+3` or `C12a`.
/// `first` lists the kinds allowed to start it.
fn parse_free_word<P: ExpressionParser>(p: &mut P, first: &[SyntaxKind]) -> Option<Name> {
    if p.at(SyntaxKind::M_UNIQUE_DIR) {
        return Some(take_name(p));
    }
    if !p.at_any(first) {
        return None;
    }
    let mut word = String::from(p.current_text());
    p.bump();
    while !p.is_spaced(0)
        && p.at_any(&[
            SyntaxKind::IDENT,
            SyntaxKind::INTEGER,
            SyntaxKind::FLOAT,
            SyntaxKind::PLUS,
            SyntaxKind::MINUS,
            SyntaxKind::STAR,
        ])
    {
        word.push_str(p.current_text());
        p.bump();
    }
    Some(Name::from(word))
}

/// One site statement, with the keyword as the current token
pub fn parse_site_statement<P: BlockParser>(p: &mut P, keyword: SiteKeyword) -> Result<ItemKind, ParseError> {
    let keyword_range = p.current_range();
    p.bump();

    let statement = match keyword {
        SiteKeyword::X => coordinate(p, Axis::X)?,
        SiteKeyword::Y => coordinate(p, Axis::Y)?,
        SiteKeyword::Z => coordinate(p, Axis::Z)?,
        SiteKeyword::Occ => SiteStatement::Occupancy(parse_occupancy(p, keyword_range.end())?),
        SiteKeyword::NumPosns | SiteKeyword::RandXyz | SiteKeyword::Inter | SiteKeyword::MinR | SiteKeyword::MaxR => {
            let value = parse_value_slot(p, keyword.is_fixed_value())?;
            match keyword {
                SiteKeyword::NumPosns => SiteStatement::NumPosns(value),
                SiteKeyword::RandXyz => SiteStatement::RandXyz(value),
                SiteKeyword::Inter => SiteStatement::Inter(value),
                SiteKeyword::MinR => SiteStatement::MinR(value),
                _ => SiteStatement::MaxR(value),
            }
        }
        SiteKeyword::Adps => SiteStatement::Adps(Box::new(parse_adps(p)?)),
        _ => {
            let parent = if keyword.as_str().starts_with('u') { "adps" } else { "occ" };
            return Err(ParseError::syntax(
                format!("'{}' is only valid after '{parent}'", keyword.as_str()),
                keyword_range,
                ErrorCode::E0901,
            ));
        }
    };
    Ok(ItemKind::SiteStatement(statement))
}

fn coordinate<P: BlockParser>(p: &mut P, axis: Axis) -> Result<SiteStatement, ParseError> {
    Ok(SiteStatement::Coordinate {
        axis,
        value: parse_value_slot(p, false)?,
    })
}

fn parse_occupancy<P: BlockParser>(p: &mut P, keyword_end: TextSize) -> Result<Occupancy, ParseError> {
    let atom = parse_free_word(p, &[SyntaxKind::IDENT])
        .ok_or_else(|| ParseError::at_offset("expected atom type after 'occ'", keyword_end, ErrorCode::E0303))?;
    let value = parse_value_slot(p, false)?;

    let mut modifiers = Vec::new();
    while let Some(keyword @ (SiteKeyword::Beq | SiteKeyword::ScaleOcc)) = current_site_keyword(p) {
        p.bump();
        modifiers.push(OccModifier {
            keyword,
            value: parse_value_slot(p, false)?,
        });
    }
    Ok(Occupancy { atom, value, modifiers })
}

fn parse_adps<P: BlockParser>(p: &mut P) -> Result<[Parameter; 6], ParseError> {
    let mut components: [Parameter; 6] = Default::default();
    for (component, expected) in components.iter_mut().zip(ADPS_ORDER) {
        if current_site_keyword(p) != Some(expected) {
            return Err(ParseError::syntax(
                format!("expected '{}' in adps block, found {}", expected.as_str(), describe_current(p)),
                p.current_range(),
                ErrorCode::E0305,
            ));
        }
        p.bump();
        *component = parse_value_slot(p, false)?;
    }
    Ok(components)
}

/// `= expr;` or `[@|!] [name] [literal]`. A bare `@` is allowed.
/// `fixed` slots take a value but no refinement flag.
pub fn parse_value_slot<P: BlockParser>(p: &mut P, fixed: bool) -> Result<Parameter, ParseError> {
    if p.at(SyntaxKind::EQ) {
        return Ok(Parameter {
            value: Some(Value::Equation(parse_equation(p)?)),
            ..Parameter::default()
        });
    }

    let flag_range = p.current_range();
    let refinement = parse_refinement_flag(p);
    if fixed && refinement != Refinement::Plain {
        return Err(ParseError::syntax(
            "refinement flags are not allowed here",
            flag_range,
            ErrorCode::E0302,
        ));
    }
    let name = at_parameter_name(p).then(|| take_name(p));
    let value = parse_signed_literal(p)?.map(Value::Literal);

    let complete = value.is_some()
        || (refinement == Refinement::Refined && name.is_none())
        || (name.is_some() && p.in_macro_body());
    if !complete {
        return Err(ParseError::syntax(
            format!("expected a value, found {}", describe_current(p)),
            p.current_range(),
            ErrorCode::E0304,
        ));
    }

    Ok(Parameter {
        refinement,
        name,
        value,
    })
}
