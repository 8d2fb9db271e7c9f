//! The crate-wide error type
//!
//! Every diagnostic the front end produces is a [`ParseError`]: lexical and
//! syntactic problems found while parsing, and macro/preprocessor problems
//! found while expanding. Each variant carries the source range it refers to.

use text_size::{TextRange, TextSize};
use thiserror::Error;

use super::codes::ErrorCode;
use super::context::BodyContext;
use crate::base::Name;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Malformed token: invalid character, unterminated comment or string,
    /// numeric literal out of range
    #[error("{code}: {message}")]
    Lex {
        message: String,
        range: TextRange,
        code: ErrorCode,
    },

    /// Token sequence that does not form a valid statement
    #[error("{code}: {message}")]
    Syntax {
        message: String,
        range: TextRange,
        code: ErrorCode,
    },

    /// Name used before it was declared, or after it was deleted
    #[error("E0501: unresolved reference `{name}`")]
    UnresolvedReference { name: Name, range: TextRange },

    /// Macro or include nesting went past the configured depth
    #[error("E0502: expanding `{name}` exceeded the expansion depth limit of {limit}")]
    RecursionLimitExceeded {
        name: Name,
        limit: usize,
        range: TextRange,
    },

    #[error("E0503: macro `{name}` takes {expected} argument(s) but {found} were supplied")]
    ArityMismatch {
        name: Name,
        expected: usize,
        found: usize,
        range: TextRange,
    },

    /// Preprocessor condition or output that is not numeric
    #[error("E0504: {message}")]
    ConditionEvaluation { message: String, range: TextRange },

    #[error("E0505: include file `{path}` not found")]
    IncludeNotFound { path: String, range: TextRange },

    #[error("E0506: parse cancelled")]
    Cancelled { range: TextRange },
}

impl ParseError {
    pub fn lex(message: impl Into<String>, range: TextRange, code: ErrorCode) -> Self {
        Self::Lex {
            message: message.into(),
            range,
            code,
        }
    }

    pub fn syntax(message: impl Into<String>, range: TextRange, code: ErrorCode) -> Self {
        Self::Syntax {
            message: message.into(),
            range,
            code,
        }
    }

    /// Create a syntax error at a specific offset with zero-width range
    pub fn at_offset(message: impl Into<String>, offset: TextSize, code: ErrorCode) -> Self {
        Self::syntax(message, TextRange::empty(offset), code)
    }

    /// Syntax error phrased from the body being parsed, e.g.
    /// "unexpected '}' in site body, expected site keywords ..."
    pub fn unexpected(found: &str, context: BodyContext, range: TextRange) -> Self {
        let message = format!(
            "unexpected {} {}, expected {}",
            found,
            context.description(),
            context.expected_description()
        );
        Self::syntax(message, range, ErrorCode::E0901)
    }

    pub fn unresolved(name: impl Into<Name>, range: TextRange) -> Self {
        Self::UnresolvedReference {
            name: name.into(),
            range,
        }
    }

    pub fn condition(message: impl Into<String>, range: TextRange) -> Self {
        Self::ConditionEvaluation {
            message: message.into(),
            range,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Lex { code, .. } | Self::Syntax { code, .. } => *code,
            Self::UnresolvedReference { .. } => ErrorCode::E0501,
            Self::RecursionLimitExceeded { .. } => ErrorCode::E0502,
            Self::ArityMismatch { .. } => ErrorCode::E0503,
            Self::ConditionEvaluation { .. } => ErrorCode::E0504,
            Self::IncludeNotFound { .. } => ErrorCode::E0505,
            Self::Cancelled { .. } => ErrorCode::E0506,
        }
    }

    pub fn range(&self) -> TextRange {
        match self {
            Self::Lex { range, .. }
            | Self::Syntax { range, .. }
            | Self::UnresolvedReference { range, .. }
            | Self::RecursionLimitExceeded { range, .. }
            | Self::ArityMismatch { range, .. }
            | Self::ConditionEvaluation { range, .. }
            | Self::IncludeNotFound { range, .. }
            | Self::Cancelled { range } => *range,
        }
    }

    /// The same error reported at `at`
    pub fn relocated(mut self, at: TextRange) -> Self {
        match &mut self {
            Self::Lex { range, .. }
            | Self::Syntax { range, .. }
            | Self::UnresolvedReference { range, .. }
            | Self::RecursionLimitExceeded { range, .. }
            | Self::ArityMismatch { range, .. }
            | Self::ConditionEvaluation { range, .. }
            | Self::IncludeNotFound { range, .. }
            | Self::Cancelled { range } => *range = at,
        }
        self
    }

    pub fn is_lex(&self) -> bool {
        matches!(self, Self::Lex { .. })
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self, Self::Syntax { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_display() {
        let err = ParseError::syntax(
            "expected ';'",
            TextRange::new(TextSize::new(10), TextSize::new(11)),
            ErrorCode::E0201,
        );

        assert_eq!(err.to_string(), "E0201: expected ';'");
        assert_eq!(err.code(), ErrorCode::E0201);
        assert_eq!(err.range(), TextRange::new(TextSize::new(10), TextSize::new(11)));
        assert!(err.is_syntax());
    }

    #[test]
    fn test_at_offset_is_empty() {
        let err = ParseError::at_offset("missing atom type", TextSize::new(7), ErrorCode::E0303);
        assert!(err.range().is_empty());
        assert_eq!(err.range().start(), TextSize::new(7));
    }

    #[test]
    fn test_relocated_keeps_code() {
        let err = ParseError::unresolved("foo", TextRange::empty(TextSize::new(3)))
            .relocated(TextRange::new(TextSize::new(20), TextSize::new(25)));
        assert_eq!(err.code(), ErrorCode::E0501);
        assert_eq!(err.range(), TextRange::new(TextSize::new(20), TextSize::new(25)));
    }

    #[test]
    fn test_unresolved_reference() {
        let err = ParseError::unresolved("foo", TextRange::empty(TextSize::new(0)));
        assert_eq!(err.code(), ErrorCode::E0501);
        assert!(err.to_string().contains("`foo`"));
    }

    #[test]
    fn test_arity_message() {
        let err = ParseError::ArityMismatch {
            name: "pv".into(),
            expected: 2,
            found: 3,
            range: TextRange::empty(TextSize::new(0)),
        };
        assert_eq!(
            err.to_string(),
            "E0503: macro `pv` takes 2 argument(s) but 3 were supplied"
        );
    }

    #[test]
    fn test_unexpected_in_context() {
        let err = ParseError::unexpected(
            "'}'",
            BodyContext::SiteBody,
            TextRange::empty(TextSize::new(3)),
        );
        assert!(err.to_string().contains("in site body"));
        assert!(err.to_string().contains("expected"));
    }
}
