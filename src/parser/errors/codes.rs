//! Error code definitions for diagnostics
//!
//! Error codes follow a naming convention: E{category}{number}
//! - E01xx: Lexical errors (invalid tokens)
//! - E02xx: Structural errors (braces, semicolons, conditional chains)
//! - E03xx: Declaration errors (parameters, sites, macros)
//! - E04xx: Expression errors
//! - E05xx: Macro and preprocessor errors
//! - E09xx: Generic/fallback errors

use std::fmt;

/// Error codes for diagnostics
///
/// Each error code represents a specific category of error,
/// enabling filtering and documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // E01xx: Lexical errors (invalid tokens)
    // =========================================================================
    /// Invalid or unexpected character in source
    E0101,
    /// Unterminated string literal
    E0102,
    /// Unterminated block comment
    E0103,
    /// Numeric literal out of range
    E0104,

    // =========================================================================
    // E02xx: Structural errors
    // =========================================================================
    /// Missing semicolon
    E0201,
    /// Unclosed brace `{`
    E0202,
    /// Unclosed parenthesis `(`
    E0203,
    /// Unexpected closing delimiter
    E0205,
    /// Conditional chain without its terminator
    E0206,
    /// Conditional chain closed by the other family's directive
    E0207,
    /// Expressions, blocks or conditionals nested too deeply
    E0208,

    // =========================================================================
    // E03xx: Declaration errors
    // =========================================================================
    /// Missing identifier/name
    E0301,
    /// Refinement flag where only a fixed value is allowed
    E0302,
    /// `occ` without an atom type
    E0303,
    /// Missing or malformed value
    E0304,
    /// `adps` components missing or out of order
    E0305,
    /// Macro-scoped directive outside a macro body
    E0306,
    /// Macro declared inside a macro body
    E0307,

    // =========================================================================
    // E04xx: Expression errors
    // =========================================================================
    /// Unclosed argument list
    E0404,
    /// Invalid argument in macro call
    E0405,
    /// Missing expression where expected
    E0406,

    // =========================================================================
    // E05xx: Macro and preprocessor errors
    // =========================================================================
    /// Reference to an undeclared or deleted name
    E0501,
    /// Expansion depth limit exceeded
    E0502,
    /// Wrong number of macro arguments
    E0503,
    /// Condition could not be evaluated to a number
    E0504,
    /// Include path could not be resolved
    E0505,
    /// Parse cancelled
    E0506,

    // =========================================================================
    // E09xx: Generic/fallback errors
    // =========================================================================
    /// Unexpected token in current context
    E0901,
    /// Expected a specific token
    E0902,
}

impl ErrorCode {
    /// Get the string representation of the error code (e.g., "E0201")
    pub fn as_str(&self) -> &'static str {
        match self {
            // Lexical
            Self::E0101 => "E0101",
            Self::E0102 => "E0102",
            Self::E0103 => "E0103",
            Self::E0104 => "E0104",
            // Structural
            Self::E0201 => "E0201",
            Self::E0202 => "E0202",
            Self::E0203 => "E0203",
            Self::E0205 => "E0205",
            Self::E0206 => "E0206",
            Self::E0207 => "E0207",
            Self::E0208 => "E0208",
            // Declaration
            Self::E0301 => "E0301",
            Self::E0302 => "E0302",
            Self::E0303 => "E0303",
            Self::E0304 => "E0304",
            Self::E0305 => "E0305",
            Self::E0306 => "E0306",
            Self::E0307 => "E0307",
            // Expression
            Self::E0404 => "E0404",
            Self::E0405 => "E0405",
            Self::E0406 => "E0406",
            // Macro/preprocessor
            Self::E0501 => "E0501",
            Self::E0502 => "E0502",
            Self::E0503 => "E0503",
            Self::E0504 => "E0504",
            Self::E0505 => "E0505",
            Self::E0506 => "E0506",
            // Generic
            Self::E0901 => "E0901",
            Self::E0902 => "E0902",
        }
    }

    /// Get a short description of the error category
    pub fn category_description(&self) -> &'static str {
        match self {
            Self::E0101 | Self::E0102 | Self::E0103 | Self::E0104 => "lexical error",
            Self::E0201 | Self::E0202 | Self::E0203 | Self::E0205 | Self::E0206 | Self::E0207 | Self::E0208 => {
                "structural error"
            }
            Self::E0301 | Self::E0302 | Self::E0303 | Self::E0304 | Self::E0305 | Self::E0306 | Self::E0307 => {
                "declaration error"
            }
            Self::E0404 | Self::E0405 | Self::E0406 => "expression error",
            Self::E0501 | Self::E0502 | Self::E0503 | Self::E0504 | Self::E0505 | Self::E0506 => {
                "preprocessor error"
            }
            Self::E0901 | Self::E0902 => "syntax error",
        }
    }

    /// Get the default message for this error code
    pub fn default_message(&self) -> &'static str {
        match self {
            // Lexical
            Self::E0101 => "invalid character",
            Self::E0102 => "unterminated string literal",
            Self::E0103 => "unterminated block comment",
            Self::E0104 => "numeric literal out of range",
            // Structural
            Self::E0201 => "missing semicolon",
            Self::E0202 => "unclosed brace",
            Self::E0203 => "unclosed parenthesis",
            Self::E0205 => "unexpected closing delimiter",
            Self::E0206 => "unterminated conditional",
            Self::E0207 => "mismatched conditional terminator",
            Self::E0208 => "nesting too deep",
            // Declaration
            Self::E0301 => "missing identifier",
            Self::E0302 => "refinement not allowed here",
            Self::E0303 => "missing atom type",
            Self::E0304 => "missing value",
            Self::E0305 => "malformed adps block",
            Self::E0306 => "macro directive outside macro body",
            Self::E0307 => "nested macro declaration",
            // Expression
            Self::E0404 => "unclosed argument list",
            Self::E0405 => "invalid argument",
            Self::E0406 => "expected expression",
            // Macro/preprocessor
            Self::E0501 => "unresolved reference",
            Self::E0502 => "recursion limit exceeded",
            Self::E0503 => "arity mismatch",
            Self::E0504 => "condition evaluation failed",
            Self::E0505 => "include not found",
            Self::E0506 => "parse cancelled",
            // Generic
            Self::E0901 => "unexpected token",
            Self::E0902 => "expected token",
        }
    }

    /// Check if this is a structural error (delimiter-related)
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::E0201
                | Self::E0202
                | Self::E0203
                | Self::E0205
                | Self::E0206
                | Self::E0207
                | Self::E0208
        )
    }

    /// Check if this error was raised while expanding rather than parsing
    pub fn is_expansion(&self) -> bool {
        matches!(
            self,
            Self::E0501 | Self::E0502 | Self::E0503 | Self::E0504 | Self::E0505 | Self::E0506
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
