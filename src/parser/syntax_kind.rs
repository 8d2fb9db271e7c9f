//! Syntax kinds for TOPAS tokens
//!
//! This enum defines every token kind the lexer can produce. Vocabulary
//! keywords (`scale`, `lam`, `x`, ...) are not listed here:
//! they lex as [`SyntaxKind::IDENT`] and are classified by the swappable
//! [`Vocabulary`](crate::keywords::Vocabulary) lookup.

/// All token kinds of the control language
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // =========================================================================
    // TRIVIA (whitespace and comments - preserved but not semantically meaningful)
    // =========================================================================
    WHITESPACE = 0,
    LINE_COMMENT,       // ' to end of line
    BLOCK_COMMENT,      // /* ... */
    UNTERMINATED_BLOCK_COMMENT, // /* ... <eof>

    // =========================================================================
    // LITERALS
    // =========================================================================
    IDENT,              // identifier
    INTEGER,            // 42
    FLOAT,              // 3.14, .5, 1e5, 2e5.5
    STRING,             // "file.xy"

    // =========================================================================
    // STRUCTURAL KEYWORDS
    // =========================================================================
    PRM_KW,
    LOCAL_KW,
    EXISTING_PRM_KW,
    SITE_KW,
    MACRO_KW,

    // =========================================================================
    // PUNCTUATION
    // =========================================================================
    L_BRACE,            // {
    R_BRACE,            // }
    L_PAREN,            // (
    R_PAREN,            // )
    SEMICOLON,          // ;
    COLON,              // :
    COMMA,              // ,
    AMP,                // &
    AT,                 // @
    BANG,               // !
    EQ,                 // =
    PLUS_EQ,            // +=
    MINUS_EQ,           // -=
    STAR_EQ,            // *=
    SLASH_EQ,           // /=
    CARET_EQ,           // ^=
    EQ_EQ,              // ==
    LT,                 // <
    GT,                 // >
    LT_EQ,              // <=
    GT_EQ,              // >=
    PLUS,               // +
    MINUS,              // -
    STAR,               // *
    SLASH,              // /
    PERCENT,            // %
    CARET,              // ^

    // =========================================================================
    // DOCUMENT-SCOPE DIRECTIVES
    // =========================================================================
    INCLUDE_DIR,
    DELETE_MACROS_DIR,
    DEFINE_DIR,
    UNDEF_DIR,
    SEED_DIR,
    IF_DIR,
    ELSEIF_DIR,
    ELSE_DIR,
    ENDIF_DIR,
    IFDEF_DIR,
    IFNDEF_DIR,
    PRM_DIR,
    OUT_DIR,
    LIST_DIR,

    // =========================================================================
    // MACRO-SCOPE DIRECTIVES
    // =========================================================================
    M_IF_DIR,
    M_ELSEIF_DIR,
    M_ELSE_DIR,
    M_ENDIF_DIR,
    M_IFARG_DIR,
    M_ARGU_DIR,
    M_FIRST_WORD_DIR,
    M_UNIQUE_NOT_REFINE_DIR,
    M_UNIQUE_DIR,
    M_OUT_DIR,
    M_CODE_DIR,
    M_EQN_DIR,
    M_CODE_REFINE_DIR,
    M_ONE_WORD_DIR,

    /// `#word` that is not part of the directive surface
    UNKNOWN_DIR,

    // Special
    ERROR,
    EOF,
}

impl SyntaxKind {
    /// Check if this is a trivia token (whitespace or comment)
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            Self::WHITESPACE
                | Self::LINE_COMMENT
                | Self::BLOCK_COMMENT
                | Self::UNTERMINATED_BLOCK_COMMENT
        )
    }

    /// Check if this is a comment
    pub fn is_comment(self) -> bool {
        self.is_trivia() && self != Self::WHITESPACE
    }

    /// Check if this is a numeric literal
    pub fn is_number(self) -> bool {
        matches!(self, Self::INTEGER | Self::FLOAT)
    }

    /// Check if this is a literal
    pub fn is_literal(self) -> bool {
        matches!(self, Self::INTEGER | Self::FLOAT | Self::STRING)
    }

    /// Check if this is a structural keyword
    pub fn is_keyword(self) -> bool {
        (self as u16) >= (Self::PRM_KW as u16) && (self as u16) <= (Self::MACRO_KW as u16)
    }

    /// Check if this is a directive (`#...`), including unknown ones
    pub fn is_directive(self) -> bool {
        (self as u16) >= (Self::INCLUDE_DIR as u16) && (self as u16) <= (Self::UNKNOWN_DIR as u16)
    }

    /// Check if this is one of the `#m_...` directives, which are only
    /// meaningful inside a macro body
    pub fn is_macro_directive(self) -> bool {
        (self as u16) >= (Self::M_IF_DIR as u16) && (self as u16) <= (Self::M_ONE_WORD_DIR as u16)
    }

    /// Assignment operators that may open an equation
    pub fn is_assignment_op(self) -> bool {
        matches!(
            self,
            Self::EQ | Self::PLUS_EQ | Self::MINUS_EQ | Self::STAR_EQ | Self::SLASH_EQ | Self::CARET_EQ
        )
    }

    /// Tokens that terminate a conditional branch of either family
    pub fn closes_branch(self) -> bool {
        matches!(
            self,
            Self::ELSEIF_DIR
                | Self::ELSE_DIR
                | Self::ENDIF_DIR
                | Self::M_ELSEIF_DIR
                | Self::M_ELSE_DIR
                | Self::M_ENDIF_DIR
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_ranges() {
        assert!(SyntaxKind::INCLUDE_DIR.is_directive());
        assert!(SyntaxKind::UNKNOWN_DIR.is_directive());
        assert!(!SyntaxKind::CARET.is_directive());
        assert!(SyntaxKind::M_UNIQUE_DIR.is_macro_directive());
        assert!(!SyntaxKind::LIST_DIR.is_macro_directive());
    }

    #[test]
    fn test_trivia_and_comments() {
        assert!(SyntaxKind::WHITESPACE.is_trivia());
        assert!(!SyntaxKind::WHITESPACE.is_comment());
        assert!(SyntaxKind::UNTERMINATED_BLOCK_COMMENT.is_comment());
        assert!(!SyntaxKind::IDENT.is_trivia());
    }

    #[test]
    fn test_keyword_range() {
        assert!(SyntaxKind::PRM_KW.is_keyword());
        assert!(SyntaxKind::MACRO_KW.is_keyword());
        assert!(!SyntaxKind::IDENT.is_keyword());
    }
}
