//! Logos-based lexer for the TOPAS control language
//!
//! The lexer is lazy and restartable: [`Lexer::at`] starts tokenizing at any
//! byte offset of the input and reports ranges relative to the whole input.
//! Every token records whether whitespace or a comment came directly before
//! it, which the parser needs to tell `f(x)` (macro call) from `f (x)`
//! (multiplication).

use logos::Logos;
use text_size::{TextRange, TextSize};

use super::errors::{ErrorCode, ParseError};
use super::syntax_kind::SyntaxKind;

/// A token with its kind, text, and position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: SyntaxKind,
    pub text: &'a str,
    pub range: TextRange,
    /// Whitespace, a comment or the start of input directly precedes this token
    pub spaced_before: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommentKind {
    /// `' ...` to end of line
    Line,
    /// `/* ... */`
    Block,
}

/// A comment removed from the significant token stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub kind: CommentKind,
    pub text: String,
    pub range: TextRange,
}

/// Lexer wrapping the logos-generated tokenizer
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, LogosToken>,
    base: u32,
    spaced: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self::at(input, TextSize::new(0))
    }

    /// Start lexing `input` at byte `offset`. An offset past the end or
    /// inside a UTF-8 sequence yields an empty lexer.
    pub fn at(input: &'a str, offset: TextSize) -> Self {
        let start = usize::from(offset);
        let (rest, base) = match input.get(start..) {
            Some(rest) => (rest, u32::from(offset)),
            None => ("", input.len() as u32),
        };
        Self {
            inner: LogosToken::lexer(rest),
            base,
            spaced: true,
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let logos_token = self.inner.next()?;
        let text = self.inner.slice();
        let span = self.inner.span();
        let range = TextRange::new(
            TextSize::new(self.base + span.start as u32),
            TextSize::new(self.base + span.end as u32),
        );

        let kind = match logos_token {
            Ok(t) => t.into(),
            Err(()) => SyntaxKind::ERROR,
        };

        let spaced_before = self.spaced;
        self.spaced = kind.is_trivia();

        Some(Token {
            kind,
            text,
            range,
            spaced_before,
        })
    }
}

/// Result of lexing a whole source text
#[derive(Debug, Clone, Default)]
pub struct Lexed<'a> {
    /// Significant tokens (no trivia, no error tokens)
    pub tokens: Vec<Token<'a>>,
    pub comments: Vec<Comment>,
    pub errors: Vec<ParseError>,
}

/// Tokenize an entire string, separating significant tokens from comments
/// and lexical errors. Lexing never stops at an error.
pub fn tokenize(input: &str) -> Lexed<'_> {
    let mut lexed = Lexed::default();
    for token in Lexer::new(input) {
        match token.kind {
            SyntaxKind::WHITESPACE => {}
            SyntaxKind::LINE_COMMENT | SyntaxKind::BLOCK_COMMENT => {
                lexed.comments.push(comment(&token));
            }
            SyntaxKind::UNTERMINATED_BLOCK_COMMENT => {
                lexed.comments.push(comment(&token));
                lexed.errors.push(ParseError::lex(
                    "block comment is not closed before end of input",
                    token.range,
                    ErrorCode::E0103,
                ));
            }
            SyntaxKind::ERROR => {
                let (message, code) = if token.text.starts_with('"') {
                    ("string literal is not closed on its line".to_string(), ErrorCode::E0102)
                } else {
                    (format!("invalid character '{}'", token.text), ErrorCode::E0101)
                };
                lexed.errors.push(ParseError::lex(message, token.range, code));
            }
            _ => lexed.tokens.push(token),
        }
    }
    lexed
}

fn comment(token: &Token<'_>) -> Comment {
    let kind = if token.kind == SyntaxKind::LINE_COMMENT {
        CommentKind::Line
    } else {
        CommentKind::Block
    };
    Comment {
        kind,
        text: token.text.to_string(),
        range: token.range,
    }
}

/// Consume a block comment after its opening `/*`. Returns whether the
/// closing `*/` was found; otherwise the comment runs to end of input.
fn block_comment(lex: &mut logos::Lexer<'_, LogosToken>) -> bool {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            true
        }
        None => {
            lex.bump(lex.remainder().len());
            false
        }
    }
}

/// Logos token enum - maps to SyntaxKind
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
pub enum LogosToken {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    #[regex(r"[ \t\r\n\f]+")]
    Whitespace,

    #[regex(r"'[^\n]*")]
    LineComment,

    #[token("/*", block_comment)]
    BlockComment(bool),

    // =========================================================================
    // LITERALS
    // =========================================================================
    #[regex(r"[A-Za-z][A-Za-z0-9_]*")]
    Ident,

    #[regex(r"[0-9]+")]
    Integer,

    #[regex(r"[0-9]*\.[0-9]+")]
    #[regex(r"[0-9]+(\.[0-9]+)?[eE]-?[0-9]+(\.[0-9]+)?")]
    Float,

    #[regex(r#""[^"\n]*""#)]
    String,

    #[regex(r#""[^"\n]*"#)]
    UnterminatedString,

    // =========================================================================
    // STRUCTURAL KEYWORDS
    // =========================================================================
    #[token("prm")]
    Prm,
    #[token("local")]
    Local,
    #[token("existing_prm")]
    ExistingPrm,
    #[token("site")]
    Site,
    #[token("macro")]
    Macro,

    // =========================================================================
    // DIRECTIVES
    // =========================================================================
    #[token("#include")]
    Include,
    #[token("#delete_macros")]
    DeleteMacros,
    #[token("#define")]
    Define,
    #[token("#undef")]
    Undef,
    #[token("#seed")]
    Seed,
    #[token("#if")]
    If,
    #[token("#elseif")]
    ElseIf,
    #[token("#else")]
    Else,
    #[token("#endif")]
    EndIf,
    #[token("#ifdef")]
    IfDef,
    #[token("#ifndef")]
    IfNDef,
    #[token("#prm")]
    PrmDirective,
    #[token("#out")]
    Out,
    #[token("#list")]
    List,
    #[token("#m_if")]
    MIf,
    #[token("#m_elseif")]
    MElseIf,
    #[token("#m_else")]
    MElse,
    #[token("#m_endif")]
    MEndIf,
    #[token("#m_ifarg")]
    MIfArg,
    #[token("#m_argu")]
    MArgu,
    #[token("#m_first_word")]
    MFirstWord,
    #[token("#m_unique_not_refine")]
    MUniqueNotRefine,
    #[token("#m_unique")]
    MUnique,
    #[token("#m_out")]
    MOut,
    #[token("#m_code")]
    MCode,
    #[token("#m_eqn")]
    #[token("#_eqn")]
    MEqn,
    #[token("#m_code_refine")]
    MCodeRefine,
    #[token("#m_one_word")]
    MOneWord,

    #[regex(r"#[A-Za-z_][A-Za-z0-9_]*")]
    UnknownDirective,

    // =========================================================================
    // MULTI-CHARACTER PUNCTUATION (must come before single-char)
    // =========================================================================
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token("^=")]
    CaretEq,
    #[token("==")]
    EqEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,

    // =========================================================================
    // SINGLE-CHARACTER PUNCTUATION
    // =========================================================================
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token("&")]
    Amp,
    #[token("@")]
    At,
    #[token("!")]
    Bang,
    #[token("=")]
    Eq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("^")]
    Caret,
}

impl From<LogosToken> for SyntaxKind {
    fn from(token: LogosToken) -> Self {
        match token {
            LogosToken::Whitespace => SyntaxKind::WHITESPACE,
            LogosToken::LineComment => SyntaxKind::LINE_COMMENT,
            LogosToken::BlockComment(true) => SyntaxKind::BLOCK_COMMENT,
            LogosToken::BlockComment(false) => SyntaxKind::UNTERMINATED_BLOCK_COMMENT,

            LogosToken::Ident => SyntaxKind::IDENT,
            LogosToken::Integer => SyntaxKind::INTEGER,
            LogosToken::Float => SyntaxKind::FLOAT,
            LogosToken::String => SyntaxKind::STRING,
            LogosToken::UnterminatedString => SyntaxKind::ERROR,

            LogosToken::Prm => SyntaxKind::PRM_KW,
            LogosToken::Local => SyntaxKind::LOCAL_KW,
            LogosToken::ExistingPrm => SyntaxKind::EXISTING_PRM_KW,
            LogosToken::Site => SyntaxKind::SITE_KW,
            LogosToken::Macro => SyntaxKind::MACRO_KW,

            LogosToken::Include => SyntaxKind::INCLUDE_DIR,
            LogosToken::DeleteMacros => SyntaxKind::DELETE_MACROS_DIR,
            LogosToken::Define => SyntaxKind::DEFINE_DIR,
            LogosToken::Undef => SyntaxKind::UNDEF_DIR,
            LogosToken::Seed => SyntaxKind::SEED_DIR,
            LogosToken::If => SyntaxKind::IF_DIR,
            LogosToken::ElseIf => SyntaxKind::ELSEIF_DIR,
            LogosToken::Else => SyntaxKind::ELSE_DIR,
            LogosToken::EndIf => SyntaxKind::ENDIF_DIR,
            LogosToken::IfDef => SyntaxKind::IFDEF_DIR,
            LogosToken::IfNDef => SyntaxKind::IFNDEF_DIR,
            LogosToken::PrmDirective => SyntaxKind::PRM_DIR,
            LogosToken::Out => SyntaxKind::OUT_DIR,
            LogosToken::List => SyntaxKind::LIST_DIR,
            LogosToken::MIf => SyntaxKind::M_IF_DIR,
            LogosToken::MElseIf => SyntaxKind::M_ELSEIF_DIR,
            LogosToken::MElse => SyntaxKind::M_ELSE_DIR,
            LogosToken::MEndIf => SyntaxKind::M_ENDIF_DIR,
            LogosToken::MIfArg => SyntaxKind::M_IFARG_DIR,
            LogosToken::MArgu => SyntaxKind::M_ARGU_DIR,
            LogosToken::MFirstWord => SyntaxKind::M_FIRST_WORD_DIR,
            LogosToken::MUniqueNotRefine => SyntaxKind::M_UNIQUE_NOT_REFINE_DIR,
            LogosToken::MUnique => SyntaxKind::M_UNIQUE_DIR,
            LogosToken::MOut => SyntaxKind::M_OUT_DIR,
            LogosToken::MCode => SyntaxKind::M_CODE_DIR,
            LogosToken::MEqn => SyntaxKind::M_EQN_DIR,
            LogosToken::MCodeRefine => SyntaxKind::M_CODE_REFINE_DIR,
            LogosToken::MOneWord => SyntaxKind::M_ONE_WORD_DIR,
            LogosToken::UnknownDirective => SyntaxKind::UNKNOWN_DIR,

            LogosToken::PlusEq => SyntaxKind::PLUS_EQ,
            LogosToken::MinusEq => SyntaxKind::MINUS_EQ,
            LogosToken::StarEq => SyntaxKind::STAR_EQ,
            LogosToken::SlashEq => SyntaxKind::SLASH_EQ,
            LogosToken::CaretEq => SyntaxKind::CARET_EQ,
            LogosToken::EqEq => SyntaxKind::EQ_EQ,
            LogosToken::LtEq => SyntaxKind::LT_EQ,
            LogosToken::GtEq => SyntaxKind::GT_EQ,

            LogosToken::LBrace => SyntaxKind::L_BRACE,
            LogosToken::RBrace => SyntaxKind::R_BRACE,
            LogosToken::LParen => SyntaxKind::L_PAREN,
            LogosToken::RParen => SyntaxKind::R_PAREN,
            LogosToken::Semicolon => SyntaxKind::SEMICOLON,
            LogosToken::Colon => SyntaxKind::COLON,
            LogosToken::Comma => SyntaxKind::COMMA,
            LogosToken::Amp => SyntaxKind::AMP,
            LogosToken::At => SyntaxKind::AT,
            LogosToken::Bang => SyntaxKind::BANG,
            LogosToken::Eq => SyntaxKind::EQ,
            LogosToken::Lt => SyntaxKind::LT,
            LogosToken::Gt => SyntaxKind::GT,
            LogosToken::Plus => SyntaxKind::PLUS,
            LogosToken::Minus => SyntaxKind::MINUS,
            LogosToken::Star => SyntaxKind::STAR,
            LogosToken::Slash => SyntaxKind::SLASH,
            LogosToken::Percent => SyntaxKind::PERCENT,
            LogosToken::Caret => SyntaxKind::CARET,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<SyntaxKind> {
        tokenize(input).tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_lex_variable_declaration() {
        let tokens: Vec<_> = Lexer::new("prm a 1.5").collect();
        assert_eq!(tokens.len(), 5); // prm, whitespace, a, whitespace, 1.5
        assert_eq!(tokens[0].kind, SyntaxKind::PRM_KW);
        assert_eq!(tokens[1].kind, SyntaxKind::WHITESPACE);
        assert_eq!(tokens[2].kind, SyntaxKind::IDENT);
        assert_eq!(tokens[4].kind, SyntaxKind::FLOAT);
    }

    #[test]
    fn test_lex_numbers() {
        assert_eq!(kinds("42"), vec![SyntaxKind::INTEGER]);
        assert_eq!(kinds(".5"), vec![SyntaxKind::FLOAT]);
        assert_eq!(kinds("1.25"), vec![SyntaxKind::FLOAT]);
        assert_eq!(kinds("1e-3"), vec![SyntaxKind::FLOAT]);
        assert_eq!(kinds("2e5.5"), vec![SyntaxKind::FLOAT]);
        // no sign is ever part of a literal
        assert_eq!(kinds("-1"), vec![SyntaxKind::MINUS, SyntaxKind::INTEGER]);
    }

    #[test]
    fn test_lex_number_followed_by_ident() {
        assert_eq!(kinds("2x"), vec![SyntaxKind::INTEGER, SyntaxKind::IDENT]);
        assert_eq!(kinds("2exp"), vec![SyntaxKind::INTEGER, SyntaxKind::IDENT]);
    }

    #[test]
    fn test_lex_adjacency() {
        let lexed = tokenize("f(x) f (x)");
        let spaced: Vec<_> = lexed.tokens.iter().map(|t| t.spaced_before).collect();
        assert_eq!(spaced, vec![true, false, false, false, true, true, false, false]);
    }

    #[test]
    fn test_comment_counts_as_space() {
        let lexed = tokenize("f/* c */(x)");
        assert!(lexed.tokens[1].spaced_before);
        assert_eq!(lexed.comments.len(), 1);
        assert_eq!(lexed.comments[0].kind, CommentKind::Block);
    }

    #[test]
    fn test_lex_line_comment() {
        let lexed = tokenize("scale 1 ' the scale\nlam");
        assert_eq!(lexed.tokens.len(), 3);
        assert_eq!(lexed.comments[0].text, "' the scale");
        assert_eq!(lexed.comments[0].kind, CommentKind::Line);
    }

    #[test]
    fn test_unterminated_block_comment() {
        let lexed = tokenize("a /* never closed\nb c");
        assert_eq!(lexed.tokens.len(), 1);
        assert_eq!(lexed.errors.len(), 1);
        assert_eq!(lexed.errors[0].code(), ErrorCode::E0103);
        assert_eq!(lexed.comments[0].text, "/* never closed\nb c");
    }

    #[test]
    fn test_lex_directives() {
        assert_eq!(
            kinds("#include #m_unique #m_unique_not_refine #_eqn #bogus"),
            vec![
                SyntaxKind::INCLUDE_DIR,
                SyntaxKind::M_UNIQUE_DIR,
                SyntaxKind::M_UNIQUE_NOT_REFINE_DIR,
                SyntaxKind::M_EQN_DIR,
                SyntaxKind::UNKNOWN_DIR,
            ]
        );
    }

    #[test]
    fn test_keyword_prefix_is_ident() {
        assert_eq!(kinds("prms sites"), vec![SyntaxKind::IDENT, SyntaxKind::IDENT]);
    }

    #[test]
    fn test_invalid_character_is_reported() {
        let lexed = tokenize("a $ b");
        assert_eq!(lexed.tokens.len(), 2);
        assert_eq!(lexed.errors[0].code(), ErrorCode::E0101);
    }

    #[test]
    fn test_unterminated_string() {
        let lexed = tokenize("\"abc\nx");
        assert_eq!(lexed.errors[0].code(), ErrorCode::E0102);
        assert_eq!(kinds("\"file.xy\""), vec![SyntaxKind::STRING]);
    }

    #[test]
    fn test_restart_at_offset() {
        let input = "prm a 1; prm b 2;";
        let tokens: Vec<_> = Lexer::at(input, TextSize::new(9))
            .filter(|t| !t.kind.is_trivia())
            .collect();
        assert_eq!(tokens[0].kind, SyntaxKind::PRM_KW);
        assert_eq!(tokens[0].range.start(), TextSize::new(9));
        assert_eq!(tokens[1].text, "b");
    }

    #[test]
    fn test_compound_operators() {
        assert_eq!(
            kinds("+= -= *= /= ^= == <= >="),
            vec![
                SyntaxKind::PLUS_EQ,
                SyntaxKind::MINUS_EQ,
                SyntaxKind::STAR_EQ,
                SyntaxKind::SLASH_EQ,
                SyntaxKind::CARET_EQ,
                SyntaxKind::EQ_EQ,
                SyntaxKind::LT_EQ,
                SyntaxKind::GT_EQ,
            ]
        );
    }
}
