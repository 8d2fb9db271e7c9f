//! Lexer and parser for TOPAS control files
//!
//! ## Architecture
//!
//! ```text
//! Source Text
//!     ↓
//! Lexer (logos) → Tokens with SyntaxKind and adjacency
//!     ↓
//! Parser (grammar/*) → owned syntax tree (crate::syntax)
//!     ↓
//! Expander → macros, conditionals and includes resolved
//! ```
//!
//! Parsing is purely syntactic: it never consults macro definitions. Whether
//! `f(x)` invokes a macro is decided later, during expansion.

#[allow(clippy::module_inception)]
mod parser;

pub mod errors;
pub mod grammar;
pub mod keywords;
mod lexer;
mod syntax_kind;

pub use errors::{BodyContext, ErrorCode, ParseError};
pub use lexer::{Comment, CommentKind, Lexed, Lexer, Token, tokenize};
pub use parser::{Parse, parse_source, parse_source_with};
pub use syntax_kind::SyntaxKind;

pub use text_size::{TextRange, TextSize};
