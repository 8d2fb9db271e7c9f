//! # topas-syntax
//!
//! Lexer, parser and macro preprocessor for the TOPAS Rietveld-refinement
//! control language.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! Session / document → parse + expand one control file
//!   ↓
//! expand    → macro table, binder, conditionals, includes
//!   ↓
//! syntax    → owned syntax tree and its source rendering
//!   ↓
//! parser    → logos lexer, recursive-descent parser, grammar traits
//!   ↓
//! base      → primitives (Name, TextRange, LineIndex)
//! ```
//!
//! ```
//! let document = topas::parse("macro lp(pk1) { = pk1; } lp(2)");
//! assert!(document.ok());
//! assert_eq!(document.to_string(), "macro lp(pk1) { = pk1; }\n= 2;");
//! ```

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

// ============================================================================
// MODULES (dependency order: base → parser → syntax → expand)
// ============================================================================

/// Foundation types: Name, TextRange, LineIndex
pub mod base;

/// Parser: logos lexer, recursive-descent parser, grammar traits
pub mod parser;

/// Syntax: owned tree types and their `Display` rendering
pub mod syntax;

/// Macro expansion, conditionals, preprocessor tables
pub mod expand;

/// Include resolvers
pub mod include;

mod document;
mod options;

// Re-export commonly needed items
pub use parser::keywords;

pub use base::{LineIndex, Name, Position, Span, TextRange, TextSize};
pub use document::{Document, ErrorSource};
pub use expand::{Expander, ParseContext};
pub use include::{FsResolver, IncludeResolver, MemoryResolver, NoIncludes};
pub use keywords::{StandardVocabulary, Vocabulary};
pub use options::ParseOptions;
pub use parser::{ErrorCode, ParseError};

/// Parse and expand `text` with the standard vocabulary and no includes
pub fn parse(text: &str) -> Document {
    Session::new().parse(text)
}

/// Everything one parse needs besides the text
#[derive(Clone)]
pub struct Session {
    options: ParseOptions,
    vocabulary: Arc<dyn Vocabulary>,
    resolver: Arc<dyn IncludeResolver>,
    cancel: Option<CancellationToken>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            options: ParseOptions::default(),
            vocabulary: Arc::new(StandardVocabulary),
            resolver: Arc::new(NoIncludes),
            cancel: None,
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_vocabulary(mut self, vocabulary: impl Vocabulary + 'static) -> Self {
        self.vocabulary = Arc::new(vocabulary);
        self
    }

    pub fn with_resolver(mut self, resolver: impl IncludeResolver + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    /// Parse checks `cancel` between items and gives up once it is cancelled
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parse `text`, then expand it. Tables start empty on every call.
    pub fn parse(&self, text: &str) -> Document {
        let parse = parser::parse_source_with(text, self.vocabulary.as_ref());
        debug!(items = parse.items.len(), errors = parse.errors.len(), "expanding document");

        let expander = Expander::new(&self.options, self.vocabulary.as_ref(), self.resolver.as_ref());
        match &self.cancel {
            Some(cancel) => expander.with_cancellation(cancel).expand(parse),
            None => expander.expand(parse),
        }
    }
}
