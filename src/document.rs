//! The result of parsing and expanding one control file

use std::fmt;

use text_size::{TextRange, TextSize};

use crate::base::{LineIndex, Span};
use crate::expand::ParseContext;
use crate::parser::{Comment, ParseError};
use crate::syntax::{Item, render_items};

/// The text an error's range points into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorSource {
    /// The text given to the parse
    Root,
    /// The included file `path`, reached from the `#include` (or the macro
    /// call expanding to it) at `directive` in the root text
    Included { path: String, directive: TextRange },
}

/// An expanded document: the items left after preprocessing, every
/// diagnostic, the comments, and the tables as they stood at the end.
#[derive(Debug, Clone)]
pub struct Document {
    pub items: Vec<Item>,
    /// Syntax errors of each text by position, expansion errors in the order
    /// they were raised. Errors inside a macro expansion are reported at the
    /// call.
    pub errors: Vec<ParseError>,
    /// Where each of `errors` was raised
    sources: Vec<ErrorSource>,
    pub comments: Vec<Comment>,
    pub context: ParseContext,
}

impl Document {
    pub(crate) fn new(
        items: Vec<Item>,
        errors: Vec<(ParseError, ErrorSource)>,
        comments: Vec<Comment>,
        context: ParseContext,
    ) -> Self {
        let (errors, sources) = errors.into_iter().unzip();
        Self {
            items,
            errors,
            sources,
            comments,
            context,
        }
    }

    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Each error with the text its range points into
    pub fn errors_with_sources(&self) -> impl Iterator<Item = (&ParseError, &ErrorSource)> {
        self.errors.iter().zip(&self.sources)
    }

    /// Each error with its line/column span in the root `source`. An error
    /// raised in an included file is placed at the `#include` that led to it.
    pub fn error_spans<'d>(&'d self, source: &str) -> impl Iterator<Item = (&'d ParseError, Span)> + 'd {
        let index = LineIndex::new(source);
        let end = TextSize::of(source);
        self.errors_with_sources().map(move |(error, origin)| {
            let range = match origin {
                ErrorSource::Root => error.range(),
                ErrorSource::Included { directive, .. } => *directive,
            };
            let clamped = TextRange::new(range.start().min(end), range.end().min(end));
            (error, index.span(clamped))
        })
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_items(&self.items))
    }
}
