//! Foundation types for the TOPAS front end.
//!
//! This module provides fundamental types used throughout the crate:
//! - [`TextRange`], [`TextSize`] - Source positions (byte offsets)
//! - [`LineIndex`] - Byte offset to line/column conversion
//! - [`Position`], [`Span`] - Line/column positions for diagnostics
//! - [`Name`] - Cheap-to-clone identifier text
//!
//! This module has NO dependencies on other crate modules.

mod position;

pub use position::{LineIndex, Position, Span};
pub use text_size::{TextRange, TextSize};

/// Identifier text as stored in the syntax tree and the preprocessor tables.
///
/// Identifiers in control files are short, so `SmolStr` keeps almost all of
/// them inline and makes cloning during macro expansion free of allocation.
pub type Name = smol_str::SmolStr;

// Re-export text-size types for convenience
pub use text_size;
