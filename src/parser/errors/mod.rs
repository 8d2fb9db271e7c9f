//! Error handling module
//!
//! This module provides the error type shared by the parser and the expander:
//! - Categorized error codes for filtering and documentation
//! - Context-aware syntax error messages
//! - One `ParseError` enum covering lexical, syntactic and macro errors

mod codes;
mod context;
mod error;

pub use codes::ErrorCode;
pub use context::BodyContext;
pub use error::ParseError;
