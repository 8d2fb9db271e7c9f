//! Grammar modules for control-file parsing
//!
//! - `expressions` - arithmetic, calls, equations and parameter markers
//! - `items` - block items: keywords, declarations, assignments
//! - `site` - `site` declarations and their statements
//! - `preprocessor` - directives, conditionals and macro declarations
//!
//! The parsing functions are generic over a trait (`ExpressionParser` / `BlockParser`)
//! so they can be used with any parser implementation.

pub mod expressions;
pub mod items;
pub mod preprocessor;
pub mod site;

pub use expressions::ExpressionParser;
pub use items::{BlockParser, parse_document};
