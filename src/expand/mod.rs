//! Macro expansion and preprocessing
//!
//! The expander takes the syntax tree of a document and resolves it against
//! a [`ParseContext`]: `#define` / `#undef` symbols, `#prm` variables, the
//! macro table and the declared `prm` names. Conditionals are reduced to the
//! branch that holds, includes are spliced in, and macro invocations are
//! replaced by their substituted bodies.
//!
//! Declarations take effect in source order, so a macro is only expanded
//! after its declaration has been seen.

mod context;
mod eval;
mod expander;
mod substitute;

pub use context::{MacroEntry, MacroTable, ParseContext, SymbolTable, VariableTable};
pub use eval::evaluate;
pub use expander::Expander;
pub use substitute::{Bindings, Substituter};

#[cfg(test)]
mod tests;
