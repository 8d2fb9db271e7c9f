//! Syntax tree for control files
//!
//! The tree is owned and immutable once built. Expressions are plain enums
//! with boxed children; block items carry the source range they were parsed
//! from. Macro bodies are shared behind an `Arc` so every signature of a
//! `#list` points at the same items.
//!
//! Every node implements `Display`, producing source text that parses back
//! to an equal tree.

mod display;
mod expr;
mod item;

pub use display::render_items;
pub use expr::{Argument, BinaryOp, Expr, Invocation, Literal, UNIQUE_PLACEHOLDER, UnaryOp};
pub use item::{
    ArgTest, AssignOp, Axis, Branch, Condition, ConditionFamily, Conditional, Directive, Equation,
    Item, ItemKind, MacroBody, MacroDecl, MacroOp, MacroOpKind, MacroParam, MacroSignature,
    OccModifier, Occupancy, Parameter, Refinement, SiteDecl, SiteStatement, Uncertainty, Value,
    VariableAssignment, VariableDecl, VariableScope,
};

#[cfg(test)]
mod tests;
