//! Preprocessor tables owned by one parse

use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::base::Name;
use crate::syntax::{MacroBody, MacroDecl, MacroSignature};

/// A registered macro signature and the body it expands to
#[derive(Debug, Clone)]
pub struct MacroEntry {
    pub signature: MacroSignature,
    /// Shared with every other signature of the same `#list`
    pub body: Arc<MacroBody>,
}

impl MacroEntry {
    pub fn arity(&self) -> usize {
        self.signature.params.len()
    }
}

/// Macros by name, in declaration order
#[derive(Debug, Clone, Default)]
pub struct MacroTable {
    entries: IndexMap<Name, MacroEntry>,
    /// Names removed by `#delete_macros` and not declared again since
    deleted: FxHashSet<Name>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every signature of `decl`, replacing earlier entries of the
    /// same name
    pub fn register(&mut self, decl: &MacroDecl) {
        for signature in &decl.signatures {
            self.deleted.remove(&signature.name);
            self.entries.insert(
                signature.name.clone(),
                MacroEntry {
                    signature: signature.clone(),
                    body: Arc::clone(&decl.body),
                },
            );
        }
    }

    /// Remove a macro. Returns false if no macro had that name.
    pub fn delete(&mut self, name: &str) -> bool {
        match self.entries.shift_remove(name) {
            Some(entry) => {
                self.deleted.insert(entry.signature.name);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<&MacroEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn is_deleted(&self, name: &str) -> bool {
        self.deleted.contains(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &Name> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `#define` / `#undef` symbols
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    defined: FxHashSet<Name>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: Name) {
        self.defined.insert(name);
    }

    pub fn undef(&mut self, name: &str) {
        self.defined.remove(name);
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.defined.contains(name)
    }
}

/// `#prm` values, last assignment wins
#[derive(Debug, Clone, Default)]
pub struct VariableTable {
    values: FxHashMap<Name, f64>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: Name, value: f64) {
        self.values.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }
}

/// All state built up while expanding one document
#[derive(Debug, Clone, Default)]
pub struct ParseContext {
    pub macros: MacroTable,
    pub symbols: SymbolTable,
    pub variables: VariableTable,
    /// Names declared by `prm` / `local`
    declared: FxHashSet<Name>,
    unique_counter: usize,
}

impl ParseContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, name: Name) {
        self.declared.insert(name);
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.declared.contains(name)
    }

    /// A fresh name for `#m_unique` and `#m_unique_not_refine`
    pub fn next_unique(&mut self) -> Name {
        self.unique_counter += 1;
        Name::from(format!("_unique_{}", self.unique_counter))
    }
}
