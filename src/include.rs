//! Include resolution
//!
//! `#include "path"` asks an [`IncludeResolver`] for the text of `path`.
//! The expander parses the text with the same vocabulary and splices its
//! items in place of the directive.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use tracing::warn;

pub trait IncludeResolver: Send + Sync {
    /// Text of the file at `path`, or `None` if it does not exist
    fn resolve(&self, path: &str) -> Option<String>;
}

/// Resolver for documents that must not include anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIncludes;

impl IncludeResolver for NoIncludes {
    fn resolve(&self, _path: &str) -> Option<String> {
        None
    }
}

/// In-memory files, keyed by the path as written in the directive
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    files: FxHashMap<String, String>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, text: impl Into<String>) {
        self.files.insert(path.into(), text.into());
    }
}

impl IncludeResolver for MemoryResolver {
    fn resolve(&self, path: &str) -> Option<String> {
        self.files.get(path).cloned()
    }
}

/// Files on disk, relative paths taken from a base directory
#[derive(Debug, Clone)]
pub struct FsResolver {
    base: PathBuf,
}

impl FsResolver {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }
}

impl IncludeResolver for FsResolver {
    fn resolve(&self, path: &str) -> Option<String> {
        let full = self.base.join(path);
        match std::fs::read_to_string(&full) {
            Ok(text) => Some(text),
            Err(error) => {
                warn!(path = %full.display(), %error, "failed to read include file");
                None
            }
        }
    }
}
