//! Parse options

/// Options for parsing and expanding a document
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Maximum nesting of macro expansions and includes. Expansion reserves
    /// 64 KiB of stack per level, up to 1 GiB.
    pub max_expansion_depth: usize,
    /// Keep comments in the resulting document
    pub collect_comments: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_expansion_depth: 256,
            collect_comments: true,
        }
    }
}
