//! Body context tracking for context-aware error messages
//!
//! The structural parser passes the kind of body it is in to the item
//! parser; the context decides which statements are legal and how an
//! unexpected token is described.

/// The body an item is being parsed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyContext {
    /// At the top level of a file
    TopLevel,
    /// Inside a `macro name(...) { ... }` body
    MacroBody,
    /// Inside a `#list` body
    ListBody,
    /// The statements following `site name`
    SiteBody,
    /// Inside a `{ ... }` block nested in a `#list` body
    DelimitedBlock,
}

impl BodyContext {
    /// Get a human-readable description of this context for error messages
    pub fn description(&self) -> &'static str {
        match self {
            Self::TopLevel => "at top level",
            Self::MacroBody => "in macro body",
            Self::ListBody => "in #list body",
            Self::SiteBody => "in site body",
            Self::DelimitedBlock => "in delimited block",
        }
    }

    /// Get a description of what tokens are expected in this context
    pub fn expected_description(&self) -> &'static str {
        match self {
            Self::TopLevel => "a keyword, declaration, directive or expression",
            Self::MacroBody | Self::DelimitedBlock => {
                "a keyword, declaration, directive, macro operator or expression"
            }
            Self::ListBody => "a literal, identifier, parameter or '{' block",
            Self::SiteBody => "site keywords (x, y, z, occ, adps, ...), directives or macro calls",
        }
    }
}
