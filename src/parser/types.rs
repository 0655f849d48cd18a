//! Common types for parsers

/// A package listed in the input, identified by its provider slug
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageRef {
    /// Display name (link text, or the slug for bare URLs)
    pub name: String,
    /// Provider slug (e.g., "sodium")
    pub slug: String,
    /// Project page URL
    pub url: String,
}

impl PackageRef {
    pub fn new(name: impl Into<String>, slug: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            url: url.into(),
        }
    }
}
