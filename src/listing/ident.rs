use crate::error::GalleryError;
use std::fmt;

pub const MAX_IDENT_LEN: usize = 64;

/// Columns every listing table owns; attributes may not reuse them.
pub const RESERVED_COLUMNS: &[&str] = &["id", "image_url"];

/// A lower-case SQL identifier matching `[a-z_][a-z0-9_]*`.
///
/// Display renders it double-quoted, so reserved words such as `condition`
/// or `order` are safe to splice into SQL text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ident(String);

impl Ident {
    pub fn parse(raw: &str) -> Result<Self, GalleryError> {
        let name = raw.trim().to_ascii_lowercase();
        let mut chars = name.chars();
        let valid_head = chars
            .next()
            .is_some_and(|c| c.is_ascii_lowercase() || c == '_');
        let valid_tail = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !valid_head || !valid_tail || name.len() > MAX_IDENT_LEN {
            return Err(GalleryError::InvalidIdentifier(raw.to_string()));
        }
        Ok(Self(name))
    }

    /// Like [`Ident::parse`], additionally refusing the fixed listing columns.
    pub fn parse_attribute(raw: &str) -> Result<Self, GalleryError> {
        let ident = Self::parse(raw)?;
        if RESERVED_COLUMNS.contains(&ident.as_str()) {
            return Err(GalleryError::InvalidIdentifier(raw.to_string()));
        }
        Ok(ident)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.0)
    }
}
