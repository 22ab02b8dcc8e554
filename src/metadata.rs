//! Documentation and naming metadata carried by tree nodes.
//!
//! The set of metadata kinds is closed: free-form comments and a serialized
//! name that overrides the key a value is written under. Lookups distinguish
//! "absent" (`None`) from "present but empty" (`Some(&[])`).

use std::fmt;

/// The well-known kinds of node metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataKind {
    Comment,
    SerializedName,
}

impl fmt::Display for MetadataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataKind::Comment => f.write_str("comment"),
            MetadataKind::SerializedName => f.write_str("serialized name"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    comments: Option<Vec<String>>,
    serialized_name: Option<String>,
}

impl Metadata {
    pub fn has(&self, kind: MetadataKind) -> bool {
        match kind {
            MetadataKind::Comment => self.comments.is_some(),
            MetadataKind::SerializedName => self.serialized_name.is_some(),
        }
    }

    pub fn comments(&self) -> Option<&[String]> {
        self.comments.as_deref()
    }

    pub fn serialized_name(&self) -> Option<&str> {
        self.serialized_name.as_deref()
    }

    /// Append one comment line. Multi-line text is split per line.
    pub fn add_comment(&mut self, text: &str) {
        let comments = self.comments.get_or_insert_with(Vec::new);
        comments.extend(text.lines().map(str::to_string));
    }

    /// Mark comment metadata as present without adding lines.
    pub fn declare_comments(&mut self) {
        self.comments.get_or_insert_with(Vec::new);
    }

    pub fn set_serialized_name(&mut self, name: impl Into<String>) {
        self.serialized_name = Some(name.into());
    }
}
