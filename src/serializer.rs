//! The contract between a value tree and a document format.
//!
//! A backend implements [`Serializer`]. Writing walks the tree in declaration
//! order; reading parses the whole input first (so a document that does not
//! parse leaves the tree untouched) and then hands the parsed document to
//! [`apply_document`], which every backend shares.
//!
//! Comments are write-only. They document enum options, constraints and
//! defaults and are never read back.

use std::io::{Read, Write};

use crate::coerce::{self, Dynamic};
use crate::error::ConfigError;
use crate::tracked::TrackedValue;
use crate::tree::{ValueTree, ValueTreeNode};
use crate::value::Value;

pub trait Serializer: Send + Sync {
    /// File extension without the dot, e.g. `"toml"`.
    fn file_extension(&self) -> &str;

    fn serialize(&self, tree: &ValueTree, to: &mut dyn Write) -> Result<(), ConfigError>;

    /// Read a document into `tree`. Keys missing from the document keep their
    /// current value; unknown keys are ignored.
    fn deserialize(&self, tree: &mut ValueTree, from: &mut dyn Read) -> Result<(), ConfigError>;

    fn serialize_to_string(&self, tree: &ValueTree) -> Result<String, ConfigError> {
        let mut out = Vec::new();
        self.serialize(tree, &mut out)?;
        String::from_utf8(out).map_err(|e| ConfigError::Serialize {
            format: self.file_extension().to_string(),
            reason: e.to_string(),
        })
    }

    fn deserialize_str(&self, tree: &mut ValueTree, content: &str) -> Result<(), ConfigError> {
        self.deserialize(tree, &mut content.as_bytes())
    }
}

/// Comment lines for a node, in order: its own comments, then (for values)
/// the enum options, each constraint, and the default unless it is a list or
/// map.
pub fn comment_lines(node: &ValueTreeNode) -> Vec<String> {
    let mut lines: Vec<String> = node
        .metadata()
        .comments()
        .map(<[String]>::to_vec)
        .unwrap_or_default();

    if let ValueTreeNode::Value(value) = node {
        let default = value.default_value();
        if let Value::Enum(e) = default {
            lines.push(format!("options: {}", e.constants().join(", ")));
        }
        lines.extend(
            value
                .constraints()
                .iter()
                .map(|c| c.representation().to_string()),
        );
        if !default.is_compound() {
            lines.push(default_line(default));
        }
    }
    lines.iter().flat_map(|line| comment_text(line)).collect()
}

fn default_line(default: &Value) -> String {
    match default {
        Value::String(s) => format!("default: {}", s.escape_debug()),
        other => format!("default: {other}"),
    }
}

/// Split `line` into physical comment lines. Control characters other than
/// tab are escaped, so no piece can end a comment early.
pub fn comment_text(line: &str) -> Vec<String> {
    line.split('\n')
        .map(|piece| {
            piece
                .chars()
                .map(|c| {
                    if c.is_control() && c != '\t' {
                        c.escape_debug().to_string()
                    } else {
                        c.to_string()
                    }
                })
                .collect()
        })
        .collect()
}

/// Install every value present in a parsed document.
///
/// Each tracked value is looked up under its section path and serialized
/// name. A found value is coerced against the default and installed without
/// notifying listeners. Constraints are checked on install: a rejected value
/// leaves the current value in place.
pub fn apply_document<D: Dynamic + ?Sized>(tree: &mut ValueTree, document: &D) {
    for value in tree.values_mut() {
        let Some(found) = locate(document, value) else {
            continue;
        };
        let coerced = coerce::coerce(found, value.default_value());
        if !value.set_value(coerced.clone(), false) {
            tracing::warn!(
                key = %value.key(),
                value = %coerced,
                kept = %value.value(),
                "Loaded value rejected by constraints, keeping current value"
            );
        }
    }

    let unknown = unknown_keys(tree, document);
    if !unknown.is_empty() {
        tracing::debug!(keys = ?unknown, "Ignoring unknown keys");
    }
}

fn locate<'d, D: Dynamic + ?Sized>(document: &'d D, value: &TrackedValue) -> Option<&'d D> {
    let segments = value.key().segments();
    let (_, sections) = segments.split_last()?;
    let mut current = document;
    for section in sections {
        current = current.get(section)?;
    }
    current.get(value.serialized_name())
}

/// Dotted paths in `document` that no value or section of `tree` reads.
pub fn unknown_keys<D: Dynamic + ?Sized>(tree: &ValueTree, document: &D) -> Vec<String> {
    let mut out = Vec::new();
    collect_unknown(tree.children(), document, "", &mut out);
    out
}

fn collect_unknown<D: Dynamic + ?Sized>(
    children: &[ValueTreeNode],
    document: &D,
    prefix: &str,
    out: &mut Vec<String>,
) {
    let Some(entries) = document.entries() else {
        return;
    };
    for (key, entry) in entries {
        let path = if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}.{key}")
        };
        let node = children.iter().find(|node| match node {
            ValueTreeNode::Value(v) => v.serialized_name() == key,
            ValueTreeNode::Section(s) => s.key().last() == key,
        });
        match node {
            Some(ValueTreeNode::Value(_)) => {}
            Some(ValueTreeNode::Section(s)) => collect_unknown(s.children(), entry, &path, out),
            None => out.push(path),
        }
    }
}
