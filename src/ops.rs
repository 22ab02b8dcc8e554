//! Config operations: listing, key lookup, setting from text, template generation.
//!
//! Provides the logic behind `config list`, `config get`, `config set` and
//! `config gen`, and the `ConfigResult` enum that callers use to display results.

use std::fmt;
use std::path::PathBuf;

use crate::coerce;
use crate::error::ConfigError;
use crate::serializer::{self, Serializer};
use crate::tree::{ValueTree, ValueTreeNode};

/// Result of a config operation. Returned to the caller for display.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigResult {
    /// A generated template string.
    Template(String),
    /// Confirmation that a template was written to a file.
    TemplateWritten { path: PathBuf },
    /// A key's current value and its comment block.
    KeyValue {
        key: String,
        value: String,
        doc: Vec<String>,
    },
    /// Confirmation that a value was installed.
    ValueSet { key: String, value: String },
    /// All current key-value pairs.
    Listing { entries: Vec<(String, String)> },
}

impl fmt::Display for ConfigResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigResult::Template(t) => write!(f, "{t}"),
            ConfigResult::TemplateWritten { path } => {
                write!(f, "Config template written to {}", path.display())
            }
            ConfigResult::KeyValue { key, value, doc } => {
                for line in doc {
                    writeln!(f, "# {line}")?;
                }
                write!(f, "{key} = {value}")
            }
            ConfigResult::ValueSet { key, value } => write!(f, "Set {key} = {value}"),
            ConfigResult::Listing { entries } => {
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{key} = {value}")?;
                }
                Ok(())
            }
        }
    }
}

/// Render the tree's defaults, with their comment blocks, in `format`.
pub fn generate_template(tree: &ValueTree, format: &dyn Serializer) -> Result<String, ConfigError> {
    format.serialize_to_string(&tree.defaults())
}

/// Current value of a dotted key, with the comments a document would carry.
pub fn get_value(tree: &ValueTree, key: &str) -> Result<ConfigResult, ConfigError> {
    let node = tree
        .nodes()
        .find(|n| matches!(n, ValueTreeNode::Value(_)) && n.key().to_string() == key)
        .ok_or_else(|| ConfigError::KeyNotFound(key.into()))?;
    let ValueTreeNode::Value(value) = node else {
        return Err(ConfigError::KeyNotFound(key.into()));
    };

    Ok(ConfigResult::KeyValue {
        key: key.into(),
        value: value.value().to_string(),
        doc: serializer::comment_lines(node),
    })
}

/// Every tracked value as a dotted key-value pair, in declaration order.
pub fn list_values(tree: &ValueTree) -> ConfigResult {
    let entries = tree
        .values()
        .map(|v| (v.key().to_string(), v.value().to_string()))
        .collect();
    ConfigResult::Listing { entries }
}

/// Parse `raw` as a TOML value and install it at `key`, notifying listeners.
///
/// Text that is not a TOML value is taken as a bare string, so `set name demo`
/// and `set name '"demo"'` both work. Unlike loading a document, every
/// mismatch is an error and the current value is kept.
pub fn set_value(tree: &mut ValueTree, key: &str, raw: &str) -> Result<ConfigResult, ConfigError> {
    let target = tree.lookup_mut(key)?;
    let parsed = parse_raw(raw);
    let value = coerce::try_coerce(&parsed, target.default_value(), key)?;
    let shown = value.to_string();
    target.try_set_value(value, true)?;
    tracing::debug!(%key, value = %shown, "Set value");

    Ok(ConfigResult::ValueSet {
        key: key.into(),
        value: shown,
    })
}

fn parse_raw(raw: &str) -> toml::Value {
    toml::from_str::<toml::Table>(&format!("v = {raw}"))
        .ok()
        .and_then(|mut table| table.remove("v"))
        .unwrap_or_else(|| toml::Value::String(raw.to_string()))
}
