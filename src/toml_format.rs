//! TOML backend.
//!
//! Writing goes through `toml_edit` so every key can carry its comment block
//! as decor. Sections and map values become tables; lists become arrays;
//! maps nested inside arrays become inline tables. Reading parses with
//! `toml` (order-preserving) and applies the resulting `toml::Value`.

use std::io::{Read, Write};

use toml_edit::{Array, DocumentMut, InlineTable, Item, Table};

use crate::coerce::Dynamic;
use crate::error::ConfigError;
use crate::serializer::{self, Serializer};
use crate::tree::{ValueTree, ValueTreeNode};
use crate::value::{Value, widen_f32};

#[derive(Debug, Clone, Copy, Default)]
pub struct TomlSerializer;

impl TomlSerializer {
    /// Render the tree as a TOML document string.
    pub fn to_document(&self, tree: &ValueTree) -> String {
        let mut doc = DocumentMut::new();
        write_nodes(doc.as_table_mut(), tree.children());

        let mut out = String::new();
        if let Some(header) = tree.metadata().comments() {
            out.push_str(&comment_prefix(header));
            out.push('\n');
        }
        out.push_str(&doc.to_string());
        out
    }
}

impl Serializer for TomlSerializer {
    fn file_extension(&self) -> &str {
        "toml"
    }

    fn serialize(&self, tree: &ValueTree, to: &mut dyn Write) -> Result<(), ConfigError> {
        to.write_all(self.to_document(tree).as_bytes())
            .map_err(|e| ConfigError::Serialize {
                format: "toml".into(),
                reason: e.to_string(),
            })
    }

    fn deserialize(&self, tree: &mut ValueTree, from: &mut dyn Read) -> Result<(), ConfigError> {
        let parse_error = |reason: String| ConfigError::Parse {
            format: "toml".into(),
            reason,
        };

        let mut content = String::new();
        from.read_to_string(&mut content)
            .map_err(|e| parse_error(e.to_string()))?;
        let table: toml::Table = toml::from_str(&content).map_err(|e| parse_error(e.to_string()))?;

        serializer::apply_document(tree, &toml::Value::Table(table));
        Ok(())
    }
}

fn comment_prefix(lines: &[String]) -> String {
    lines
        .iter()
        .flat_map(|line| serializer::comment_text(line))
        .map(|line| format!("# {line}\n"))
        .collect()
}

fn write_nodes(table: &mut Table, nodes: &[ValueTreeNode]) {
    for node in nodes {
        let comments = serializer::comment_lines(node);
        match node {
            ValueTreeNode::Value(value) => {
                let name = value.serialized_name();
                let mut item = to_item(value.value());
                if comments.is_empty() {
                    table.insert(name, item);
                } else if let Item::Table(sub) = &mut item {
                    sub.decor_mut()
                        .set_prefix(format!("\n{}", comment_prefix(&comments)));
                    table.insert(name, item);
                } else {
                    table.insert(name, item);
                    if let Some(mut key) = table.key_mut(name) {
                        key.leaf_decor_mut().set_prefix(comment_prefix(&comments));
                    }
                }
            }
            ValueTreeNode::Section(section) => {
                let mut sub = Table::new();
                write_nodes(&mut sub, section.children());
                if !comments.is_empty() {
                    sub.decor_mut()
                        .set_prefix(format!("\n{}", comment_prefix(&comments)));
                }
                table.insert(section.key().last(), Item::Table(sub));
            }
        }
    }
}

/// Maps (and objects represented by maps) become tables; everything else is
/// an inline value.
fn to_item(value: &Value) -> Item {
    match value {
        Value::Map(map) => {
            let mut table = Table::new();
            for (key, entry) in map.iter() {
                table.insert(key, to_item(entry));
            }
            Item::Table(table)
        }
        Value::Object(object) => to_item(&object.representation()),
        other => Item::Value(to_value(other)),
    }
}

fn to_value(value: &Value) -> toml_edit::Value {
    match value {
        Value::Int(v) => i64::from(*v).into(),
        Value::Long(v) => (*v).into(),
        Value::Float(v) => widen_f32(*v).into(),
        Value::Double(v) => (*v).into(),
        Value::Bool(v) => (*v).into(),
        Value::String(v) => v.as_str().into(),
        Value::Enum(v) => v.name().into(),
        Value::List(list) => {
            let mut array = Array::new();
            for item in list.iter() {
                array.push(to_value(item));
            }
            array.into()
        }
        Value::Map(map) => {
            let mut table = InlineTable::new();
            for (key, entry) in map.iter() {
                table.insert(key, to_value(entry));
            }
            table.into()
        }
        Value::Object(object) => to_value(&object.representation()),
    }
}

impl Dynamic for toml::Value {
    fn as_integer(&self) -> Option<i64> {
        match self {
            toml::Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    fn as_float(&self) -> Option<f64> {
        match self {
            toml::Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    fn as_bool(&self) -> Option<bool> {
        match self {
            toml::Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    fn as_str(&self) -> Option<&str> {
        match self {
            toml::Value::String(s) => Some(s),
            _ => None,
        }
    }

    fn elements(&self) -> Option<Box<dyn Iterator<Item = &Self> + '_>> {
        match self {
            toml::Value::Array(items) => Some(Box::new(items.iter())),
            _ => None,
        }
    }

    fn entries(&self) -> Option<Box<dyn Iterator<Item = (&str, &Self)> + '_>> {
        match self {
            toml::Value::Table(table) => Some(Box::new(table.iter().map(|(k, v)| (k.as_str(), v)))),
            _ => None,
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            toml::Value::String(_) => "string",
            toml::Value::Integer(_) => "integer",
            toml::Value::Float(_) => "float",
            toml::Value::Boolean(_) => "boolean",
            toml::Value::Datetime(_) => "datetime",
            toml::Value::Array(_) => "array",
            toml::Value::Table(_) => "table",
        }
    }
}
