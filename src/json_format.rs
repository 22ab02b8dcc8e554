//! JSON backend. JSON has no comments, so only values are written.
//!
//! JSON has no NaN or infinity either: a tree holding a non-finite float or
//! double is refused at write time rather than written as `null`.

use std::io::{Read, Write};

use serde::ser::{Serialize, SerializeMap};

use crate::coerce::Dynamic;
use crate::error::ConfigError;
use crate::serializer::{self, Serializer};
use crate::tree::{ValueTree, ValueTreeNode};
use crate::value::Value;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

/// Serializes a node list as an object, in declaration order.
struct Nodes<'a>(&'a [ValueTreeNode]);

impl Serialize for Nodes<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for node in self.0 {
            match node {
                ValueTreeNode::Value(v) => map.serialize_entry(v.serialized_name(), v.value())?,
                ValueTreeNode::Section(s) => {
                    map.serialize_entry(s.key().last(), &Nodes(s.children()))?
                }
            }
        }
        map.end()
    }
}

impl Serializer for JsonSerializer {
    fn file_extension(&self) -> &str {
        "json"
    }

    fn serialize(&self, tree: &ValueTree, to: &mut dyn Write) -> Result<(), ConfigError> {
        let write_error = |reason: String| ConfigError::Serialize {
            format: "json".into(),
            reason,
        };
        if let Some(v) = tree.values().find(|v| !is_finite(v.value())) {
            return Err(write_error(format!(
                "'{}' holds {}, which JSON cannot represent",
                v.key(),
                v.value()
            )));
        }
        serde_json::to_writer_pretty(&mut *to, &Nodes(tree.children()))
            .map_err(|e| write_error(e.to_string()))?;
        to.write_all(b"\n").map_err(|e| write_error(e.to_string()))
    }

    fn deserialize(&self, tree: &mut ValueTree, from: &mut dyn Read) -> Result<(), ConfigError> {
        let document: serde_json::Value =
            serde_json::from_reader(from).map_err(|e| ConfigError::Parse {
                format: "json".into(),
                reason: e.to_string(),
            })?;
        if !document.is_object() {
            return Err(ConfigError::Parse {
                format: "json".into(),
                reason: format!("top level must be an object, found {}", document.describe()),
            });
        }
        serializer::apply_document(tree, &document);
        Ok(())
    }
}

fn is_finite(value: &Value) -> bool {
    match value {
        Value::Float(f) => f.is_finite(),
        Value::Double(f) => f.is_finite(),
        Value::List(list) => list.iter().all(is_finite),
        Value::Map(map) => map.values().all(is_finite),
        Value::Object(object) => is_finite(&object.representation()),
        _ => true,
    }
}

impl Dynamic for serde_json::Value {
    fn as_integer(&self) -> Option<i64> {
        match self {
            serde_json::Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    fn as_float(&self) -> Option<f64> {
        match self {
            serde_json::Value::Number(n) if n.is_f64() => n.as_f64(),
            _ => None,
        }
    }

    fn as_bool(&self) -> Option<bool> {
        match self {
            serde_json::Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    fn as_str(&self) -> Option<&str> {
        match self {
            serde_json::Value::String(s) => Some(s),
            _ => None,
        }
    }

    fn elements(&self) -> Option<Box<dyn Iterator<Item = &Self> + '_>> {
        match self {
            serde_json::Value::Array(items) => Some(Box::new(items.iter())),
            _ => None,
        }
    }

    fn entries(&self) -> Option<Box<dyn Iterator<Item = (&str, &Self)> + '_>> {
        match self {
            serde_json::Value::Object(map) => {
                Some(Box::new(map.iter().map(|(k, v)| (k.as_str(), v))))
            }
            _ => None,
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            serde_json::Value::Null => "null",
            serde_json::Value::Bool(_) => "boolean",
            serde_json::Value::Number(n) if n.is_f64() => "float",
            serde_json::Value::Number(_) => "integer",
            serde_json::Value::String(_) => "string",
            serde_json::Value::Array(_) => "array",
            serde_json::Value::Object(_) => "object",
        }
    }
}
