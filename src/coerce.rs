//! Type-directed coercion of untyped document values into typed [`Value`]s.
//!
//! Backends parse documents into their own dynamic representation (a
//! `toml::Value`, a `serde_json::Value`, ...). The [`Dynamic`] trait is the only
//! thing the engine knows about that representation: scalar accessors plus
//! iteration over sequences and key/value entries.
//!
//! The *default* value decides what the result must look like:
//!
//! - **List**: the input must be a sequence; each element is coerced against the
//!   list's element default.
//! - **Map**: the input must be map-shaped; each entry is coerced against the
//!   map's value default. Entry order follows the input, not the default.
//! - **Object**: the input is coerced against the default's representation and
//!   the result handed to the default's `convert_from`.
//! - **Scalar**: the input must have a compatible kind. Integers widen to long,
//!   float and double; floats satisfy float and double only. Enum constants
//!   are matched by exact, case-sensitive name.
//!
//! [`coerce`] is total. A mismatch at any level is replaced by the default for
//! that level (the element default inside a list, the whole default at the
//! top), so one malformed field never aborts a load. [`try_coerce`] applies
//! the same rules but reports the first mismatch instead.

use crate::error::ConfigError;
use crate::value::{Value, ValueList, ValueMap};

/// Read access to a backend's untyped value.
pub trait Dynamic {
    fn as_integer(&self) -> Option<i64>;

    fn as_float(&self) -> Option<f64>;

    fn as_bool(&self) -> Option<bool>;

    fn as_str(&self) -> Option<&str>;

    /// Elements, if this is a sequence.
    fn elements(&self) -> Option<Box<dyn Iterator<Item = &Self> + '_>>;

    /// Key/value pairs in document order, if this is map-shaped.
    fn entries(&self) -> Option<Box<dyn Iterator<Item = (&str, &Self)> + '_>>;

    /// Short description of the value's shape, for diagnostics.
    fn describe(&self) -> &'static str;

    fn get(&self, key: &str) -> Option<&Self> {
        self.entries()?.find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// Coerce `dynamic` into the shape of `default`, falling back to defaults on
/// any mismatch. Never fails.
pub fn coerce<D: Dynamic + ?Sized>(dynamic: &D, default: &Value) -> Value {
    settle(dynamic, default, "", Mode::Lenient).unwrap_or_else(|_| default.clone())
}

/// Coerce `dynamic` into the shape of `default`, failing on the first mismatch.
/// `key` prefixes the location reported in the error.
pub fn try_coerce<D: Dynamic + ?Sized>(
    dynamic: &D,
    default: &Value,
    key: &str,
) -> Result<Value, ConfigError> {
    convert(dynamic, default, key, Mode::Strict).map_err(|m| ConfigError::InvalidValue {
        key: if m.path.is_empty() { "<root>".into() } else { m.path },
        reason: m.reason,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Lenient,
    Strict,
}

#[derive(Debug)]
struct Mismatch {
    path: String,
    reason: String,
}

fn mismatch<D: Dynamic + ?Sized>(path: &str, expected: &str, found: &D) -> Mismatch {
    Mismatch {
        path: path.to_string(),
        reason: format!("expected {expected}, found {}", found.describe()),
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

/// Convert one level; in lenient mode a failure is replaced by `default`.
fn settle<D: Dynamic + ?Sized>(
    dynamic: &D,
    default: &Value,
    path: &str,
    mode: Mode,
) -> Result<Value, Mismatch> {
    match convert(dynamic, default, path, mode) {
        Ok(value) => Ok(value),
        Err(m) if mode == Mode::Lenient => {
            tracing::debug!(path = %m.path, reason = %m.reason, %default, "Falling back to default");
            Ok(default.clone())
        }
        Err(m) => Err(m),
    }
}

fn convert<D: Dynamic + ?Sized>(
    dynamic: &D,
    default: &Value,
    path: &str,
    mode: Mode,
) -> Result<Value, Mismatch> {
    match default {
        Value::List(list) => {
            let elements = dynamic
                .elements()
                .ok_or_else(|| mismatch(path, "a list", dynamic))?;
            let element_default = list.element_default();
            let mut out = ValueList::new(element_default.clone());
            for (i, element) in elements.enumerate() {
                let element_path = format!("{path}[{i}]");
                out.push(settle(element, element_default, &element_path, mode)?);
            }
            Ok(Value::List(out))
        }
        Value::Map(map) => {
            let entries = dynamic
                .entries()
                .ok_or_else(|| mismatch(path, "a map", dynamic))?;
            let value_default = map.value_default();
            let mut out = ValueMap::new(value_default.clone());
            for (key, entry) in entries {
                out.insert(key, settle(entry, value_default, &join(path, key), mode)?);
            }
            Ok(Value::Map(out))
        }
        Value::Object(object) => {
            let representation = object.representation();
            let coerced = convert(dynamic, &representation, path, mode)?;
            object
                .convert_from(&coerced)
                .map(Value::Object)
                .map_err(|e| Mismatch {
                    path: path.to_string(),
                    reason: e.to_string(),
                })
        }
        scalar => coerce_scalar(dynamic, scalar).ok_or_else(|| {
            let expected = match scalar {
                Value::Enum(e) => format!("one of {}", e.constants().join(", ")),
                other => other.kind().to_string(),
            };
            mismatch(path, &expected, dynamic)
        }),
    }
}

fn coerce_scalar<D: Dynamic + ?Sized>(dynamic: &D, default: &Value) -> Option<Value> {
    match default {
        Value::Int(_) => dynamic
            .as_integer()
            .and_then(|i| i32::try_from(i).ok())
            .map(Value::Int),
        Value::Long(_) => dynamic.as_integer().map(Value::Long),
        Value::Float(_) => numeric(dynamic).and_then(narrow).map(Value::Float),
        Value::Double(_) => numeric(dynamic).map(Value::Double),
        Value::Bool(_) => dynamic.as_bool().map(Value::Bool),
        Value::String(_) => dynamic.as_str().map(|s| Value::String(s.to_string())),
        Value::Enum(e) => dynamic.as_str().and_then(|name| e.sibling(name)).map(Value::Enum),
        Value::List(_) | Value::Map(_) | Value::Object(_) => None,
    }
}

/// `None` when a finite double does not fit in an `f32`.
fn narrow(f: f64) -> Option<f32> {
    let narrowed = f as f32;
    (narrowed.is_finite() || !f.is_finite()).then_some(narrowed)
}

fn numeric<D: Dynamic + ?Sized>(dynamic: &D) -> Option<f64> {
    dynamic
        .as_float()
        .or_else(|| dynamic.as_integer().map(|i| i as f64))
}

/// Typed values are themselves a valid dynamic input, which lets a value be
/// re-coerced against another default. Serializable objects must be lowered
/// with [`Value::to_representation`] first.
impl Dynamic for Value {
    fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(i64::from(*v)),
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(crate::value::widen_f32(*v)),
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            Value::Enum(e) => Some(e.name()),
            _ => None,
        }
    }

    fn elements(&self) -> Option<Box<dyn Iterator<Item = &Self> + '_>> {
        match self {
            Value::List(list) => Some(Box::new(list.iter())),
            _ => None,
        }
    }

    fn entries(&self) -> Option<Box<dyn Iterator<Item = (&str, &Self)> + '_>> {
        match self {
            Value::Map(map) => Some(Box::new(map.iter())),
            _ => None,
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Value::Int(_) | Value::Long(_) => "integer",
            Value::Float(_) | Value::Double(_) => "float",
            Value::Bool(_) => "boolean",
            Value::String(_) => "string",
            Value::Enum(_) => "enum constant",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
        }
    }
}
