//! Tracked values: named, constrained, observable config fields.
//!
//! A [`TrackedValue`] holds its default and its current value. Every mutation
//! goes through [`set_value`](TrackedValue::set_value), which rejects values
//! that do not have the default's shape or that fail any attached constraint.
//! A rejected mutation leaves the current value untouched.

use std::fmt;

use crate::constraint::{self, Constraint};
use crate::error::ConfigError;
use crate::metadata::{Metadata, MetadataKind};
use crate::types::ValueKey;
use crate::value::{ConfigSerializable, FromValue, Value};

/// Change callback, invoked with `(old, new)`.
pub type Listener = Box<dyn FnMut(&Value, &Value) + Send>;

pub struct TrackedValue {
    key: ValueKey,
    default: Value,
    value: Value,
    constraints: Vec<Constraint>,
    metadata: Metadata,
    listeners: Vec<Listener>,
}

impl TrackedValue {
    /// Start declaring a value named `name` (a single path segment).
    pub fn builder(name: &str, default: impl Into<Value>) -> TrackedValueBuilder {
        TrackedValueBuilder {
            name: name.to_string(),
            default: default.into(),
            constraints: Vec::new(),
            metadata: Metadata::default(),
            listeners: Vec::new(),
        }
    }

    pub fn key(&self) -> &ValueKey {
        &self.key
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }

    /// Current value as a concrete scalar type.
    pub fn get<T: FromValue>(&self) -> Option<T> {
        self.value.get()
    }

    /// The live serializable object held by this value, if it holds one of type `T`.
    pub fn real_value<T: ConfigSerializable>(&self) -> Option<&T> {
        self.value.as_object()
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn has_metadata(&self, kind: MetadataKind) -> bool {
        self.metadata.has(kind)
    }

    /// Comment lines, or `MetadataNotFound` if none were declared.
    pub fn require_comments(&self) -> Result<&[String], ConfigError> {
        self.metadata
            .comments()
            .ok_or_else(|| ConfigError::MetadataNotFound {
                key: self.key.to_string(),
                kind: MetadataKind::Comment.to_string(),
            })
    }

    /// The name this value is written under: its serialized name if one is
    /// set, otherwise the last segment of its key.
    pub fn serialized_name(&self) -> &str {
        self.metadata
            .serialized_name()
            .unwrap_or_else(|| self.key.last())
    }

    /// Replace the current value.
    ///
    /// Returns `false` and leaves the value unchanged if `value` does not have
    /// the default's shape or violates a constraint. When `notify` is set,
    /// listeners run synchronously with `(old, new)` after the replacement.
    pub fn set_value(&mut self, value: impl Into<Value>, notify: bool) -> bool {
        let value = value.into();
        if let Err(reason) = self.validate(&value) {
            tracing::debug!(key = %self.key, %value, %reason, "Rejected value");
            return false;
        }

        self.install(value, notify);
        true
    }

    /// Restore the default value.
    pub fn reset(&mut self, notify: bool) -> bool {
        let default = self.default.clone();
        self.set_value(default, notify)
    }

    /// Like [`set_value`](Self::set_value), but reports why a value was rejected.
    pub fn try_set_value(&mut self, value: Value, notify: bool) -> Result<(), ConfigError> {
        if !value.conforms_to(&self.default) {
            return Err(ConfigError::InvalidValue {
                key: self.key.to_string(),
                reason: format!("expected {}, got {}", self.default.kind(), value.kind()),
            });
        }
        if let Some(c) = constraint::first_violation(&self.constraints, &value) {
            return Err(ConfigError::ConstraintViolation {
                key: self.key.to_string(),
                value: value.to_string(),
                constraint: c.representation().to_string(),
            });
        }
        self.install(value, notify);
        Ok(())
    }

    /// A copy holding the default as its current value, without listeners.
    pub(crate) fn default_copy(&self) -> TrackedValue {
        TrackedValue {
            key: self.key.clone(),
            default: self.default.clone(),
            value: self.default.clone(),
            constraints: self.constraints.clone(),
            metadata: self.metadata.clone(),
            listeners: Vec::new(),
        }
    }

    pub fn register_listener(&mut self, listener: impl FnMut(&Value, &Value) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn install(&mut self, value: Value, notify: bool) {
        let old = std::mem::replace(&mut self.value, value);
        if notify {
            for listener in &mut self.listeners {
                listener(&old, &self.value);
            }
        }
    }

    fn validate(&self, value: &Value) -> Result<(), String> {
        if !value.conforms_to(&self.default) {
            return Err(format!("expected {}", self.default.kind()));
        }
        match constraint::first_violation(&self.constraints, value) {
            Some(c) => Err(c.representation().to_string()),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for TrackedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedValue")
            .field("key", &self.key)
            .field("value", &self.value)
            .field("default", &self.default)
            .field("constraints", &self.constraints)
            .field("metadata", &self.metadata)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Declaration of a tracked value, consumed by the tree builder.
pub struct TrackedValueBuilder {
    name: String,
    default: Value,
    constraints: Vec<Constraint>,
    metadata: Metadata,
    listeners: Vec<Listener>,
}

impl TrackedValueBuilder {
    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn comment(mut self, text: &str) -> Self {
        self.metadata.add_comment(text);
        self
    }

    pub fn serialized_name(mut self, name: &str) -> Self {
        self.metadata.set_serialized_name(name);
        self
    }

    pub fn listener(mut self, listener: impl FnMut(&Value, &Value) + Send + 'static) -> Self {
        self.listeners.push(Box::new(listener));
        self
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// The key this value will be written under.
    pub(crate) fn written_name(&self) -> &str {
        self.metadata.serialized_name().unwrap_or(&self.name)
    }

    /// Finish the value under `parent`. The default must have a consistent
    /// shape and satisfy its own constraints.
    pub(crate) fn build(self, parent: &ValueKey) -> Result<TrackedValue, ConfigError> {
        let key = parent.child(&self.name);
        if self.name.is_empty() || self.name.contains('.') {
            return Err(ConfigError::InvalidDefault {
                key: key.to_string(),
                reason: "names must be a single non-empty path segment".into(),
            });
        }
        if !self.default.conforms_to(&self.default) {
            return Err(ConfigError::InvalidDefault {
                key: key.to_string(),
                reason: "default is not well-formed (mismatched elements or unknown enum constant)"
                    .into(),
            });
        }
        if let Some(c) = constraint::first_violation(&self.constraints, &self.default) {
            return Err(ConfigError::InvalidDefault {
                key: key.to_string(),
                reason: format!("default {} violates '{}'", self.default, c.representation()),
            });
        }

        Ok(TrackedValue {
            key,
            value: self.default.clone(),
            default: self.default,
            constraints: self.constraints,
            metadata: self.metadata,
            listeners: self.listeners,
        })
    }
}
