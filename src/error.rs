use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse {format} document: {reason}")]
    Parse { format: String, reason: String },

    #[error("Failed to write {format} document: {reason}")]
    Serialize { format: String, reason: String },

    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("No {kind} metadata on '{key}'")]
    MetadataNotFound { key: String, kind: String },

    #[error("Duplicate key '{0}' in the same section")]
    DuplicateKey(String),

    #[error("Invalid default for '{key}': {reason}")]
    InvalidDefault { key: String, reason: String },

    #[error("Value {value} for '{key}' violates constraint '{constraint}'")]
    ConstraintViolation {
        key: String,
        value: String,
        constraint: String,
    },

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("No serializer registered for extension '{0}'")]
    UnknownFormat(String),

    #[error("Config {family}:{id} is already registered")]
    AlreadyRegistered { family: String, id: String },

    #[error("Config {family}:{id} is not registered")]
    NotRegistered { family: String, id: String },
}

impl ConfigError {
    /// Shorthand used by `convert_from` implementations to reject a representation.
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
