//! Typed, tracked configuration trees with format-agnostic persistence.
//!
//! Trackfig describes configuration as a tree of sections and tracked values.
//! Each value carries a typed default, its current value, validation
//! constraints, comments and change listeners. The tree is written to and read
//! from documents through a pluggable [`Serializer`]; TOML and JSON backends
//! are included.
//!
//! ```ignore
//! let tree = ValueTree::builder()
//!     .comment("Example settings.")
//!     .field(TrackedValue::builder("port", 8080).constraint(Constraint::range_i64(1, 65535)))
//!     .section("client", |s| {
//!         s.comment("Client-side settings.")
//!             .field(TrackedValue::builder("volume", 1.0).constraint(Constraint::range_f64(0.0, 1.0)))
//!     })
//!     .build()?;
//!
//! let env = ConfigEnvironment::new("config");
//! let mut registry = ConfigRegistry::new();
//! let config = registry.create(&env, "example", "main", "", tree)?;
//! let volume: f64 = config.tree().lookup("client.volume")?.get().unwrap_or(1.0);
//! ```
//!
//! That call binds the tree to `config/example/main.toml`, loads whatever the
//! file holds, and saves it back so the file documents every field.
//!
//! # Values
//!
//! A [`Value`] is a scalar (integer, long, float, double, boolean, string, enum
//! constant), a homogeneous list, a string-keyed map, or a serializable object.
//! Lists and maps carry an element default even when empty, so an empty list
//! still knows what its elements look like. Objects implement
//! [`ConfigSerializable`]: they expose a representation built from the other
//! value kinds and rebuild themselves from one.
//!
//! # Tracked values
//!
//! A [`TrackedValue`] never holds a value of the wrong shape or one that fails
//! its constraints. [`TrackedValue::set_value`] returns `false` and keeps the
//! current value when either check fails. Listeners receive `(old, new)` when
//! the caller asks for notification; loading from a document never notifies.
//!
//! # Loading is forgiving
//!
//! Documents are parsed in full before anything is installed, so a document
//! that does not parse fails the load and leaves the tree untouched. Inside a
//! parsed document every field is handled on its own. Each value is coerced
//! against its default by [`coerce`](coerce::coerce): a wrong type falls back
//! to the default at that level (one bad list element does not discard the
//! list), integers widen to long and floating kinds, and enum constants match
//! by exact name. A coerced value that violates a constraint is rejected and
//! the previous value stays. Unknown keys are ignored.
//!
//! Setting a value from text ([`ConfigAction::Set`]) applies the same rules
//! strictly and reports the first problem instead.
//!
//! # Written documents
//!
//! Serializers write values in declaration order. Sections become nested
//! tables, and each value is preceded by its comment block: user comments,
//! enum options, constraint descriptions and the default. Comments are never
//! read back.
//!
//! ```toml
//! # Listen port.
//! # range: [1, 65535]
//! # default: 8080
//! port = 8080
//!
//! # Client-side settings.
//! [client]
//! # range: [0, 1]
//! # default: 1.0
//! volume = 1.0
//! ```
//!
//! # Clap adapter
//!
//! With the `clap` feature (on by default), [`ConfigArgs`] adds
//! `config list|gen|get|set` to an application's CLI:
//!
//! ```ignore
//! Commands::Config(args) => {
//!     let result = config.handle(&args.into_action())?;
//!     println!("{result}");
//! }
//! ```
//!
//! # Error handling
//!
//! Every fallible operation returns [`ConfigError`]. Building a tree fails on
//! duplicate keys and invalid defaults; loading fails only on unreadable or
//! unparseable files; `set` fails on unknown keys, type mismatches and
//! constraint violations.

pub mod coerce;
pub mod error;
pub mod serializer;
pub mod types;

#[cfg(feature = "clap")]
mod cli;
mod config;
mod constraint;
mod json_format;
mod metadata;
mod ops;
mod toml_format;
mod tracked;
mod tree;
mod value;

#[cfg(test)]
mod fixtures;

#[cfg(feature = "clap")]
pub use cli::{ConfigArgs, ConfigSubcommand};
pub use config::{Config, ConfigEnvironment, ConfigRegistry};
pub use constraint::Constraint;
pub use error::ConfigError;
pub use json_format::JsonSerializer;
pub use metadata::{Metadata, MetadataKind};
pub use ops::{ConfigResult, generate_template, get_value, list_values, set_value};
pub use serializer::Serializer;
pub use toml_format::TomlSerializer;
pub use tracked::{Listener, TrackedValue, TrackedValueBuilder};
pub use tree::{Nodes, Section, TreeBuilder, ValueTree, ValueTreeNode};
pub use types::{ConfigAction, ValueKey};
pub use value::{
    ConfigEnum, ConfigSerializable, EnumValue, FromValue, ObjectValue, Value, ValueKind,
    ValueList, ValueMap,
};
