//! The typed value model: scalars, enum constants, ordered lists and maps, and
//! user-defined serializable objects.
//!
//! [`Value`] is a closed sum type. Every tracked value holds one as its default
//! and one as its current value, and the coercion engine dispatches on the
//! default's variant to decide how an untyped document value is read.
//!
//! Cloning a `Value` is a deep copy: lists and maps duplicate their elements and
//! serializable objects are duplicated through their own `Clone`. Defaults are
//! therefore never aliased by the values derived from them.

use std::any::Any;
use std::fmt;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::error::ConfigError;

/// The variant of a [`Value`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Int,
    Long,
    Float,
    Double,
    Bool,
    String,
    Enum,
    List,
    Map,
    Object,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Int => "integer",
            ValueKind::Long => "long integer",
            ValueKind::Float => "float",
            ValueKind::Double => "double",
            ValueKind::Bool => "boolean",
            ValueKind::String => "string",
            ValueKind::Enum => "enum constant",
            ValueKind::List => "list",
            ValueKind::Map => "map",
            ValueKind::Object => "object",
        };
        f.write_str(name)
    }
}

/// A typed configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bool(bool),
    String(String),
    Enum(EnumValue),
    List(ValueList),
    Map(ValueMap),
    Object(ObjectValue),
}

impl Value {
    /// Wrap an enum implementing [`ConfigEnum`].
    pub fn from_enum<E: ConfigEnum>(constant: E) -> Self {
        Value::Enum(EnumValue::of(constant))
    }

    /// Wrap a serializable object.
    pub fn object<T: ConfigSerializable>(object: T) -> Self {
        Value::Object(ObjectValue::new(object))
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Int(_) => ValueKind::Int,
            Value::Long(_) => ValueKind::Long,
            Value::Float(_) => ValueKind::Float,
            Value::Double(_) => ValueKind::Double,
            Value::Bool(_) => ValueKind::Bool,
            Value::String(_) => ValueKind::String,
            Value::Enum(_) => ValueKind::Enum,
            Value::List(_) => ValueKind::List,
            Value::Map(_) => ValueKind::Map,
            Value::Object(_) => ValueKind::Object,
        }
    }

    /// Lists and maps. Their structure documents itself, so no "default" line
    /// is generated for them.
    pub fn is_compound(&self) -> bool {
        matches!(self, Value::List(_) | Value::Map(_))
    }

    /// Whether `self` has the same shape as `template`: same kind, same enum
    /// constant set, same object type, and (for lists and maps) every element
    /// conforming to the template's element default.
    pub fn conforms_to(&self, template: &Value) -> bool {
        match (self, template) {
            (Value::Enum(a), Value::Enum(b)) => a.constants() == b.constants() && a.is_valid(),
            (Value::Object(a), Value::Object(b)) => a.same_type(b),
            (Value::List(a), Value::List(b)) => {
                a.element_default().conforms_to(b.element_default())
                    && a.iter().all(|item| item.conforms_to(b.element_default()))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.value_default().conforms_to(b.value_default())
                    && a.values().all(|item| item.conforms_to(b.value_default()))
            }
            (a, b) => a.kind() == b.kind(),
        }
    }

    /// Read a scalar out as a concrete Rust type.
    pub fn get<T: FromValue>(&self) -> Option<T> {
        T::from_value(self)
    }

    pub fn as_list(&self) -> Option<&ValueList> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Value::Enum(e) => Some(e),
            _ => None,
        }
    }

    /// Borrow the live instance of a serializable object of type `T`.
    pub fn as_object<T: ConfigSerializable>(&self) -> Option<&T> {
        match self {
            Value::Object(o) => o.downcast_ref(),
            _ => None,
        }
    }

    /// Replace serializable objects by their representation, recursively.
    /// The result contains only scalars, enums, lists and maps.
    pub fn to_representation(&self) -> Value {
        match self {
            Value::Object(o) => o.representation().to_representation(),
            Value::List(l) => Value::List(ValueList {
                element_default: Box::new(l.element_default.to_representation()),
                items: l.items.iter().map(Value::to_representation).collect(),
            }),
            Value::Map(m) => Value::Map(ValueMap {
                value_default: Box::new(m.value_default.to_representation()),
                entries: m
                    .entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_representation()))
                    .collect(),
            }),
            other => other.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}"),
            // Debug keeps the fractional part: `1.0`, not `1`.
            Value::Float(v) => write!(f, "{v:?}"),
            Value::Double(v) => write!(f, "{v:?}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::String(v) => f.write_str(v),
            Value::Enum(v) => f.write_str(v.name()),
            Value::List(list) => {
                f.write_str("[")?;
                for (i, item) in list.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key} = {value}")?;
                }
                f.write_str("}")
            }
            Value::Object(o) => write!(f, "{}", o.representation()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Int(v) => serializer.serialize_i32(*v),
            Value::Long(v) => serializer.serialize_i64(*v),
            Value::Float(v) => serializer.serialize_f64(widen_f32(*v)),
            Value::Double(v) => serializer.serialize_f64(*v),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::String(v) => serializer.serialize_str(v),
            Value::Enum(v) => serializer.serialize_str(v.name()),
            Value::List(list) => {
                let mut seq = serializer.serialize_seq(Some(list.len()))?;
                for item in list.iter() {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map.iter() {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
            Value::Object(o) => o.representation().serialize(serializer),
        }
    }
}

/// Widen an `f32` through its shortest decimal form, so `0.1f32` is written
/// as `0.1` rather than `0.10000000149011612` and still reads back exactly.
pub(crate) fn widen_f32(v: f32) -> f64 {
    if !v.is_finite() {
        return f64::from(v);
    }
    v.to_string().parse().unwrap_or(f64::from(v))
}

macro_rules! scalar_conversions {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }

            impl FromValue for $ty {
                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::$variant(v) => Some(v.clone()),
                        _ => None,
                    }
                }
            }
        )*
    };
}

/// Extract a concrete Rust type from a [`Value`] of the matching kind.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

scalar_conversions! {
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    bool => Bool,
    String => String,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<ValueList> for Value {
    fn from(v: ValueList) -> Self {
        Value::List(v)
    }
}

impl From<ValueMap> for Value {
    fn from(v: ValueMap) -> Self {
        Value::Map(v)
    }
}

impl From<EnumValue> for Value {
    fn from(v: EnumValue) -> Self {
        Value::Enum(v)
    }
}

// --- Enums ---

/// A Rust enum usable as a config value. Constants are identified by name,
/// matched exactly (case-sensitive) when reading documents.
pub trait ConfigEnum: Copy + 'static {
    /// All legal constant names, in ordinal order.
    const CONSTANTS: &'static [&'static str];

    fn ordinal(self) -> usize;

    fn from_ordinal(ordinal: usize) -> Option<Self>;
}

/// One constant of an enum, together with the full constant set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumValue {
    constants: &'static [&'static str],
    ordinal: usize,
}

impl EnumValue {
    pub fn of<E: ConfigEnum>(constant: E) -> Self {
        Self {
            constants: E::CONSTANTS,
            ordinal: constant.ordinal(),
        }
    }

    /// Look up `name` among `constants`. Returns `None` if it is not one of them.
    pub fn named(constants: &'static [&'static str], name: &str) -> Option<Self> {
        let ordinal = constants.iter().position(|c| *c == name)?;
        Some(Self { constants, ordinal })
    }

    /// Another constant of the same enum.
    pub fn sibling(&self, name: &str) -> Option<Self> {
        Self::named(self.constants, name)
    }

    /// The constant's name, or `""` if the ordinal is outside the constant set.
    pub fn name(&self) -> &'static str {
        self.constants.get(self.ordinal).copied().unwrap_or("")
    }

    /// Whether the ordinal names one of the constants. A [`ConfigEnum`] whose
    /// `ordinal` disagrees with its `CONSTANTS` produces invalid values, which
    /// tracked values refuse.
    pub fn is_valid(&self) -> bool {
        self.ordinal < self.constants.len()
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn constants(&self) -> &'static [&'static str] {
        self.constants
    }

    /// Convert back into the Rust enum it was built from.
    pub fn get<E: ConfigEnum>(&self) -> Option<E> {
        if self.constants != E::CONSTANTS {
            return None;
        }
        E::from_ordinal(self.ordinal)
    }
}

// --- Lists ---

/// An ordered, homogeneous list. The element default gives the shape every
/// element must have and is what a malformed element falls back to.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueList {
    element_default: Box<Value>,
    items: Vec<Value>,
}

impl ValueList {
    pub fn new(element_default: impl Into<Value>) -> Self {
        Self {
            element_default: Box::new(element_default.into()),
            items: Vec::new(),
        }
    }

    pub fn with_items<V: Into<Value>>(
        element_default: impl Into<Value>,
        items: impl IntoIterator<Item = V>,
    ) -> Self {
        let mut list = Self::new(element_default);
        list.items.extend(items.into_iter().map(Into::into));
        list
    }

    pub fn element_default(&self) -> &Value {
        &self.element_default
    }

    pub fn push(&mut self, item: impl Into<Value>) {
        self.items.push(item.into());
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// --- Maps ---

/// A string-keyed map that keeps insertion order. Keys are unique; inserting
/// an existing key replaces its value in place.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueMap {
    value_default: Box<Value>,
    entries: Vec<(String, Value)>,
}

impl ValueMap {
    pub fn new(value_default: impl Into<Value>) -> Self {
        Self {
            value_default: Box::new(value_default.into()),
            entries: Vec::new(),
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn value_default(&self) -> &Value {
        &self.value_default
    }

    /// Insert or replace. Returns the previous value for `key`, if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// --- Serializable objects ---

/// A user type stored through a representation built from other values.
///
/// `convert_from(&representation())` must produce a value equal to `self`.
/// `convert_from` is called on the default instance, so it may use the
/// default's state to fill in anything the representation leaves out.
pub trait ConfigSerializable: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    fn representation(&self) -> Value;

    fn convert_from(&self, representation: &Value) -> Result<Self, ConfigError>;
}

trait DynSerializable: fmt::Debug + Send + Sync {
    fn representation(&self) -> Value;
    fn convert_from(&self, representation: &Value) -> Result<ObjectValue, ConfigError>;
    fn clone_box(&self) -> Box<dyn DynSerializable>;
    fn eq_dyn(&self, other: &dyn DynSerializable) -> bool;
    fn as_any(&self) -> &dyn Any;
}

impl<T: ConfigSerializable> DynSerializable for T {
    fn representation(&self) -> Value {
        ConfigSerializable::representation(self)
    }

    fn convert_from(&self, representation: &Value) -> Result<ObjectValue, ConfigError> {
        ConfigSerializable::convert_from(self, representation).map(ObjectValue::new)
    }

    fn clone_box(&self) -> Box<dyn DynSerializable> {
        Box::new(self.clone())
    }

    fn eq_dyn(&self, other: &dyn DynSerializable) -> bool {
        other.as_any().downcast_ref::<T>() == Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A type-erased [`ConfigSerializable`] instance.
#[derive(Debug)]
pub struct ObjectValue(Box<dyn DynSerializable>);

impl ObjectValue {
    pub fn new<T: ConfigSerializable>(object: T) -> Self {
        ObjectValue(Box::new(object))
    }

    pub fn representation(&self) -> Value {
        self.0.representation()
    }

    /// Rebuild an instance of the same type from a representation.
    pub fn convert_from(&self, representation: &Value) -> Result<ObjectValue, ConfigError> {
        self.0.convert_from(representation)
    }

    pub fn downcast_ref<T: ConfigSerializable>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref()
    }

    fn same_type(&self, other: &ObjectValue) -> bool {
        self.0.as_any().type_id() == other.0.as_any().type_id()
    }
}

impl Clone for ObjectValue {
    fn clone(&self) -> Self {
        ObjectValue(self.0.clone_box())
    }
}

impl PartialEq for ObjectValue {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_dyn(other.0.as_ref())
    }
}
