//! Predicates attached to tracked values.
//!
//! A [`Constraint`] pairs a check with a stable, human-readable representation
//! (`range: [0, 100]`, `matches: [a-z]+`). The representation is written as a
//! comment next to the value by serializers that support comments. Several
//! constraints on one value combine with logical AND.

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::error::ConfigError;
use crate::value::Value;

type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct Constraint {
    predicate: Predicate,
    representation: String,
}

impl Constraint {
    /// A constraint from an arbitrary predicate.
    pub fn custom(
        representation: impl Into<String>,
        predicate: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            predicate: Arc::new(predicate),
            representation: representation.into(),
        }
    }

    /// Inclusive integer range. Accepts any numeric value inside the bounds.
    pub fn range_i64(min: i64, max: i64) -> Self {
        Self::custom(format!("range: [{min}, {max}]"), move |value| {
            match value {
                Value::Int(v) => (min..=max).contains(&i64::from(*v)),
                Value::Long(v) => (min..=max).contains(v),
                Value::Float(v) => (min as f64..=max as f64).contains(&f64::from(*v)),
                Value::Double(v) => (min as f64..=max as f64).contains(v),
                _ => false,
            }
        })
    }

    /// Inclusive floating-point range.
    pub fn range_f64(min: f64, max: f64) -> Self {
        Self::custom(format!("range: [{min}, {max}]"), move |value| {
            let v = match value {
                Value::Int(v) => f64::from(*v),
                Value::Long(v) => *v as f64,
                Value::Float(v) => f64::from(*v),
                Value::Double(v) => *v,
                _ => return false,
            };
            (min..=max).contains(&v)
        })
    }

    /// The whole string must match `pattern`.
    pub fn matching(pattern: &str) -> Result<Self, ConfigError> {
        let regex = Regex::new(&format!("^(?:{pattern})$"))
            .map_err(|e| ConfigError::invalid(pattern, e.to_string()))?;
        Ok(Self::custom(format!("matches: {pattern}"), move |value| {
            matches!(value, Value::String(s) if regex.is_match(s))
        }))
    }

    /// Apply `inner` to every list element or map value.
    pub fn all(inner: Constraint) -> Self {
        let representation = format!("all: {}", inner.representation);
        Self::custom(representation, move |value| match value {
            Value::List(list) => list.iter().all(|item| inner.check(item)),
            Value::Map(map) => map.values().all(|item| inner.check(item)),
            _ => false,
        })
    }

    pub fn check(&self, value: &Value) -> bool {
        (self.predicate)(value)
    }

    pub fn representation(&self) -> &str {
        &self.representation
    }
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Constraint")
            .field(&self.representation)
            .finish()
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.representation)
    }
}

/// The first constraint in `constraints` that rejects `value`.
pub fn first_violation<'a>(constraints: &'a [Constraint], value: &Value) -> Option<&'a Constraint> {
    constraints.iter().find(|c| !c.check(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{ValueList, ValueMap};

    #[test]
    fn range_representation_is_stable() {
        assert_eq!(Constraint::range_i64(0, 100).representation(), "range: [0, 100]");
        assert_eq!(Constraint::range_f64(0.0, 1.0).representation(), "range: [0, 1]");
        assert_eq!(Constraint::range_f64(0.5, 2.5).representation(), "range: [0.5, 2.5]");
    }

    #[test]
    fn integer_range_bounds_are_inclusive() {
        let c = Constraint::range_i64(0, 100);
        assert!(c.check(&Value::Int(0)));
        assert!(c.check(&Value::Int(100)));
        assert!(!c.check(&Value::Int(101)));
        assert!(!c.check(&Value::Long(-1)));
        assert!(!c.check(&Value::from("50")));
    }

    #[test]
    fn float_range_checks_doubles() {
        let c = Constraint::range_f64(0.0, 1.0);
        assert!(c.check(&Value::Double(1.0)));
        assert!(!c.check(&Value::Double(2.5)));
        assert!(c.check(&Value::Float(0.25)));
    }

    #[test]
    fn matching_is_anchored() {
        let c = Constraint::matching("[a-z]+").unwrap();
        assert_eq!(c.representation(), "matches: [a-z]+");
        assert!(c.check(&Value::from("abc")));
        assert!(!c.check(&Value::from("abc1")));
        assert!(!c.check(&Value::Int(1)));
    }

    #[test]
    fn matching_rejects_bad_pattern() {
        assert!(Constraint::matching("(").is_err());
    }

    #[test]
    fn all_applies_to_elements() {
        let c = Constraint::all(Constraint::range_i64(0, 10));
        assert_eq!(c.representation(), "all: range: [0, 10]");
        assert!(c.check(&Value::List(ValueList::with_items(0, [1, 2, 3]))));
        assert!(!c.check(&Value::List(ValueList::with_items(0, [1, 20]))));
        assert!(c.check(&Value::Map(ValueMap::new(0).with("a", 5))));
        assert!(c.check(&Value::List(ValueList::new(0))));
    }

    #[test]
    fn first_violation_reports_in_order() {
        let constraints = vec![
            Constraint::range_i64(0, 100),
            Constraint::custom("even", |v| matches!(v, Value::Int(n) if n % 2 == 0)),
        ];
        assert!(first_violation(&constraints, &Value::Int(4)).is_none());
        assert_eq!(
            first_violation(&constraints, &Value::Int(3)).unwrap().representation(),
            "even"
        );
        assert_eq!(
            first_violation(&constraints, &Value::Int(300)).unwrap().representation(),
            "range: [0, 100]"
        );
    }
}
