#[cfg(test)]
pub mod test {
    use crate::constraint::Constraint;
    use crate::error::ConfigError;
    use crate::tracked::TrackedValue;
    use crate::tree::ValueTree;
    use crate::value::{ConfigEnum, ConfigSerializable, Value, ValueList, ValueMap};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Color {
        Red,
        Green,
        Blue,
    }

    impl ConfigEnum for Color {
        const CONSTANTS: &'static [&'static str] = &["RED", "GREEN", "BLUE"];

        fn ordinal(self) -> usize {
            self as usize
        }

        fn from_ordinal(ordinal: usize) -> Option<Self> {
            [Color::Red, Color::Green, Color::Blue].get(ordinal).copied()
        }
    }

    /// Integer vector stored as `{x, y, z}`.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Vec3i {
        pub x: i32,
        pub y: i32,
        pub z: i32,
    }

    impl Vec3i {
        pub fn new(x: i32, y: i32, z: i32) -> Self {
            Self { x, y, z }
        }
    }

    impl ConfigSerializable for Vec3i {
        fn representation(&self) -> Value {
            Value::Map(
                ValueMap::new(0)
                    .with("x", self.x)
                    .with("y", self.y)
                    .with("z", self.z),
            )
        }

        fn convert_from(&self, representation: &Value) -> Result<Self, ConfigError> {
            let map = representation
                .as_map()
                .ok_or_else(|| ConfigError::invalid("vec3i", "expected a map"))?;
            let axis = |name: &str| {
                map.get(name)
                    .and_then(Value::get::<i32>)
                    .ok_or_else(|| ConfigError::invalid("vec3i", format!("missing '{name}'")))
            };
            Ok(Vec3i::new(axis("x")?, axis("y")?, axis("z")?))
        }
    }

    /// A tree touching every value kind:
    ///
    /// ```text
    /// name     = "demo"
    /// port     = 8080            range: [1, 65535]
    /// seed     = 42 (long)
    /// ratio    = 0.5 (float)
    /// debug    = false
    /// color    = RED
    /// tags     = ["a", "b"]
    /// limits   = {soft = 10, hard = 20}
    /// origin   = Vec3i(0, 0, 0)
    /// [client]
    /// volume   = 1.0             range: [0, 1]
    /// ```
    pub fn sample_tree() -> ValueTree {
        ValueTree::builder()
            .field(TrackedValue::builder("name", "demo").comment("Display name."))
            .field(
                TrackedValue::builder("port", 8080)
                    .constraint(Constraint::range_i64(1, 65535))
                    .comment("Listen port."),
            )
            .field(TrackedValue::builder("seed", 42_i64))
            .field(TrackedValue::builder("ratio", 0.5_f32))
            .field(TrackedValue::builder("debug", false))
            .field(TrackedValue::builder("color", Value::from_enum(Color::Red)))
            .field(TrackedValue::builder(
                "tags",
                ValueList::with_items("", ["a", "b"]),
            ))
            .field(TrackedValue::builder(
                "limits",
                ValueMap::new(0).with("soft", 10).with("hard", 20),
            ))
            .field(TrackedValue::builder(
                "origin",
                Value::object(Vec3i::new(0, 0, 0)),
            ))
            .section("client", |s| {
                s.comment("Client-side settings.").field(
                    TrackedValue::builder("volume", 1.0)
                        .constraint(Constraint::range_f64(0.0, 1.0)),
                )
            })
            .build()
            .unwrap()
    }

    #[test]
    fn sample_tree_builds_with_defaults() {
        let tree = sample_tree();
        assert_eq!(tree.values().count(), 10);
        assert_eq!(tree.get("port").unwrap().value(), &Value::Int(8080));
        assert_eq!(tree.get("client.volume").unwrap().value(), &Value::Double(1.0));
    }

    #[test]
    fn vec3i_round_trips_through_its_representation() {
        let v = Vec3i::new(1, 2, 3);
        let back = v.convert_from(&v.representation()).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn vec3i_rejects_incomplete_representation() {
        let partial = Value::Map(ValueMap::new(0).with("x", 1));
        assert!(Vec3i::new(0, 0, 0).convert_from(&partial).is_err());
    }
}
