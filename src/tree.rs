//! The value tree: an ordered, nested schema of sections and tracked values.
//!
//! Trees are built once through [`TreeBuilder`]. After that the set of paths
//! and the shape of each value are fixed; only current values change.
//!
//! Traversal is depth-first pre-order in declaration order. A section is
//! yielded by [`ValueTree::nodes`] *before* its children.

use std::slice;

use crate::error::ConfigError;
use crate::metadata::Metadata;
use crate::tracked::{TrackedValue, TrackedValueBuilder};
use crate::types::ValueKey;

#[derive(Debug)]
pub enum ValueTreeNode {
    Value(TrackedValue),
    Section(Section),
}

impl ValueTreeNode {
    pub fn key(&self) -> &ValueKey {
        match self {
            ValueTreeNode::Value(v) => v.key(),
            ValueTreeNode::Section(s) => &s.key,
        }
    }

    pub fn metadata(&self) -> &Metadata {
        match self {
            ValueTreeNode::Value(v) => v.metadata(),
            ValueTreeNode::Section(s) => &s.metadata,
        }
    }
}

/// A named group of child nodes.
#[derive(Debug)]
pub struct Section {
    key: ValueKey,
    metadata: Metadata,
    children: Vec<ValueTreeNode>,
}

impl Section {
    pub fn key(&self) -> &ValueKey {
        &self.key
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn children(&self) -> &[ValueTreeNode] {
        &self.children
    }
}

#[derive(Debug, Default)]
pub struct ValueTree {
    metadata: Metadata,
    children: Vec<ValueTreeNode>,
}

impl ValueTree {
    pub fn builder() -> TreeBuilder {
        TreeBuilder::new(ValueKey::root())
    }

    /// Header metadata for the whole tree (written at the top of a document).
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Top-level nodes.
    pub fn children(&self) -> &[ValueTreeNode] {
        &self.children
    }

    /// A copy of this tree with every value at its default. Listeners are
    /// not copied.
    pub fn defaults(&self) -> ValueTree {
        ValueTree {
            metadata: self.metadata.clone(),
            children: default_nodes(&self.children),
        }
    }

    /// Every node, pre-order, sections before their children.
    pub fn nodes(&self) -> Nodes<'_> {
        Nodes {
            stack: vec![self.children.iter()],
        }
    }

    /// Every tracked value, flattened, in declaration order.
    pub fn values(&self) -> impl Iterator<Item = &TrackedValue> {
        self.nodes().filter_map(|node| match node {
            ValueTreeNode::Value(v) => Some(v),
            ValueTreeNode::Section(_) => None,
        })
    }

    /// Mutable access to every tracked value, in declaration order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut TrackedValue> {
        let mut out = Vec::new();
        collect_values_mut(&mut self.children, &mut out);
        out.into_iter()
    }

    pub fn get(&self, path: &str) -> Option<&TrackedValue> {
        match self.node(path)? {
            ValueTreeNode::Value(v) => Some(v),
            ValueTreeNode::Section(_) => None,
        }
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut TrackedValue> {
        let key = ValueKey::from(path);
        let (leaf, parents) = key.segments().split_last()?;
        let mut children = &mut self.children;
        for segment in parents {
            children = match children.iter_mut().find(|n| n.key().last() == segment)? {
                ValueTreeNode::Section(s) => &mut s.children,
                ValueTreeNode::Value(_) => return None,
            };
        }
        match children.iter_mut().find(|n| n.key().last() == leaf)? {
            ValueTreeNode::Value(v) => Some(v),
            ValueTreeNode::Section(_) => None,
        }
    }

    /// Like [`get`](Self::get), but `KeyNotFound` when the path names no value.
    pub fn lookup(&self, path: &str) -> Result<&TrackedValue, ConfigError> {
        self.get(path)
            .ok_or_else(|| ConfigError::KeyNotFound(path.to_string()))
    }

    pub fn lookup_mut(&mut self, path: &str) -> Result<&mut TrackedValue, ConfigError> {
        self.get_mut(path)
            .ok_or_else(|| ConfigError::KeyNotFound(path.to_string()))
    }

    pub fn section(&self, path: &str) -> Option<&Section> {
        match self.node(path)? {
            ValueTreeNode::Section(s) => Some(s),
            ValueTreeNode::Value(_) => None,
        }
    }

    fn node(&self, path: &str) -> Option<&ValueTreeNode> {
        let key = ValueKey::from(path);
        let mut children = self.children.as_slice();
        let mut found = None;
        for segment in key.segments() {
            let node = children.iter().find(|n| n.key().last() == segment)?;
            children = match node {
                ValueTreeNode::Section(s) => s.children.as_slice(),
                ValueTreeNode::Value(_) => &[],
            };
            found = Some(node);
        }
        found
    }
}

fn written_name(node: &ValueTreeNode) -> &str {
    match node {
        ValueTreeNode::Value(v) => v.serialized_name(),
        ValueTreeNode::Section(s) => s.key.last(),
    }
}

fn default_nodes(nodes: &[ValueTreeNode]) -> Vec<ValueTreeNode> {
    nodes
        .iter()
        .map(|node| match node {
            ValueTreeNode::Value(v) => ValueTreeNode::Value(v.default_copy()),
            ValueTreeNode::Section(s) => ValueTreeNode::Section(Section {
                key: s.key.clone(),
                metadata: s.metadata.clone(),
                children: default_nodes(&s.children),
            }),
        })
        .collect()
}

fn collect_values_mut<'a>(nodes: &'a mut [ValueTreeNode], out: &mut Vec<&'a mut TrackedValue>) {
    for node in nodes {
        match node {
            ValueTreeNode::Value(v) => out.push(v),
            ValueTreeNode::Section(s) => collect_values_mut(&mut s.children, out),
        }
    }
}

/// Pre-order iterator returned by [`ValueTree::nodes`].
pub struct Nodes<'a> {
    stack: Vec<slice::Iter<'a, ValueTreeNode>>,
}

impl<'a> Iterator for Nodes<'a> {
    type Item = &'a ValueTreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                Some(node) => {
                    if let ValueTreeNode::Section(s) = node {
                        self.stack.push(s.children.iter());
                    }
                    return Some(node);
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

/// Builds a [`ValueTree`] (or, nested, one of its sections).
///
/// Errors are deferred: the first failure is kept and returned by
/// [`build`](Self::build), so declarations can be chained freely.
pub struct TreeBuilder {
    prefix: ValueKey,
    metadata: Metadata,
    children: Vec<ValueTreeNode>,
    error: Option<ConfigError>,
}

impl TreeBuilder {
    fn new(prefix: ValueKey) -> Self {
        Self {
            prefix,
            metadata: Metadata::default(),
            children: Vec::new(),
            error: None,
        }
    }

    /// Comment for this section (or the document header, at the root).
    pub fn comment(mut self, text: &str) -> Self {
        self.metadata.add_comment(text);
        self
    }

    pub fn field(mut self, field: TrackedValueBuilder) -> Self {
        if self.error.is_some() {
            return self;
        }
        if let Err(e) = self.check_sibling(field.name(), field.written_name()) {
            self.error = Some(e);
            return self;
        }
        match field.build(&self.prefix) {
            Ok(value) => self.children.push(ValueTreeNode::Value(value)),
            Err(e) => self.error = Some(e),
        }
        self
    }

    /// Declare a nested section, populated by `build`.
    pub fn section(mut self, name: &str, build: impl FnOnce(TreeBuilder) -> TreeBuilder) -> Self {
        if self.error.is_some() {
            return self;
        }
        if let Err(e) = self.check_sibling(name, name) {
            self.error = Some(e);
            return self;
        }
        let key = self.prefix.child(name);
        let inner = build(TreeBuilder::new(key.clone()));
        match inner.error {
            Some(e) => self.error = Some(e),
            None => self.children.push(ValueTreeNode::Section(Section {
                key,
                metadata: inner.metadata,
                children: inner.children,
            })),
        }
        self
    }

    pub fn build(self) -> Result<ValueTree, ConfigError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(ValueTree {
                metadata: self.metadata,
                children: self.children,
            }),
        }
    }

    /// Siblings must differ both in schema name and in the name they are
    /// written under.
    fn check_sibling(&self, name: &str, written: &str) -> Result<(), ConfigError> {
        if name.is_empty() || name.contains('.') {
            return Err(ConfigError::InvalidDefault {
                key: self.prefix.child(name).to_string(),
                reason: "names must be a single non-empty path segment".into(),
            });
        }
        if self.children.iter().any(|n| n.key().last() == name) {
            return Err(ConfigError::DuplicateKey(self.prefix.child(name).to_string()));
        }
        if self.children.iter().any(|n| written_name(n) == written) {
            return Err(ConfigError::DuplicateKey(self.prefix.child(written).to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::sample_tree;
    use crate::value::Value;

    fn nested() -> ValueTree {
        ValueTree::builder()
            .field(TrackedValue::builder("a", 1))
            .section("s", |s| {
                s.field(TrackedValue::builder("b", 2))
                    .section("t", |t| t.field(TrackedValue::builder("c", 3)))
                    .field(TrackedValue::builder("d", 4))
            })
            .field(TrackedValue::builder("e", 5))
            .build()
            .unwrap()
    }

    #[test]
    fn nodes_are_pre_order_with_sections_first() {
        let tree = nested();
        let keys: Vec<String> = tree.nodes().map(|n| n.key().to_string()).collect();
        assert_eq!(keys, vec!["a", "s", "s.b", "s.t", "s.t.c", "s.d", "e"]);
    }

    #[test]
    fn values_are_flattened_in_order() {
        let tree = nested();
        let keys: Vec<String> = tree.values().map(|v| v.key().to_string()).collect();
        assert_eq!(keys, vec!["a", "s.b", "s.t.c", "s.d", "e"]);
    }

    #[test]
    fn values_mut_matches_values_order() {
        let mut tree = nested();
        for (i, v) in tree.values_mut().enumerate() {
            assert!(v.set_value(100 + i as i32, false));
        }
        assert_eq!(tree.get("s.t.c").unwrap().value(), &Value::Int(102));
        assert_eq!(tree.get("e").unwrap().value(), &Value::Int(104));
    }

    #[test]
    fn defaults_copy_resets_values() {
        let mut tree = nested();
        assert!(tree.get_mut("s.t.c").unwrap().set_value(30, false));
        let defaults = tree.defaults();
        assert_eq!(defaults.get("s.t.c").unwrap().value(), &Value::Int(3));
        assert_eq!(tree.get("s.t.c").unwrap().value(), &Value::Int(30));
        let keys: Vec<String> = defaults.nodes().map(|n| n.key().to_string()).collect();
        assert_eq!(keys.len(), 7);
    }

    #[test]
    fn get_by_dotted_path() {
        let tree = nested();
        assert_eq!(tree.get("s.t.c").unwrap().value(), &Value::Int(3));
        assert!(tree.get("s.t").is_none());
        assert!(tree.get("s.missing").is_none());
        assert!(tree.get("a.b").is_none());
        assert!(tree.section("s.t").is_some());
    }

    #[test]
    fn lookup_reports_key_not_found() {
        let tree = nested();
        match tree.lookup("nope") {
            Err(ConfigError::KeyNotFound(k)) => assert_eq!(k, "nope"),
            other => panic!("Expected KeyNotFound, got: {other:?}"),
        }
    }

    #[test]
    fn get_mut_changes_leaf() {
        let mut tree = nested();
        assert!(tree.get_mut("s.b").unwrap().set_value(20, false));
        assert_eq!(tree.get("s.b").unwrap().value(), &Value::Int(20));
        assert!(tree.get_mut("s").is_none());
    }

    #[test]
    fn duplicate_sibling_keys_fail() {
        let err = ValueTree::builder()
            .field(TrackedValue::builder("a", 1))
            .section("a", |s| s)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateKey(k) if k == "a"));
    }

    #[test]
    fn serialized_names_must_not_collide() {
        let err = ValueTree::builder()
            .field(TrackedValue::builder("a", 1))
            .field(TrackedValue::builder("b", 2).serialized_name("a"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateKey(k) if k == "a"));

        let err = ValueTree::builder()
            .field(TrackedValue::builder("b", 2).serialized_name("net"))
            .section("net", |s| s)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateKey(k) if k == "net"));

        let err = ValueTree::builder()
            .field(TrackedValue::builder("b", 1).serialized_name("x"))
            .field(TrackedValue::builder("c", 2).serialized_name("x"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateKey(k) if k == "x"));
    }

    #[test]
    fn distinct_serialized_names_are_allowed() {
        let tree = ValueTree::builder()
            .field(TrackedValue::builder("a", 1).serialized_name("first"))
            .field(TrackedValue::builder("b", 2).serialized_name("second"))
            .build()
            .unwrap();
        assert_eq!(tree.get("b").unwrap().serialized_name(), "second");
    }

    #[test]
    fn same_name_in_different_sections_is_fine() {
        let tree = ValueTree::builder()
            .field(TrackedValue::builder("x", 1))
            .section("s", |s| s.field(TrackedValue::builder("x", 2)))
            .build()
            .unwrap();
        assert_eq!(tree.get("s.x").unwrap().value(), &Value::Int(2));
    }

    #[test]
    fn nested_error_propagates() {
        let err = ValueTree::builder()
            .section("s", |s| {
                s.field(TrackedValue::builder("x", 1))
                    .field(TrackedValue::builder("x", 2))
            })
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateKey(k) if k == "s.x"));
    }

    #[test]
    fn section_comments_are_kept() {
        let tree = sample_tree();
        let client = tree.section("client").unwrap();
        assert_eq!(client.metadata().comments().unwrap(), ["Client-side settings."]);
    }
}
