use std::fmt;
use std::path::PathBuf;

/// Dotted path of a node in a value tree, e.g. `client.volume`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ValueKey {
    segments: Vec<String>,
}

impl ValueKey {
    /// The empty path of the tree root.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Local name of the node (last segment). Empty for the root.
    pub fn last(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    pub fn parent(&self) -> Option<ValueKey> {
        let (_, parent) = self.segments.split_last()?;
        Some(Self {
            segments: parent.to_vec(),
        })
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl From<&str> for ValueKey {
    fn from(dotted: &str) -> Self {
        Self {
            segments: dotted
                .split('.')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

impl fmt::Display for ValueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// A config operation, independent of any CLI framework.
/// The CLI layer converts parsed clap args into this.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigAction {
    List,
    Gen { output: Option<PathBuf> },
    Get { key: String },
    Set { key: String, value: String },
}
