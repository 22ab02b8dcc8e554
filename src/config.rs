//! Config files, the environment that places them, and a caller-owned registry.
//!
//! A [`Config`] binds a value tree to one file: `{root}/{family}/{sub_path}/{id}.{ext}`,
//! where the extension comes from the serializer chosen by the
//! [`ConfigEnvironment`]. There is no global state: callers own the
//! environment and the [`ConfigRegistry`] and pass them where needed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::ConfigError;
use crate::json_format::JsonSerializer;
use crate::ops::{self, ConfigResult};
use crate::serializer::Serializer;
use crate::toml_format::TomlSerializer;
use crate::tree::ValueTree;
use crate::types::ConfigAction;

/// Where config files live and which formats are available.
pub struct ConfigEnvironment {
    root: PathBuf,
    default_format: String,
    serializers: Vec<Arc<dyn Serializer>>,
}

impl ConfigEnvironment {
    /// An environment rooted at `root` with the TOML (default) and JSON
    /// serializers registered.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            default_format: "toml".into(),
            serializers: vec![Arc::new(TomlSerializer), Arc::new(JsonSerializer)],
        }
    }

    /// Register a serializer, replacing any with the same extension.
    pub fn with_serializer(mut self, serializer: impl Serializer + 'static) -> Self {
        let ext = serializer.file_extension().to_string();
        self.serializers.retain(|s| s.file_extension() != ext);
        self.serializers.push(Arc::new(serializer));
        self
    }

    /// Extension of the serializer used for new configs.
    pub fn default_format(mut self, extension: &str) -> Self {
        self.default_format = extension.to_string();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn serializer(&self, extension: &str) -> Result<Arc<dyn Serializer>, ConfigError> {
        self.serializers
            .iter()
            .find(|s| s.file_extension() == extension)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownFormat(extension.to_string()))
    }

    /// Bind `tree` to its file in this environment, without touching disk.
    pub fn config(
        &self,
        family: &str,
        id: &str,
        sub_path: impl AsRef<Path>,
        tree: ValueTree,
    ) -> Result<Config, ConfigError> {
        let serializer = self.serializer(&self.default_format)?;
        let path = self
            .root
            .join(family)
            .join(sub_path)
            .join(format!("{id}.{}", serializer.file_extension()));
        Ok(Config {
            family: family.to_string(),
            id: id.to_string(),
            path,
            serializer,
            tree,
        })
    }
}

/// A value tree bound to a file and a serializer.
pub struct Config {
    family: String,
    id: String,
    path: PathBuf,
    serializer: Arc<dyn Serializer>,
    tree: ValueTree,
}

impl Config {
    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn serializer(&self) -> &dyn Serializer {
        self.serializer.as_ref()
    }

    pub fn tree(&self) -> &ValueTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut ValueTree {
        &mut self.tree
    }

    /// Read the file into the tree. A missing file is not an error: the tree
    /// keeps its values and `Ok(false)` is returned.
    pub fn load(&mut self) -> Result<bool, ConfigError> {
        let content = match std::fs::read(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No config file, keeping defaults");
                return Ok(false);
            }
            Err(e) => {
                return Err(ConfigError::Io {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };

        self.serializer
            .deserialize(&mut self.tree, &mut content.as_slice())?;
        tracing::debug!(path = %self.path.display(), "Loaded config");
        Ok(true)
    }

    /// Write the tree to its file, creating parent directories as needed.
    pub fn save(&self) -> Result<(), ConfigError> {
        let mut content = Vec::new();
        self.serializer.serialize(&self.tree, &mut content)?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        std::fs::write(&self.path, &content).map_err(|e| ConfigError::Io {
            path: self.path.clone(),
            source: e,
        })?;
        tracing::debug!(path = %self.path.display(), "Saved config");
        Ok(())
    }

    /// Handle a `ConfigAction` (list / gen / get / set). `Set` persists the
    /// file after the value is accepted.
    pub fn handle(&mut self, action: &ConfigAction) -> Result<ConfigResult, ConfigError> {
        match action {
            ConfigAction::List => Ok(ops::list_values(&self.tree)),
            ConfigAction::Gen { output } => {
                let template = ops::generate_template(&self.tree, self.serializer.as_ref())?;
                match output {
                    Some(path) => {
                        if let Some(parent) = path.parent() {
                            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                                path: parent.to_path_buf(),
                                source: e,
                            })?;
                        }
                        std::fs::write(path, &template).map_err(|e| ConfigError::Io {
                            path: path.clone(),
                            source: e,
                        })?;
                        Ok(ConfigResult::TemplateWritten { path: path.clone() })
                    }
                    None => Ok(ConfigResult::Template(template)),
                }
            }
            ConfigAction::Get { key } => ops::get_value(&self.tree, key),
            ConfigAction::Set { key, value } => {
                let result = ops::set_value(&mut self.tree, key, value)?;
                self.save()?;
                Ok(result)
            }
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("family", &self.family)
            .field("id", &self.id)
            .field("path", &self.path)
            .field("format", &self.serializer.file_extension())
            .finish_non_exhaustive()
    }
}

/// Caller-owned set of configs, unique by `(family, id)`, in registration order.
#[derive(Debug, Default)]
pub struct ConfigRegistry {
    configs: Vec<Config>,
}

impl ConfigRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind, register, load and save a config in one step.
    ///
    /// Saving right after loading writes a fully commented file even when
    /// none existed, and refreshes one that lacks newer fields.
    pub fn create(
        &mut self,
        env: &ConfigEnvironment,
        family: &str,
        id: &str,
        sub_path: impl AsRef<Path>,
        tree: ValueTree,
    ) -> Result<&mut Config, ConfigError> {
        self.ensure_free(family, id)?;
        let mut config = env.config(family, id, sub_path, tree)?;
        config.load()?;
        config.save()?;
        self.register(config)
    }

    pub fn register(&mut self, config: Config) -> Result<&mut Config, ConfigError> {
        self.ensure_free(&config.family, &config.id)?;
        self.configs.push(config);
        let index = self.configs.len() - 1;
        Ok(&mut self.configs[index])
    }

    pub fn get(&self, family: &str, id: &str) -> Option<&Config> {
        self.configs
            .iter()
            .find(|c| c.family == family && c.id == id)
    }

    pub fn get_mut(&mut self, family: &str, id: &str) -> Option<&mut Config> {
        self.configs
            .iter_mut()
            .find(|c| c.family == family && c.id == id)
    }

    /// Like [`get`](Self::get), but `NotRegistered` when absent.
    pub fn lookup(&self, family: &str, id: &str) -> Result<&Config, ConfigError> {
        self.get(family, id).ok_or_else(|| ConfigError::NotRegistered {
            family: family.to_string(),
            id: id.to_string(),
        })
    }

    pub fn remove(&mut self, family: &str, id: &str) -> Option<Config> {
        let index = self
            .configs
            .iter()
            .position(|c| c.family == family && c.id == id)?;
        Some(self.configs.remove(index))
    }

    pub fn clear(&mut self) {
        self.configs.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Config> {
        self.configs.iter()
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    fn ensure_free(&self, family: &str, id: &str) -> Result<(), ConfigError> {
        if self.get(family, id).is_some() {
            return Err(ConfigError::AlreadyRegistered {
                family: family.to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::sample_tree;
    use crate::value::Value;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn file_path_layout() {
        let env = ConfigEnvironment::new("/cfg");
        let config = env.config("example_mod", "main", "client/gui", sample_tree()).unwrap();
        assert_eq!(
            config.path(),
            Path::new("/cfg/example_mod/client/gui/main.toml")
        );

        let json = ConfigEnvironment::new("/cfg").default_format("json");
        let config = json.config("example_mod", "main", "", sample_tree()).unwrap();
        assert_eq!(config.path(), Path::new("/cfg/example_mod/main.json"));
    }

    #[test]
    fn unknown_default_format() {
        let env = ConfigEnvironment::new("/cfg").default_format("yaml");
        let err = env.config("f", "i", "", sample_tree()).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownFormat(ext) if ext == "yaml"));
    }

    #[test]
    fn load_missing_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let env = ConfigEnvironment::new(dir.path());
        let mut config = env.config("fam", "id", "", sample_tree()).unwrap();
        assert!(!config.load().unwrap());
        assert_eq!(config.tree().get("port").unwrap().value(), &Value::Int(8080));
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let env = ConfigEnvironment::new(dir.path());
        let mut config = env.config("fam", "id", "nested", sample_tree()).unwrap();
        assert!(config.tree_mut().get_mut("port").unwrap().set_value(1234, false));
        config.save().unwrap();
        assert!(config.path().exists());

        let mut reloaded = env.config("fam", "id", "nested", sample_tree()).unwrap();
        assert!(reloaded.load().unwrap());
        assert_eq!(reloaded.tree().get("port").unwrap().value(), &Value::Int(1234));
    }

    #[test]
    fn load_invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let env = ConfigEnvironment::new(dir.path());
        let mut config = env.config("fam", "id", "", sample_tree()).unwrap();
        fs::create_dir_all(config.path().parent().unwrap()).unwrap();
        fs::write(config.path(), "port = = 3\n").unwrap();
        assert!(matches!(config.load(), Err(ConfigError::Parse { .. })));
        assert_eq!(config.tree().get("port").unwrap().value(), &Value::Int(8080));
    }

    #[test]
    fn registry_create_writes_documented_file() {
        let dir = TempDir::new().unwrap();
        let env = ConfigEnvironment::new(dir.path());
        let mut registry = ConfigRegistry::new();
        let config = registry.create(&env, "fam", "main", "", sample_tree()).unwrap();
        let content = fs::read_to_string(config.path()).unwrap();
        assert!(content.contains("# default: 8080"), "{content}");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn registry_rejects_duplicates() {
        let dir = TempDir::new().unwrap();
        let env = ConfigEnvironment::new(dir.path());
        let mut registry = ConfigRegistry::new();
        registry.create(&env, "fam", "main", "", sample_tree()).unwrap();
        let err = registry
            .create(&env, "fam", "main", "", sample_tree())
            .unwrap_err();
        assert!(matches!(err, ConfigError::AlreadyRegistered { .. }));
        registry.create(&env, "fam", "other", "", sample_tree()).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn registry_lookup_remove_clear() {
        let dir = TempDir::new().unwrap();
        let env = ConfigEnvironment::new(dir.path());
        let mut registry = ConfigRegistry::new();
        registry.create(&env, "a", "one", "", sample_tree()).unwrap();
        registry.create(&env, "b", "two", "", sample_tree()).unwrap();

        assert!(registry.get("a", "one").is_some());
        assert!(matches!(
            registry.lookup("a", "two"),
            Err(ConfigError::NotRegistered { .. })
        ));
        let ids: Vec<&str> = registry.iter().map(Config::id).collect();
        assert_eq!(ids, vec!["one", "two"]);

        assert!(registry.remove("a", "one").is_some());
        assert!(registry.remove("a", "one").is_none());
        assert_eq!(registry.len(), 1);

        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn create_loads_existing_values() {
        let dir = TempDir::new().unwrap();
        let env = ConfigEnvironment::new(dir.path());
        let path = dir.path().join("fam").join("main.toml");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "port = 4000\n").unwrap();

        let mut registry = ConfigRegistry::new();
        let config = registry.create(&env, "fam", "main", "", sample_tree()).unwrap();
        assert_eq!(config.tree().get("port").unwrap().value(), &Value::Int(4000));
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("port = 4000"));
        assert!(content.contains("name = \"demo\""));
    }

    #[test]
    fn handle_set_persists() {
        let dir = TempDir::new().unwrap();
        let env = ConfigEnvironment::new(dir.path());
        let mut registry = ConfigRegistry::new();
        let config = registry.create(&env, "fam", "main", "", sample_tree()).unwrap();

        let result = config
            .handle(&ConfigAction::Set {
                key: "client.volume".into(),
                value: "0.75".into(),
            })
            .unwrap();
        assert!(matches!(result, ConfigResult::ValueSet { .. }));
        let content = fs::read_to_string(config.path()).unwrap();
        assert!(content.contains("volume = 0.75"), "{content}");
    }

    #[test]
    fn handle_gen_to_file() {
        let dir = TempDir::new().unwrap();
        let env = ConfigEnvironment::new(dir.path());
        let mut config = env.config("fam", "main", "", sample_tree()).unwrap();
        let out = dir.path().join("out").join("template.toml");
        let result = config
            .handle(&ConfigAction::Gen {
                output: Some(out.clone()),
            })
            .unwrap();
        assert_eq!(result, ConfigResult::TemplateWritten { path: out.clone() });
        assert!(fs::read_to_string(&out).unwrap().contains("[client]"));
    }
}
