//! Configuration tree with dotted-path access

use crate::config::ConfigError;
use serde_yaml::{Mapping, Value};
use std::path::Path;

/// A composed configuration; the root is always a mapping
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    root: Value,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Empty configuration
    pub fn new() -> Self {
        Self {
            root: Value::Mapping(Mapping::new()),
        }
    }

    /// Wrap a YAML value; `null` becomes an empty mapping
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::Mapping(_) => Ok(Self { root: value }),
            _ => Err(ConfigError::NotAMapping("<root>".to_string())),
        }
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_yaml::from_str(yaml).map_err(|source| ConfigError::Parse {
            path: "<string>".to_string(),
            source,
        })?;
        Self::from_value(value)
    }

    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::from_value(read_yaml(path.as_ref())?)
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn into_value(self) -> Value {
        self.root
    }

    /// Look up a node by dotted path (`db.user`, `layers.0.size`); empty path is the root
    pub fn select(&self, path: &str) -> Option<&Value> {
        lookup(&self.root, path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.select(path).is_some()
    }

    /// Set a node, creating intermediate mappings as needed
    pub fn set(&mut self, path: &str, value: Value) -> Result<(), ConfigError> {
        let segments: Vec<&str> = path.split('.').collect();
        let (last, parents) = match segments.split_last() {
            Some(split) => split,
            None => return Ok(()),
        };

        let mut node = &mut self.root;
        for (depth, segment) in parents.iter().enumerate() {
            let map = node
                .as_mapping_mut()
                .ok_or_else(|| ConfigError::NotAMapping(segments[..depth].join(".")))?;
            let key = Value::String(segment.to_string());
            if !map.contains_key(&key) {
                map.insert(key.clone(), Value::Mapping(Mapping::new()));
            }
            node = map
                .get_mut(&key)
                .ok_or_else(|| ConfigError::NotAMapping(segments[..=depth].join(".")))?;
            if node.is_null() {
                *node = Value::Mapping(Mapping::new());
            }
        }

        let map = node
            .as_mapping_mut()
            .ok_or_else(|| ConfigError::NotAMapping(parents.join(".")))?;
        map.insert(Value::String(last.to_string()), value);
        Ok(())
    }

    /// Remove a node, returning it if it existed
    pub fn remove(&mut self, path: &str) -> Option<Value> {
        let (parent, last) = match path.rsplit_once('.') {
            Some((parent, last)) => (lookup_mut(&mut self.root, parent)?, last),
            None => (&mut self.root, path),
        };
        parent.as_mapping_mut()?.remove(last)
    }

    /// Deep-merge another tree over this one
    pub fn merge(&mut self, overlay: Value) {
        merge_values(&mut self.root, overlay);
    }

    /// Render as YAML
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(&self.root)?)
    }
}

pub(crate) fn read_yaml(path: &Path) -> Result<Value, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Resolve a dotted path against a YAML tree
pub fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(root);
    }
    path.split('.').try_fold(root, |node, segment| match node {
        Value::Mapping(map) => map.get(segment),
        Value::Sequence(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn lookup_mut<'a>(root: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    path.split('.').try_fold(root, |node, segment| match node {
        Value::Mapping(map) => map.get_mut(segment),
        Value::Sequence(items) => segment
            .parse::<usize>()
            .ok()
            .and_then(move |i| items.get_mut(i)),
        _ => None,
    })
}

/// Mappings merge key by key; anything else in the overlay replaces the base
pub fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
