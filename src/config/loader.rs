//! Config composition from a directory of YAML files
//!
//! Layout:
//!
//! ```text
//! conf/
//!   config.yaml          # primary config, may start with a `defaults` list
//!   dataloader/
//!     local.yaml         # options of the `dataloader` config group
//!     redshift.yaml
//! ```

use crate::config::{
    tree::read_yaml, Config, ConfigError, Override, OverrideOp,
};
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const DEFAULTS_KEY: &str = "defaults";
const SELF_ENTRY: &str = "_self_";
const OPTIONAL_PREFIX: &str = "optional ";

/// One entry of a `defaults` list
#[derive(Debug, Clone, PartialEq, Eq)]
enum DefaultsEntry {
    /// `_self_`: where the primary config is merged
    Primary,
    /// `group: option`; `option: None` disables the group
    Group {
        group: String,
        option: Option<String>,
        optional: bool,
    },
    /// A sibling config file merged at the root
    File(String),
}

/// Composes configurations from a config directory
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Whether `name` is a config group directory
    pub fn is_group(&self, name: &str) -> bool {
        self.config_dir.join(name).is_dir()
    }

    /// Option names available in a config group, sorted
    pub fn group_options(&self, group: &str) -> Vec<String> {
        let mut options: Vec<String> = std::fs::read_dir(self.config_dir.join(group))
            .map(|entries| {
                entries
                    .filter_map(|entry| entry.ok())
                    .map(|entry| entry.path())
                    .filter(|path| {
                        matches!(path.extension().and_then(|e| e.to_str()), Some("yaml" | "yml"))
                    })
                    .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        options.sort();
        options
    }

    /// Compose the named primary config with its defaults list and the given overrides
    pub fn compose(&self, config_name: &str, overrides: &[Override]) -> Result<Config, ConfigError> {
        let primary_path = self.config_path(config_name);
        let mut primary = read_yaml(&primary_path)?;
        if primary.is_null() {
            primary = Value::Mapping(Mapping::new());
        }
        if !primary.is_mapping() {
            return Err(ConfigError::NotAMapping(primary_path.display().to_string()));
        }

        let defaults = primary
            .as_mapping_mut()
            .and_then(|map| map.remove(DEFAULTS_KEY));
        let mut entries = parse_defaults(defaults, &primary_path)?;
        if !entries.contains(&DefaultsEntry::Primary) {
            entries.push(DefaultsEntry::Primary);
        }

        let (group_overrides, value_overrides): (Vec<&Override>, Vec<&Override>) = overrides
            .iter()
            .partition(|o| self.is_group_override(o, &entries));

        for o in group_overrides {
            apply_group_override(&mut entries, o)?;
        }

        let mut config = Config::new();
        for entry in &entries {
            match entry {
                DefaultsEntry::Primary => config.merge(primary.clone()),
                DefaultsEntry::Group {
                    group,
                    option: Some(option),
                    optional,
                } => {
                    let path = self.config_dir.join(group).join(format!("{}.yaml", option));
                    if !path.is_file() {
                        if *optional {
                            debug!("Skipping optional group {}={}", group, option);
                            continue;
                        }
                        return Err(ConfigError::MissingGroupOption {
                            group: group.clone(),
                            option: option.clone(),
                            available: self.group_options(group).join(", "),
                        });
                    }
                    debug!("Merging {}={} from {}", group, option, path.display());
                    let content = strip_defaults(read_yaml(&path)?, &path);
                    config.merge(package(group, content));
                }
                DefaultsEntry::Group { group, option: None, .. } => {
                    debug!("Config group '{}' disabled", group);
                }
                DefaultsEntry::File(name) => {
                    let path = self.config_path(name);
                    debug!("Merging {}", path.display());
                    config.merge(strip_defaults(read_yaml(&path)?, &path));
                }
            }
        }

        for o in value_overrides {
            config.apply_override(o)?;
        }

        info!(
            "Composed config '{}' from {} with {} override(s)",
            config_name,
            self.config_dir.display(),
            overrides.len()
        );
        Ok(config)
    }

    fn config_path(&self, name: &str) -> PathBuf {
        if name.ends_with(".yaml") || name.ends_with(".yml") {
            self.config_dir.join(name)
        } else {
            self.config_dir.join(format!("{}.yaml", name))
        }
    }

    fn is_group_override(&self, o: &Override, entries: &[DefaultsEntry]) -> bool {
        let listed = entries
            .iter()
            .any(|e| matches!(e, DefaultsEntry::Group { group, .. } if *group == o.key));
        match o.op {
            OverrideOp::Assign | OverrideOp::Delete => listed,
            OverrideOp::Append | OverrideOp::ForceAppend => listed || self.is_group(&o.key),
        }
    }
}

fn parse_defaults(value: Option<Value>, path: &Path) -> Result<Vec<DefaultsEntry>, ConfigError> {
    let invalid = |message: String| ConfigError::InvalidDefaults {
        path: path.display().to_string(),
        message,
    };

    let items = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Sequence(items)) => items,
        Some(_) => return Err(invalid("expected a list".to_string())),
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) if s == SELF_ENTRY => Ok(DefaultsEntry::Primary),
            Value::String(s) => Ok(DefaultsEntry::File(s)),
            Value::Mapping(map) if map.len() == 1 => {
                let (key, value) = map
                    .into_iter()
                    .next()
                    .ok_or_else(|| invalid("empty entry".to_string()))?;
                let key = key
                    .as_str()
                    .ok_or_else(|| invalid("group names must be strings".to_string()))?
                    .to_string();
                let (group, optional) = match key.strip_prefix(OPTIONAL_PREFIX) {
                    Some(group) => (group.trim().to_string(), true),
                    None => (key, false),
                };
                let option = match value {
                    Value::Null => None,
                    Value::String(s) => Some(s),
                    Value::Number(n) => Some(n.to_string()),
                    Value::Bool(b) => Some(b.to_string()),
                    _ => return Err(invalid(format!("option of group '{}' must be a name", group))),
                };
                Ok(DefaultsEntry::Group {
                    group,
                    option,
                    optional,
                })
            }
            other => Err(invalid(format!("unsupported entry {:?}", other))),
        })
        .collect()
}

fn apply_group_override(entries: &mut Vec<DefaultsEntry>, o: &Override) -> Result<(), ConfigError> {
    let position = entries
        .iter()
        .position(|e| matches!(e, DefaultsEntry::Group { group, .. } if *group == o.key));

    match (o.op, position) {
        (OverrideOp::Delete, Some(i)) => {
            entries.remove(i);
        }
        (OverrideOp::Append, Some(_)) => return Err(ConfigError::KeyExists(o.key.clone())),
        (OverrideOp::Assign | OverrideOp::ForceAppend, Some(i)) => {
            if let Some(DefaultsEntry::Group { option, .. }) = entries.get_mut(i) {
                *option = o.option_name();
            }
        }
        (OverrideOp::Append | OverrideOp::ForceAppend, None) => {
            entries.push(DefaultsEntry::Group {
                group: o.key.clone(),
                option: o.option_name(),
                optional: false,
            });
        }
        (OverrideOp::Assign | OverrideOp::Delete, None) => {
            return Err(ConfigError::InvalidOverride {
                text: o.to_string(),
                reason: "config group is not in the defaults list".to_string(),
            })
        }
    }
    debug!("Applied group override {}", o);
    Ok(())
}

fn strip_defaults(mut content: Value, path: &Path) -> Value {
    if content.is_null() {
        return Value::Mapping(Mapping::new());
    }
    if let Some(map) = content.as_mapping_mut() {
        if map.remove(DEFAULTS_KEY).is_some() {
            warn!("Ignoring nested defaults list in {}", path.display());
        }
    }
    content
}

/// Place group content under its package path (`model/optimizer` -> `model.optimizer`)
fn package(group: &str, content: Value) -> Value {
    group.rsplit('/').fold(content, |inner, segment| {
        let mut map = Mapping::new();
        map.insert(Value::String(segment.to_string()), inner);
        Value::Mapping(map)
    })
}
