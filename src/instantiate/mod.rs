//! Object instantiation from declarative nodes
//!
//! A mapping carrying a `_target_` key describes an object: the target name
//! is resolved in a [`Registry`] and the remaining entries become keyword
//! arguments of the registered factory. `_args_` supplies positional
//! arguments and `_recursive_: false` passes nested nodes through as plain
//! data instead of instantiating them.
//!
//! ```yaml
//! _target_: confpipe.estimator.RandomForestClassifier
//! n_estimators: 50
//! random_state: 0
//! ```

mod args;
mod builtins;
mod error;
mod instance;
mod registry;

pub use args::{Args, FromInstance};
pub use builtins::register_builtins;
pub use error::{ConstructionError, InstantiateError};
pub use instance::{Instance, Object};
pub use registry::{Registry, TargetKind};

use serde_yaml::{Mapping, Value};
use tracing::debug;

pub const TARGET_KEY: &str = "_target_";
pub const ARGS_KEY: &str = "_args_";
pub const RECURSIVE_KEY: &str = "_recursive_";

pub(crate) const ROOT_PATH: &str = "<root>";

/// Instantiate every `_target_` node in `node`
///
/// Plain scalars, sequences and mappings come back structurally unchanged.
/// Every reachable target is resolved before any object is constructed, and
/// any error aborts the whole call.
pub fn instantiate(registry: &Registry, node: &Value) -> Result<Instance, InstantiateError> {
    check_targets(registry, node, "")?;
    walk(registry, node, "")
}

fn child_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        ROOT_PATH.to_string()
    } else {
        path.to_string()
    }
}

fn key_name(key: &Value, path: &str) -> Result<String, InstantiateError> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(InstantiateError::InvalidSpec {
            path: display_path(path),
            message: "mapping keys must be scalars".to_string(),
        }),
    }
}

fn invalid(path: &str, message: &str) -> InstantiateError {
    InstantiateError::InvalidSpec {
        path: display_path(path),
        message: message.to_string(),
    }
}

fn resolve<'a>(registry: &Registry, target: &'a Value, path: &str) -> Result<&'a str, InstantiateError> {
    let target = target
        .as_str()
        .ok_or_else(|| invalid(path, "_target_ must be a string"))?;
    if !registry.contains(target) {
        return Err(InstantiateError::Resolution {
            target: target.to_string(),
            path: display_path(path),
        });
    }
    Ok(target)
}

fn is_recursive(map: &Mapping, path: &str) -> Result<bool, InstantiateError> {
    match map.get(RECURSIVE_KEY) {
        None => Ok(true),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(invalid(path, "_recursive_ must be a boolean")),
    }
}

fn positional_items<'a>(map: &'a Mapping, path: &str) -> Result<&'a [Value], InstantiateError> {
    match map.get(ARGS_KEY) {
        None => Ok(&[]),
        Some(Value::Sequence(items)) => Ok(items.as_slice()),
        Some(_) => Err(invalid(path, "_args_ must be a sequence")),
    }
}

/// Keyword entries of a target node, reserved keys skipped
fn keyword_items<'a>(map: &'a Mapping, path: &str) -> Result<Vec<(String, &'a Value)>, InstantiateError> {
    let mut items = Vec::new();
    for (key, value) in map {
        let name = key_name(key, path)?;
        if ![TARGET_KEY, ARGS_KEY, RECURSIVE_KEY].contains(&name.as_str()) {
            items.push((name, value));
        }
    }
    Ok(items)
}

fn positional_path(path: &str, index: usize) -> String {
    child_path(path, &format!("{}.{}", ARGS_KEY, index))
}

/// Resolve every target reachable under the `_recursive_` rules without constructing anything
fn check_targets(registry: &Registry, node: &Value, path: &str) -> Result<(), InstantiateError> {
    match node {
        Value::Sequence(items) => items
            .iter()
            .enumerate()
            .try_for_each(|(i, item)| check_targets(registry, item, &child_path(path, &i.to_string()))),
        Value::Mapping(map) => match map.get(TARGET_KEY) {
            Some(target) => {
                resolve(registry, target, path)?;
                if !is_recursive(map, path)? {
                    return Ok(());
                }
                for (i, item) in positional_items(map, path)?.iter().enumerate() {
                    check_targets(registry, item, &positional_path(path, i))?;
                }
                for (name, value) in keyword_items(map, path)? {
                    check_targets(registry, value, &child_path(path, &name))?;
                }
                Ok(())
            }
            None => map
                .iter()
                .try_for_each(|(k, v)| check_targets(registry, v, &child_path(path, &key_name(k, path)?))),
        },
        _ => Ok(()),
    }
}

fn walk(registry: &Registry, node: &Value, path: &str) -> Result<Instance, InstantiateError> {
    match node {
        Value::Sequence(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| walk(registry, item, &child_path(path, &i.to_string())))
            .collect::<Result<Vec<_>, InstantiateError>>()
            .map(Instance::List),
        Value::Mapping(map) => match map.get(TARGET_KEY) {
            Some(target) => build(registry, map, target, path).map(Instance::Object),
            None => map
                .iter()
                .map(|(k, v)| {
                    let sub = child_path(path, &key_name(k, path)?);
                    Ok((k.clone(), walk(registry, v, &sub)?))
                })
                .collect::<Result<Vec<_>, InstantiateError>>()
                .map(Instance::Map),
        },
        other => Ok(Instance::Value(other.clone())),
    }
}

fn build(registry: &Registry, map: &Mapping, target: &Value, path: &str) -> Result<Object, InstantiateError> {
    let target = resolve(registry, target, path)?;
    let recursive = is_recursive(map, path)?;
    let argument = |value: &Value, sub: &str| {
        if recursive {
            walk(registry, value, sub)
        } else {
            Ok(Instance::Value(value.clone()))
        }
    };

    let positional = positional_items(map, path)?
        .iter()
        .enumerate()
        .map(|(i, item)| argument(item, &positional_path(path, i)))
        .collect::<Result<Vec<_>, InstantiateError>>()?;

    let mut keyword = Vec::new();
    for (name, value) in keyword_items(map, path)? {
        let sub = child_path(path, &name);
        keyword.push((name, argument(value, &sub)?));
    }

    debug!("constructing {} at {}", target, display_path(path));
    let args = Args::new(target, positional, keyword);
    registry
        .construct(target, Value::Mapping(map.clone()), args)
        .ok_or_else(|| InstantiateError::Resolution {
            target: target.to_string(),
            path: display_path(path),
        })?
        .map_err(|source| InstantiateError::Construction {
            target: target.to_string(),
            path: display_path(path),
            source,
        })
}
