//! `${...}` interpolation
//!
//! `${db.user}` refers to another node by absolute dotted path. When the
//! whole string is one interpolation the referenced node replaces it with
//! its type intact; otherwise the referenced scalar is substituted into the
//! text. `${oc.env:NAME}` and `${oc.env:NAME,default}` read the environment.

use crate::config::{tree::lookup, Config, ConfigError};
use regex::{Captures, Regex};
use serde_yaml::{Mapping, Value};
use std::sync::OnceLock;

fn interpolation_regex() -> &'static Regex {
    static INTERPOLATION: OnceLock<Regex> = OnceLock::new();
    INTERPOLATION.get_or_init(|| {
        Regex::new(r"\$\{([^${}]+)\}").expect("interpolation pattern is valid")
    })
}

impl Config {
    /// Return a copy with every interpolation resolved
    pub fn resolve(&self) -> Result<Config, ConfigError> {
        let mut stack = Vec::new();
        let resolved = resolve_node(self.root(), self.root(), &mut stack)?;
        Config::from_value(resolved)
    }
}

fn resolve_node(root: &Value, node: &Value, stack: &mut Vec<String>) -> Result<Value, ConfigError> {
    match node {
        Value::String(text) => resolve_string(root, text, stack),
        Value::Sequence(items) => items
            .iter()
            .map(|item| resolve_node(root, item, stack))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Sequence),
        Value::Mapping(map) => {
            let mut out = Mapping::new();
            for (key, value) in map {
                out.insert(key.clone(), resolve_node(root, value, stack)?);
            }
            Ok(Value::Mapping(out))
        }
        other => Ok(other.clone()),
    }
}

fn resolve_string(root: &Value, text: &str, stack: &mut Vec<String>) -> Result<Value, ConfigError> {
    let regex = interpolation_regex();

    if let Some(caps) = regex.captures(text) {
        if caps.get(0).map(|m| m.as_str().len()) == Some(text.len()) {
            return resolve_reference(root, caps[1].trim(), stack);
        }
    } else {
        return Ok(Value::String(text.to_string()));
    }

    let mut error = None;
    let replaced = regex.replace_all(text, |caps: &Captures<'_>| {
        let reference = caps[1].trim();
        match resolve_reference(root, reference, stack).and_then(|v| scalar_text(reference, &v)) {
            Ok(rendered) => rendered,
            Err(e) => {
                error.get_or_insert(e);
                String::new()
            }
        }
    });

    match error {
        Some(e) => Err(e),
        None => Ok(Value::String(replaced.into_owned())),
    }
}

fn resolve_reference(root: &Value, reference: &str, stack: &mut Vec<String>) -> Result<Value, ConfigError> {
    if let Some(spec) = reference.strip_prefix("oc.env:") {
        let (name, default) = match spec.split_once(',') {
            Some((name, default)) => (name.trim(), Some(default.trim())),
            None => (spec.trim(), None),
        };
        return match std::env::var(name) {
            Ok(value) => Ok(Value::String(value)),
            Err(_) => default
                .map(|d| Value::String(d.to_string()))
                .ok_or_else(|| ConfigError::EnvVarMissing(name.to_string())),
        };
    }

    if stack.iter().any(|seen| seen == reference) {
        return Err(ConfigError::InterpolationCycle(reference.to_string()));
    }

    let target = lookup(root, reference)
        .ok_or_else(|| ConfigError::InterpolationNotFound(reference.to_string()))?;

    stack.push(reference.to_string());
    let resolved = resolve_node(root, target, stack);
    stack.pop();
    resolved
}

fn scalar_text(reference: &str, value: &Value) -> Result<String, ConfigError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok("null".to_string()),
        _ => Err(ConfigError::NonScalarInterpolation(reference.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_string_keeps_type() {
        let config = Config::from_yaml(
            r#"
db:
  port: 5432
  copy: ${db.port}
  settings: {a: 1}
  nested: ${db.settings}
"#,
        )
        .unwrap()
        .resolve()
        .unwrap();

        assert_eq!(config.select("db.copy"), Some(&Value::from(5432)));
        assert!(config.select("db.nested").unwrap().is_mapping());
    }

    #[test]
    fn test_embedded_interpolation() {
        let config = Config::from_yaml(
            r#"
user: alice
host: localhost
url: "postgres://${user}@${host}:${port}"
port: 5432
"#,
        )
        .unwrap()
        .resolve()
        .unwrap();

        assert_eq!(
            config.select("url"),
            Some(&Value::from("postgres://alice@localhost:5432"))
        );
    }

    #[test]
    fn test_chained_references() {
        let config = Config::from_yaml("a: ${b}\nb: ${c}\nc: done").unwrap().resolve().unwrap();
        assert_eq!(config.select("a"), Some(&Value::from("done")));
    }

    #[test]
    fn test_missing_reference() {
        let err = Config::from_yaml("a: ${nope}").unwrap().resolve().unwrap_err();
        assert!(matches!(err, ConfigError::InterpolationNotFound(r) if r == "nope"));
    }

    #[test]
    fn test_cycle_detected() {
        let err = Config::from_yaml("a: ${b}\nb: ${a}").unwrap().resolve().unwrap_err();
        assert!(matches!(err, ConfigError::InterpolationCycle(_)));
    }

    #[test]
    fn test_mapping_cannot_be_embedded() {
        let err = Config::from_yaml("m: {x: 1}\ns: \"value ${m}\"").unwrap().resolve().unwrap_err();
        assert!(matches!(err, ConfigError::NonScalarInterpolation(r) if r == "m"));
    }

    #[test]
    fn test_env_resolver_with_default() {
        let config = Config::from_yaml(
            "home: ${oc.env:CONFPIPE_SURELY_UNSET_VAR,/tmp}\nstrict: plain",
        )
        .unwrap()
        .resolve()
        .unwrap();
        assert_eq!(config.select("home"), Some(&Value::from("/tmp")));

        let err = Config::from_yaml("x: ${oc.env:CONFPIPE_SURELY_UNSET_VAR}")
            .unwrap()
            .resolve()
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarMissing(_)));
    }
}
