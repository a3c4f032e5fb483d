//! Command-line overrides and multirun sweeps
//!
//! Grammar, one override per argument:
//!
//! - `key=value`   change an existing key (or pick a config group option)
//! - `+key=value`  add a key that does not exist yet (or append a config group)
//! - `++key=value` add or replace
//! - `~key`        delete a key (or drop a config group)
//!
//! Values are YAML scalars or flow collections. Under multirun a value with
//! top-level commas (`a,b,c`) is a sweep over each alternative; a single run
//! rejects it unless the commas are quoted or bracketed.

use crate::config::{Config, ConfigError};
use regex::Regex;
use serde_yaml::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// How an override edits the configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideOp {
    Assign,
    Append,
    ForceAppend,
    Delete,
}

/// A single parsed override
#[derive(Debug, Clone, PartialEq)]
pub struct Override {
    pub op: OverrideOp,
    pub key: String,
    /// Raw value text as written on the command line
    pub raw_value: Option<String>,
    /// Parsed value; `None` only for deletions
    pub value: Option<Value>,
}

fn key_regex() -> &'static Regex {
    static KEY: OnceLock<Regex> = OnceLock::new();
    KEY.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][\w\-/]*(\.[\w\-/]+)*$").expect("override key pattern is valid")
    })
}

impl Override {
    /// Parse one override with a single value (no sweep splitting)
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidOverride {
            text: text.to_string(),
            reason: reason.to_string(),
        };

        let (op, rest) = if let Some(rest) = text.strip_prefix('~') {
            (OverrideOp::Delete, rest)
        } else if let Some(rest) = text.strip_prefix("++") {
            (OverrideOp::ForceAppend, rest)
        } else if let Some(rest) = text.strip_prefix('+') {
            (OverrideOp::Append, rest)
        } else {
            (OverrideOp::Assign, text)
        };

        let (key, raw_value) = match rest.split_once('=') {
            Some((key, value)) => (key.trim(), Some(value.trim())),
            None => (rest.trim(), None),
        };

        if !key_regex().is_match(key) {
            return Err(invalid("expected a dotted key such as 'db.user'"));
        }

        let value = match (op, raw_value) {
            (OverrideOp::Delete, _) => None,
            (_, None) => return Err(invalid("missing '=value'")),
            (_, Some(raw)) => Some(parse_value(raw).map_err(|reason| invalid(&reason))?),
        };

        Ok(Self {
            op,
            key: key.to_string(),
            raw_value: raw_value.map(str::to_string),
            value,
        })
    }

    /// Value as a config group option name
    pub fn option_name(&self) -> Option<String> {
        match &self.value {
            Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => self.raw_value.clone(),
            None => None,
        }
    }
}

impl FromStr for Override {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Override {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.op {
            OverrideOp::Assign => "",
            OverrideOp::Append => "+",
            OverrideOp::ForceAppend => "++",
            OverrideOp::Delete => "~",
        };
        match &self.raw_value {
            Some(raw) => write!(f, "{}{}={}", prefix, self.key, raw),
            None => write!(f, "{}{}", prefix, self.key),
        }
    }
}

impl Config {
    /// Apply a value override to this config
    pub fn apply_override(&mut self, o: &Override) -> Result<(), ConfigError> {
        let exists = self.contains(&o.key);
        match o.op {
            OverrideOp::Delete => {
                self.remove(&o.key)
                    .ok_or_else(|| ConfigError::DeleteMissing(o.key.clone()))?;
                return Ok(());
            }
            OverrideOp::Assign if !exists => return Err(ConfigError::KeyNotFound(o.key.clone())),
            OverrideOp::Append if exists => return Err(ConfigError::KeyExists(o.key.clone())),
            _ => {}
        }
        let value = o.value.clone().unwrap_or(Value::Null);
        self.set(&o.key, value)
    }
}

fn parse_value(raw: &str) -> Result<Value, String> {
    if raw.is_empty() {
        return Ok(Value::String(String::new()));
    }
    serde_yaml::from_str(raw).map_err(|e| format!("value is not valid YAML: {}", e))
}

/// Parse overrides for a single run
pub fn parse_overrides<S: AsRef<str>>(args: &[S]) -> Result<Vec<Override>, ConfigError> {
    args.iter().map(|a| parse_single(a.as_ref())).collect()
}

fn parse_single(text: &str) -> Result<Override, ConfigError> {
    if !text.starts_with('~') {
        if let Some((_, value)) = text.split_once('=') {
            if split_top_level(value).len() > 1 {
                return Err(ConfigError::InvalidOverride {
                    text: text.to_string(),
                    reason: "comma-separated values are a sweep; use --multirun, or quote the value"
                        .to_string(),
                });
            }
        }
    }
    Override::parse(text)
}

/// Expand sweep overrides into one override list per job
///
/// The result is the cartesian product of all sweeps; the first override
/// varies slowest. Without sweeps there is exactly one job.
pub fn expand_sweeps<S: AsRef<str>>(args: &[S]) -> Result<Vec<Vec<Override>>, ConfigError> {
    let mut jobs: Vec<Vec<Override>> = vec![Vec::new()];

    for arg in args {
        let alternatives = sweep_alternatives(arg.as_ref())?;
        jobs = jobs
            .into_iter()
            .flat_map(|job| {
                alternatives.iter().map(move |alt| {
                    let mut next = job.clone();
                    next.push(alt.clone());
                    next
                })
            })
            .collect();
    }

    Ok(jobs)
}

fn sweep_alternatives(text: &str) -> Result<Vec<Override>, ConfigError> {
    if text.starts_with('~') {
        return Ok(vec![Override::parse(text)?]);
    }
    let Some((head, value)) = text.split_once('=') else {
        return Ok(vec![Override::parse(text)?]);
    };

    let parts = split_top_level(value);
    if parts.len() < 2 {
        return Ok(vec![Override::parse(text)?]);
    }
    parts
        .iter()
        .map(|part| Override::parse(&format!("{}={}", head, part)))
        .collect()
}

/// Split on commas that are outside brackets, braces and quotes
fn split_top_level(value: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;

    for c in value.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => {
                quote = None;
                current.push(c);
            }
            (Some(_), c) => current.push(c),
            (None, '\'' | '"') => {
                quote = Some(c);
                current.push(c);
            }
            (None, '[' | '{' | '(') => {
                depth += 1;
                current.push(c);
            }
            (None, ']' | '}' | ')') => {
                depth -= 1;
                current.push(c);
            }
            (None, ',') if depth == 0 => {
                parts.push(current.trim().to_string());
                current.clear();
            }
            (None, c) => current.push(c),
        }
    }
    parts.push(current.trim().to_string());
    parts
}
