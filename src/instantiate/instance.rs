//! Instantiation results

use crate::core::{Estimator, Transformer};
use crate::instantiate::{ARGS_KEY, RECURSIVE_KEY, TARGET_KEY};
use serde_yaml::Value;
use std::any::Any;
use std::fmt;

type Convert<T: ?Sized> = fn(Box<dyn Any + Send>) -> Result<Box<T>, Box<dyn Any + Send>>;

/// Capability a constructed value was registered with
#[derive(Clone, Copy)]
pub(crate) enum Role {
    Plain,
    Transformer(Convert<dyn Transformer>),
    Estimator(Convert<dyn Estimator>),
}

pub(crate) fn as_transformer<T: Transformer + 'static>(
    value: Box<dyn Any + Send>,
) -> Result<Box<dyn Transformer>, Box<dyn Any + Send>> {
    value.downcast::<T>().map(|t| -> Box<dyn Transformer> { t })
}

pub(crate) fn as_estimator<E: Estimator + 'static>(
    value: Box<dyn Any + Send>,
) -> Result<Box<dyn Estimator>, Box<dyn Any + Send>> {
    value.downcast::<E>().map(|e| -> Box<dyn Estimator> { e })
}

/// A value built from a `_target_` node
pub struct Object {
    target: String,
    spec: Value,
    value: Box<dyn Any + Send>,
    role: Role,
}

impl Object {
    pub(crate) fn new(target: String, spec: Value, value: Box<dyn Any + Send>, role: Role) -> Self {
        Self {
            target,
            spec,
            value,
            role,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Declarative node this object was built from
    pub fn spec(&self) -> &Value {
        &self.spec
    }

    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    pub fn is_transformer(&self) -> bool {
        matches!(self.role, Role::Transformer(_)) || self.is::<Box<dyn Transformer>>()
    }

    pub fn is_estimator(&self) -> bool {
        matches!(self.role, Role::Estimator(_)) || self.is::<Box<dyn Estimator>>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Take the concrete value, or get the object back on a type mismatch
    pub fn downcast<T: Any>(self) -> Result<T, Object> {
        let Object {
            target,
            spec,
            value,
            role,
        } = self;
        value.downcast::<T>().map(|v| *v).map_err(|value| Object {
            target,
            spec,
            value,
            role,
        })
    }

    pub fn into_transformer(self) -> Result<Box<dyn Transformer>, Object> {
        match self.role {
            Role::Transformer(convert) => self.convert(convert),
            _ => self.downcast::<Box<dyn Transformer>>(),
        }
    }

    pub fn into_estimator(self) -> Result<Box<dyn Estimator>, Object> {
        match self.role {
            Role::Estimator(convert) => self.convert(convert),
            _ => self.downcast::<Box<dyn Estimator>>(),
        }
    }

    fn convert<T: ?Sized>(self, convert: Convert<T>) -> Result<Box<T>, Object> {
        let Object {
            target,
            spec,
            value,
            role,
        } = self;
        convert(value).map_err(|value| Object {
            target,
            spec,
            value,
            role,
        })
    }

    /// `target(arg=value, ...)` rendering of the spec
    pub fn repr(&self) -> String {
        repr(&self.target, &self.spec)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("target", &self.target)
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

fn repr(target: &str, spec: &Value) -> String {
    let mut args = Vec::new();
    if let Some(Value::Sequence(positional)) = spec.get(ARGS_KEY) {
        args.extend(positional.iter().map(render));
    }
    if let Value::Mapping(map) = spec {
        for (key, value) in map {
            let key = render_key(key);
            if [TARGET_KEY, ARGS_KEY, RECURSIVE_KEY].contains(&key.as_str()) {
                continue;
            }
            args.push(format!("{}={}", key, render(value)));
        }
    }
    format!("{}({})", target, args.join(", "))
}

fn render_key(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => render(other),
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(b) => if *b { "True" } else { "False" }.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("'{}'", s),
        Value::Sequence(items) => format!(
            "[{}]",
            items.iter().map(render).collect::<Vec<_>>().join(", ")
        ),
        Value::Mapping(map) => match map.get(TARGET_KEY).and_then(Value::as_str) {
            Some(target) => repr(target, value),
            None => format!(
                "{{{}}}",
                map.iter()
                    .map(|(k, v)| format!("{}: {}", render(k), render(v)))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        },
        Value::Tagged(tagged) => render(&tagged.value),
    }
}

/// Result of instantiating a node
#[derive(Debug)]
pub enum Instance {
    /// Scalar data, or a subtree passed through unchanged
    Value(Value),
    List(Vec<Instance>),
    Map(Vec<(Value, Instance)>),
    Object(Object),
}

impl Instance {
    /// YAML rendering; objects become their `repr`
    pub fn to_value(&self) -> Value {
        match self {
            Instance::Value(v) => v.clone(),
            Instance::List(items) => Value::Sequence(items.iter().map(Instance::to_value).collect()),
            Instance::Map(entries) => Value::Mapping(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_value()))
                    .collect(),
            ),
            Instance::Object(obj) => Value::String(obj.repr()),
        }
    }

    /// True when no object was constructed anywhere in the tree
    pub fn is_plain(&self) -> bool {
        match self {
            Instance::Value(_) => true,
            Instance::List(items) => items.iter().all(Instance::is_plain),
            Instance::Map(entries) => entries.iter().all(|(_, v)| v.is_plain()),
            Instance::Object(_) => false,
        }
    }

    /// Plain data as YAML, or the instance back when it holds objects
    pub fn into_plain(self) -> Result<Value, Instance> {
        if self.is_plain() {
            Ok(self.to_value())
        } else {
            Err(self)
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Instance::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn into_object(self) -> Option<Object> {
        match self {
            Instance::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Child of a map instance by string key
    pub fn get(&self, key: &str) -> Option<&Instance> {
        match self {
            Instance::Map(entries) => entries
                .iter()
                .find(|(k, _)| k.as_str() == Some(key))
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Short description used in type mismatch errors
    pub fn describe(&self) -> String {
        match self {
            Instance::Value(Value::Null) => "null".to_string(),
            Instance::Value(Value::Bool(b)) => format!("boolean {}", b),
            Instance::Value(Value::Number(n)) => format!("number {}", n),
            Instance::Value(Value::String(s)) => format!("string '{}'", s),
            Instance::Value(Value::Sequence(_)) | Instance::List(_) => "a list".to_string(),
            Instance::Value(Value::Mapping(_)) | Instance::Map(_) => "a mapping".to_string(),
            Instance::Value(Value::Tagged(t)) => format!("tagged value {}", t.tag),
            Instance::Object(obj) => format!("object {}", obj.target()),
        }
    }
}
