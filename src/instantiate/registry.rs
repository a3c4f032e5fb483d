//! Name to factory registry

use super::instance::{as_estimator, as_transformer, Role};
use super::{instantiate, Args, ConstructionError, FromInstance, Instance, InstantiateError, Object};
use crate::core::{Estimator, Transformer};
use serde::Serialize;
use serde_yaml::Value;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

type Factory = Box<dyn Fn(&mut Args) -> Result<Box<dyn Any + Send>, ConstructionError> + Send + Sync>;

/// What a registered target produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Transformer,
    Estimator,
    Object,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Transformer => write!(f, "transformer"),
            TargetKind::Estimator => write!(f, "estimator"),
            TargetKind::Object => write!(f, "object"),
        }
    }
}

struct Entry {
    kind: TargetKind,
    role: Role,
    factory: Factory,
}

/// Factories keyed by fully qualified target name
#[derive(Default)]
pub struct Registry {
    entries: BTreeMap<String, Entry>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("targets", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert<T, F>(&mut self, target: impl Into<String>, kind: TargetKind, role: Role, factory: F) -> &mut Self
    where
        T: Any + Send,
        F: Fn(&mut Args) -> Result<T, ConstructionError> + Send + Sync + 'static,
    {
        let boxed: Factory = Box::new(move |args: &mut Args| {
            factory(args).map(|value| -> Box<dyn Any + Send> { Box::new(value) })
        });
        self.entries.insert(
            target.into(),
            Entry {
                kind,
                role,
                factory: boxed,
            },
        );
        self
    }

    /// Register a factory for an arbitrary value; replaces an existing entry
    pub fn register<T, F>(&mut self, target: impl Into<String>, factory: F) -> &mut Self
    where
        T: Any + Send,
        F: Fn(&mut Args) -> Result<T, ConstructionError> + Send + Sync + 'static,
    {
        self.insert(target, TargetKind::Object, Role::Plain, factory)
    }

    /// Register a factory whose value can be used as a pipeline stage
    pub fn register_transformer<T, F>(&mut self, target: impl Into<String>, factory: F) -> &mut Self
    where
        T: Transformer + 'static,
        F: Fn(&mut Args) -> Result<T, ConstructionError> + Send + Sync + 'static,
    {
        self.insert(
            target,
            TargetKind::Transformer,
            Role::Transformer(as_transformer::<T>),
            factory,
        )
    }

    /// Register a factory whose value can terminate a pipeline
    pub fn register_estimator<E, F>(&mut self, target: impl Into<String>, factory: F) -> &mut Self
    where
        E: Estimator + 'static,
        F: Fn(&mut Args) -> Result<E, ConstructionError> + Send + Sync + 'static,
    {
        self.insert(
            target,
            TargetKind::Estimator,
            Role::Estimator(as_estimator::<E>),
            factory,
        )
    }

    pub fn contains(&self, target: &str) -> bool {
        self.entries.contains_key(target)
    }

    pub fn kind(&self, target: &str) -> Option<TargetKind> {
        self.entries.get(target).map(|e| e.kind)
    }

    /// Registered target names, sorted
    pub fn targets(&self) -> impl Iterator<Item = (&str, TargetKind)> {
        self.entries.iter().map(|(name, e)| (name.as_str(), e.kind))
    }

    /// Run a target's factory; `None` when the target is not registered
    pub(crate) fn construct(
        &self,
        target: &str,
        spec: Value,
        mut args: Args,
    ) -> Option<Result<Object, ConstructionError>> {
        let entry = self.entries.get(target)?;
        let built = (entry.factory)(&mut args).and_then(|value| {
            args.finish()?;
            Ok(value)
        });
        Some(built.map(|value| Object::new(target.to_string(), spec, value, entry.role)))
    }

    pub fn instantiate(&self, node: &Value) -> Result<Instance, InstantiateError> {
        instantiate(self, node)
    }

    /// Instantiate a node and convert the result to a concrete type
    pub fn build<T: FromInstance>(&self, node: &Value) -> Result<T, InstantiateError> {
        let instance = self.instantiate(node)?;
        T::from_instance(instance).map_err(|found| InstantiateError::UnexpectedType {
            path: super::ROOT_PATH.to_string(),
            expected: T::EXPECTED.to_string(),
            found: found.describe(),
        })
    }
}
