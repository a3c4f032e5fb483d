//! Typed constructor arguments

use super::{ConstructionError, Instance, Object};
use crate::core::{Estimator, Transformer};
use crate::pipeline::CompositePipeline;
use serde_yaml::Value;
use std::collections::VecDeque;
use std::str::FromStr;

/// Conversion from an instantiated argument into a constructor parameter
pub trait FromInstance: Sized {
    /// Human readable name of the accepted shape
    const EXPECTED: &'static str;

    /// Convert, or hand the instance back when it has the wrong shape
    fn from_instance(instance: Instance) -> Result<Self, Instance>;
}

fn scalar<T>(instance: Instance, f: impl FnOnce(&Value) -> Option<T>) -> Result<T, Instance> {
    let converted = match &instance {
        Instance::Value(value) => f(value),
        _ => None,
    };
    converted.ok_or(instance)
}

impl FromInstance for Instance {
    const EXPECTED: &'static str = "any value";

    fn from_instance(instance: Instance) -> Result<Self, Instance> {
        Ok(instance)
    }
}

impl FromInstance for Value {
    const EXPECTED: &'static str = "plain data";

    fn from_instance(instance: Instance) -> Result<Self, Instance> {
        instance.into_plain()
    }
}

impl FromInstance for f64 {
    const EXPECTED: &'static str = "a number";

    fn from_instance(instance: Instance) -> Result<Self, Instance> {
        scalar(instance, Value::as_f64)
    }
}

impl FromInstance for i64 {
    const EXPECTED: &'static str = "an integer";

    fn from_instance(instance: Instance) -> Result<Self, Instance> {
        scalar(instance, Value::as_i64)
    }
}

impl FromInstance for u64 {
    const EXPECTED: &'static str = "a non-negative integer";

    fn from_instance(instance: Instance) -> Result<Self, Instance> {
        scalar(instance, Value::as_u64)
    }
}

impl FromInstance for usize {
    const EXPECTED: &'static str = "a non-negative integer";

    fn from_instance(instance: Instance) -> Result<Self, Instance> {
        scalar(instance, |v| v.as_u64().and_then(|n| usize::try_from(n).ok()))
    }
}

impl FromInstance for bool {
    const EXPECTED: &'static str = "a boolean";

    fn from_instance(instance: Instance) -> Result<Self, Instance> {
        scalar(instance, Value::as_bool)
    }
}

impl FromInstance for String {
    const EXPECTED: &'static str = "a string";

    fn from_instance(instance: Instance) -> Result<Self, Instance> {
        scalar(instance, |v| v.as_str().map(String::from))
    }
}

impl FromInstance for Vec<String> {
    const EXPECTED: &'static str = "a list of strings";

    fn from_instance(instance: Instance) -> Result<Self, Instance> {
        let value = instance.into_plain()?;
        let strings = value.as_sequence().and_then(|items| {
            items
                .iter()
                .map(|v| v.as_str().map(String::from))
                .collect::<Option<Vec<_>>>()
        });
        strings.ok_or(Instance::Value(value))
    }
}

impl FromInstance for Vec<f64> {
    const EXPECTED: &'static str = "a list of numbers";

    fn from_instance(instance: Instance) -> Result<Self, Instance> {
        let value = instance.into_plain()?;
        let numbers = value
            .as_sequence()
            .and_then(|items| items.iter().map(Value::as_f64).collect::<Option<Vec<_>>>());
        numbers.ok_or(Instance::Value(value))
    }
}

impl FromInstance for Object {
    const EXPECTED: &'static str = "an object";

    fn from_instance(instance: Instance) -> Result<Self, Instance> {
        match instance {
            Instance::Object(obj) => Ok(obj),
            other => Err(other),
        }
    }
}

impl FromInstance for Box<dyn Transformer> {
    const EXPECTED: &'static str = "a transformer";

    fn from_instance(instance: Instance) -> Result<Self, Instance> {
        match instance {
            Instance::Object(obj) => obj.into_transformer().map_err(Instance::Object),
            other => Err(other),
        }
    }
}

impl FromInstance for Box<dyn Estimator> {
    const EXPECTED: &'static str = "an estimator";

    fn from_instance(instance: Instance) -> Result<Self, Instance> {
        match instance {
            Instance::Object(obj) => obj.into_estimator().map_err(Instance::Object),
            other => Err(other),
        }
    }
}

impl FromInstance for CompositePipeline {
    const EXPECTED: &'static str = "a composite pipeline";

    fn from_instance(instance: Instance) -> Result<Self, Instance> {
        match instance {
            Instance::Object(obj) => obj.downcast::<CompositePipeline>().map_err(Instance::Object),
            other => Err(other),
        }
    }
}

/// Arguments handed to a factory
///
/// A parameter is looked up by keyword first and otherwise taken from the
/// front of the positional list, so factories must request parameters in
/// declaration order.
#[derive(Debug)]
pub struct Args {
    target: String,
    positional: VecDeque<Instance>,
    keyword: Vec<(String, Instance)>,
}

impl Args {
    pub fn new(target: impl Into<String>, positional: Vec<Instance>, keyword: Vec<(String, Instance)>) -> Self {
        Self {
            target: target.into(),
            positional: positional.into(),
            keyword,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }

    fn take(&mut self, name: &str) -> Option<Instance> {
        match self.keyword.iter().position(|(k, _)| k == name) {
            Some(idx) => Some(self.keyword.remove(idx).1),
            None => self.positional.pop_front(),
        }
    }

    fn convert<T: FromInstance>(name: &str, instance: Instance) -> Result<T, ConstructionError> {
        T::from_instance(instance).map_err(|found| ConstructionError::InvalidArgument {
            name: name.to_string(),
            expected: T::EXPECTED.to_string(),
            found: found.describe(),
        })
    }

    pub fn required<T: FromInstance>(&mut self, name: &str) -> Result<T, ConstructionError> {
        let instance = self
            .take(name)
            .ok_or_else(|| ConstructionError::MissingArgument(name.to_string()))?;
        Self::convert(name, instance)
    }

    /// Absent and `null` arguments are `None`
    pub fn optional<T: FromInstance>(&mut self, name: &str) -> Result<Option<T>, ConstructionError> {
        match self.take(name) {
            None | Some(Instance::Value(Value::Null)) => Ok(None),
            Some(instance) => Self::convert(name, instance).map(Some),
        }
    }

    pub fn optional_or<T: FromInstance>(&mut self, name: &str, default: T) -> Result<T, ConstructionError> {
        Ok(self.optional(name)?.unwrap_or(default))
    }

    /// Optional string argument parsed with `FromStr`
    pub fn parsed<T>(&mut self, name: &str) -> Result<Option<T>, ConstructionError>
    where
        T: FromStr<Err = String>,
    {
        self.optional::<String>(name)?
            .map(|s| {
                s.parse().map_err(|reason| ConstructionError::InvalidValue {
                    name: name.to_string(),
                    reason,
                })
            })
            .transpose()
    }

    /// Fail on anything the factory did not consume
    pub fn finish(self) -> Result<(), ConstructionError> {
        if !self.keyword.is_empty() {
            return Err(ConstructionError::UnexpectedArguments(
                self.keyword.into_iter().map(|(k, _)| k).collect(),
            ));
        }
        if !self.positional.is_empty() {
            return Err(ConstructionError::TooManyPositional(self.positional.len()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(yaml: &str) -> Instance {
        Instance::Value(serde_yaml::from_str(yaml).unwrap())
    }

    #[test]
    fn test_keyword_before_positional() {
        let mut args = Args::new(
            "t",
            vec![value("1"), value("2")],
            vec![("b".to_string(), value("3"))],
        );
        assert_eq!(args.required::<i64>("a").unwrap(), 1);
        assert_eq!(args.required::<i64>("b").unwrap(), 3);
        assert_eq!(args.required::<i64>("c").unwrap(), 2);
        assert!(args.finish().is_ok());
    }

    #[test]
    fn test_missing_and_invalid_arguments() {
        let mut args = Args::new("t", vec![], vec![("depth".to_string(), value("deep"))]);
        assert!(matches!(
            args.required::<usize>("n"),
            Err(ConstructionError::MissingArgument(name)) if name == "n"
        ));
        assert!(matches!(
            args.required::<usize>("depth"),
            Err(ConstructionError::InvalidArgument { expected, .. }) if expected == "a non-negative integer"
        ));
    }

    #[test]
    fn test_null_is_none() {
        let mut args = Args::new("t", vec![], vec![("max_depth".to_string(), value("null"))]);
        assert_eq!(args.optional::<usize>("max_depth").unwrap(), None);
        assert_eq!(args.optional_or("min_samples_leaf", 1usize).unwrap(), 1);
    }

    #[test]
    fn test_finish_reports_leftovers() {
        let args = Args::new("t", vec![], vec![("typo".to_string(), value("1"))]);
        assert!(matches!(
            args.finish(),
            Err(ConstructionError::UnexpectedArguments(names)) if names == vec!["typo".to_string()]
        ));

        let args = Args::new("t", vec![value("1")], vec![]);
        assert!(matches!(args.finish(), Err(ConstructionError::TooManyPositional(1))));
    }

    #[test]
    fn test_string_lists() {
        let mut args = Args::new(
            "t",
            vec![],
            vec![(
                "columns".to_string(),
                Instance::List(vec![value("age"), value("income")]),
            )],
        );
        assert_eq!(
            args.required::<Vec<String>>("columns").unwrap(),
            vec!["age", "income"]
        );
    }
}
