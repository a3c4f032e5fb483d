//! Targets shipped with the crate

use super::{Args, ConstructionError, Registry};
use crate::core::{Estimator, Transformer};
use crate::estimator::{DecisionTreeClassifier, DummyClassifier, MaxFeatures, RandomForestClassifier};
use crate::pipeline::{create_pipeline, CompositePipeline};
use crate::preprocessing::{
    FillValue, HandleUnknown, ImputeStrategy, MinMaxScaler, OneHotEncoder, SimpleImputer, StandardScaler,
};
use serde_yaml::Value;

impl Registry {
    /// Registry holding every built-in target
    pub fn with_builtins() -> Self {
        let mut registry = Registry::new();
        register_builtins(&mut registry);
        registry
    }
}

/// Add the built-in preprocessing stages, classifiers and `create_pipeline`
pub fn register_builtins(registry: &mut Registry) {
    registry
        .register_transformer("confpipe.preprocessing.SimpleImputer", simple_imputer)
        .register_transformer("confpipe.preprocessing.StandardScaler", |args: &mut Args| {
            Ok(StandardScaler::new(
                args.optional_or("with_mean", true)?,
                args.optional_or("with_std", true)?,
            ))
        })
        .register_transformer("confpipe.preprocessing.MinMaxScaler", min_max_scaler)
        .register_transformer("confpipe.preprocessing.OneHotEncoder", |args: &mut Args| {
            let handle_unknown = args.parsed::<HandleUnknown>("handle_unknown")?;
            Ok(OneHotEncoder::new(handle_unknown.unwrap_or_default()))
        })
        .register_estimator("confpipe.estimator.DummyClassifier", |_: &mut Args| {
            Ok(DummyClassifier::new())
        })
        .register_estimator("confpipe.estimator.DecisionTreeClassifier", decision_tree)
        .register_estimator("confpipe.estimator.RandomForestClassifier", random_forest)
        .register("confpipe.pipeline.create_pipeline", pipeline);
}

fn simple_imputer(args: &mut Args) -> Result<SimpleImputer, ConstructionError> {
    let strategy = args
        .parsed::<ImputeStrategy>("strategy")?
        .unwrap_or(ImputeStrategy::Mean);
    let fill_value = match args.optional::<Value>("fill_value")? {
        None => None,
        Some(Value::String(label)) => Some(FillValue::Label(label)),
        Some(value) => match value.as_f64() {
            Some(n) => Some(FillValue::Number(n)),
            None => {
                return Err(ConstructionError::InvalidValue {
                    name: "fill_value".to_string(),
                    reason: "expected a number or a string".to_string(),
                })
            }
        },
    };

    let imputer = SimpleImputer::new(strategy);
    Ok(match fill_value {
        Some(fill) => imputer.with_fill_value(fill),
        None => imputer,
    })
}

fn min_max_scaler(args: &mut Args) -> Result<MinMaxScaler, ConstructionError> {
    match args.optional::<Vec<f64>>("feature_range")? {
        None => Ok(MinMaxScaler::default()),
        Some(range) => match range.as_slice() {
            [min, max] => Ok(MinMaxScaler::new(*min, *max)?),
            _ => Err(ConstructionError::InvalidValue {
                name: "feature_range".to_string(),
                reason: format!("expected [min, max], got {} values", range.len()),
            }),
        },
    }
}

fn decision_tree(args: &mut Args) -> Result<DecisionTreeClassifier, ConstructionError> {
    let mut tree = DecisionTreeClassifier::new();
    tree.max_depth = args.optional("max_depth")?;
    tree.min_samples_split = args.optional_or("min_samples_split", tree.min_samples_split)?;
    tree.min_samples_leaf = args.optional_or("min_samples_leaf", tree.min_samples_leaf)?;
    tree.max_features = args.optional("max_features")?;
    tree.random_state = args.optional("random_state")?;
    tree.validate()?;
    Ok(tree)
}

fn max_features(args: &mut Args) -> Result<Option<MaxFeatures>, ConstructionError> {
    let invalid = |reason: String| ConstructionError::InvalidValue {
        name: "max_features".to_string(),
        reason,
    };
    match args.optional::<Value>("max_features")? {
        None => Ok(None),
        Some(Value::String(s)) => s.parse().map(Some).map_err(invalid),
        Some(Value::Number(n)) => match (n.as_u64(), n.as_f64()) {
            (Some(k), _) if k > 0 => Ok(Some(MaxFeatures::Fixed(k as usize))),
            (None, Some(f)) if f > 0.0 && f <= 1.0 => Ok(Some(MaxFeatures::Fraction(f))),
            _ => Err(invalid(format!(
                "expected a positive integer or a fraction in (0, 1], got {}",
                n
            ))),
        },
        Some(other) => Err(invalid(format!("unsupported value {:?}", other))),
    }
}

fn random_forest(args: &mut Args) -> Result<RandomForestClassifier, ConstructionError> {
    let mut forest = RandomForestClassifier::new(args.optional_or("n_estimators", 100)?);
    forest.max_depth = args.optional("max_depth")?;
    forest.min_samples_split = args.optional_or("min_samples_split", forest.min_samples_split)?;
    forest.min_samples_leaf = args.optional_or("min_samples_leaf", forest.min_samples_leaf)?;
    if let Some(m) = max_features(args)? {
        forest.max_features = m;
    }
    forest.bootstrap = args.optional_or("bootstrap", true)?;
    forest.random_state = args.optional("random_state")?;
    forest.validate()?;
    Ok(forest)
}

fn pipeline(args: &mut Args) -> Result<CompositePipeline, ConstructionError> {
    let numerical_imputer: Box<dyn Transformer> = args.required("numerical_imputer")?;
    let numerical_scaler: Box<dyn Transformer> = args.required("numerical_scaler")?;
    let categorical_imputer: Box<dyn Transformer> = args.required("categorical_imputer")?;
    let categorical_encoder: Box<dyn Transformer> = args.required("categorical_encoder")?;
    let categorical_features: Vec<String> = args.required("categorical_features")?;
    let numerical_features: Vec<String> = args.required("numerical_features")?;
    let estimator: Box<dyn Estimator> = args.required("estimator")?;

    Ok(create_pipeline(
        numerical_imputer,
        numerical_scaler,
        categorical_imputer,
        categorical_encoder,
        categorical_features.as_slice(),
        numerical_features.as_slice(),
        estimator,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instantiate::{InstantiateError, Object, TargetKind};

    fn build(yaml: &str) -> Result<Object, crate::instantiate::InstantiateError> {
        Registry::with_builtins().build(&serde_yaml::from_str(yaml).unwrap())
    }

    #[test]
    fn test_builtin_targets_are_registered() {
        let registry = Registry::with_builtins();
        assert_eq!(registry.targets().count(), 8);
        assert_eq!(
            registry.kind("confpipe.preprocessing.OneHotEncoder"),
            Some(TargetKind::Transformer)
        );
        assert_eq!(
            registry.kind("confpipe.pipeline.create_pipeline"),
            Some(TargetKind::Object)
        );
    }

    #[test]
    fn test_simple_imputer_fill_value() {
        let obj = build("{_target_: confpipe.preprocessing.SimpleImputer, strategy: constant, fill_value: unknown}")
            .unwrap();
        assert!(obj.is_transformer());
        let imputer = obj.downcast::<SimpleImputer>().unwrap();
        assert_eq!(imputer.strategy(), ImputeStrategy::Constant);
    }

    #[test]
    fn test_unknown_strategy() {
        let err = build("{_target_: confpipe.preprocessing.SimpleImputer, strategy: average}").unwrap_err();
        assert!(err.to_string().contains("unknown imputation strategy 'average'"));
    }

    #[test]
    fn test_min_max_feature_range() {
        let obj = build("{_target_: confpipe.preprocessing.MinMaxScaler, feature_range: [-1, 1]}").unwrap();
        assert_eq!(obj.downcast::<MinMaxScaler>().unwrap().feature_range(), (-1.0, 1.0));
        assert!(build("{_target_: confpipe.preprocessing.MinMaxScaler, feature_range: [1]}").is_err());
    }

    #[test]
    fn test_random_forest_rejects_invalid_hyperparameters_at_build() {
        for yaml in [
            "{_target_: confpipe.estimator.RandomForestClassifier, n_estimators: 0}",
            "{_target_: confpipe.estimator.RandomForestClassifier, min_samples_split: 1}",
            "{_target_: confpipe.estimator.RandomForestClassifier, min_samples_leaf: 0}",
        ] {
            let err = build(yaml).unwrap_err();
            assert!(
                matches!(&err, InstantiateError::Construction { target, .. } if target == "confpipe.estimator.RandomForestClassifier"),
                "{}",
                err
            );
        }
    }

    #[test]
    fn test_random_forest_arguments() {
        let obj = build(
            "{_target_: confpipe.estimator.RandomForestClassifier, n_estimators: 5, max_features: log2, bootstrap: false}",
        )
        .unwrap();
        assert!(obj.is_estimator());
        let forest = obj.downcast::<RandomForestClassifier>().unwrap();
        assert_eq!(forest.n_estimators, 5);
        assert_eq!(forest.max_features, MaxFeatures::Log2);
        assert!(!forest.bootstrap);

        let obj = build("{_target_: confpipe.estimator.RandomForestClassifier, max_features: 0.5}").unwrap();
        assert_eq!(
            obj.downcast::<RandomForestClassifier>().unwrap().max_features,
            MaxFeatures::Fraction(0.5)
        );
    }

    #[test]
    fn test_decision_tree_rejects_bad_split_size() {
        let err = build("{_target_: confpipe.estimator.DecisionTreeClassifier, min_samples_split: 1}").unwrap_err();
        assert!(err.is_configuration_error());
    }
}
