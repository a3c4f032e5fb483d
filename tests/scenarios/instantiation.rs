//! Test: Instantiation - composed configs turn into objects

use crate::helpers::*;
use confpipe::estimator::RandomForestClassifier;
use confpipe::pipeline::CompositePipeline;
use confpipe::preprocessing::StandardScaler;
use confpipe::instantiate::{Args, ConstructionError, Instance, InstantiateError, Object, Registry};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Test that an unknown target fails before any nested object is built
#[test]
fn test_unknown_target_constructs_nothing() {
    let built = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&built);
    let mut registry = Registry::new();
    registry.register("scenario.Counter", move |_: &mut Args| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    let node = serde_yaml::from_str(
        "{_target_: nonexistent.Type, child: {_target_: scenario.Counter}}",
    )
    .unwrap();
    let err = registry.instantiate(&node).unwrap_err();

    assert!(matches!(
        &err,
        InstantiateError::Resolution { target, .. } if target == "nonexistent.Type"
    ));
    assert_eq!(built.load(Ordering::SeqCst), 0);

    let node = serde_yaml::from_str("{_target_: scenario.Counter}").unwrap();
    registry.instantiate(&node).unwrap();
    assert_eq!(built.load(Ordering::SeqCst), 1);
}

/// Test that a misspelled model target stops the pipeline before any stage is built
#[test]
fn test_unknown_model_constructs_no_stage() {
    let built = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&built);
    let mut registry = Registry::with_builtins();
    registry.register_transformer("scenario.CountingScaler", move |_: &mut Args| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(StandardScaler::default())
    });

    let dir = config_dir();
    let config = compose(
        &dir,
        &[
            "pipeline.numerical_scaler._target_=scenario.CountingScaler",
            "model._target_=nonexistent.Model",
        ],
    );
    let err = registry
        .build::<CompositePipeline>(config.select("pipeline").unwrap())
        .unwrap_err();

    assert!(matches!(
        &err,
        InstantiateError::Resolution { target, path } if target == "nonexistent.Model" && path == "estimator"
    ));
    assert_eq!(built.load(Ordering::SeqCst), 0);
}

/// Test that plain config sections come back unchanged
#[test]
fn test_plain_section_is_copied() {
    let dir = config_dir();
    let config = compose(&dir, &[]);
    let features = config.select("features").unwrap();

    let instance = Registry::with_builtins().instantiate(features).unwrap();
    assert!(instance.is_plain());
    assert_eq!(&instance.to_value(), features);
}

/// Test that group values and overrides flow into the constructed estimator
#[test]
fn test_overrides_reach_constructed_estimator() {
    let dir = config_dir();
    let config = compose(&dir, &["model.n_estimators=3", "+model.bootstrap=false"]);

    let forest = Registry::with_builtins()
        .build::<Object>(config.select("model").unwrap())
        .unwrap()
        .downcast::<RandomForestClassifier>()
        .unwrap();
    assert_eq!(forest.n_estimators, 3);
    assert_eq!(forest.max_depth, Some(4));
    assert_eq!(forest.random_state, Some(0));
    assert!(!forest.bootstrap);
}

/// Test that an object's spec reproduces an equivalent object
#[test]
fn test_spec_reproduces_object() {
    let dir = config_dir();
    let config = compose(&dir, &[]);
    let registry = Registry::with_builtins();

    let instance = registry.instantiate(config.root()).unwrap();
    let estimator = instance
        .get("pipeline")
        .and_then(Instance::as_object)
        .map(|pipeline| pipeline.spec().get("estimator").cloned().unwrap())
        .unwrap();

    let first: Object = registry.build(&estimator).unwrap();
    let second: Object = registry.build(first.spec()).unwrap();
    assert_eq!(first.repr(), second.repr());
    assert_eq!(
        first.repr(),
        "confpipe.estimator.RandomForestClassifier(n_estimators=10, max_depth=4, random_state=0)"
    );
}

/// Test that a transformer in the estimator slot is a construction error
#[test]
fn test_stage_in_wrong_slot() {
    let dir = config_dir();
    let config = compose(&dir, &["pipeline.estimator=${pipeline.numerical_scaler}"]);

    let err = Registry::with_builtins()
        .instantiate(config.select("pipeline").unwrap())
        .unwrap_err();
    match err {
        InstantiateError::Construction {
            source: ConstructionError::InvalidArgument { name, expected, found },
            ..
        } => {
            assert_eq!(name, "estimator");
            assert_eq!(expected, "an estimator");
            assert_eq!(found, "object confpipe.preprocessing.StandardScaler");
        }
        other => panic!("unexpected error: {other}"),
    }
}

/// Test that a misspelled stage argument is reported by name
#[test]
fn test_unexpected_stage_argument() {
    let dir = config_dir();
    let config = compose(&dir, &["+pipeline.numerical_scaler.with_median=true"]);

    let err = Registry::with_builtins()
        .instantiate(config.select("pipeline").unwrap())
        .unwrap_err();
    assert!(matches!(
        &err,
        InstantiateError::Construction {
            path,
            source: ConstructionError::UnexpectedArguments(names),
            ..
        } if path == "numerical_scaler" && names == &vec!["with_median".to_string()]
    ));
}

/// Test that both feature lists empty fails as a configuration error
#[test]
fn test_no_features_is_configuration_error() {
    let dir = config_dir();
    let config = compose(
        &dir,
        &["features.categorical=[]", "features.numerical=[]"],
    );

    let err = Registry::with_builtins()
        .instantiate(config.select("pipeline").unwrap())
        .unwrap_err();
    assert!(err.is_configuration_error());
}
