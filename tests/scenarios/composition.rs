//! Test: Composition - primary config, config groups, overrides and run directories

use crate::helpers::*;
use chrono::Local;
use confpipe::config::{parse_overrides, Config, ConfigError, RunDir};
use pretty_assertions::assert_eq;
use serde_yaml::Value;
use std::fs;
use tempfile::TempDir;

/// Test that the defaults list places the model group under `model`
#[test]
fn test_model_group_is_merged() {
    let dir = config_dir();
    let config = compose(&dir, &[]);

    assert_eq!(
        config.select("model._target_"),
        Some(&Value::from("confpipe.estimator.RandomForestClassifier"))
    );
    assert_eq!(config.select("pipeline.estimator.n_estimators"), Some(&Value::from(10)));
    assert_eq!(
        config.select("pipeline.numerical_features"),
        config.select("features.numerical")
    );
}

/// Test that a group override swaps the estimator without touching the rest
#[test]
fn test_group_override_swaps_model() {
    let dir = config_dir();
    let config = compose(&dir, &["model=dummy"]);

    assert_eq!(
        config.select("pipeline.estimator"),
        Some(&serde_yaml::from_str::<Value>("_target_: confpipe.estimator.DummyClassifier").unwrap())
    );
    assert_eq!(
        config.select("pipeline.numerical_imputer.strategy"),
        Some(&Value::from("mean"))
    );
}

/// Test that an unknown group option names the available ones
#[test]
fn test_unknown_model_option() {
    let dir = config_dir();
    match try_compose(&dir, &["model=svm"]) {
        Err(ConfigError::MissingGroupOption { available, .. }) => {
            assert_eq!(available, "decision_tree, dummy, random_forest");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

/// Test that overriding a key that does not exist is refused
#[test]
fn test_override_of_unknown_key() {
    let dir = config_dir();
    assert!(matches!(
        try_compose(&dir, &["pipeline.numerical_scaler.with_median=true"]),
        Err(ConfigError::KeyNotFound(_))
    ));
}

/// Test that environment interpolation falls back to its default
#[test]
fn test_env_interpolation_default() {
    let dir = config_dir();
    let config = compose(
        &dir,
        &["++run.owner=${oc.env:CONFPIPE_SCENARIO_UNSET_OWNER,nobody}"],
    );
    assert_eq!(config.select("run.owner"), Some(&Value::from("nobody")));
}

/// Test that a run directory stores the composed config and its overrides
#[test]
fn test_run_dir_records_config() {
    let dir = config_dir();
    let out = TempDir::new().unwrap();
    let overrides = parse_overrides(&["model.n_estimators=3"]).unwrap();
    let config = compose(&dir, &["model.n_estimators=3"]);

    let run = RunDir::single(out.path(), Local::now());
    run.save(&config, &overrides).unwrap();

    let saved = Config::from_file(run.path().join(".confpipe/config.yaml")).unwrap();
    assert_eq!(saved, config);
    let recorded = fs::read_to_string(run.path().join(".confpipe/overrides.yaml")).unwrap();
    assert!(recorded.contains("model.n_estimators=3"));
}
