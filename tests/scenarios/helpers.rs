//! Shared fixtures for the scenario tests

use confpipe::config::{parse_overrides, Config, ConfigError, ConfigLoader};
use confpipe::core::Transformer;
use confpipe::data::{Frame, Labels};
use confpipe::instantiate::Registry;
use confpipe::pipeline::CompositePipeline;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Small purchase dataset with a missing cell in every feature column
pub const PURCHASES_CSV: &str = "\
age,income,city,purchased
25,50000,rome,no
32,,paris,yes
47,82000,,yes
51,91000,paris,yes
,43000,rome,no
29,39000,berlin,no
38,67000,paris,yes
23,31000,rome,no
";

const PRIMARY: &str = r#"
defaults:
  - model: random_forest
  - _self_

features:
  numerical: [age, income]
  categorical: [city]

pipeline:
  _target_: confpipe.pipeline.create_pipeline
  numerical_imputer:
    _target_: confpipe.preprocessing.SimpleImputer
    strategy: mean
  numerical_scaler:
    _target_: confpipe.preprocessing.StandardScaler
  categorical_imputer:
    _target_: confpipe.preprocessing.SimpleImputer
    strategy: most_frequent
  categorical_encoder:
    _target_: confpipe.preprocessing.OneHotEncoder
    handle_unknown: ignore
  categorical_features: ${features.categorical}
  numerical_features: ${features.numerical}
  estimator: ${model}
"#;

pub fn write_file(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Config directory with a primary config and a `model` group
pub fn config_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "config.yaml", PRIMARY);
    write_file(
        dir.path(),
        "model/random_forest.yaml",
        "_target_: confpipe.estimator.RandomForestClassifier\nn_estimators: 10\nmax_depth: 4\nrandom_state: 0\n",
    );
    write_file(
        dir.path(),
        "model/decision_tree.yaml",
        "_target_: confpipe.estimator.DecisionTreeClassifier\nrandom_state: 0\n",
    );
    write_file(
        dir.path(),
        "model/dummy.yaml",
        "_target_: confpipe.estimator.DummyClassifier\n",
    );
    dir
}

pub fn try_compose(dir: &TempDir, overrides: &[&str]) -> Result<Config, ConfigError> {
    let overrides = parse_overrides(overrides)?;
    ConfigLoader::new(dir.path()).compose("config", &overrides)?.resolve()
}

/// Composed and resolved config
pub fn compose(dir: &TempDir, overrides: &[&str]) -> Config {
    try_compose(dir, overrides).unwrap()
}

pub fn build_pipeline(config: &Config) -> CompositePipeline {
    Registry::with_builtins()
        .build(config.select("pipeline").unwrap())
        .unwrap()
}

/// Feature frame and encoded labels (`no` = 0, `yes` = 1)
pub fn purchases() -> (Frame, Labels) {
    Frame::from_csv_reader(PURCHASES_CSV.as_bytes())
        .unwrap()
        .split_target("purchased")
        .unwrap()
}

pub fn boxed<T: Transformer + 'static>(stage: T) -> Box<dyn Transformer> {
    Box::new(stage)
}
