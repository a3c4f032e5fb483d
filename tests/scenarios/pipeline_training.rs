//! Test: Pipeline Training - configured pipelines fit and predict on tabular data

use crate::helpers::*;
use confpipe::core::{PipelineError, Transformer};
use confpipe::data::Frame;
use confpipe::pipeline::Pipeline;
use confpipe::preprocessing::{ImputeStrategy, SimpleImputer, StandardScaler};
use polars::prelude::{NamedFrom, Series};
use pretty_assertions::assert_eq;

/// Test that the random forest pipeline fits and predicts every row
#[test]
fn test_random_forest_pipeline_fits_and_predicts() {
    let dir = config_dir();
    let mut pipeline = build_pipeline(&compose(&dir, &[]));
    let (features, labels) = purchases();

    pipeline.fit(&features, &labels.y).unwrap();
    assert!(pipeline.is_fitted());

    let predictions = pipeline.predict(&features).unwrap();
    assert_eq!(predictions.len(), features.n_rows());
    assert!(predictions.iter().all(|p| *p == 0.0 || *p == 1.0));
    assert!(pipeline.score(&features, &labels.y).unwrap() >= 0.75);
}

/// Test that an unrestricted decision tree memorises the training rows
#[test]
fn test_decision_tree_pipeline_fits_training_data() {
    let dir = config_dir();
    let mut pipeline = build_pipeline(&compose(&dir, &["model=decision_tree"]));
    let (features, labels) = purchases();

    pipeline.fit(&features, &labels.y).unwrap();
    assert_eq!(pipeline.score(&features, &labels.y).unwrap(), 1.0);
    assert_eq!(labels.decode(1.0), "yes");
}

/// Test that numeric outputs come first, then the one-hot city columns
#[test]
fn test_feature_order_and_width() {
    let dir = config_dir();
    let mut pipeline = build_pipeline(&compose(&dir, &[]));
    let (features, labels) = purchases();
    pipeline.fit(&features, &labels.y).unwrap();

    let expected = vec![
        "num__age",
        "num__income",
        "cat__city_berlin",
        "cat__city_paris",
        "cat__city_rome",
    ];
    assert_eq!(pipeline.feature_names_out().unwrap().to_vec(), expected);

    let transformed = pipeline.transform(&features).unwrap();
    assert_eq!(transformed.n_cols(), 2 + 3);
    assert_eq!(transformed.n_rows(), features.n_rows());
}

/// Test that fitting on data without the `city` column is a configuration error
#[test]
fn test_missing_categorical_column_is_configuration_error() {
    let dir = config_dir();
    let mut pipeline = build_pipeline(&compose(&dir, &[]));
    let (features, labels) = purchases();
    let without_city = features.select(&["age", "income"]).unwrap();

    let err = pipeline.fit(&without_city, &labels.y).unwrap_err();
    assert!(err.is_configuration_error());
    assert!(matches!(
        &err,
        PipelineError::MissingColumn { branch, column } if branch == "cat" && column == "city"
    ));
    assert!(!pipeline.is_fitted());
}

/// Test that an empty categorical list leaves only the numerical branch
#[test]
fn test_empty_categorical_features_matches_numeric_branch() {
    let dir = config_dir();
    let mut pipeline = build_pipeline(&compose(&dir, &["features.categorical=[]"]));
    let (features, labels) = purchases();
    pipeline.fit(&features, &labels.y).unwrap();

    assert_eq!(
        pipeline.feature_names_out().unwrap().to_vec(),
        vec!["num__age", "num__income"]
    );

    let mut numeric_only = Pipeline::new([
        ("impute", boxed(SimpleImputer::new(ImputeStrategy::Mean))),
        ("scale", boxed(StandardScaler::default())),
    ])
    .unwrap();
    let expected = numeric_only
        .fit_transform(&features.select(&["age", "income"]).unwrap())
        .unwrap()
        .to_array()
        .unwrap();
    let actual = pipeline.transform(&features).unwrap().to_array().unwrap();
    assert_eq!(actual, expected);
}

/// Test that predicting before fitting is rejected
#[test]
fn test_predict_before_fit() {
    let dir = config_dir();
    let pipeline = build_pipeline(&compose(&dir, &[]));
    let (features, _) = purchases();

    assert!(matches!(
        pipeline.predict(&features),
        Err(PipelineError::NotFitted(_))
    ));
}

/// Test that a city never seen during fit encodes to zeros when ignored
#[test]
fn test_unknown_city_is_ignored_at_predict_time() {
    let dir = config_dir();
    let mut pipeline = build_pipeline(&compose(&dir, &["model=dummy"]));
    let (features, labels) = purchases();
    pipeline.fit(&features, &labels.y).unwrap();

    let unseen = Frame::new()
        .with_column(Series::new("age".into(), &[40.0]))
        .unwrap()
        .with_column(Series::new("income".into(), &[60000.0]))
        .unwrap()
        .with_column(Series::new("city".into(), &["madrid"]))
        .unwrap();

    let transformed = pipeline.transform(&unseen).unwrap().to_array().unwrap();
    assert_eq!(transformed.row(0).iter().skip(2).sum::<f64>(), 0.0);
    assert_eq!(pipeline.predict(&unseen).unwrap().len(), 1);
}

/// Test that a strict encoder rejects the unseen city instead
#[test]
fn test_unknown_city_errors_with_strict_encoder() {
    let dir = config_dir();
    let mut pipeline = build_pipeline(&compose(
        &dir,
        &["pipeline.categorical_encoder.handle_unknown=error"],
    ));
    let (features, labels) = purchases();
    pipeline.fit(&features, &labels.y).unwrap();

    let unseen = Frame::new()
        .with_column(Series::new("age".into(), &[40.0]))
        .unwrap()
        .with_column(Series::new("income".into(), &[60000.0]))
        .unwrap()
        .with_column(Series::new("city".into(), &["madrid"]))
        .unwrap();
    assert!(matches!(
        pipeline.predict(&unseen),
        Err(PipelineError::UnknownCategory { .. })
    ));
}
