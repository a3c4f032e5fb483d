//! Test: Sweeps - multirun override expansion drives one pipeline per job

use crate::helpers::*;
use chrono::{Local, TimeZone};
use confpipe::config::{expand_sweeps, ConfigLoader, RunDir};
use confpipe::instantiate::Registry;
use confpipe::pipeline::CompositePipeline;
use pretty_assertions::assert_eq;
use std::path::Path;

/// Test that every combination of swept values becomes a trained job
#[test]
fn test_sweep_trains_every_combination() {
    let dir = config_dir();
    let jobs = expand_sweeps(&["model=decision_tree,dummy", "features.categorical=[city],[]"]).unwrap();
    assert_eq!(jobs.len(), 4);

    let rendered: Vec<Vec<String>> = jobs
        .iter()
        .map(|job| job.iter().map(ToString::to_string).collect())
        .collect();
    assert_eq!(
        rendered,
        vec![
            vec!["model=decision_tree", "features.categorical=[city]"],
            vec!["model=decision_tree", "features.categorical=[]"],
            vec!["model=dummy", "features.categorical=[city]"],
            vec!["model=dummy", "features.categorical=[]"],
        ]
    );

    let (features, labels) = purchases();
    let registry = Registry::with_builtins();
    let widths: Vec<usize> = jobs
        .iter()
        .map(|job| {
            let config = ConfigLoader::new(dir.path())
                .compose("config", job)
                .unwrap()
                .resolve()
                .unwrap();
            let mut pipeline: CompositePipeline =
                registry.build(config.select("pipeline").unwrap()).unwrap();
            pipeline.fit(&features, &labels.y).unwrap();
            pipeline.feature_names_out().unwrap().len()
        })
        .collect();
    assert_eq!(widths, vec![5, 2, 5, 2]);
}

/// Test that a sweep with a bad option only fails that job
#[test]
fn test_sweep_with_unknown_option() {
    let dir = config_dir();
    let jobs = expand_sweeps(&["model=dummy,svm"]).unwrap();
    let outcomes: Vec<bool> = jobs
        .iter()
        .map(|job| ConfigLoader::new(dir.path()).compose("config", job).is_ok())
        .collect();
    assert_eq!(outcomes, vec![true, false]);
}

/// Test that multirun jobs get sibling directories
#[test]
fn test_multirun_job_directories() {
    let started = Local.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
    let base = Path::new("/tmp/runs");
    let first = RunDir::multirun(base, started, 0);
    let second = RunDir::multirun(base, started, 1);

    assert_eq!(first.path(), Path::new("/tmp/runs/multirun/2024-05-01/09-30-00/0"));
    assert_eq!(first.path().parent(), second.path().parent());
    assert_ne!(first.path(), second.path());
}
