//! Per-run output directories
//!
//! Single runs write to `outputs/<date>/<time>/`, multirun jobs to
//! `multirun/<date>/<time>/<job>/`. The composed config and the overrides
//! that produced it are saved under `.confpipe/` in that directory.

use crate::config::{Config, ConfigError, Override};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::debug;

const META_DIR: &str = ".confpipe";

/// Output directory of one run or multirun job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDir {
    path: PathBuf,
}

impl RunDir {
    /// Directory of a single run started at `started_at`
    pub fn single(base: &Path, started_at: DateTime<Local>) -> Self {
        Self {
            path: base
                .join("outputs")
                .join(started_at.format("%Y-%m-%d").to_string())
                .join(started_at.format("%H-%M-%S").to_string()),
        }
    }

    /// Directory of job number `job` of a multirun started at `started_at`
    pub fn multirun(base: &Path, started_at: DateTime<Local>, job: usize) -> Self {
        Self {
            path: base
                .join("multirun")
                .join(started_at.format("%Y-%m-%d").to_string())
                .join(started_at.format("%H-%M-%S").to_string())
                .join(job.to_string()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `config.yaml` and `overrides.yaml` for this run
    pub fn save(&self, config: &Config, overrides: &[Override]) -> Result<(), ConfigError> {
        let meta = self.path.join(META_DIR);
        std::fs::create_dir_all(&meta).map_err(|source| ConfigError::Io {
            path: meta.clone(),
            source,
        })?;

        let overrides: Vec<String> = overrides.iter().map(ToString::to_string).collect();
        write_file(&meta.join("config.yaml"), &config.to_yaml()?)?;
        write_file(&meta.join("overrides.yaml"), &serde_yaml::to_string(&overrides)?)?;

        debug!("Saved run configuration to {}", meta.display());
        Ok(())
    }
}

fn write_file(path: &Path, content: &str) -> Result<(), ConfigError> {
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
