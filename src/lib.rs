//! confpipe - hierarchical YAML configuration, declarative object
//! instantiation and configurable ML preprocessing pipelines

pub mod cli;
pub mod config;
pub mod core;
pub mod data;
pub mod estimator;
pub mod instantiate;
pub mod pipeline;
pub mod preprocessing;

// Re-export commonly used types
pub use config::{Config, ConfigError, ConfigLoader};
pub use core::{Estimator, PipelineError, Transformer};
pub use data::{Frame, Labels};
pub use instantiate::{instantiate, Instance, InstantiateError, Object, Registry};
pub use pipeline::{create_pipeline, CompositePipeline};
