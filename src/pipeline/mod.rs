//! Pipeline composition
//!
//! [`Pipeline`] chains transformers, [`ColumnTransformer`] routes column
//! subsets through separate branches, and [`CompositePipeline`] feeds the
//! routed features to an estimator. [`create_pipeline`] wires the fixed
//! numerical/categorical topology.

mod assembler;
mod column;
mod composite;
mod sequential;

pub use assembler::*;
pub use column::{Branch, ColumnTransformer};
pub use composite::CompositePipeline;
pub use sequential::{Pipeline, Step};
