//! Scenario tests for confpipe

mod helpers;

mod composition;
mod instantiation;
mod pipeline_training;
mod sweeps;
