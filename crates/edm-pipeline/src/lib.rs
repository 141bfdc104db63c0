#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # edm-pipeline
//!
//! Drives a model from parse events to API schemas: build the repository, run the enhancer
//! pipeline, assemble one schema per namespace and decide acceptance.
//!
//! Diagnostics never stop the run. The acceptance policy turns them into a single
//! accepted/rejected decision at the end.

pub mod pipeline;
pub mod policies;

pub use pipeline::{CompileOutput, Pipeline, PipelineConfig, PipelineStats, StageStats};
pub use policies::AcceptancePolicy;

use thiserror::Error;

/// Errors that stop a compilation before any diagnostics are produced
#[derive(Error, Debug)]
pub enum Error {
    #[error("Loading events failed: {0}")]
    Load(#[from] edm_builder::Error),

    #[error("Pipeline configuration error: {0}")]
    Config(#[from] edm_enhancer::Error),

    #[error("No event files given")]
    NoInput,
}

pub type Result<T> = std::result::Result<T, Error>;
