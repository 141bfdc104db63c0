#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # edm-enhancer
//!
//! Reference resolution and the ordered enhancer pipeline.
//!
//! Every stage is a whole-repository pass that reads the model and the output of earlier
//! stages and fills in derived data. Problems are returned as diagnostics; a construct that
//! cannot be resolved is left without derived data and the remaining graph is processed
//! normally.
//!
//! ## Example
//!
//! ```rust,ignore
//! use edm_enhancer::enhance;
//!
//! let mut repository = build(&events, BuilderConfig::default())?.repository;
//! for result in enhance(&mut repository) {
//!     for diagnostic in &result.diagnostics {
//!         eprintln!("{diagnostic}");
//!     }
//! }
//! ```

pub mod api_mapping;
pub mod array_uniqueness;
pub mod collecting;
pub mod document_paths;
pub mod identity;
pub mod json_paths;
pub mod json_schema;
pub mod merge;
pub mod naming;
pub mod pipeline;
pub mod query_fields;
pub mod resolver;
pub mod resource;
pub mod security;

#[cfg(test)]
pub(crate) mod test_support;

pub use pipeline::{EnhancerPipeline, EnhancerResult, Stage, enhance};
pub use resolver::resolve_references;

use thiserror::Error;

/// Errors raised while configuring the pipeline
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown enhancer stage: {0}")]
    UnknownStage(String),
}

pub type Result<T> = std::result::Result<T, Error>;
