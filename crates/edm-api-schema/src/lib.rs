#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # edm-api-schema
//!
//! Folds the derived data of an enhanced repository into one [`ApiSchema`] per namespace.
//!
//! The schema is the hand-off to downstream generators: resource schemas keyed by endpoint
//! name, name mappings, abstract resources and the education organization hierarchy.

pub mod assemble;
pub mod schema;

pub use assemble::{assemble, assemble_namespace};
pub use schema::{
    AbstractResource, ApiSchema, ProjectSchema, ResourceSchema, SecurityElements, SubclassType,
};

use thiserror::Error;

/// Errors raised while writing schemas out
#[derive(Error, Debug)]
pub enum Error {
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Pretty-printed JSON of a list of schemas.
pub fn to_json(schemas: &[ApiSchema]) -> Result<String> {
    Ok(serde_json::to_string_pretty(schemas)?)
}

pub fn to_yaml(schemas: &[ApiSchema]) -> Result<String> {
    Ok(serde_yaml::to_string(schemas)?)
}
