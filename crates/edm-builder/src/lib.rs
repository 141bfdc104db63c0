#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # edm-builder
//!
//! Turns a parse-event stream into a populated [`edm_model::Repository`].
//!
//! Events come either from a parser or from JSON/YAML event files on disk. The builder
//! records every structural problem as a diagnostic instead of failing, so one pass over a
//! broken model reports everything that is wrong with it.

pub mod builder;
pub mod events;
pub mod identity_rename;
pub mod loader;
pub mod naming;
pub mod text;

pub use builder::{BuildOutput, Builder, BuilderConfig, build};
pub use events::{Event, ParseEvent, split_qualified_name};
pub use loader::{EventFormat, load_events, parse_events};
pub use naming::NamingRules;
pub use text::EventStreamBuilder;

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur before building starts
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error during {operation} of {path}: {message}")]
    Io {
        operation: String,
        path: PathBuf,
        message: String,
    },

    #[error("Invalid event file {path}: {message}")]
    InvalidFormat { path: String, message: String },

    #[error("Unsupported event file format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid naming pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

impl Error {
    /// Build an IO error for a file operation.
    pub fn io(operation: impl Into<String>, path: &Path, error: &std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: path.to_path_buf(),
            message: error.to_string(),
        }
    }

    /// Build a format error for an event source.
    pub fn invalid_format(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Build an invalid naming pattern error.
    pub fn invalid_pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
