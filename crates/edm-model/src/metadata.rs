//! Source positions and diagnostics
#![allow(clippy::must_use_candidate)] // Constructor helpers are clear at call sites without #[must_use].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a construct in the source text, carried through every stage for reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    /// Line number (1-indexed, 0 when unknown)
    #[serde(default)]
    pub line: usize,

    /// Column number (0-indexed)
    #[serde(default)]
    pub column: usize,

    /// Raw token text of the construct
    #[serde(default)]
    pub token_text: String,
}

/// Category of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// A problem found while building or enhancing the model. Diagnostics are recorded, never thrown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    /// Name of the builder, validator or enhancer that raised it
    pub validator_name: String,

    /// Error or warning
    pub category: Severity,

    /// Human-readable message
    pub message: String,

    /// Location of the offending construct
    pub source_map: SourceMap,
}

impl SourceMap {
    /// Create a new source map
    pub fn new(line: usize, column: usize, token_text: impl Into<String>) -> Self {
        Self {
            line,
            column,
            token_text: token_text.into(),
        }
    }

    /// Whether this map points somewhere real.
    pub fn is_known(&self) -> bool {
        self.line > 0
    }
}

impl Diagnostic {
    /// Create an error diagnostic
    pub fn error(
        validator_name: impl Into<String>,
        message: impl Into<String>,
        source_map: SourceMap,
    ) -> Self {
        Self {
            validator_name: validator_name.into(),
            category: Severity::Error,
            message: message.into(),
            source_map,
        }
    }

    /// Create a warning diagnostic
    pub fn warning(
        validator_name: impl Into<String>,
        message: impl Into<String>,
        source_map: SourceMap,
    ) -> Self {
        Self {
            validator_name: validator_name.into(),
            category: Severity::Warning,
            message: message.into(),
            source_map,
        }
    }

    pub fn is_error(&self) -> bool {
        self.category == Severity::Error
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}] {}:{} '{}': {}",
            self.category,
            self.validator_name,
            self.source_map.line,
            self.source_map.column,
            self.source_map.token_text,
            self.message
        )
    }
}

/// Counts of diagnostics by severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiagnosticCounts {
    pub errors: usize,
    pub warnings: usize,
}

impl DiagnosticCounts {
    /// Tally a list of diagnostics.
    pub fn of(diagnostics: &[Diagnostic]) -> Self {
        diagnostics
            .iter()
            .fold(Self::default(), |mut counts, diagnostic| {
                match diagnostic.category {
                    Severity::Error => counts.errors += 1,
                    Severity::Warning => counts.warnings += 1,
                }
                counts
            })
    }

    pub fn total(self) -> usize {
        self.errors + self.warnings
    }
}
