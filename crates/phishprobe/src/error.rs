//! Pipeline-level errors.
//!
//! Source failures never show up here: they are contained in
//! [`crate::sources::SourceOutcome`] and degrade to defaults. A `ProbeError`
//! means the pipeline itself is misconfigured or was handed bad artifacts.

use crate::schema::Source;
use thiserror::Error;

/// Errors surfaced by the pipeline, configuration, and classifier boundary.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// A source produced a feature it does not own.
    #[error("schema violation: source {owner} produced feature {feature} it does not own")]
    SchemaViolation {
        owner: Source,
        feature: &'static str,
    },

    /// The merged record is missing required features after defaulting.
    #[error("merged record is missing required features: {}", .0.join(", "))]
    MissingRequired(Vec<&'static str>),

    /// Invalid configuration value or file.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The TLD frequency table could not be parsed.
    #[error("invalid TLD frequency table at line {line}: {reason}")]
    TldTable { line: usize, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ProbeError>;
