use thiserror::Error;

use super::config::ConfigError;
use crate::core::chem::smiles::ParseError;
use crate::core::embed::EmbedError;
use crate::core::io::sdf::SdfParseErrorKind;
use crate::core::shape::gaussian::ShapeParameters;

/// Failures of a conformer generator for a single query.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConformerError {
    #[error("Invalid SMILES: {0}")]
    Parse(#[from] ParseError),

    #[error("No conformer could be built for {attempted} structure(s): {source}")]
    Build { attempted: usize, source: EmbedError },
}

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Failed to open database '{path}': {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },

    #[error("Unsupported database format '{extension}' for '{path}' (expected .sdf, .sd, .mol, .smi, .smiles or .ism)")]
    UnsupportedFormat { path: String, extension: String },

    #[error("Malformed record {record} in '{path}' on line {line}: {kind}")]
    Parse {
        path: String,
        record: usize,
        line: usize,
        kind: SdfParseErrorKind,
    },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScoringError {
    #[error("Database was indexed with {database:?} but the scorer uses {scorer:?}")]
    IncompatibleDatabase {
        database: ShapeParameters,
        scorer: ShapeParameters,
    },

    #[error("Scoring failed: {0}")]
    Failed(String),
}

impl ScoringError {
    /// Whether the error invalidates every remaining query, not just the current one.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ScoringError::IncompatibleDatabase { .. })
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {source}")]
    Database {
        #[from]
        source: DatabaseError,
    },

    #[error("Scoring backend error: {source}")]
    Scoring {
        #[from]
        source: ScoringError,
    },

    #[error("Scoring backend is unavailable: {0}")]
    BackendUnavailable(String),
}
