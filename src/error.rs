//! Error taxonomy for the ingestion and query paths.
//!
//! Failures local to one document ([`LoadFailure`]) or one retrieval
//! ([`RagError::RetrievalFailure`]) never abort the surrounding batch or
//! query. An empty corpus or a failed generation always surfaces to the
//! caller.

use std::path::PathBuf;

use thiserror::Error;

/// A single source file that could not be read or parsed.
///
/// Collected by the loader alongside the documents that did load; never
/// fatal to the batch.
#[derive(Error, Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[error("failed to load {}: {reason}", .path.display())]
pub struct LoadFailure {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Error, Debug)]
pub enum RagError {
    #[error("corpus directory {} is not readable: {reason}", .path.display())]
    CorpusUnreadable { path: PathBuf, reason: String },

    #[error("no documents survived preprocessing in {}; no index was written", .0.display())]
    EmptyCorpus(PathBuf),

    #[error("retrieval failed: {0}")]
    RetrievalFailure(String),

    #[error("invalid mode '{0}': expected one of interview, storytelling, fast_facts, humble_brag")]
    InvalidMode(String),

    #[error("generation failed: {0}")]
    GenerationFailure(String),

    #[error("embedding failed: {0:#}")]
    Embedding(anyhow::Error),

    #[error("vector index error: {0:#}")]
    Index(anyhow::Error),
}
