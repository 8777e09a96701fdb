/// Centralized error types for medirag using thiserror
///
/// Provides domain-specific error types for better error handling and user-facing messages.
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the RAG chatbot engine
#[derive(Error, Debug)]
pub enum RagError {
    #[error("Ingestion error: {0}")]
    Ingest(#[from] IngestError),

    #[error("Chunking error: {0}")]
    Chunk(#[from] ChunkError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Index build failed during {stage}: {source}")]
    BuildFailed {
        stage: &'static str,
        #[source]
        source: Box<RagError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Errors raised while ingesting source PDFs
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Source not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("Failed to parse PDF '{path}': {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("No text could be extracted from '{0}'")]
    EmptyDocument(PathBuf),
}

/// Errors raised by the text chunker
#[derive(Error, Debug)]
pub enum ChunkError {
    #[error("Invalid chunk window: overlap {overlap} must be smaller than size {size}")]
    InvalidWindow { size: usize, overlap: usize },

    #[error("Chunk size must be greater than 0")]
    ZeroSize,
}

/// Errors raised by the embedding service client
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Embedding API key is missing (set GOOGLE_API_KEY)")]
    MissingApiKey,

    #[error("Embedding request failed: {0}")]
    Request(String),

    #[error("Embedding API returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Malformed embedding response: {0}")]
    MalformedResponse(String),

    #[error("Embedding batch is empty")]
    EmptyBatch,

    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Errors raised by the vector index
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Cannot build an index from an empty corpus")]
    EmptyCorpus,

    #[error("Index not found at: {0}")]
    NotFound(PathBuf),

    #[error("Index at '{path}' is corrupted: {reason}")]
    Corrupted { path: PathBuf, reason: String },

    #[error("Index dimension {stored} does not match embedder dimension {current}")]
    DimensionMismatch { stored: usize, current: usize },

    #[error("Index was built with model '{stored}' but the embedder is '{current}'")]
    ModelMismatch { stored: String, current: String },

    #[error("Failed to save index to '{path}': {reason}")]
    SaveFailed { path: PathBuf, reason: String },

    #[error("Another index build is in progress (lock marker at {0})")]
    BuildInProgress(PathBuf),

    #[error("No index is loaded")]
    NotLoaded,
}

/// Errors raised by the generative-model client
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Generation API key is missing (set GOOGLE_API_KEY)")]
    MissingApiKey,

    #[error("Generation request failed: {0}")]
    Request(String),

    #[error("Generation API returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Malformed generation response: {0}")]
    MalformedResponse(String),
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration file: {0}")]
    LoadFailed(String),

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
}

// Conversion from anyhow::Error to RagError
impl From<anyhow::Error> for RagError {
    fn from(err: anyhow::Error) -> Self {
        RagError::Other(format!("{:#}", err))
    }
}

impl RagError {
    /// Create a new error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        RagError::Other(msg.into())
    }

    /// Wrap an error as a build failure at the named pipeline stage
    pub fn build_failed(stage: &'static str, source: impl Into<RagError>) -> Self {
        RagError::BuildFailed {
            stage,
            source: Box::new(source.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RagError::Ingest(IngestError::SourceNotFound(PathBuf::from("/data")));
        assert_eq!(err.to_string(), "Ingestion error: Source not found: /data");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let rag_err: RagError = io_err.into();
        assert!(matches!(rag_err, RagError::Io(_)));
    }

    #[test]
    fn test_index_dimension_mismatch_display() {
        let err = IndexError::DimensionMismatch {
            stored: 384,
            current: 768,
        };
        assert_eq!(
            err.to_string(),
            "Index dimension 384 does not match embedder dimension 768"
        );
    }

    #[test]
    fn test_build_failed_names_stage() {
        let err = RagError::build_failed("embed", EmbeddingError::EmptyBatch);
        assert_eq!(
            err.to_string(),
            "Index build failed during embed: Embedding error: Embedding batch is empty"
        );
    }

    #[test]
    fn test_chunk_error_invalid_window() {
        let err = ChunkError::InvalidWindow {
            size: 100,
            overlap: 200,
        };
        assert_eq!(
            err.to_string(),
            "Invalid chunk window: overlap 200 must be smaller than size 100"
        );
    }

    #[test]
    fn test_embedding_api_error_display() {
        let err = EmbeddingError::Api {
            status: 403,
            body: "forbidden".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Embedding API returned status 403: forbidden"
        );
    }

    #[test]
    fn test_error_chain() {
        let err: RagError = IndexError::EmptyCorpus.into();
        assert!(matches!(err, RagError::Index(_)));
        assert_eq!(
            err.to_string(),
            "Index error: Cannot build an index from an empty corpus"
        );
    }
}
