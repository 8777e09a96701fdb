//! # medirag - Retrieval-Augmented Medical Reference Chatbot
//!
//! Ingests medical reference PDFs into a vector index and answers questions
//! by combining a Gemini generative call with a similarity search over the
//! indexed corpus, optionally appending retrieved passages as sources.
//!
//! ## Architecture
//!
//! ```text
//! build path:  PDF ──▶ Ingestor ──▶ Chunker ──▶ Embedder ──▶ VectorIndex ──▶ disk
//! query path:  question ──▶ Embedder ──▶ VectorIndex ──▶ top-k passages ─┐
//!              question ──▶ Generator (templated prompt) ────────────────┴─▶ Composer
//! ```
//!
//! The [`index::lifecycle::IndexManager`] gates which index instance is
//! active: load the primary directory, fall back to the `_backup` sibling,
//! and as a last resort rebuild from the source PDFs under a lock marker.
//!
//! ## Modules
//!
//! - [`ingest`]: PDF extraction into per-page chunks and overlap re-windowing
//! - [`embedding`]: embedding provider trait
//! - [`generation`]: generative-model trait
//! - [`gemini`]: REST client implementing both provider traits
//! - [`index`]: cosine vector index with persistence, plus lifecycle management
//! - [`chat`]: answer composition, prompt templates and style classification
//! - [`history`]: chat transcript types and the per-user JSON store
//! - [`config`]: configuration with environment variable overrides
//! - [`error`]: error types

/// Answer composition, prompts and question style classification
pub mod chat;

/// Configuration management with environment variable overrides
pub mod config;

/// Embedding provider trait
pub mod embedding;

/// Error types and utilities
pub mod error;

/// Gemini REST client (embeddings and generation)
pub mod gemini;

/// Generative-model provider trait
pub mod generation;

/// Chat transcript types and persistence
pub mod history;

/// Vector index and its lifecycle manager
pub mod index;

/// PDF ingestion and chunking
pub mod ingest;

pub use chat::{ChatReply, Composer};
pub use config::Config;
pub use error::RagError;
pub use index::lifecycle::{IndexManager, IndexState, Retriever};
pub use index::{ScoredChunk, VectorIndex};
pub use ingest::{Chunk, ChunkMetadata};
