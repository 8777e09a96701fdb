/// Configuration system for medirag
///
/// Supports loading from multiple sources with priority:
/// Environment variables > Config file > Defaults
///
/// The Gemini API key is never read from the config file; it comes from the
/// GOOGLE_API_KEY environment variable only.
use crate::error::{ConfigError, RagError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Source document configuration
    pub source: SourceConfig,

    /// Chunking configuration
    pub chunking: ChunkingConfig,

    /// Embedding model configuration
    pub embedding: EmbeddingConfig,

    /// Generative model configuration
    pub generation: GenerationConfig,

    /// Retrieval configuration
    pub retrieval: RetrievalConfig,

    /// Index storage configuration
    pub index: IndexConfig,

    /// Chat configuration
    pub chat: ChatConfig,
}

/// Source document configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Candidate directories probed in order for source PDFs
    #[serde(default = "default_data_dirs")]
    pub data_dirs: Vec<PathBuf>,
}

/// Chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between consecutive chunks in characters
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Keep one chunk per PDF page instead of re-windowing
    #[serde(default)]
    pub per_page: bool,
}

/// Embedding model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Gemini embedding model identifier
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Expected embedding dimensionality for the configured model
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// Batch size for embedding requests
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

/// Generative model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Gemini generative model identifier
    #[serde(default = "default_generation_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_k")]
    pub top_k: u32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of passages retrieved for the sources block
    #[serde(default = "default_retrieval_top_k")]
    pub top_k: usize,
}

/// Index storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Primary index directory
    #[serde(default = "default_index_path")]
    pub primary_path: PathBuf,

    /// Lock marker file created while a build is in progress
    #[serde(default = "default_lock_path")]
    pub lock_path: PathBuf,

    /// Age in seconds after which an orphaned lock marker is reclaimed
    #[serde(default = "default_stale_lock_secs")]
    pub stale_lock_secs: u64,
}

/// Chat configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Number of past messages included as conversational context
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Directory for per-user chat history files
    #[serde(default = "default_history_dir")]
    pub history_dir: PathBuf,
}

// Default value functions
fn default_data_dirs() -> Vec<PathBuf> {
    vec![PathBuf::from("data"), PathBuf::from("Data")]
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    100
}

fn default_embedding_model() -> String {
    "models/embedding-001".to_string()
}

fn default_embedding_dimension() -> usize {
    768
}

fn default_batch_size() -> usize {
    32
}

fn default_generation_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_k() -> u32 {
    40
}

fn default_top_p() -> f32 {
    0.95
}

fn default_max_output_tokens() -> u32 {
    2048
}

fn default_retrieval_top_k() -> usize {
    3
}

fn default_index_path() -> PathBuf {
    PathBuf::from("vectorstore/medical_db")
}

fn default_lock_path() -> PathBuf {
    PathBuf::from("vectorstore/.build.lock")
}

fn default_stale_lock_secs() -> u64 {
    30 * 60
}

fn default_history_window() -> usize {
    4
}

fn default_history_dir() -> PathBuf {
    PathBuf::from("chat_histories")
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            data_dirs: default_data_dirs(),
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            per_page: false,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            batch_size: default_batch_size(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: default_generation_model(),
            temperature: default_temperature(),
            top_k: default_top_k(),
            top_p: default_top_p(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_retrieval_top_k(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            primary_path: default_index_path(),
            lock_path: default_lock_path(),
            stale_lock_secs: default_stale_lock_secs(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_window: default_history_window(),
            history_dir: default_history_dir(),
        }
    }
}

impl IndexConfig {
    /// Sibling backup directory for the primary index path
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self
            .primary_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "index".to_string());
        name.push_str("_backup");
        match self.primary_path.parent() {
            Some(parent) => parent.join(name),
            None => PathBuf::from(name),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &Path) -> Result<Self, RagError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed(format!("Invalid TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `medirag.toml` in the working directory,
    /// falling back to the user config directory, then to defaults
    pub fn load_or_default() -> Result<Self, RagError> {
        let mut candidates = vec![PathBuf::from("medirag.toml")];
        if let Some(base) = dirs::config_dir() {
            candidates.push(base.join("medirag").join("medirag.toml"));
        }

        for path in candidates {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(&path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), RagError> {
        if self.source.data_dirs.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "source.data_dirs".to_string(),
                reason: "at least one candidate directory is required".to_string(),
            }
            .into());
        }

        if self.chunking.chunk_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "chunking.chunk_size".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(ConfigError::InvalidValue {
                key: "chunking.chunk_overlap".to_string(),
                reason: format!(
                    "must be smaller than chunk_size ({}), got {}",
                    self.chunking.chunk_size, self.chunking.chunk_overlap
                ),
            }
            .into());
        }

        if self.embedding.dimension == 0 {
            return Err(ConfigError::InvalidValue {
                key: "embedding.dimension".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.embedding.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "embedding.batch_size".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.retrieval.top_k == 0 {
            return Err(ConfigError::InvalidValue {
                key: "retrieval.top_k".to_string(),
                reason: "must be at least 1".to_string(),
            }
            .into());
        }

        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(ConfigError::InvalidValue {
                key: "generation.temperature".to_string(),
                reason: format!(
                    "must be between 0.0 and 2.0, got {}",
                    self.generation.temperature
                ),
            }
            .into());
        }

        if !(0.0..=1.0).contains(&self.generation.top_p) {
            return Err(ConfigError::InvalidValue {
                key: "generation.top_p".to_string(),
                reason: format!("must be between 0.0 and 1.0, got {}", self.generation.top_p),
            }
            .into());
        }

        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("MEDIRAG_DATA_DIR") {
            self.source.data_dirs = vec![PathBuf::from(dir)];
        }

        if let Ok(path) = std::env::var("MEDIRAG_INDEX_PATH") {
            self.index.primary_path = PathBuf::from(path);
        }

        if let Ok(model) = std::env::var("MEDIRAG_EMBEDDING_MODEL") {
            self.embedding.model = model;
        }

        if let Ok(model) = std::env::var("MEDIRAG_GENERATION_MODEL") {
            self.generation.model = model;
        }

        if let Ok(size) = std::env::var("MEDIRAG_CHUNK_SIZE")
            && let Ok(size) = size.parse()
        {
            self.chunking.chunk_size = size;
        }

        if let Ok(overlap) = std::env::var("MEDIRAG_CHUNK_OVERLAP")
            && let Ok(overlap) = overlap.parse()
        {
            self.chunking.chunk_overlap = overlap;
        }

        if let Ok(top_k) = std::env::var("MEDIRAG_RETRIEVAL_TOP_K")
            && let Ok(top_k) = top_k.parse()
        {
            self.retrieval.top_k = top_k;
        }
    }

    /// Create a new Config with defaults and environment overrides
    pub fn new() -> Result<Self, RagError> {
        let mut config = Self::load_or_default()?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }
}
