//! Index lifecycle: load-or-build decision logic
//!
//! Owns which index instance is active. Load order is primary directory, then
//! the `_backup` sibling, then a full rebuild from the source PDFs performed
//! under a lock marker. Before a rebuild overwrites the primary, the previous
//! index is snapshotted to the backup path. Build errors never leave a
//! partially built index exposed as usable.

use super::{ScoredChunk, VectorIndex};
use crate::config::{ChunkingConfig, Config, IndexConfig, SourceConfig};
use crate::embedding::Embedder;
use crate::error::{IndexError, RagError};
use crate::ingest::{self, chunker::TextChunker};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Lifecycle state of the managed index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    NoIndex,
    Loaded,
    Building,
    LoadFailed,
    BuildFailed,
}

/// Seam for retrieval so the answer composer can be tested without an index
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>, RagError>;
}

/// Sentinel file signalling an in-progress build
///
/// Created with create-exclusive semantics so two processes racing on an empty
/// filesystem cannot both acquire it. A marker left behind by a crashed build
/// is reclaimed once it is older than the configured stale threshold. The
/// marker is removed when this guard drops, on success and failure alike.
#[derive(Debug)]
struct LockMarker {
    path: PathBuf,
}

impl LockMarker {
    fn acquire(path: &Path, stale_after: Duration) -> Result<Self, RagError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        match Self::try_create(path) {
            Ok(marker) => Ok(marker),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                if Self::is_stale(path, stale_after) {
                    tracing::warn!(
                        "Reclaiming stale lock marker at {} (older than {:?})",
                        path.display(),
                        stale_after
                    );
                    let _ = std::fs::remove_file(path);
                    Self::try_create(path)
                        .map_err(|_| IndexError::BuildInProgress(path.to_path_buf()).into())
                } else {
                    Err(IndexError::BuildInProgress(path.to_path_buf()).into())
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    fn try_create(path: &Path) -> Result<Self, std::io::Error> {
        std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    fn is_stale(path: &Path, stale_after: Duration) -> bool {
        std::fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| modified.elapsed().ok())
            .is_some_and(|age| age > stale_after)
    }
}

impl Drop for LockMarker {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(
                "Failed to remove lock marker {}: {}",
                self.path.display(),
                e
            );
        }
    }
}

/// Owns the active index and the load-or-build policy around it
pub struct IndexManager {
    source: SourceConfig,
    chunking: ChunkingConfig,
    index_config: IndexConfig,
    embedder: Arc<dyn Embedder>,
    index: RwLock<Option<VectorIndex>>,
    state: RwLock<IndexState>,
}

impl IndexManager {
    pub fn new(config: &Config, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            source: config.source.clone(),
            chunking: config.chunking.clone(),
            index_config: config.index.clone(),
            embedder,
            index: RwLock::new(None),
            state: RwLock::new(IndexState::NoIndex),
        }
    }

    pub async fn state(&self) -> IndexState {
        *self.state.read().await
    }

    /// Number of entries in the active index, if one is loaded
    pub async fn len(&self) -> Option<usize> {
        self.index.read().await.as_ref().map(|i| i.len())
    }

    /// Make an index active: load primary, fall back to backup, else rebuild
    pub async fn ensure_loaded(&self) -> Result<(), RagError> {
        if self.index.read().await.is_some() {
            return Ok(());
        }

        if self.try_load_from_disk().await {
            return Ok(());
        }

        *self.state.write().await = IndexState::LoadFailed;
        self.rebuild().await
    }

    /// Attempt primary then backup load; true if either succeeded
    async fn try_load_from_disk(&self) -> bool {
        let primary = &self.index_config.primary_path;

        if self.index_config.lock_path.exists() {
            tracing::warn!(
                "Lock marker present at {}, skipping primary load",
                self.index_config.lock_path.display()
            );
        } else {
            match VectorIndex::load(primary, self.embedder.as_ref()) {
                Ok(index) => {
                    self.install(index).await;
                    return true;
                }
                Err(e) => {
                    tracing::warn!("Primary index load failed ({}): {}", primary.display(), e);
                }
            }
        }

        let backup = self.index_config.backup_path();
        match VectorIndex::load(&backup, self.embedder.as_ref()) {
            Ok(index) => {
                tracing::info!("Loaded backup index from {}", backup.display());
                self.install(index).await;
                true
            }
            Err(e) => {
                tracing::warn!("Backup index load failed ({}): {}", backup.display(), e);
                false
            }
        }
    }

    /// Rebuild the index from the source PDFs while holding the lock marker
    ///
    /// On success the previous primary (if any) is snapshotted to the backup
    /// path before being overwritten. On failure the manager holds no index.
    pub async fn rebuild(&self) -> Result<(), RagError> {
        *self.state.write().await = IndexState::Building;

        let stale_after = Duration::from_secs(self.index_config.stale_lock_secs);
        let marker = match LockMarker::acquire(&self.index_config.lock_path, stale_after) {
            Ok(marker) => marker,
            Err(e) => {
                *self.state.write().await = IndexState::BuildFailed;
                return Err(e);
            }
        };

        let result = self.build_and_persist().await;
        // Marker removal must happen on every exit path out of Building
        drop(marker);

        match result {
            Ok(index) => {
                self.install(index).await;
                Ok(())
            }
            Err(e) => {
                *self.index.write().await = None;
                *self.state.write().await = IndexState::BuildFailed;
                tracing::error!("Index build failed: {}", e);
                Err(e)
            }
        }
    }

    async fn build_and_persist(&self) -> Result<VectorIndex, RagError> {
        let source_dir = ingest::resolve_source_dir(&self.source.data_dirs)
            .map_err(|e| RagError::build_failed("ingest", e))?;
        let pages = ingest::load_corpus(&source_dir)
            .map_err(|e| RagError::build_failed("ingest", e))?;

        let chunks = if self.chunking.per_page {
            pages
        } else {
            let chunker = TextChunker::new(self.chunking.chunk_size, self.chunking.chunk_overlap)
                .map_err(|e| RagError::build_failed("chunk", e))?;
            chunker.split(&pages)
        };

        tracing::info!("Building index over {} chunks", chunks.len());

        let index = VectorIndex::build(chunks, self.embedder.as_ref())
            .await
            .map_err(|e| RagError::build_failed("embed", e))?;

        let primary = &self.index_config.primary_path;
        if primary.join(super::INDEX_FILE).exists() {
            let backup = self.index_config.backup_path();
            snapshot_dir(primary, &backup).map_err(|e| RagError::build_failed("save", e))?;
        }
        index
            .save(primary)
            .map_err(|e| RagError::build_failed("save", e))?;

        Ok(index)
    }

    async fn install(&self, index: VectorIndex) {
        *self.index.write().await = Some(index);
        *self.state.write().await = IndexState::Loaded;
    }

    async fn query_once(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>, RagError> {
        let guard = self.index.read().await;
        let index = guard.as_ref().ok_or(IndexError::NotLoaded)?;
        index.query(query, k, self.embedder.as_ref()).await
    }
}

#[async_trait]
impl Retriever for IndexManager {
    /// Query with a one-shot retry: on failure, re-load once from disk and
    /// retry; a second failure propagates to the caller.
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>, RagError> {
        self.ensure_loaded().await?;

        match self.query_once(query, k).await {
            Ok(hits) => Ok(hits),
            Err(first) => {
                tracing::warn!("Query failed, attempting one reload: {}", first);
                *self.index.write().await = None;
                if self.try_load_from_disk().await {
                    self.query_once(query, k).await
                } else {
                    *self.state.write().await = IndexState::LoadFailed;
                    Err(first)
                }
            }
        }
    }
}

/// Replace `dst` with a recursive copy of `src`
fn snapshot_dir(src: &Path, dst: &Path) -> Result<(), std::io::Error> {
    if dst.exists() {
        std::fs::remove_dir_all(dst)?;
    }
    copy_dir(src, dst)?;
    tracing::info!("Snapshotted {} to {}", src.display(), dst.display());
    Ok(())
}

fn copy_dir(src: &Path, dst: &Path) -> Result<(), std::io::Error> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
