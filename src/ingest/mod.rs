//! PDF ingestion: turns source documents into retrievable chunks
//!
//! Each PDF page becomes one [`Chunk`] tagged with a 1-based page number and
//! the source path. The optional re-windowing into overlapping character
//! windows lives in [`chunker`].

pub mod chunker;

use crate::error::IngestError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A unit of source text plus provenance metadata, the atomic retrievable item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Raw text content
    pub text: String,
    /// Provenance metadata
    pub metadata: ChunkMetadata,
}

/// Provenance of a chunk within the source corpus
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkMetadata {
    /// 1-based page number within the source PDF
    pub page: usize,
    /// Path of the source document
    pub source: PathBuf,
}

/// Probe the candidate directories in order and return the first that exists
pub fn resolve_source_dir(candidates: &[PathBuf]) -> Result<PathBuf, IngestError> {
    for dir in candidates {
        if dir.is_dir() {
            return Ok(dir.clone());
        }
    }
    Err(IngestError::SourceNotFound(
        candidates
            .first()
            .cloned()
            .unwrap_or_else(|| PathBuf::from(".")),
    ))
}

/// Load a single PDF, producing one chunk per page in page order
///
/// Blank pages are skipped but the 1-based numbering of the remaining pages
/// is preserved so citations stay truthful.
pub fn load_pdf(path: &Path) -> Result<Vec<Chunk>, IngestError> {
    if !path.exists() {
        return Err(IngestError::SourceNotFound(path.to_path_buf()));
    }

    tracing::info!("Extracting text from {}", path.display());

    let pages = pdf_extract::extract_text_by_pages(path).map_err(|e| IngestError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut chunks = Vec::new();
    for (idx, page_text) in pages.iter().enumerate() {
        let text = normalize_page_text(page_text);
        if text.is_empty() {
            continue;
        }
        chunks.push(Chunk {
            text,
            metadata: ChunkMetadata {
                page: idx + 1,
                source: path.to_path_buf(),
            },
        });
    }

    if chunks.is_empty() {
        return Err(IngestError::EmptyDocument(path.to_path_buf()));
    }

    tracing::info!(
        "Extracted {} non-empty pages from {}",
        chunks.len(),
        path.display()
    );
    Ok(chunks)
}

/// Load every PDF under the given directory, in path order
pub fn load_corpus(dir: &Path) -> Result<Vec<Chunk>, IngestError> {
    if !dir.is_dir() {
        return Err(IngestError::SourceNotFound(dir.to_path_buf()));
    }

    let mut pdfs: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|s| s.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .map(|e| e.into_path())
        .collect();
    pdfs.sort();

    if pdfs.is_empty() {
        return Err(IngestError::SourceNotFound(dir.to_path_buf()));
    }

    let mut chunks = Vec::new();
    for path in &pdfs {
        match load_pdf(path) {
            Ok(mut page_chunks) => chunks.append(&mut page_chunks),
            Err(IngestError::EmptyDocument(path)) => {
                tracing::warn!("Skipping {}: no extractable text", path.display());
            }
            Err(e) => return Err(e),
        }
    }

    if chunks.is_empty() {
        return Err(IngestError::SourceNotFound(dir.to_path_buf()));
    }

    Ok(chunks)
}

/// Collapse runs of whitespace inside a page into single spaces
fn normalize_page_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_source_dir_picks_first_existing() {
        let dir = TempDir::new().unwrap();
        let candidates = vec![PathBuf::from("/nonexistent"), dir.path().to_path_buf()];
        assert_eq!(resolve_source_dir(&candidates).unwrap(), dir.path());
    }

    #[test]
    fn test_resolve_source_dir_missing() {
        let candidates = vec![PathBuf::from("/nonexistent")];
        let err = resolve_source_dir(&candidates).unwrap_err();
        assert!(matches!(err, IngestError::SourceNotFound(_)));
    }

    #[test]
    fn test_load_pdf_missing_path() {
        let err = load_pdf(Path::new("/nonexistent/doc.pdf")).unwrap_err();
        assert!(matches!(err, IngestError::SourceNotFound(_)));
    }

    #[test]
    fn test_load_corpus_empty_dir() {
        let dir = TempDir::new().unwrap();
        let err = load_corpus(dir.path()).unwrap_err();
        assert!(matches!(err, IngestError::SourceNotFound(_)));
    }

    #[test]
    fn test_normalize_page_text() {
        assert_eq!(normalize_page_text("  a\n\nb\t c  "), "a b c");
        assert_eq!(normalize_page_text("\n \t"), "");
    }
}
