use super::Chunk;
use crate::error::ChunkError;

/// Splits page chunks into fixed-size overlapping character windows
///
/// Consecutive windows share `overlap` characters of context so that a
/// sentence cut at a window boundary is still retrievable. Input shorter than
/// the window size passes through unchanged.
pub struct TextChunker {
    size: usize,
    overlap: usize,
}

impl TextChunker {
    pub fn new(size: usize, overlap: usize) -> Result<Self, ChunkError> {
        if size == 0 {
            return Err(ChunkError::ZeroSize);
        }
        if overlap >= size {
            return Err(ChunkError::InvalidWindow { size, overlap });
        }
        Ok(Self { size, overlap })
    }

    /// Re-window a sequence of chunks, preserving metadata on every window
    pub fn split(&self, chunks: &[Chunk]) -> Vec<Chunk> {
        let mut out = Vec::new();
        for chunk in chunks {
            self.split_one(chunk, &mut out);
        }
        out
    }

    fn split_one(&self, chunk: &Chunk, out: &mut Vec<Chunk>) {
        let chars: Vec<char> = chunk.text.chars().collect();
        if chars.len() <= self.size {
            out.push(chunk.clone());
            return;
        }

        let step = self.size - self.overlap;
        let mut start = 0;
        while start < chars.len() {
            let end = (start + self.size).min(chars.len());
            // Every window is kept, even all-whitespace ones, so consecutive
            // windows always share `overlap` characters and concatenation
            // modulo the overlap reproduces the input exactly.
            out.push(Chunk {
                text: chars[start..end].iter().collect(),
                metadata: chunk.metadata.clone(),
            });
            if end >= chars.len() {
                break;
            }
            start += step;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::ChunkMetadata;
    use std::path::PathBuf;

    fn page(text: &str) -> Chunk {
        Chunk {
            text: text.to_string(),
            metadata: ChunkMetadata {
                page: 7,
                source: PathBuf::from("doc.pdf"),
            },
        }
    }

    #[test]
    fn test_short_input_passes_through() {
        let chunker = TextChunker::new(100, 10).unwrap();
        let windows = chunker.split(&[page("short text")]);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].text, "short text");
    }

    #[test]
    fn test_window_lengths_bounded() {
        let text: String = ('a'..='z').cycle().take(250).collect();
        let chunker = TextChunker::new(100, 20).unwrap();
        let windows = chunker.split(&[page(&text)]);
        assert!(windows.len() > 1);
        for w in &windows {
            assert!(w.text.chars().count() <= 100);
        }
    }

    #[test]
    fn test_consecutive_windows_share_overlap() {
        let text: String = (0..300).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let chunker = TextChunker::new(100, 20).unwrap();
        let windows = chunker.split(&[page(&text)]);

        for pair in windows.windows(2) {
            let head: Vec<char> = pair[0].text.chars().collect();
            let tail_of_head: String = head[head.len() - 20..].iter().collect();
            assert!(pair[1].text.starts_with(&tail_of_head));
        }
    }

    #[test]
    fn test_reconstruction_modulo_overlap() {
        let text: String = (0..500).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let chunker = TextChunker::new(120, 30).unwrap();
        let windows = chunker.split(&[page(&text)]);

        let mut rebuilt: String = windows[0].text.clone();
        for w in &windows[1..] {
            let chars: Vec<char> = w.text.chars().collect();
            rebuilt.extend(chars[30.min(chars.len())..].iter());
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_whitespace_run_survives_windowing() {
        // A run of spaces longer than size - overlap fills whole windows;
        // those windows must be kept or the text cannot be reconstructed
        let text = format!("abcdefgh{}z", " ".repeat(20));
        let chunker = TextChunker::new(10, 2).unwrap();
        let windows = chunker.split(&[page(&text)]);

        let mut rebuilt: String = windows[0].text.clone();
        for w in &windows[1..] {
            let chars: Vec<char> = w.text.chars().collect();
            rebuilt.extend(chars[2.min(chars.len())..].iter());
        }
        assert_eq!(rebuilt, text);

        for pair in windows.windows(2) {
            let head: Vec<char> = pair[0].text.chars().collect();
            let tail_of_head: String = head[head.len() - 2..].iter().collect();
            assert!(pair[1].text.starts_with(&tail_of_head));
        }
    }

    #[test]
    fn test_metadata_preserved_on_every_window() {
        let text: String = "x".repeat(500);
        let chunker = TextChunker::new(100, 10).unwrap();
        let windows = chunker.split(&[page(&text)]);
        assert!(windows.len() > 1);
        for w in &windows {
            assert_eq!(w.metadata.page, 7);
            assert_eq!(w.metadata.source, PathBuf::from("doc.pdf"));
        }
    }

    #[test]
    fn test_invalid_window_rejected() {
        assert!(matches!(
            TextChunker::new(50, 50),
            Err(ChunkError::InvalidWindow { .. })
        ));
        assert!(matches!(TextChunker::new(0, 0), Err(ChunkError::ZeroSize)));
    }
}
