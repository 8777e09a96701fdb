//! Answer composition
//!
//! One generative call produces the direct answer; when sources are requested
//! a retrieval pass adds an extractive summary with a page-range citation.
//! Every external-call failure degrades to user-facing text so the chat
//! transcript is never interrupted by an error.

pub mod prompts;
pub mod style;

use crate::config::Config;
use crate::error::GenerationError;
use crate::generation::Generator;
use crate::history::ChatMessage;
use crate::index::ScoredChunk;
use crate::index::lifecycle::Retriever;
use std::sync::Arc;

/// Apology shown when retrieval fails twice
const RETRIEVAL_APOLOGY: &str =
    "I apologize, but I'm having trouble processing your request. Please try again.";

/// Heading inserted between the direct answer and retrieved material
const SOURCES_HEADING: &str = "📚 **Additional Research & Sources:**";

/// The composed response: the model's answer and the merged final text
#[derive(Debug, Clone)]
pub struct ChatReply {
    /// The generative model's answer alone
    pub direct: String,
    /// Direct answer plus the sources block when one was produced
    pub merged: String,
}

/// Stateless answer composer over injected provider seams
pub struct Composer {
    generator: Arc<dyn Generator>,
    retriever: Arc<dyn Retriever>,
    history_window: usize,
    retrieval_k: usize,
}

impl Composer {
    pub fn new(generator: Arc<dyn Generator>, retriever: Arc<dyn Retriever>, config: &Config) -> Self {
        Self {
            generator,
            retriever,
            history_window: config.chat.history_window,
            retrieval_k: config.retrieval.top_k,
        }
    }

    /// Answer a question, never returning an error to the transcript
    pub async fn answer(
        &self,
        question: &str,
        history: &[ChatMessage],
        want_sources: bool,
    ) -> ChatReply {
        let style = style::classify_style(question);
        let window_start = history.len().saturating_sub(self.history_window);
        let prompt = prompts::build_prompt(question, &history[window_start..], style.instruction());

        let direct = match self.generator.generate(&prompt).await {
            Ok(text) => text,
            Err(GenerationError::Api { body, .. }) => format!("API Error: {}", body),
            Err(e) => {
                tracing::error!("Generation failed: {}", e);
                format!("Failed to generate response: {}", e)
            }
        };

        let merged = if want_sources {
            match self.sources_block(question).await {
                Some(block) => format!("{}\n\n{}\n{}", direct, SOURCES_HEADING, block),
                None => direct.clone(),
            }
        } else {
            direct.clone()
        };

        ChatReply { direct, merged }
    }

    /// Retrieve supporting passages and format the citation block
    ///
    /// Returns None when retrieval yields nothing usable; a retrieval failure
    /// degrades to the apology string rather than propagating.
    async fn sources_block(&self, question: &str) -> Option<String> {
        let hits = match self.retriever.retrieve(question, self.retrieval_k).await {
            Ok(hits) => hits,
            Err(e) => {
                tracing::warn!("Retrieval failed: {}", e);
                return Some(RETRIEVAL_APOLOGY.to_string());
            }
        };

        if hits.is_empty() {
            return None;
        }

        let summary = hits
            .iter()
            .map(|hit| format!("- {}", extract_summary(&hit.chunk.text)))
            .collect::<Vec<_>>()
            .join("\n");

        let source_name = hits[0]
            .chunk
            .metadata
            .source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "source document".to_string());

        Some(format!(
            "{}\n\nSources: {} ({})",
            summary,
            source_name,
            page_range(&hits)
        ))
    }
}

/// First one or two sentences of a retrieved chunk
fn extract_summary(text: &str) -> String {
    let flattened = text.replace('\n', " ");
    let trimmed = flattened.trim();
    let sentences: Vec<&str> = trimmed.split(". ").collect();
    if sentences.len() > 1 {
        format!("{}.", sentences[..2].join(". ").trim_end_matches('.'))
    } else {
        trimmed.to_string()
    }
}

/// Citation covering the min/max page among the retrieved chunks
fn page_range(hits: &[ScoredChunk]) -> String {
    let min = hits.iter().map(|h| h.chunk.metadata.page).min().unwrap_or(0);
    let max = hits.iter().map(|h| h.chunk.metadata.page).max().unwrap_or(0);
    if min == max {
        format!("Page {}", min)
    } else {
        format!("Pages {}–{}", min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RagError;
    use crate::ingest::{Chunk, ChunkMetadata};
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::Mutex;

    struct StubGenerator {
        response: Result<String, GenerationError>,
    }

    #[async_trait]
    impl Generator for StubGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            match &self.response {
                Ok(text) => Ok(text.clone()),
                Err(GenerationError::Api { status, body }) => Err(GenerationError::Api {
                    status: *status,
                    body: body.clone(),
                }),
                Err(e) => Err(GenerationError::Request(e.to_string())),
            }
        }
    }

    struct StubRetriever {
        hits: Mutex<Result<Vec<ScoredChunk>, String>>,
    }

    #[async_trait]
    impl Retriever for StubRetriever {
        async fn retrieve(&self, _query: &str, _k: usize) -> Result<Vec<ScoredChunk>, RagError> {
            match &*self.hits.lock().unwrap() {
                Ok(hits) => Ok(hits.clone()),
                Err(msg) => Err(RagError::other(msg.clone())),
            }
        }
    }

    fn hit(text: &str, page: usize) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk {
                text: text.to_string(),
                metadata: ChunkMetadata {
                    page,
                    source: PathBuf::from("data/encyclopedia.pdf"),
                },
            },
            score: 0.9,
        }
    }

    fn composer(
        generated: Result<String, GenerationError>,
        retrieved: Result<Vec<ScoredChunk>, String>,
    ) -> Composer {
        Composer::new(
            Arc::new(StubGenerator {
                response: generated,
            }),
            Arc::new(StubRetriever {
                hits: Mutex::new(retrieved),
            }),
            &Config::default(),
        )
    }

    #[tokio::test]
    async fn test_no_sources_merged_equals_direct() {
        let composer = composer(Ok("the answer".into()), Ok(vec![hit("a", 1)]));
        let reply = composer.answer("what is anemia?", &[], false).await;
        assert_eq!(reply.direct, "the answer");
        assert_eq!(reply.merged, reply.direct);
    }

    #[tokio::test]
    async fn test_sources_block_has_page_range() {
        let hits = vec![
            hit("Anemia is a shortage of red cells. It causes fatigue. More detail.", 4),
            hit("Iron deficiency is the most common cause.", 9),
            hit("Treatment depends on the cause.", 4),
        ];
        let composer = composer(Ok("the answer".into()), Ok(hits));
        let reply = composer.answer("what causes anemia?", &[], true).await;

        assert!(reply.merged.starts_with("the answer"));
        assert!(reply.merged.contains(SOURCES_HEADING));
        assert!(reply.merged.contains("Pages 4–9"));
        assert!(reply.merged.contains("encyclopedia.pdf"));
        // Extractive summary keeps only the first two sentences
        assert!(reply.merged.contains("- Anemia is a shortage of red cells. It causes fatigue."));
        assert!(!reply.merged.contains("More detail"));
    }

    #[tokio::test]
    async fn test_single_page_citation() {
        let composer = composer(Ok("answer".into()), Ok(vec![hit("text here", 12)]));
        let reply = composer.answer("q", &[], true).await;
        assert!(reply.merged.contains("(Page 12)"));
    }

    #[tokio::test]
    async fn test_empty_retrieval_falls_back_to_direct() {
        let composer = composer(Ok("the answer".into()), Ok(vec![]));
        let reply = composer.answer("q", &[], true).await;
        assert_eq!(reply.merged, "the answer");
    }

    #[tokio::test]
    async fn test_retrieval_failure_degrades_to_apology() {
        let composer = composer(Ok("the answer".into()), Err("index is gone".into()));
        let reply = composer.answer("q", &[], true).await;
        assert!(reply.merged.contains(RETRIEVAL_APOLOGY));
        assert!(reply.merged.starts_with("the answer"));
    }

    #[tokio::test]
    async fn test_api_error_becomes_inline_text() {
        let composer = composer(
            Err(GenerationError::Api {
                status: 429,
                body: "quota exceeded".into(),
            }),
            Ok(vec![]),
        );
        let reply = composer.answer("q", &[], false).await;
        assert_eq!(reply.direct, "API Error: quota exceeded");
        assert_eq!(reply.merged, reply.direct);
    }

    #[tokio::test]
    async fn test_transport_error_becomes_generic_text() {
        let composer = composer(
            Err(GenerationError::Request("connection refused".into())),
            Ok(vec![]),
        );
        let reply = composer.answer("q", &[], false).await;
        assert!(reply.direct.starts_with("Failed to generate response:"));
    }

    #[test]
    fn test_extract_summary_two_sentences() {
        let text = "First sentence. Second sentence. Third sentence.";
        assert_eq!(extract_summary(text), "First sentence. Second sentence.");
    }

    #[test]
    fn test_extract_summary_single_sentence() {
        assert_eq!(extract_summary("Just one sentence"), "Just one sentence");
    }
}
