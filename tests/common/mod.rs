#![allow(dead_code)]

use async_trait::async_trait;
use medirag::embedding::Embedder;
use medirag::error::{EmbeddingError, GenerationError};
use medirag::generation::Generator;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;

/// Deterministic offline embedder: a text's vector is the sum of
/// pseudo-random per-token vectors, so texts sharing rare tokens score high
/// under cosine similarity and identical texts are exact matches.
pub struct TokenHashEmbedder {
    dimension: usize,
}

impl TokenHashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn token_vector(&self, token: &str) -> Vec<f32> {
        let mut state = DefaultHasher::new();
        token.hash(&mut state);
        let mut seed = state.finish();
        (0..self.dimension)
            .map(|_| {
                seed = seed
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                ((seed >> 33) as f32 / u32::MAX as f32) - 0.5
            })
            .collect()
    }
}

#[async_trait]
impl Embedder for TokenHashEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Err(EmbeddingError::EmptyBatch);
        }
        Ok(texts
            .iter()
            .map(|text| {
                let mut vector = vec![0.0f32; self.dimension];
                for token in text.split_whitespace() {
                    for (slot, value) in vector.iter_mut().zip(self.token_vector(token)) {
                        *slot += value;
                    }
                }
                vector
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        "stub-token-hash"
    }
}

/// Generator returning a fixed answer
pub struct CannedGenerator {
    pub answer: String,
}

#[async_trait]
impl Generator for CannedGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        Ok(self.answer.clone())
    }
}

/// Write a minimal valid PDF with one line of text per page
pub fn write_pdf(path: &Path, pages: &[&str]) {
    let n = pages.len();
    let font_id = 3 + 2 * n;

    let mut objects: Vec<(usize, Vec<u8>)> = Vec::new();
    objects.push((1, b"<< /Type /Catalog /Pages 2 0 R >>".to_vec()));

    let kids = (0..n)
        .map(|i| format!("{} 0 R", 3 + i))
        .collect::<Vec<_>>()
        .join(" ");
    objects.push((
        2,
        format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, n).into_bytes(),
    ));

    for i in 0..n {
        objects.push((
            3 + i,
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
                 /Resources << /Font << /F1 {} 0 R >> >> /Contents {} 0 R >>",
                font_id,
                3 + n + i
            )
            .into_bytes(),
        ));
    }

    for (i, text) in pages.iter().enumerate() {
        let escaped = text
            .replace('\\', "\\\\")
            .replace('(', "\\(")
            .replace(')', "\\)");
        let stream = format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET", escaped);
        objects.push((
            3 + n + i,
            format!(
                "<< /Length {} >>\nstream\n{}\nendstream",
                stream.len(),
                stream
            )
            .into_bytes(),
        ));
    }

    objects.push((
        font_id,
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_vec(),
    ));

    let mut out: Vec<u8> = b"%PDF-1.4\n".to_vec();
    let mut offsets = vec![0usize; objects.len() + 1];
    for (id, body) in &objects {
        offsets[*id] = out.len();
        out.extend(format!("{} 0 obj\n", id).into_bytes());
        out.extend(body);
        out.extend(b"\nendobj\n");
    }

    let xref_pos = out.len();
    let total = objects.len() + 1;
    out.extend(format!("xref\n0 {}\n", total).into_bytes());
    out.extend(b"0000000000 65535 f \n");
    for offset in offsets.iter().skip(1) {
        out.extend(format!("{:010} 00000 n \n", offset).into_bytes());
    }
    out.extend(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            total, xref_pos
        )
        .into_bytes(),
    );

    std::fs::write(path, out).unwrap();
}
