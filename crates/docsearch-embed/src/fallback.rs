//! Last-resort embedding: a pure function of the text, no I/O.

use async_trait::async_trait;
use docsearch_core::traits::Embedder;

/// Deterministic hash-seeded vector.
///
/// A 32-bit rolling hash over the UTF-16 code units (`h = h * 31 + unit`,
/// wrapping) seeds `v[i] = sin(h + i) * 0.5`. Same text, same vector; the
/// vectors carry no meaning beyond identity.
#[derive(Debug, Clone, Copy)]
pub struct HashEmbedder { dim: usize }

impl HashEmbedder {
    pub fn new(dim: usize) -> Self { Self { dim } }

    pub fn rolling_hash(text: &str) -> i32 {
        text.encode_utf16().fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)))
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let seed = f64::from(Self::rolling_hash(text));
        (0..self.dim).map(|i| ((seed + i as f64).sin() * 0.5) as f32).collect()
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn dim(&self) -> usize { self.dim }

    async fn embed(&self, text: &str) -> Vec<f32> { self.embed_text(text) }
}
