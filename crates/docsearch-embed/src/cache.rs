//! In-process embedding cache keyed by the `blake3` hash of the preprocessed
//! text. Only provider/model vectors are stored here, never fallback vectors.
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

pub struct EmbeddingCache {
    inner: Mutex<LruCache<blake3::Hash, Vec<f32>>>,
}

impl EmbeddingCache {
    /// `None` when `capacity` is zero.
    pub fn new(capacity: usize) -> Option<Self> {
        NonZeroUsize::new(capacity).map(|cap| Self { inner: Mutex::new(LruCache::new(cap)) })
    }

    pub fn get(&self, text: &str) -> Option<Vec<f32>> {
        self.inner.lock().get(&blake3::hash(text.as_bytes())).cloned()
    }

    pub fn put(&self, text: &str, vector: Vec<f32>) {
        self.inner.lock().put(blake3::hash(text.as_bytes()), vector);
    }

    pub fn len(&self) -> usize { self.inner.lock().len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}
