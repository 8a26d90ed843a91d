//! docsearch-embed
//!
//! Text embedding with a tiered fallback chain: hosted API, then an
//! in-process model, then a deterministic hash vector. `TieredEmbedder::embed`
//! always returns a vector of the configured dimension.
pub mod cache;
pub mod error;
pub mod fallback;
pub mod local;
pub mod pool;
pub mod remote;
pub mod tokenize;

use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

use docsearch_core::config::{expand_path, EmbeddingSettings};
use docsearch_core::traits::Embedder;

pub use cache::EmbeddingCache;
pub use error::EmbedError;
pub use fallback::HashEmbedder;
pub use local::{EmbeddingModel, LocalModelTier, SentenceModel};
pub use pool::masked_mean_l2;
pub use remote::RemoteTier;

/// One strategy in the fallback chain.
#[async_trait]
pub trait EmbedTier: Send + Sync {
    fn name(&self) -> &'static str;
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;
}

/// Normalize text before embedding: collapse whitespace runs to one space,
/// drop everything except ASCII word characters, spaces and `.,!?-`, trim,
/// and keep at most `max_chars` characters.
pub fn preprocess(text: &str, max_chars: usize) -> String {
    let mut collapsed = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space { collapsed.push(' '); }
            in_space = true;
        } else {
            collapsed.push(c);
            in_space = false;
        }
    }
    let kept: String = collapsed
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ' ' | '.' | ',' | '!' | '?' | '-'))
        .collect();
    kept.trim().chars().take(max_chars).collect()
}

/// A vector plus the name of whatever produced it.
#[derive(Debug, Clone)]
pub struct Embedding {
    pub vector: Vec<f32>,
    pub source: &'static str,
}

pub struct TieredEmbedder {
    tiers: Vec<Box<dyn EmbedTier>>,
    fallback: HashEmbedder,
    cache: Option<EmbeddingCache>,
    dim: usize,
    max_chars: usize,
    tier_timeout: Duration,
    last: Mutex<Option<&'static str>>,
}

impl TieredEmbedder {
    /// Fallback-only chain; add tiers with [`TieredEmbedder::with_tier`].
    pub fn new(dim: usize, max_chars: usize, tier_timeout: Duration) -> Self {
        Self { tiers: Vec::new(), fallback: HashEmbedder::new(dim), cache: None, dim, max_chars, tier_timeout, last: Mutex::new(None) }
    }

    pub fn with_tier(mut self, tier: Box<dyn EmbedTier>) -> Self { self.tiers.push(tier); self }

    pub fn with_cache(mut self, capacity: usize) -> Self { self.cache = EmbeddingCache::new(capacity); self }

    /// Remote tier when an API key is configured, local tier when enabled.
    pub fn from_settings(settings: &EmbeddingSettings) -> Self {
        let timeout = Duration::from_millis(settings.tier_timeout_ms);
        let mut embedder = Self::new(settings.dim, settings.max_chars, timeout).with_cache(settings.cache_capacity);
        if let Some(key) = settings.remote.enabled_key() {
            match RemoteTier::new(&settings.remote.base_url, &settings.remote.model, key, settings.dim, timeout) {
                Ok(tier) => embedder = embedder.with_tier(Box::new(tier)),
                Err(e) => warn!(error = %e, "remote embedding tier disabled"),
            }
        } else {
            debug!("no remote embedding key configured");
        }
        if settings.local.enabled {
            let dir = settings.local.model_dir.as_deref().map(expand_path);
            embedder = embedder.with_tier(Box::new(LocalModelTier::from_dir(dir, settings.local.max_tokens)));
        }
        embedder
    }

    pub fn tier_names(&self) -> Vec<&'static str> { self.tiers.iter().map(|t| t.name()).collect() }

    pub fn cache(&self) -> Option<&EmbeddingCache> { self.cache.as_ref() }

    /// Source of the most recent vector: `"cache"`, a tier name, or `"fallback"`.
    pub fn last_tier(&self) -> Option<&'static str> { *self.last.lock() }

    /// Embed and report which tier answered.
    pub async fn embed_traced(&self, text: &str) -> Embedding {
        let out = self.run_chain(text).await;
        *self.last.lock() = Some(out.source);
        out
    }

    async fn run_chain(&self, text: &str) -> Embedding {
        let clean = preprocess(text, self.max_chars);
        if let Some(vector) = self.cache.as_ref().and_then(|c| c.get(&clean)) {
            return Embedding { vector, source: "cache" };
        }
        for tier in &self.tiers {
            match self.try_tier(tier.as_ref(), &clean).await {
                Ok(vector) => {
                    if let Some(cache) = &self.cache { cache.put(&clean, vector.clone()); }
                    return Embedding { vector, source: tier.name() };
                }
                Err(e) => warn!(tier = tier.name(), error = %e, "embedding tier failed, falling through"),
            }
        }
        Embedding { vector: self.fallback.embed_text(&clean), source: "fallback" }
    }

    async fn try_tier(&self, tier: &dyn EmbedTier, text: &str) -> Result<Vec<f32>, EmbedError> {
        let vector = tokio::time::timeout(self.tier_timeout, tier.embed(text))
            .await
            .map_err(|_| EmbedError::Timeout(self.tier_timeout))??;
        if vector.len() != self.dim {
            return Err(EmbedError::DimensionMismatch { expected: self.dim, actual: vector.len() });
        }
        Ok(vector)
    }
}

#[async_trait]
impl Embedder for TieredEmbedder {
    fn dim(&self) -> usize { self.dim }

    async fn embed(&self, text: &str) -> Vec<f32> { self.embed_traced(text).await.vector }
}
