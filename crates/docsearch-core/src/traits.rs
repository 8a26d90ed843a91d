use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;
use crate::types::{Document, DocumentId, FileType, Filters, NewDocument};

/// Text-to-vector capability. Implementations never fail: whatever goes wrong
/// internally, a vector of exactly `dim()` values comes back.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;

    async fn embed(&self, text: &str) -> Vec<f32>;
}

/// Persistence boundary. Identity and timestamps are assigned here.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Active documents matching `filters`, newest first.
    async fn find_active(&self, filters: &Filters) -> Result<Vec<Document>>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Document>>;

    /// Atomically add 1 to the search count of every listed document.
    async fn increment_search_count(&self, ids: &[DocumentId]) -> Result<()>;

    async fn save(&self, doc: NewDocument) -> Result<Document>;

    /// Flip `is_active` off. Returns false when no such document exists.
    async fn deactivate(&self, id: &str) -> Result<bool>;
}

/// Lexical matching over an already-filtered candidate set.
///
/// Returns indexes into `candidates`, best match first when the matcher has
/// a notion of relevance, otherwise in candidate order.
pub trait LexicalMatcher: Send + Sync {
    fn find_matches(&self, query: &str, candidates: &[Document]) -> Result<Vec<usize>>;
}

pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path, file_type: FileType) -> Result<String>;
}
