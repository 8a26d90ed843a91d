//! In-memory `DocumentStore`.
//!
//! Records live in a `Vec` behind one `RwLock`, in insertion order. With a
//! snapshot path every mutation rewrites the whole record set as compact JSON
//! (`<path>.tmp` then rename), and `open` loads it back.
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use docsearch_core::traits::DocumentStore;
use docsearch_core::types::{Document, DocumentId, Filters, NewDocument};
use docsearch_core::{Error, Result};

#[derive(Default)]
pub struct MemoryStore {
    docs: RwLock<Vec<Document>>,
    snapshot: Option<PathBuf>,
    // serializes snapshot writes so an older state never lands last
    persist_lock: tokio::sync::Mutex<()>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    /// Store pre-populated with `docs` (ids and timestamps kept as given).
    pub fn with_documents(docs: Vec<Document>) -> Self {
        Self { docs: RwLock::new(docs), ..Self::default() }
    }

    /// Load the snapshot at `path` if it exists; mutations are written back to it.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let docs = if path.exists() {
            let raw = std::fs::read_to_string(&path).map_err(|e| store_err(&path, e))?;
            serde_json::from_str::<Vec<Document>>(&raw).map_err(|e| store_err(&path, e))?
        } else {
            Vec::new()
        };
        info!(path = %path.display(), documents = docs.len(), "opened document store");
        Ok(Self { docs: RwLock::new(docs), snapshot: Some(path), persist_lock: tokio::sync::Mutex::new(()) })
    }

    pub fn len(&self) -> usize { self.docs.read().len() }

    pub fn is_empty(&self) -> bool { self.docs.read().is_empty() }

    async fn persist(&self) -> Result<()> {
        let Some(path) = &self.snapshot else { return Ok(()) };
        let _guard = self.persist_lock.lock().await;
        let json = serde_json::to_vec(&*self.docs.read()).map_err(|e| store_err(path, e))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| store_err(path, e))?;
        }
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await.map_err(|e| store_err(&tmp, e))?;
        tokio::fs::rename(&tmp, path).await.map_err(|e| store_err(path, e))?;
        debug!(path = %path.display(), "snapshot written");
        Ok(())
    }
}

fn store_err(path: &Path, e: impl std::fmt::Display) -> Error {
    Error::Store(format!("{}: {}", path.display(), e))
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_active(&self, filters: &Filters) -> Result<Vec<Document>> {
        let docs = self.docs.read();
        let mut found: Vec<Document> = docs.iter().rev().filter(|d| d.is_active && filters.matches(d)).cloned().collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Document>> {
        Ok(self.docs.read().iter().find(|d| d.id == id).cloned())
    }

    async fn increment_search_count(&self, ids: &[DocumentId]) -> Result<()> {
        if ids.is_empty() { return Ok(()); }
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        {
            let mut docs = self.docs.write();
            for d in docs.iter_mut().filter(|d| wanted.contains(d.id.as_str())) {
                d.search_count += 1;
            }
        }
        self.persist().await
    }

    async fn save(&self, doc: NewDocument) -> Result<Document> {
        let saved = doc.into_document(uuid::Uuid::new_v4().to_string(), Utc::now());
        self.docs.write().push(saved.clone());
        self.persist().await?;
        Ok(saved)
    }

    async fn deactivate(&self, id: &str) -> Result<bool> {
        let found = {
            let mut docs = self.docs.write();
            match docs.iter_mut().find(|d| d.id == id) {
                Some(d) => {
                    d.is_active = false;
                    d.updated_at = Utc::now();
                    true
                }
                None => false,
            }
        };
        if found { self.persist().await?; }
        Ok(found)
    }
}
