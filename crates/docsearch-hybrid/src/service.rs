//! Document operations: upload, search, categories, get, delete.
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use docsearch_core::categorize::Categorizer;
use docsearch_core::config::SearchSettings;
use docsearch_core::data_processor::{extract_tags, extract_team_from_path, PlainTextExtractor};
use docsearch_core::traits::{DocumentStore, Embedder, TextExtractor};
use docsearch_core::types::{
    CategoriesResponse, Category, DocumentDetail, DocumentFile, DocumentId, DocumentMetadata, DocumentSummary, FileType,
    Filters, NameCount, NewDocument, SearchResponse, SearchResult, DEFAULT_PROJECT,
};
use docsearch_core::{Error, Result};

use crate::HybridRanker;

/// A file already received by the transport layer.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-side file name; its extension decides the file type.
    pub original_name: String,
    /// Where the bytes were stored.
    pub path: PathBuf,
    pub size: u64,
}

#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file: UploadedFile,
    pub team: Option<String>,
    pub project: Option<String>,
    pub category: Option<String>,
}

impl UploadRequest {
    pub fn new(file: UploadedFile) -> Self { Self { file, team: None, project: None, category: None } }
}

#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub query: Option<String>,
    pub category: Option<String>,
    pub team: Option<String>,
    pub project: Option<String>,
    pub limit: Option<usize>,
}

impl SearchRequest {
    pub fn query(q: impl Into<String>) -> Self { Self { query: Some(q.into()), ..Self::default() } }
}

pub struct DocumentService {
    store: Arc<dyn DocumentStore>,
    embedder: Arc<dyn Embedder>,
    ranker: HybridRanker,
    categorizer: Categorizer,
    extractor: Arc<dyn TextExtractor>,
    settings: SearchSettings,
    // search-count updates still in flight
    pending: Mutex<JoinSet<()>>,
}

// Blank strings count as "not provided".
fn provided(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.is_empty())
}

fn parse_category(name: &str) -> Result<Category> {
    name.parse::<Category>()
        .map_err(|_| Error::invalid(format!("invalid category '{}'; valid categories: {}", name, Category::names().join(", "))))
}

fn check_len(what: &str, value: &str, min: usize, max: usize) -> Result<()> {
    let n = value.chars().count();
    if n < min || n > max {
        return Err(Error::invalid(format!("{} must be between {} and {} characters", what, min, max)));
    }
    Ok(())
}

fn tally<'a>(values: impl Iterator<Item = &'a str>) -> Vec<NameCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for v in values { *counts.entry(v).or_default() += 1; }
    let mut out: Vec<NameCount> = counts.into_iter().map(|(name, count)| NameCount { name: name.to_string(), count }).collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    out
}

impl DocumentService {
    pub fn new(store: Arc<dyn DocumentStore>, embedder: Arc<dyn Embedder>, settings: &SearchSettings) -> Self {
        let ranker = HybridRanker::from_settings(store.clone(), embedder.clone(), settings);
        Self {
            store,
            embedder,
            ranker,
            categorizer: Categorizer::default(),
            extractor: Arc::new(PlainTextExtractor),
            settings: settings.clone(),
            pending: Mutex::new(JoinSet::new()),
        }
    }

    pub fn with_ranker(mut self, ranker: HybridRanker) -> Self { self.ranker = ranker; self }

    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self { self.extractor = extractor; self }

    pub fn with_categorizer(mut self, categorizer: Categorizer) -> Self { self.categorizer = categorizer; self }

    pub fn store(&self) -> &Arc<dyn DocumentStore> { &self.store }

    pub async fn upload(&self, req: UploadRequest) -> Result<DocumentSummary> {
        let category = provided(&req.category).map(parse_category).transpose()?;
        let team = provided(&req.team);
        if let Some(t) = team { check_len("team name", t, 2, 50)?; }
        let project = provided(&req.project);
        if let Some(p) = project { check_len("project name", p, 2, 100)?; }

        let file = req.file;
        let file_type = FileType::from_path(Path::new(&file.original_name))
            .ok_or_else(|| Error::invalid(format!("unsupported file type: {}", file.original_name)))?;

        let extractor = self.extractor.clone();
        let path = file.path.clone();
        let content = tokio::task::spawn_blocking(move || extractor.extract(&path, file_type))
            .await
            .map_err(|e| Error::Operation(format!("extraction task failed: {}", e)))??;
        if content.trim().is_empty() {
            return Err(Error::invalid(format!("no text content could be extracted from {}", file.original_name)));
        }

        let category = category.unwrap_or_else(|| self.categorizer.categorize(&content, &file.original_name));
        let team = team.map(str::to_string).unwrap_or_else(|| extract_team_from_path(&file.path));
        let tags = extract_tags(&content, &file.original_name);
        let embedding = self.embedder.embed(&content).await;
        let now = Utc::now();

        let doc = self
            .store
            .save(NewDocument {
                title: file.original_name,
                content,
                file_path: file.path.to_string_lossy().to_string(),
                file_type,
                file_size: file.size,
                category,
                team,
                project: project.unwrap_or(DEFAULT_PROJECT).to_string(),
                tags,
                embedding,
                metadata: DocumentMetadata { created_date: Some(now), last_modified: Some(now), ..DocumentMetadata::default() },
            })
            .await?;
        info!(id = %doc.id, category = %doc.category, team = %doc.team, "document indexed");
        Ok(DocumentSummary::from(&doc))
    }

    pub async fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
        let limit = req.limit.unwrap_or(self.settings.default_limit);
        if limit < 1 || limit > self.settings.max_limit {
            return Err(Error::invalid(format!("limit must be between 1 and {}", self.settings.max_limit)));
        }
        let query = provided(&req.query).unwrap_or("");
        if !query.is_empty() && query.trim().is_empty() {
            return Err(Error::invalid("search query cannot be empty"));
        }
        if query.chars().count() > self.settings.max_query_chars {
            return Err(Error::invalid(format!("search query too long (max {} characters)", self.settings.max_query_chars)));
        }
        let echo = || if query.is_empty() { String::new() } else { self.ranker.enhance(query) };
        let category = match provided(&req.category) {
            Some(name) => match name.parse::<Category>() {
                Ok(c) => Some(c),
                Err(_) => {
                    debug!(category = name, "unknown category filter matches nothing");
                    return Ok(SearchResponse::empty(echo()));
                }
            },
            None => None,
        };
        let filters = Filters {
            category,
            team: provided(&req.team).map(str::to_string),
            project: provided(&req.project).map(str::to_string),
        };

        let ranking = match self.ranker.rank_with_query(query, &filters, limit).await {
            Ok(r) => r,
            Err(e) if e.is_invalid_request() => return Err(e),
            Err(e) => {
                warn!(error = %e, "search failed; returning no results");
                return Ok(SearchResponse::empty(echo()));
            }
        };

        if !query.is_empty() && !ranking.hits.is_empty() {
            let ids: Vec<DocumentId> = ranking.hits.iter().map(|h| h.id().to_string()).collect();
            let store = self.store.clone();
            let mut pending = self.pending.lock();
            while pending.try_join_next().is_some() {}
            pending.spawn(async move {
                if let Err(e) = store.increment_search_count(&ids).await {
                    warn!(error = %e, "search count update failed");
                }
            });
        }

        let results: Vec<SearchResult> = ranking.hits.iter().map(SearchResult::from).collect();
        Ok(SearchResponse { query: ranking.query, total: results.len(), results })
    }

    /// Wait for the search-count updates started by [`DocumentService::search`].
    /// Call before shutting the runtime down; dropped tasks lose their update.
    pub async fn flush_pending(&self) {
        let mut pending = {
            let mut guard = self.pending.lock();
            std::mem::take(&mut *guard)
        };
        while let Some(joined) = pending.join_next().await {
            if let Err(e) = joined { warn!(error = %e, "search count task did not finish"); }
        }
    }

    /// Active-document counts per category, team and project; a static
    /// placeholder list when nothing is stored yet.
    pub async fn get_categories(&self) -> Result<CategoriesResponse> {
        let docs = self.store.find_active(&Filters::default()).await?;
        if docs.is_empty() {
            let zero = |name: &str| NameCount { name: name.to_string(), count: 0 };
            return Ok(CategoriesResponse {
                categories: Category::names().iter().map(|n| zero(n)).collect(),
                teams: vec![zero("general")],
                projects: vec![zero(DEFAULT_PROJECT)],
            });
        }
        Ok(CategoriesResponse {
            categories: tally(docs.iter().map(|d| d.category.as_ref())),
            teams: tally(docs.iter().map(|d| d.team.as_str())),
            projects: tally(docs.iter().map(|d| d.project.as_str())),
        })
    }

    pub async fn get_document(&self, id: &str) -> Result<DocumentDetail> {
        match self.store.find_by_id(id).await? {
            Some(doc) if doc.is_active => Ok(DocumentDetail::from(&doc)),
            _ => Err(Error::NotFound(format!("document {}", id))),
        }
    }

    /// Location and content type of the stored file behind a document.
    pub async fn file(&self, id: &str) -> Result<DocumentFile> {
        let doc = match self.store.find_by_id(id).await? {
            Some(doc) if doc.is_active => doc,
            _ => return Err(Error::NotFound(format!("document {}", id))),
        };
        let path = PathBuf::from(&doc.file_path);
        let meta = tokio::fs::metadata(&path)
            .await
            .map_err(|e| Error::NotFound(format!("file for document {}: {}", id, e)))?;
        Ok(DocumentFile {
            file_name: doc.title,
            content_type: doc.file_type.content_type(),
            size: meta.len(),
            path,
        })
    }

    /// Soft delete.
    pub async fn delete_document(&self, id: &str) -> Result<()> {
        if self.store.deactivate(id).await? {
            info!(id, "document deactivated");
            Ok(())
        } else {
            Err(Error::NotFound(format!("document {}", id)))
        }
    }
}
