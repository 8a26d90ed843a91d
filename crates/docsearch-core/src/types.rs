//! Domain types shared by the embedder, ranker, store and service layers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

pub type DocumentId = String;

/// Dimension D of every stored and query embedding.
pub const EMBEDDING_DIM: usize = 384;

/// Maximum number of tags kept per document.
pub const MAX_TAGS: usize = 10;

/// Characters of content shown in a search result preview.
pub const PREVIEW_CHARS: usize = 200;

pub const DEFAULT_PROJECT: &str = "general";

/// Closed set of document categories, in scoring/tie-break order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
    Display, EnumString, EnumIter, AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Category {
    Campaign,
    Brand,
    SocialMedia,
    Email,
    #[default]
    Content,
    Analytics,
    Strategy,
    Creative,
}

impl Category {
    pub fn all() -> Vec<Category> { Category::iter().collect() }

    pub fn names() -> Vec<String> { Category::iter().map(|c| c.to_string()).collect() }
}

/// File types accepted at upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum FileType {
    Pdf,
    Docx,
    Txt,
    Xlsx,
    Pptx,
    Jpg,
    Jpeg,
    Png,
    Gif,
}

impl FileType {
    /// Detect the file type from the path extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension().and_then(|e| e.to_str()).and_then(|e| e.parse().ok())
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            FileType::Pdf => "application/pdf",
            FileType::Docx => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            FileType::Txt => "text/plain",
            FileType::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            FileType::Pptx => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
            FileType::Jpg | FileType::Jpeg => "image/jpeg",
            FileType::Png => "image/png",
            FileType::Gif => "image/gif",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub author: Option<String>,
    pub created_date: Option<DateTime<Utc>>,
    pub last_modified: Option<DateTime<Utc>>,
    pub version: String,
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        Self { author: None, created_date: None, last_modified: None, version: "1.0".to_string() }
    }
}

/// A stored document.
///
/// - `id`: opaque identity assigned by the store
/// - `content`: extracted text, never empty
/// - `embedding`: either empty (not yet embedded) or exactly `EMBEDDING_DIM` long
/// - `search_count`: bumped once per search call that returns the document
/// - `is_active`: soft-delete flag; inactive documents are invisible to search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    pub content: String,
    pub file_path: String,
    pub file_type: FileType,
    pub file_size: u64,
    pub category: Category,
    pub team: String,
    pub project: String,
    pub tags: Vec<String>,
    #[serde(default)]
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub metadata: DocumentMetadata,
    #[serde(default)]
    pub search_count: u64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn has_embedding(&self) -> bool { !self.embedding.is_empty() }

    /// First `PREVIEW_CHARS` characters of the content followed by an ellipsis.
    pub fn preview(&self) -> String {
        let mut preview: String = self.content.chars().take(PREVIEW_CHARS).collect();
        preview.push_str("...");
        preview
    }

    pub fn file_url(&self) -> String { format!("/api/documents/file/{}", self.id) }
}

/// A validated document that has not been persisted yet. The store assigns
/// `id`, timestamps, `search_count = 0` and `is_active = true` on save.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDocument {
    pub title: String,
    pub content: String,
    pub file_path: String,
    pub file_type: FileType,
    pub file_size: u64,
    pub category: Category,
    pub team: String,
    pub project: String,
    pub tags: Vec<String>,
    pub embedding: Vec<f32>,
    pub metadata: DocumentMetadata,
}

impl NewDocument {
    pub fn into_document(self, id: DocumentId, now: DateTime<Utc>) -> Document {
        Document {
            id,
            title: self.title,
            content: self.content,
            file_path: self.file_path,
            file_type: self.file_type,
            file_size: self.file_size,
            category: self.category,
            team: self.team,
            project: self.project,
            tags: self.tags,
            embedding: self.embedding,
            metadata: self.metadata,
            search_count: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Structured-field equality filters. `None` is a wildcard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filters {
    pub category: Option<Category>,
    pub team: Option<String>,
    pub project: Option<String>,
}

impl Filters {
    pub fn is_empty(&self) -> bool { self.category.is_none() && self.team.is_none() && self.project.is_none() }

    pub fn matches(&self, doc: &Document) -> bool {
        self.category.map_or(true, |c| doc.category == c)
            && self.team.as_deref().map_or(true, |t| doc.team == t)
            && self.project.as_deref().map_or(true, |p| doc.project == p)
    }
}

/// Which pass of the ranker produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MatchType {
    Semantic,
    Text,
    Filter,
}

/// Per-query ranking record; never persisted.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub document: Document,
    pub similarity: f32,
    pub match_type: MatchType,
}

impl ScoredCandidate {
    pub fn new(document: Document, similarity: f32, match_type: MatchType) -> Self {
        Self { document, similarity, match_type }
    }

    pub fn id(&self) -> &str { &self.document.id }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: DocumentId,
    pub title: String,
    pub category: Category,
    pub team: String,
    pub project: String,
    pub tags: Vec<String>,
    pub file_type: FileType,
    pub file_size: u64,
    pub created_at: DateTime<Utc>,
    pub similarity: f32,
    pub match_type: MatchType,
    pub preview: String,
    pub search_count: u64,
}

impl From<&ScoredCandidate> for SearchResult {
    fn from(c: &ScoredCandidate) -> Self {
        let d = &c.document;
        Self {
            id: d.id.clone(),
            title: d.title.clone(),
            category: d.category,
            team: d.team.clone(),
            project: d.project.clone(),
            tags: d.tags.clone(),
            file_type: d.file_type,
            file_size: d.file_size,
            created_at: d.created_at,
            similarity: c.similarity,
            match_type: c.match_type,
            preview: d.preview(),
            search_count: d.search_count,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchResult>,
    pub total: usize,
}

impl SearchResponse {
    pub fn empty(query: impl Into<String>) -> Self { Self { query: query.into(), results: Vec::new(), total: 0 } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: DocumentId,
    pub title: String,
    pub category: Category,
    pub team: String,
    pub project: String,
    pub tags: Vec<String>,
    pub file_type: FileType,
    pub file_size: u64,
    pub created_at: DateTime<Utc>,
}

impl From<&Document> for DocumentSummary {
    fn from(d: &Document) -> Self {
        Self {
            id: d.id.clone(),
            title: d.title.clone(),
            category: d.category,
            team: d.team.clone(),
            project: d.project.clone(),
            tags: d.tags.clone(),
            file_type: d.file_type,
            file_size: d.file_size,
            created_at: d.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDetail {
    pub id: DocumentId,
    pub title: String,
    pub content: String,
    pub category: Category,
    pub team: String,
    pub project: String,
    pub tags: Vec<String>,
    pub file_type: FileType,
    pub file_size: u64,
    pub metadata: DocumentMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub search_count: u64,
    pub file_url: String,
}

impl From<&Document> for DocumentDetail {
    fn from(d: &Document) -> Self {
        Self {
            id: d.id.clone(),
            title: d.title.clone(),
            content: d.content.clone(),
            category: d.category,
            team: d.team.clone(),
            project: d.project.clone(),
            tags: d.tags.clone(),
            file_type: d.file_type,
            file_size: d.file_size,
            metadata: d.metadata.clone(),
            created_at: d.created_at,
            updated_at: d.updated_at,
            search_count: d.search_count,
            file_url: d.file_url(),
        }
    }
}

/// The stored file behind a document, ready to be streamed back.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentFile {
    pub path: PathBuf,
    pub file_name: String,
    pub content_type: &'static str,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoriesResponse {
    pub categories: Vec<NameCount>,
    pub teams: Vec<NameCount>,
    pub projects: Vec<NameCount>,
}
