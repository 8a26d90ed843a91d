use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use std::path::PathBuf;
use std::sync::Arc;

use docsearch_core::config::{LexicalMode, SearchSettings};
use docsearch_core::traits::{DocumentStore, Embedder};
use docsearch_core::types::{
    Category, Document, DocumentId, DocumentMetadata, FileType, Filters, MatchType, NewDocument, ScoredCandidate,
};
use docsearch_core::Error;
use docsearch_hybrid::{fuse, DocumentService, HybridRanker, SearchRequest, UploadRequest, UploadedFile};
use docsearch_vector::MemoryStore;

/// Maps text to a fixed vector by the first keyword it contains.
struct KeywordEmbedder {
    table: Vec<(&'static str, Vec<f32>)>,
}

impl KeywordEmbedder {
    fn new() -> Self {
        Self { table: vec![("zebra", vec![1.0, 0.0, 0.0]), ("orbit", vec![0.0, 0.0, 1.0])] }
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    fn dim(&self) -> usize { 3 }

    async fn embed(&self, text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        self.table.iter().find(|(k, _)| lower.contains(k)).map(|(_, v)| v.clone()).unwrap_or_else(|| vec![0.0, 1.0, 0.0])
    }
}

struct BrokenStore;

#[async_trait]
impl DocumentStore for BrokenStore {
    async fn find_active(&self, _filters: &Filters) -> docsearch_core::Result<Vec<Document>> {
        Err(Error::Store("connection refused".into()))
    }
    async fn find_by_id(&self, _id: &str) -> docsearch_core::Result<Option<Document>> {
        Err(Error::Store("connection refused".into()))
    }
    async fn increment_search_count(&self, _ids: &[DocumentId]) -> docsearch_core::Result<()> {
        Err(Error::Store("connection refused".into()))
    }
    async fn save(&self, _doc: NewDocument) -> docsearch_core::Result<Document> {
        Err(Error::Store("connection refused".into()))
    }
    async fn deactivate(&self, _id: &str) -> docsearch_core::Result<bool> {
        Err(Error::Store("connection refused".into()))
    }
}

fn new_doc(id: &str, team: &str, content: &str, embedding: Vec<f32>) -> NewDocument {
    NewDocument {
        title: format!("{id}.txt"),
        content: content.to_string(),
        file_path: format!("/uploads/{id}.txt"),
        file_type: FileType::Txt,
        file_size: content.len() as u64,
        category: Category::Campaign,
        team: team.to_string(),
        project: "general".to_string(),
        tags: vec![],
        embedding,
        metadata: DocumentMetadata::default(),
    }
}

fn doc(id: &str, team: &str, minutes: i64, content: &str, embedding: Vec<f32>) -> Document {
    let base = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
    new_doc(id, team, content, embedding).into_document(id.to_string(), base + Duration::minutes(minutes))
}

fn service_over(docs: Vec<Document>) -> (DocumentService, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::with_documents(docs));
    let svc = DocumentService::new(store.clone(), Arc::new(KeywordEmbedder::new()), &SearchSettings::default());
    (svc, store)
}

fn ids(hits: &[ScoredCandidate]) -> Vec<&str> { hits.iter().map(|h| h.id()).collect() }

#[tokio::test]
async fn filter_only_search_returns_newest_first() {
    let mut retired = doc("retired", "marketing", 30, "old plan", vec![]);
    retired.is_active = false;
    let (svc, _) = service_over(vec![
        doc("m1", "marketing", 0, "first", vec![]),
        doc("s1", "sales", 5, "other team", vec![]),
        doc("m2", "marketing", 10, "second", vec![]),
        retired,
    ]);
    let resp = svc
        .search(SearchRequest { team: Some("marketing".into()), ..SearchRequest::default() })
        .await
        .unwrap();
    assert_eq!(resp.query, "");
    assert_eq!(resp.total, 2);
    let got: Vec<&str> = resp.results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(got, vec!["m2", "m1"]);
    assert!(resp.results.iter().all(|r| r.similarity == 1.0 && r.match_type == MatchType::Filter));
}

#[tokio::test]
async fn empty_query_without_filters_is_rejected() {
    let (svc, store) = service_over(vec![doc("a", "t", 0, "x", vec![])]);
    let err = svc.search(SearchRequest::default()).await.unwrap_err();
    assert!(err.is_invalid_request());
    let err = svc.search(SearchRequest::query("")).await.unwrap_err();
    assert!(err.is_invalid_request());

    let ranker = HybridRanker::new(store, Arc::new(KeywordEmbedder::new()));
    assert!(ranker.rank("  ", &Filters::default(), 10).await.unwrap_err().is_invalid_request());
}

#[tokio::test]
async fn semantic_hit_wins_over_lexical_duplicate() {
    let (svc, _) = service_over(vec![
        doc("A", "t", 0, "zebra crossing campaign", vec![0.9, 0.435_889_9, 0.0]),
        doc("B", "t", 1, "notes about a zebra", vec![0.0, 1.0, 0.0]),
        doc("C", "t", 2, "nothing relevant", vec![0.0, 1.0, 0.0]),
    ]);
    let resp = svc.search(SearchRequest::query("zebra")).await.unwrap();
    assert_eq!(resp.total, 2);
    assert_eq!(resp.results[0].id, "A");
    assert_eq!(resp.results[0].match_type, MatchType::Semantic);
    assert!((resp.results[0].similarity - 0.9).abs() < 1e-4);
    assert_eq!(resp.results[1].id, "B");
    assert_eq!(resp.results[1].match_type, MatchType::Text);
    assert_eq!(resp.results[1].similarity, 0.5);
}

#[tokio::test]
async fn limit_keeps_the_highest_scores() {
    let docs: Vec<Document> = (0..20)
        .map(|i| doc(&format!("d{i:02}"), "t", i, "filler", vec![1.0, i as f32 * 0.05, 0.0]))
        .collect();
    let (svc, _) = service_over(docs);
    let resp = svc.search(SearchRequest { limit: Some(5), ..SearchRequest::query("zebra") }).await.unwrap();
    let got: Vec<&str> = resp.results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(got, vec!["d00", "d01", "d02", "d03", "d04"]);
    assert!(resp.results.windows(2).all(|w| w[0].similarity >= w[1].similarity));
}

#[tokio::test]
async fn search_counts_are_bumped_after_responding() {
    let (svc, store) = service_over(vec![
        doc("hit", "t", 0, "zebra", vec![1.0, 0.0, 0.0]),
        doc("miss", "t", 1, "other", vec![0.0, 1.0, 0.0]),
    ]);
    let resp = svc.search(SearchRequest::query("zebra")).await.unwrap();
    assert_eq!(resp.results[0].search_count, 0);

    svc.flush_pending().await;
    assert_eq!(store.find_by_id("hit").await.unwrap().unwrap().search_count, 1);
    assert_eq!(store.find_by_id("miss").await.unwrap().unwrap().search_count, 0);

    svc.search(SearchRequest { team: Some("t".into()), ..SearchRequest::default() }).await.unwrap();
    svc.flush_pending().await;
    assert_eq!(store.find_by_id("hit").await.unwrap().unwrap().search_count, 1);
}

#[test]
fn flushed_search_counts_survive_runtime_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("documents.json");
    let id = {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let store = MemoryStore::open(&path).unwrap();
        rt.block_on(store.save(new_doc("z", "t", "zebra notes", vec![1.0, 0.0, 0.0]))).unwrap().id
    };

    for _ in 0..5 {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let store = Arc::new(MemoryStore::open(&path).unwrap());
        let svc = DocumentService::new(store, Arc::new(KeywordEmbedder::new()), &SearchSettings::default());
        rt.block_on(async {
            let resp = svc.search(SearchRequest::query("zebra")).await.unwrap();
            assert_eq!(resp.total, 1);
            svc.flush_pending().await;
        });
        drop(rt);
    }

    let rt = tokio::runtime::Runtime::new().unwrap();
    let reopened = MemoryStore::open(&path).unwrap();
    let stored = rt.block_on(reopened.find_by_id(&id)).unwrap().unwrap();
    assert_eq!(stored.search_count, 5);
}

#[tokio::test]
async fn inactive_documents_never_match() {
    let mut gone = doc("gone", "t", 0, "zebra", vec![1.0, 0.0, 0.0]);
    gone.is_active = false;
    let (svc, _) = service_over(vec![gone]);
    let resp = svc.search(SearchRequest::query("zebra")).await.unwrap();
    assert_eq!(resp.total, 0);
}

#[tokio::test]
async fn store_failure_degrades_to_empty_response() {
    let store: Arc<dyn DocumentStore> = Arc::new(BrokenStore);
    let svc = DocumentService::new(store, Arc::new(KeywordEmbedder::new()), &SearchSettings::default());
    let resp = svc.search(SearchRequest::query("brand zebra")).await.unwrap();
    assert_eq!(resp.total, 0);
    assert!(resp.results.is_empty());
    assert!(resp.query.starts_with("brand zebra brand branding"));
}

#[tokio::test]
async fn request_validation() {
    let (svc, _) = service_over(vec![]);
    for limit in [0, 101] {
        let req = SearchRequest { limit: Some(limit), ..SearchRequest::query("zebra") };
        assert!(svc.search(req).await.unwrap_err().is_invalid_request());
    }
    assert!(svc.search(SearchRequest::query("x".repeat(501))).await.unwrap_err().is_invalid_request());
    assert!(svc.search(SearchRequest::query(" \t ")).await.unwrap_err().is_invalid_request());
    assert!(svc.search(SearchRequest::query("x".repeat(500))).await.is_ok());
}

#[tokio::test]
async fn unknown_category_filter_matches_nothing() {
    let (svc, _) = service_over(vec![doc("z", "t", 0, "zebra", vec![1.0, 0.0, 0.0])]);
    let resp = svc
        .search(SearchRequest { category: Some("memes".into()), ..SearchRequest::query("zebra") })
        .await
        .unwrap();
    assert_eq!(resp.total, 0);
    assert!(resp.results.is_empty());
    assert_eq!(resp.query, "zebra");

    let filter_only = SearchRequest { category: Some("memes".into()), ..SearchRequest::default() };
    let resp = svc.search(filter_only).await.unwrap();
    assert_eq!(resp.total, 0);
    assert_eq!(resp.query, "");
}

#[tokio::test]
async fn response_echoes_enhanced_query() {
    let (svc, _) = service_over(vec![]);
    let resp = svc.search(SearchRequest::query("brand")).await.unwrap();
    assert_eq!(resp.query, "brand brand branding identity logo");
}

#[tokio::test]
async fn semantic_only_mode_uses_lower_threshold() {
    // cosine 0.4 against the "zebra" vector
    let weak = doc("weak", "t", 0, "unrelated words", vec![0.4, 0.916_515_1, 0.0]);
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::with_documents(vec![weak]));
    let embedder: Arc<dyn Embedder> = Arc::new(KeywordEmbedder::new());

    let hybrid = HybridRanker::new(store.clone(), embedder.clone());
    assert!(hybrid.rank("zebra", &Filters::default(), 10).await.unwrap().is_empty());

    let settings = SearchSettings { lexical: LexicalMode::Off, ..SearchSettings::default() };
    let semantic_only = HybridRanker::from_settings(store, embedder, &settings);
    let hits = semantic_only.rank("zebra", &Filters::default(), 10).await.unwrap();
    assert_eq!(ids(&hits), vec!["weak"]);
}

#[tokio::test]
async fn tantivy_mode_finds_word_matches() {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::with_documents(vec![
        doc("a", "t", 0, "Launch checklist for the spring release", vec![]),
        doc("b", "t", 1, "Budget overview", vec![]),
    ]));
    let settings = SearchSettings { lexical: LexicalMode::Tantivy, ..SearchSettings::default() };
    let ranker = HybridRanker::from_settings(store, Arc::new(KeywordEmbedder::new()), &settings);
    let hits = ranker.rank("spring", &Filters::default(), 10).await.unwrap();
    assert_eq!(ids(&hits), vec!["a"]);
    assert_eq!(hits[0].match_type, MatchType::Text);
}

#[test]
fn fuse_dedups_sorts_and_truncates() {
    let a = doc("a", "t", 0, "", vec![]);
    let b = doc("b", "t", 0, "", vec![]);
    let c = doc("c", "t", 0, "", vec![]);
    let semantic = vec![
        ScoredCandidate::new(a.clone(), 0.7, MatchType::Semantic),
        ScoredCandidate::new(b.clone(), 0.5, MatchType::Semantic),
    ];
    let lexical = vec![
        ScoredCandidate::new(c.clone(), 0.5, MatchType::Text),
        ScoredCandidate::new(a.clone(), 0.5, MatchType::Text),
    ];
    let fused = fuse(semantic.clone(), lexical.clone(), 10);
    assert_eq!(ids(&fused), vec!["a", "b", "c"]);
    assert_eq!(fused[0].match_type, MatchType::Semantic);
    // equal scores keep insertion order: semantic b before lexical c
    assert_eq!(fused[1].match_type, MatchType::Semantic);

    assert_eq!(ids(&fuse(semantic, lexical, 2)), vec!["a", "b"]);
    assert!(fuse(vec![], vec![], 5).is_empty());
}

fn upload_file(dir: &std::path::Path, name: &str, body: &str) -> UploadedFile {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    UploadedFile { original_name: name.to_string(), path, size: body.len() as u64 }
}

#[tokio::test]
async fn upload_categorizes_tags_and_embeds() {
    let dir = tempfile::tempdir().unwrap();
    let (svc, store) = service_over(vec![]);
    let file = upload_file(dir.path(), "campaign-launch.txt", "Launch plan with ROI\n\ntargets for zebra season.");
    let mut req = UploadRequest::new(file);
    req.team = Some("growth".into());
    let summary = svc.upload(req).await.unwrap();

    assert_eq!(summary.category, Category::Campaign);
    assert_eq!(summary.team, "growth");
    assert_eq!(summary.project, "general");
    assert_eq!(summary.file_type, FileType::Txt);
    assert_eq!(summary.tags, vec!["campaign", "launch", "roi"]);

    let stored = store.find_by_id(&summary.id).await.unwrap().unwrap();
    assert_eq!(stored.content, "Launch plan with ROI targets for zebra season.");
    assert_eq!(stored.embedding, vec![1.0, 0.0, 0.0]);
    assert!(stored.metadata.created_date.is_some());
}

#[tokio::test]
async fn upload_derives_team_from_path_for_placeholder_formats() {
    let (svc, _) = service_over(vec![]);
    let file = UploadedFile {
        original_name: "brand-guide.pdf".into(),
        path: PathBuf::from("uploads/creative/1700000000-brand-guide.pdf"),
        size: 2048,
    };
    let mut req = UploadRequest::new(file);
    req.category = Some("brand".into());
    let summary = svc.upload(req).await.unwrap();
    assert_eq!(summary.team, "creative");
    assert_eq!(summary.category, Category::Brand);
    assert_eq!(summary.file_type, FileType::Pdf);
}

#[tokio::test]
async fn upload_validation() {
    let dir = tempfile::tempdir().unwrap();
    let (svc, _) = service_over(vec![]);
    let ok = || upload_file(dir.path(), "notes.txt", "some words");

    let mut r = UploadRequest::new(ok());
    r.category = Some("memes".into());
    assert!(svc.upload(r).await.unwrap_err().is_invalid_request());

    let mut r = UploadRequest::new(ok());
    r.team = Some("x".into());
    assert!(svc.upload(r).await.unwrap_err().is_invalid_request());

    let mut r = UploadRequest::new(ok());
    r.project = Some("p".repeat(101));
    assert!(svc.upload(r).await.unwrap_err().is_invalid_request());

    let exe = upload_file(dir.path(), "tool.exe", "binary");
    assert!(svc.upload(UploadRequest::new(exe)).await.unwrap_err().is_invalid_request());

    let blank = upload_file(dir.path(), "blank.txt", "  \n\t ");
    assert!(svc.upload(UploadRequest::new(blank)).await.unwrap_err().is_invalid_request());
}

#[tokio::test]
async fn categories_are_counted_and_sorted() {
    let mut d3 = doc("c", "analytics", 2, "z", vec![]);
    d3.category = Category::Analytics;
    let mut hidden = doc("h", "analytics", 3, "z", vec![]);
    hidden.is_active = false;
    let (svc, _) = service_over(vec![doc("a", "email", 0, "z", vec![]), doc("b", "email", 1, "z", vec![]), d3, hidden]);
    let cats = svc.get_categories().await.unwrap();
    assert_eq!(cats.categories[0].name, "campaign");
    assert_eq!(cats.categories[0].count, 2);
    assert_eq!(cats.categories[1].name, "analytics");
    assert_eq!(cats.teams.iter().map(|t| (t.name.as_str(), t.count)).collect::<Vec<_>>(), vec![("email", 2), ("analytics", 1)]);
    assert_eq!(cats.projects[0].count, 3);
}

#[tokio::test]
async fn categories_fall_back_to_static_list() {
    let (svc, _) = service_over(vec![]);
    let cats = svc.get_categories().await.unwrap();
    assert_eq!(cats.categories.len(), 8);
    assert!(cats.categories.iter().all(|c| c.count == 0));
    assert_eq!(cats.categories[2].name, "social-media");
    assert_eq!(cats.teams[0].name, "general");
    assert_eq!(cats.projects[0].name, "general");
}

#[tokio::test]
async fn get_and_delete_documents() {
    let (svc, _) = service_over(vec![doc("keep", "t", 0, "body text", vec![])]);
    let detail = svc.get_document("keep").await.unwrap();
    assert_eq!(detail.content, "body text");
    assert_eq!(detail.file_url, "/api/documents/file/keep");

    svc.delete_document("keep").await.unwrap();
    assert!(matches!(svc.get_document("keep").await, Err(Error::NotFound(_))));
    assert!(matches!(svc.delete_document("nope").await, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn file_reports_path_and_content_type() {
    let dir = tempfile::tempdir().unwrap();
    let (svc, _) = service_over(vec![]);
    let summary = svc.upload(UploadRequest::new(upload_file(dir.path(), "brief.txt", "zebra brief"))).await.unwrap();

    let file = svc.file(&summary.id).await.unwrap();
    assert_eq!(file.path, dir.path().join("brief.txt"));
    assert_eq!(file.file_name, "brief.txt");
    assert_eq!(file.content_type, "text/plain");
    assert_eq!(file.size, 11);

    assert!(matches!(svc.file("missing").await, Err(Error::NotFound(_))));
    svc.delete_document(&summary.id).await.unwrap();
    assert!(matches!(svc.file(&summary.id).await, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn file_missing_on_disk_is_not_found() {
    let (svc, _) = service_over(vec![doc("ghost", "t", 0, "zebra", vec![])]);
    assert!(matches!(svc.file("ghost").await, Err(Error::NotFound(_))));
}
