use chrono::{Duration, TimeZone, Utc};
use docsearch_core::traits::DocumentStore;
use docsearch_core::types::{Category, Document, DocumentMetadata, FileType, Filters, MatchType, NewDocument};
use docsearch_vector::{cosine_similarity, semantic_pass, MemoryStore};

fn new_doc(title: &str, team: &str, embedding: Vec<f32>) -> NewDocument {
    NewDocument {
        title: title.to_string(),
        content: format!("{title} body"),
        file_path: format!("/uploads/{title}.txt"),
        file_type: FileType::Txt,
        file_size: 10,
        category: Category::Campaign,
        team: team.to_string(),
        project: "general".to_string(),
        tags: vec![],
        embedding,
        metadata: DocumentMetadata::default(),
    }
}

fn doc_at(id: &str, team: &str, minutes: i64, embedding: Vec<f32>) -> Document {
    let base = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    new_doc(id, team, embedding).into_document(id.to_string(), base + Duration::minutes(minutes))
}

#[test]
fn similarity_is_symmetric() {
    let a = [1.0f32, 2.0, 3.0];
    let b = [-2.0f32, 0.5, 1.0];
    assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    let s = cosine_similarity(&a, &b);
    assert!((-1.0..=1.0).contains(&s));
}

#[test]
fn semantic_pass_thresholds_and_orders() {
    let q = vec![1.0, 0.0];
    let docs = vec![
        doc_at("low", "t", 0, vec![0.0, 1.0]),
        doc_at("mid", "t", 1, vec![1.0, 1.0]),
        doc_at("none", "t", 2, vec![]),
        doc_at("top", "t", 3, vec![2.0, 0.0]),
        doc_at("mid2", "t", 4, vec![1.0, 1.0]),
    ];
    let hits = semantic_pass(&q, &docs, 0.5);
    let ids: Vec<&str> = hits.iter().map(|h| h.id()).collect();
    assert_eq!(ids, vec!["top", "mid", "mid2"]);
    assert!(hits.iter().all(|h| h.match_type == MatchType::Semantic));
    assert!((hits[0].similarity - 1.0).abs() < 1e-6);
}

#[tokio::test]
async fn find_active_filters_newest_first() {
    let mut hidden = doc_at("gone", "marketing", 50, vec![]);
    hidden.is_active = false;
    let store = MemoryStore::with_documents(vec![
        doc_at("old", "marketing", 0, vec![]),
        doc_at("other", "sales", 10, vec![]),
        doc_at("new", "marketing", 20, vec![]),
        hidden,
    ]);
    let filters = Filters { team: Some("marketing".into()), ..Filters::default() };
    let ids: Vec<String> = store.find_active(&filters).await.unwrap().into_iter().map(|d| d.id).collect();
    assert_eq!(ids, vec!["new", "old"]);
    assert_eq!(store.find_active(&Filters::default()).await.unwrap().len(), 3);
}

#[tokio::test]
async fn save_assigns_identity() {
    let store = MemoryStore::new();
    let a = store.save(new_doc("a", "content", vec![])).await.unwrap();
    let b = store.save(new_doc("b", "content", vec![])).await.unwrap();
    assert_ne!(a.id, b.id);
    assert!(a.is_active);
    assert_eq!(a.search_count, 0);
    assert_eq!(store.find_by_id(&b.id).await.unwrap().unwrap().title, "b");
    assert!(store.find_by_id("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn increments_and_soft_deletes() {
    let store = MemoryStore::with_documents(vec![doc_at("x", "t", 0, vec![]), doc_at("y", "t", 1, vec![])]);
    store.increment_search_count(&["x".into(), "y".into(), "nope".into()]).await.unwrap();
    store.increment_search_count(&["x".into()]).await.unwrap();
    assert_eq!(store.find_by_id("x").await.unwrap().unwrap().search_count, 2);
    assert_eq!(store.find_by_id("y").await.unwrap().unwrap().search_count, 1);

    assert!(store.deactivate("x").await.unwrap());
    assert!(!store.deactivate("nope").await.unwrap());
    let active = store.find_active(&Filters::default()).await.unwrap();
    assert_eq!(active.len(), 1);
    assert!(!store.find_by_id("x").await.unwrap().unwrap().is_active);
}

#[tokio::test]
async fn snapshot_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("documents.json");
    let id = {
        let store = MemoryStore::open(&path).unwrap();
        assert!(store.is_empty());
        let saved = store.save(new_doc("brief", "creative", vec![0.5; 4])).await.unwrap();
        store.increment_search_count(&[saved.id.clone()]).await.unwrap();
        saved.id
    };
    let reopened = MemoryStore::open(&path).unwrap();
    assert_eq!(reopened.len(), 1);
    let doc = reopened.find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(doc.search_count, 1);
    assert_eq!(doc.embedding, vec![0.5; 4]);
}

#[test]
fn corrupt_snapshot_is_a_store_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("documents.json");
    std::fs::write(&path, "not json").unwrap();
    assert!(matches!(MemoryStore::open(&path), Err(docsearch_core::Error::Store(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_increments_are_not_lost() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("documents.json");
    let store = std::sync::Arc::new(MemoryStore::open(&path).unwrap());
    let id = store.save(new_doc("hot", "t", vec![])).await.unwrap().id;

    let tasks: Vec<_> = (0..64)
        .map(|_| {
            let store = store.clone();
            let ids = vec![id.clone()];
            tokio::spawn(async move { store.increment_search_count(&ids).await })
        })
        .collect();
    for t in tasks {
        t.await.unwrap().unwrap();
    }

    assert_eq!(store.find_by_id(&id).await.unwrap().unwrap().search_count, 64);
    let reopened = MemoryStore::open(&path).unwrap();
    assert_eq!(reopened.find_by_id(&id).await.unwrap().unwrap().search_count, 64);
}

#[tokio::test]
async fn snapshot_is_compact_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("documents.json");
    let store = MemoryStore::open(&path).unwrap();
    store.save(new_doc("a", "t", vec![0.25; 384])).await.unwrap();
    store.save(new_doc("b", "t", vec![0.5; 384])).await.unwrap();
    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(!raw.contains('\n'));
    assert!(!raw.contains("  "));
    assert_eq!(MemoryStore::open(&path).unwrap().len(), 2);
}
