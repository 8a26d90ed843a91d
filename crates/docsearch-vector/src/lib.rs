//! docsearch-vector
//!
//! Vector scoring (`similarity`, `semantic`) and the bundled in-memory
//! `DocumentStore` with optional JSON snapshot (`store`).
pub mod semantic;
pub mod similarity;
pub mod store;

pub use semantic::semantic_pass;
pub use similarity::cosine_similarity;
pub use store::MemoryStore;
