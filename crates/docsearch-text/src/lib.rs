pub mod tantivy_utils;
pub mod index;
pub mod lexical;
pub mod query;

pub use index::TantivyMatcher;
pub use lexical::SubstringMatcher;
pub use query::QueryEnhancer;
