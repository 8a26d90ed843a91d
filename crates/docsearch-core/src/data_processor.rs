//! Ingest-time helpers: text cleanup, tag and team extraction, plain-text
//! extraction and directory walking.
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::traits::TextExtractor;
use crate::types::{FileType, MAX_TAGS};

const MARKETING_TERMS: &[&str] = &[
    "roi", "ctr", "conversion", "engagement", "reach", "impressions",
    "leads", "funnel", "acquisition", "retention", "churn", "ltv",
    "seo", "sem", "ppc", "cpc", "cpm", "organic", "paid",
    "a/b test", "landing page", "call to action", "cta",
];

const TEAM_KEYWORDS: &[(&str, &[&str])] = &[
    ("creative", &["creative", "design", "graphics"]),
    ("content", &["content", "editorial", "blog"]),
    ("social", &["social", "community"]),
    ("email", &["email", "newsletter"]),
    ("analytics", &["analytics", "data", "reporting"]),
    ("strategy", &["strategy", "planning"]),
];

pub const DEFAULT_TEAM: &str = "general";

/// Normalize line endings and collapse all whitespace runs to one space.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Tags from the filename stem (parts longer than two characters) followed by
/// marketing terms found in the content. Lowercased, deduplicated, at most
/// `MAX_TAGS`.
pub fn extract_tags(content: &str, filename: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut tags = Vec::new();
    let stem = Path::new(filename).file_stem().and_then(|s| s.to_str()).unwrap_or(filename);
    let parts = stem
        .split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|p| p.chars().count() > 2)
        .map(str::to_lowercase);
    let lower = content.to_lowercase();
    let terms = MARKETING_TERMS.iter().filter(|t| lower.contains(*t)).map(|t| t.to_string());
    for tag in parts.chain(terms) {
        if seen.insert(tag.clone()) { tags.push(tag); }
    }
    tags.truncate(MAX_TAGS);
    tags
}

/// First path component that mentions a team keyword decides the team.
pub fn extract_team_from_path(path: &Path) -> String {
    for component in path.components() {
        let part = component.as_os_str().to_string_lossy().to_lowercase();
        for (team, keywords) in TEAM_KEYWORDS {
            if keywords.iter().any(|k| part.contains(k)) { return team.to_string(); }
        }
    }
    DEFAULT_TEAM.to_string()
}

/// Placeholder text for formats whose content cannot be extracted here, so
/// the document is still findable by its filename words.
pub fn filename_placeholder(filename: &str, file_type: FileType) -> String {
    let words: Vec<&str> = filename.split(|c: char| c == '.' || c == '_' || c == '-' || c == ' ').filter(|w| w.chars().count() > 2).collect();
    format!(
        "File: {} ({}). Keywords from filename: {}. Content extraction not available for this file format or the file may be protected/corrupted.",
        filename,
        file_type.as_ref().to_uppercase(),
        words.join(" ")
    )
}

/// Reads `.txt` files (lossy UTF-8 fallback); every other supported type gets
/// the filename placeholder.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn new() -> Self { Self }

    fn read_file_content(&self, file_path: &Path) -> Result<String> {
        match fs::read_to_string(file_path) {
            Ok(content) => Ok(content),
            Err(_) => Ok(String::from_utf8_lossy(&fs::read(file_path)?).to_string()),
        }
    }
}

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, path: &Path, file_type: FileType) -> Result<String> {
        match file_type {
            FileType::Txt => Ok(clean_text(&self.read_file_content(path)?)),
            other => {
                let name = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
                Ok(filename_placeholder(&name, other))
            }
        }
    }
}

/// Recursively list files with a supported extension, sorted by path.
pub fn list_ingest_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().to_path_buf())
        .filter(|p| FileType::from_path(p).is_some())
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  a\r\n\r\nb \t c  "), "a b c");
    }

    #[test]
    fn placeholder_names_the_type() {
        let p = filename_placeholder("q3-brand_deck.pdf", FileType::Pdf);
        assert!(p.starts_with("File: q3-brand_deck.pdf (PDF). Keywords from filename: brand deck."));
    }
}
