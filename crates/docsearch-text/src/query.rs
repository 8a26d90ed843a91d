//! Query expansion with a fixed marketing synonym table.

const SYNONYMS: &[(&str, &str)] = &[
    ("marketing", "marketing campaign advertising promotion"),
    ("brand", "brand branding identity logo"),
    ("social", "social media facebook twitter instagram"),
    ("email", "email newsletter mailchimp campaign"),
    ("content", "content blog article copy writing"),
    ("analytics", "analytics metrics data performance"),
    ("strategy", "strategy plan roadmap objectives"),
    ("creative", "creative design visual artwork"),
];

#[derive(Debug, Clone)]
pub struct QueryEnhancer {
    synonyms: Vec<(&'static str, &'static str)>,
}

impl Default for QueryEnhancer {
    fn default() -> Self { Self { synonyms: SYNONYMS.to_vec() } }
}

impl QueryEnhancer {
    pub fn new() -> Self { Self::default() }

    /// Appends the expansion of every table key found (as a substring,
    /// case-insensitively) in `query`, in table order.
    pub fn enhance(&self, query: &str) -> String {
        let lowered = query.to_lowercase();
        let mut out = query.to_string();
        for (key, expansion) in &self.synonyms {
            if lowered.contains(key) {
                out.push(' ');
                out.push_str(expansion);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmatched_query_is_unchanged() {
        assert_eq!(QueryEnhancer::new().enhance("quarterly numbers"), "quarterly numbers");
    }

    #[test]
    fn expansions_follow_table_order() {
        let q = QueryEnhancer::new().enhance("Strategy for Brand");
        assert_eq!(q, "Strategy for Brand brand branding identity logo strategy plan roadmap objectives");
    }
}
