//! Keyword-scored category assignment.

use crate::types::Category;

const FILENAME_WEIGHT: u32 = 2;
const CONTENT_WEIGHT: u32 = 1;

/// Assigns a [`Category`] from a document's text and filename.
///
/// Each category scores +2 per keyword found in the lowercased filename and
/// +1 per keyword found in the lowercased text. The strictly highest score
/// wins, ties go to the category defined first, and an all-zero board falls
/// back to the default category.
#[derive(Debug, Clone)]
pub struct Categorizer {
    keywords: Vec<(Category, Vec<&'static str>)>,
    default: Category,
}

impl Default for Categorizer {
    fn default() -> Self {
        let keywords = vec![
            (Category::Campaign, vec!["campaign", "advertising", "promotion", "launch", "marketing campaign"]),
            (Category::Brand, vec!["brand", "branding", "identity", "logo", "brand guide"]),
            (Category::SocialMedia, vec!["social", "facebook", "twitter", "instagram", "linkedin", "tiktok"]),
            (Category::Email, vec!["email", "newsletter", "mailchimp", "campaign monitor", "subject line"]),
            (Category::Content, vec!["content", "blog", "article", "copy", "copywriting", "editorial"]),
            (Category::Analytics, vec!["analytics", "metrics", "kpi", "performance", "data", "report"]),
            (Category::Strategy, vec!["strategy", "plan", "roadmap", "objectives", "goals"]),
            (Category::Creative, vec!["creative", "design", "visual", "artwork", "graphics"]),
        ];
        Self { keywords, default: Category::default() }
    }
}

impl Categorizer {
    pub fn new() -> Self { Self::default() }

    pub fn categorize(&self, text: &str, filename: &str) -> Category {
        let text = text.to_lowercase();
        let filename = filename.to_lowercase();
        let mut best: Option<(Category, u32)> = None;
        for (category, score) in self.scores(&text, &filename) {
            // strict comparison keeps the earlier category on ties
            if best.map_or(true, |(_, s)| score > s) { best = Some((category, score)); }
        }
        match best {
            Some((category, score)) if score > 0 => category,
            _ => self.default,
        }
    }

    /// Per-category scores in definition order; inputs already lowercased.
    fn scores(&self, text: &str, filename: &str) -> Vec<(Category, u32)> {
        self.keywords
            .iter()
            .map(|(category, words)| {
                let score = words
                    .iter()
                    .map(|w| {
                        u32::from(filename.contains(w)) * FILENAME_WEIGHT + u32::from(text.contains(w)) * CONTENT_WEIGHT
                    })
                    .sum::<u32>();
                (*category, score)
            })
            .collect()
    }
}
