//! Post models

use serde::{Deserialize, Serialize};

use super::FrontMatter;

/// Average reading speed used for the reading-time estimate
pub const WORDS_PER_MINUTE: usize = 200;

/// Metadata of an update, as kept in the content index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMeta {
    /// Post title (never empty)
    pub title: String,

    /// URL identifier (never empty, not guaranteed unique)
    pub slug: String,

    /// Publication date as written, compared lexically
    pub date: String,

    /// Short summary shown in listings
    pub summary: String,

    /// Single category, empty when uncategorized
    pub category: String,

    /// Tags in source order, duplicates kept
    pub tags: Vec<String>,

    /// Estimated reading time in minutes
    pub reading_time: usize,
}

impl PostMeta {
    /// Build post metadata from parsed front-matter and body.
    ///
    /// Returns `None` when `title` or `slug` is missing or blank; such
    /// documents are left out of the index rather than reported.
    pub fn build(fm: &FrontMatter, body: &str) -> Option<Self> {
        let title = required(fm, "title")?;
        let slug = required(fm, "slug")?;

        let tags = fm.get("tags").map(parse_tags).unwrap_or_default();

        Some(Self {
            title,
            slug,
            date: optional(fm, "date"),
            summary: optional(fm, "summary"),
            category: optional(fm, "category"),
            tags,
            reading_time: reading_time(body),
        })
    }
}

/// A post with its rendered body, produced on single-item retrieval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    #[serde(flatten)]
    pub meta: PostMeta,

    /// Rendered HTML content
    pub html: String,
}

fn required(fm: &FrontMatter, key: &str) -> Option<String> {
    fm.get(key)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn optional(fm: &FrontMatter, key: &str) -> String {
    fm.get(key).unwrap_or_default().to_string()
}

/// Split a comma-separated tag list, dropping empty pieces
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Minutes needed to read `body`, rounded up. An empty body reads in 0.
pub fn reading_time(body: &str) -> usize {
    let words = body.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE)
}
