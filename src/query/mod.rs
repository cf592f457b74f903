//! Sorting, faceting, filtering and pagination over the post list
//!
//! Every listing goes through [`sort_posts`] first, so all views share the
//! same newest-first order. Facets are always taken from the whole
//! collection, never from the filtered subset.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::content::PostMeta;

/// Number of posts on a listing page
pub const PAGE_SIZE: usize = 6;

/// Listing request: optional filters plus a 1-based page number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostQuery {
    /// Exact category to keep; `None` keeps all
    pub category: Option<String>,
    /// Tag that kept posts must carry; `None` keeps all
    pub tag: Option<String>,
    /// Requested page, clamped into range
    pub page: usize,
}

impl Default for PostQuery {
    fn default() -> Self {
        Self {
            category: None,
            tag: None,
            page: 1,
        }
    }
}

impl PostQuery {
    pub fn page(page: usize) -> Self {
        Self {
            page,
            ..Default::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    fn matches(&self, post: &PostMeta) -> bool {
        let category_ok = self
            .category
            .as_deref()
            .map_or(true, |c| post.category == c);
        let tag_ok = self
            .tag
            .as_deref()
            .map_or(true, |t| post.tags.iter().any(|pt| pt == t));
        category_ok && tag_ok
    }
}

/// One page of a listing together with the full-collection facets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub items: Vec<PostMeta>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub current_page: usize,
    pub total_pages: usize,
}

/// Distinct categories and tags of a collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Facets {
    /// Non-empty categories in first-seen order
    pub categories: Vec<String>,
    /// Tags in first-seen order
    pub tags: Vec<String>,
}

/// Sort newest first by plain string comparison of `date`.
///
/// The sort is stable: equal dates, including empty ones, keep their
/// incoming order. An empty date compares lowest and so lands last.
pub fn sort_posts(posts: &mut [PostMeta]) {
    posts.sort_by(|a, b| b.date.cmp(&a.date));
}

/// Collect distinct categories and tags in the order they first appear
pub fn facets(posts: &[PostMeta]) -> Facets {
    let mut categories: IndexSet<&str> = IndexSet::new();
    let mut tags: IndexSet<&str> = IndexSet::new();

    for post in posts {
        if !post.category.is_empty() {
            categories.insert(&post.category);
        }
        for tag in &post.tags {
            tags.insert(tag);
        }
    }

    Facets {
        categories: categories.into_iter().map(str::to_string).collect(),
        tags: tags.into_iter().map(str::to_string).collect(),
    }
}

/// Number of pages needed for `count` posts; at least one
pub fn total_pages(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1)).max(1)
}

/// Sort, facet, filter and paginate with the default page size
pub fn query(all: Vec<PostMeta>, q: &PostQuery) -> QueryResult {
    query_with_page_size(all, q, PAGE_SIZE)
}

/// Sort, facet, filter and paginate
pub fn query_with_page_size(
    mut all: Vec<PostMeta>,
    q: &PostQuery,
    page_size: usize,
) -> QueryResult {
    let page_size = page_size.max(1);

    sort_posts(&mut all);
    let Facets { categories, tags } = facets(&all);

    let filtered: Vec<PostMeta> = all.into_iter().filter(|p| q.matches(p)).collect();

    let total_pages = total_pages(filtered.len(), page_size);
    let current_page = q.page.clamp(1, total_pages);

    let items = filtered
        .into_iter()
        .skip((current_page - 1) * page_size)
        .take(page_size)
        .collect();

    QueryResult {
        items,
        categories,
        tags,
        current_page,
        total_pages,
    }
}

/// Every post in `category`, newest first, unpaginated
pub fn by_category(all: Vec<PostMeta>, category: &str) -> Vec<PostMeta> {
    filter_sorted(all, &PostQuery::default().with_category(category))
}

/// Every post tagged `tag`, newest first, unpaginated
pub fn by_tag(all: Vec<PostMeta>, tag: &str) -> Vec<PostMeta> {
    filter_sorted(all, &PostQuery::default().with_tag(tag))
}

fn filter_sorted(mut all: Vec<PostMeta>, q: &PostQuery) -> Vec<PostMeta> {
    sort_posts(&mut all);
    all.retain(|p| q.matches(p));
    all
}
