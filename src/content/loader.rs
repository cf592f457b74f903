//! Content loader - builds the in-memory index of updates

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{FrontMatter, MarkdownRenderer, Post, PostMeta};

/// One successfully built document
#[derive(Debug, Clone)]
struct Entry {
    meta: PostMeta,
    body: String,
    source: PathBuf,
}

/// All updates found in the content directory for a single load.
///
/// Entries keep enumeration order. Display order is the query layer's job.
#[derive(Debug, Clone, Default)]
pub struct ContentIndex {
    entries: Vec<Entry>,
}

impl ContentIndex {
    /// Load every markdown file directly inside `dir`.
    ///
    /// Never fails: a missing directory gives an empty index, and files that
    /// cannot be read or lack a title/slug are skipped.
    pub fn load<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            tracing::warn!("Content directory {:?} not found", dir);
            return Self::default();
        }

        let mut documents = Vec::new();

        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry in {:?}: {}", dir, e);
                    continue;
                }
            };

            let path = entry.path();
            if !path.is_file() || !is_markdown_file(path) {
                continue;
            }

            match fs::read_to_string(path) {
                Ok(raw) => documents.push((path.to_path_buf(), raw)),
                Err(e) => tracing::warn!("Failed to read update {:?}: {}", path, e),
            }
        }

        let index = Self::from_documents(documents);
        tracing::debug!("Loaded {} updates from {:?}", index.len(), dir);
        index
    }

    /// Build an index from already-read documents, in the given order
    pub fn from_documents<I, P, S>(documents: I) -> Self
    where
        I: IntoIterator<Item = (P, S)>,
        P: Into<PathBuf>,
        S: AsRef<str>,
    {
        let mut entries: Vec<Entry> = Vec::new();
        let mut seen: HashMap<String, PathBuf> = HashMap::new();

        for (source, raw) in documents {
            let source = source.into();
            let (fm, body) = FrontMatter::parse(raw.as_ref());

            let Some(meta) = PostMeta::build(&fm, body) else {
                tracing::debug!("Skipping {:?}: missing title or slug", source);
                continue;
            };

            // First one wins on lookup; later duplicates stay listed
            if let Some(first) = seen.get(&meta.slug) {
                tracing::warn!(
                    "Duplicate slug {:?} in {:?}, lookups resolve to {:?}",
                    meta.slug,
                    source,
                    first
                );
            } else {
                seen.insert(meta.slug.clone(), source.clone());
            }

            entries.push(Entry {
                meta,
                body: body.to_string(),
                source,
            });
        }

        Self { entries }
    }

    /// Metadata of every update, in enumeration order
    pub fn load_all(&self) -> Vec<PostMeta> {
        self.entries.iter().map(|e| e.meta.clone()).collect()
    }

    /// Markdown body of the first update with this slug
    pub fn load_body(&self, slug: &str) -> Option<String> {
        self.find(slug).map(|e| e.body.clone())
    }

    /// Source file of the first update with this slug
    pub fn source_of(&self, slug: &str) -> Option<&Path> {
        self.find(slug).map(|e| e.source.as_path())
    }

    /// Look up an update by slug and render its body
    pub fn get_by_slug(&self, slug: &str, renderer: &MarkdownRenderer) -> Option<Post> {
        let entry = self.find(slug)?;
        Some(Post {
            meta: entry.meta.clone(),
            html: renderer.render(&entry.body),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn find(&self, slug: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.meta.slug == slug)
    }
}

/// Check if a file is a markdown file
fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "md" || e == "markdown")
        .unwrap_or(false)
}
