//! Create a new update

use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use crate::content::parse_tags;
use crate::Site;

/// Front-matter fields for a new update
#[derive(Debug, Clone, Default)]
pub struct NewUpdate {
    pub title: String,
    pub slug: Option<String>,
    pub summary: Option<String>,
    pub category: Option<String>,
    pub tags: Option<String>,
}

/// Write a new update file into the content directory and return its path
pub fn create_update(site: &Site, update: &NewUpdate) -> Result<PathBuf> {
    let title = update.title.trim();
    if title.is_empty() {
        anyhow::bail!("Title must not be empty");
    }

    // Front-matter values are single lines
    let fields = [
        ("title", Some(title)),
        ("slug", update.slug.as_deref()),
        ("summary", update.summary.as_deref()),
        ("category", update.category.as_deref()),
        ("tags", update.tags.as_deref()),
    ];
    for (name, value) in fields {
        if value.is_some_and(|v| v.contains(['\n', '\r'])) {
            anyhow::bail!("{} must be a single line", name);
        }
    }

    // Explicit slugs are normalized too, so they cannot name a path
    let slug = match update.slug.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => slug::slugify(s),
        _ => slug::slugify(title),
    };
    if slug.is_empty() {
        anyhow::bail!("Could not derive a slug from {:?}, pass one explicitly", title);
    }

    fs::create_dir_all(&site.content_dir)?;
    let file_path = site.content_dir.join(format!("{}.md", slug));

    // Check if file already exists
    if file_path.exists() {
        anyhow::bail!("File already exists: {:?}", file_path);
    }

    let now = chrono::Local::now();
    let tags = update
        .tags
        .as_deref()
        .map(parse_tags)
        .unwrap_or_default()
        .join(", ");

    let content = format!(
        "---\ntitle: {}\nslug: {}\ndate: {}\nsummary: {}\ncategory: {}\ntags: {}\n---\n\n",
        title,
        slug,
        now.format("%Y-%m-%d"),
        update.summary.as_deref().unwrap_or("").trim(),
        update.category.as_deref().unwrap_or("").trim(),
        tags
    );

    fs::write(&file_path, content)?;
    tracing::info!("Created: {:?}", file_path);

    Ok(file_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::content::{FrontMatter, PostMeta};

    fn site(dir: &tempfile::TempDir) -> Site {
        Site::with_config(dir.path(), SiteConfig::default())
    }

    #[test]
    fn test_create_update_round_trips_through_index() {
        let dir = tempfile::tempdir().unwrap();
        let site = site(&dir);

        let path = create_update(
            &site,
            &NewUpdate {
                title: "Hello, World!".to_string(),
                category: Some("news".to_string()),
                tags: Some("a, b ,, c".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(path, site.content_dir.join("hello-world.md"));

        let raw = fs::read_to_string(&path).unwrap();
        let (fm, body) = FrontMatter::parse(&raw);
        let meta = PostMeta::build(&fm, body).unwrap();
        assert_eq!(meta.title, "Hello, World!");
        assert_eq!(meta.slug, "hello-world");
        assert_eq!(meta.category, "news");
        assert_eq!(meta.tags, vec!["a", "b", "c"]);
        assert_eq!(meta.date.len(), 10);
        assert_eq!(meta.reading_time, 0);
    }

    #[test]
    fn test_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let site = site(&dir);
        let update = NewUpdate {
            title: "Twice".to_string(),
            slug: Some("twice".to_string()),
            ..Default::default()
        };

        create_update(&site, &update).unwrap();
        assert!(create_update(&site, &update).is_err());
    }

    #[test]
    fn test_explicit_slug_stays_in_content_dir() {
        let dir = tempfile::tempdir().unwrap();
        let site = site(&dir);
        let update = NewUpdate {
            title: "Escape".to_string(),
            slug: Some("../../Escaped Update".to_string()),
            ..Default::default()
        };

        let path = create_update(&site, &update).unwrap();
        assert_eq!(path, site.content_dir.join("escaped-update.md"));
        assert!(!dir.path().join("escaped-update.md").exists());

        let only_dots = NewUpdate {
            title: "Dots".to_string(),
            slug: Some("../..".to_string()),
            ..Default::default()
        };
        assert!(create_update(&site, &only_dots).is_err());
    }

    #[test]
    fn test_rejects_multiline_fields() {
        let dir = tempfile::tempdir().unwrap();
        let site = site(&dir);
        let base = NewUpdate {
            title: "Injected".to_string(),
            ..Default::default()
        };

        let cases = [
            NewUpdate {
                summary: Some("hi\nslug: hijacked".to_string()),
                ..base.clone()
            },
            NewUpdate {
                category: Some("news\r\ntitle: other".to_string()),
                ..base.clone()
            },
            NewUpdate {
                tags: Some("a\nb".to_string()),
                ..base.clone()
            },
            NewUpdate {
                title: "Two\nLines".to_string(),
                ..base.clone()
            },
        ];
        for update in &cases {
            assert!(create_update(&site, update).is_err());
        }
        assert!(!site.content_dir.join("injected.md").exists());
    }

    #[test]
    fn test_rejects_empty_title() {
        let dir = tempfile::tempdir().unwrap();
        let update = NewUpdate {
            title: "   ".to_string(),
            ..Default::default()
        };
        assert!(create_update(&site(&dir), &update).is_err());
    }
}
