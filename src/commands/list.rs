//! List site content

use anyhow::Result;
use indexmap::IndexMap;

use crate::content::PostMeta;
use crate::Site;

/// List site content by type
pub fn run(site: &Site, content_type: &str) -> Result<()> {
    let posts = site.posts();

    match content_type {
        "post" | "posts" => {
            println!("Posts ({}):", posts.len());
            for post in &posts {
                let date = if post.date.is_empty() {
                    "----------"
                } else {
                    post.date.as_str()
                };
                println!(
                    "  {} - {} [{}] ({} min)",
                    date, post.title, post.slug, post.reading_time
                );
            }
        }
        "tag" | "tags" => {
            let tags = count(&posts, |p| p.tags.iter().map(String::as_str).collect());
            println!("Tags ({}):", tags.len());
            for (tag, n) in tags {
                println!("  {} ({})", tag, n);
            }
        }
        "category" | "categories" => {
            let categories = count(&posts, |p| {
                Some(p.category.as_str())
                    .filter(|c| !c.is_empty())
                    .into_iter()
                    .collect()
            });
            println!("Categories ({}):", categories.len());
            for (category, n) in categories {
                println!("  {} ({})", category, n);
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: post, tag, category",
                content_type
            );
        }
    }

    Ok(())
}

/// Count values per key, most used first; ties keep first-seen order
fn count<'a, F>(posts: &'a [PostMeta], keys: F) -> Vec<(&'a str, usize)>
where
    F: Fn(&'a PostMeta) -> Vec<&'a str>,
{
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for post in posts {
        for key in keys(post) {
            *counts.entry(key).or_insert(0) += 1;
        }
    }

    let mut counts: Vec<_> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}
