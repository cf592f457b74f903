//! Content module - front-matter, post records, the content index and markdown rendering

mod frontmatter;
pub mod loader;
mod markdown;
mod post;

pub use frontmatter::FrontMatter;
pub use loader::ContentIndex;
pub use markdown::{html_escape, MarkdownRenderer};
pub use post::{parse_tags, reading_time, Post, PostMeta, WORDS_PER_MINUTE};
