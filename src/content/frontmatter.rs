//! Front-matter parsing
//!
//! Updates carry a flat block of `key: value` lines between two `---`
//! delimiters. Values are single physical lines with no quoting or escaping.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

lazy_static! {
    /// Opening `---` on the first line, the metadata lines, a closing `---`
    /// line, then the body.
    static ref FRONT_MATTER_RE: Regex =
        Regex::new(r"(?s)\A---\r?\n(.*?)\r?\n---\r?\n(.*)\z").unwrap();
}

/// Raw key/value metadata from the head of a document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
    fields: HashMap<String, String>,
}

impl FrontMatter {
    /// Parse front-matter from content string
    /// Returns (front_matter, body)
    ///
    /// Content that does not open with a delimited block comes back whole as
    /// the body, with an empty front-matter.
    pub fn parse(content: &str) -> (Self, &str) {
        let Some(caps) = FRONT_MATTER_RE.captures(content) else {
            return (FrontMatter::default(), content);
        };

        let (Some(block), Some(body)) = (caps.get(1), caps.get(2)) else {
            return (FrontMatter::default(), content);
        };

        (Self::parse_block(block.as_str()), body.as_str())
    }

    fn parse_block(block: &str) -> Self {
        let mut fields = HashMap::new();

        for line in block.lines() {
            // Split on the first colon; a leading colon has no key
            match line.find(':') {
                Some(idx) if idx > 0 => {
                    let key = line[..idx].trim();
                    let value = line[idx + 1..].trim();
                    fields.insert(key.to_string(), value.to_string());
                }
                _ => {}
            }
        }

        Self { fields }
    }

    /// Raw value of a field, if present
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
