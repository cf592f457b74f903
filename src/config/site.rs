//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::query::PAGE_SIZE;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,

    // Content
    pub content_dir: String,
    pub per_page: usize,
    pub highlight_theme: String,

    // Server
    #[serde(default)]
    pub server: ServerConfig,

    // Contact form
    #[serde(default)]
    pub contact: ContactConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Updates".to_string(),
            description: String::new(),

            content_dir: "content/updates".to_string(),
            per_page: PAGE_SIZE,
            highlight_theme: "base16-ocean.dark".to_string(),

            server: ServerConfig::default(),
            contact: ContactConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let config: SiteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {:?}", path))?;
        Ok(config)
    }

    /// Apply `RESEND_API_KEY` and `CONTACT_EMAIL` from the environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var("RESEND_API_KEY").ok(),
            std::env::var("CONTACT_EMAIL").ok(),
        );
    }

    fn apply_overrides(&mut self, api_key: Option<String>, to: Option<String>) {
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            self.contact.api_key = Some(key);
        }
        if let Some(to) = to.filter(|t| !t.is_empty()) {
            self.contact.to = Some(to);
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub ip: String,
    pub port: u16,
    /// Keep the index in memory and rebuild it when content changes
    pub watch: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ip: "localhost".to_string(),
            port: 4000,
            watch: false,
        }
    }
}

/// Contact form configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactConfig {
    /// Recipient of contact messages
    pub to: Option<String>,
    pub from: String,
    pub api_key: Option<String>,
    pub api_url: String,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            to: None,
            from: "Updates <noreply@example.com>".to_string(),
            api_key: None,
            api_url: "https://api.resend.com/emails".to_string(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// Fixed-window limits for the contact endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub window_secs: u64,
    pub max_requests: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: 15 * 60,
            max_requests: 5,
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}
