//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub author: String,
    pub url: String,

    // Directory
    pub content_dir: String,
    pub static_dir: String,

    // Writing
    pub words_per_minute: usize,
    pub excerpt_length: usize,
    pub highlight_theme: String,

    // Home page
    pub latest_posts: usize,
    #[serde(default)]
    pub home: HomeConfig,

    // Contact form
    #[serde(default)]
    pub contact: ContactConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Portfolio".to_string(),
            description: "Portfolio & blog".to_string(),
            author: "John Doe".to_string(),
            url: "http://localhost:4000".to_string(),

            content_dir: "content/blog".to_string(),
            static_dir: "public".to_string(),

            words_per_minute: 200,
            excerpt_length: 160,
            highlight_theme: "base16-ocean.dark".to_string(),

            latest_posts: 3,
            home: HomeConfig::default(),

            contact: ContactConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Host part of the site URL, used to tag outgoing mail
    pub fn host(&self) -> &str {
        let without_scheme = self
            .url
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.url);
        without_scheme
            .split(['/', ':'])
            .next()
            .unwrap_or(without_scheme)
    }
}

/// Landing page content
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HomeConfig {
    pub headline: String,
    pub tagline: String,
    pub experience: Vec<Experience>,
    pub photos: Vec<String>,
    pub books: Vec<String>,
    pub links: Vec<LinkItem>,
}

/// One entry of the work history
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Experience {
    pub company: String,
    pub role: String,
    pub period: String,
    pub bullets: Vec<String>,
}

/// An external profile link shown in the hero
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkItem {
    pub label: String,
    pub href: String,
}

/// Contact form policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactConfig {
    /// Address used for the `mailto:` fallback on the page
    pub email: Option<String>,
    /// Name used in the subject of forwarded messages (defaults to the site title)
    pub site_name: Option<String>,
    pub min_elapsed_ms: i64,
    pub message_min_chars: usize,
    pub message_max_chars: usize,
    pub email_max_chars: usize,
    pub provider_url: String,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            email: None,
            site_name: None,
            min_elapsed_ms: 1200,
            message_min_chars: 2,
            message_max_chars: 5000,
            email_max_chars: 320,
            provider_url: "https://api.resend.com/emails".to_string(),
        }
    }
}
