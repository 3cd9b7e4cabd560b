//! Content loader - loads blog posts from the content directory

use chrono::Utc;
use percent_encoding::percent_decode_str;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use super::post::{derive_excerpt, reading_minutes};
use super::{FrontMatter, FullPost, MarkdownRenderer, PostMeta};
use crate::Folio;

/// Extensions recognised as posts, in lookup order
const POST_EXTENSIONS: [&str; 2] = ["md", "mdx"];

/// Listing-level content failures
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Content directory not found: {0}")]
    MissingDirectory(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to list content directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Loads posts from the content directory
pub struct ContentLoader {
    content_dir: PathBuf,
    renderer: MarkdownRenderer,
    words_per_minute: usize,
    excerpt_length: usize,
}

impl ContentLoader {
    /// Create a new content loader
    pub fn new(folio: &Folio) -> Self {
        Self {
            content_dir: folio.content_dir.clone(),
            renderer: MarkdownRenderer::with_theme(&folio.config.highlight_theme),
            words_per_minute: folio.config.words_per_minute,
            excerpt_length: folio.config.excerpt_length,
        }
    }

    /// Directory the posts are read from
    pub fn content_dir(&self) -> &Path {
        &self.content_dir
    }

    /// Load metadata for every post, newest first
    pub fn load_posts(&self) -> Result<Vec<PostMeta>, ContentError> {
        if !self.content_dir.is_dir() {
            return Err(ContentError::MissingDirectory(self.content_dir.clone()));
        }

        let mut posts = Vec::new();

        for entry in WalkDir::new(&self.content_dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
        {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type().is_file() || !is_markdown_file(path) {
                continue;
            }
            let Some(slug) = slug_from_path(path) else {
                continue;
            };

            let raw = fs::read_to_string(path).map_err(|source| ContentError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            let (meta, _) = self.parse_post(&slug, &raw);
            posts.push(meta);
        }

        // Sort by date descending (newest first)
        posts.sort_by(|a, b| b.date.cmp(&a.date));

        tracing::debug!("Loaded {} posts from {:?}", posts.len(), self.content_dir);
        Ok(posts)
    }

    /// Look up one post by slug and render its body.
    ///
    /// Anything that prevents the post from loading is reported as `None`.
    pub fn find_post(&self, raw_slug: &str) -> Option<FullPost> {
        let slug = sanitize_slug(raw_slug)?;

        let path = POST_EXTENSIONS
            .iter()
            .map(|ext| self.content_dir.join(format!("{}.{}", slug, ext)))
            .find(|candidate| candidate.is_file())?;

        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Failed to read post {:?}: {}", path, e);
                return None;
            }
        };

        let (meta, body) = self.parse_post(&slug, &raw);
        let content_html = self.renderer.render(body);

        Some(FullPost { meta, content_html })
    }

    /// Build metadata from raw file contents, returning the markdown body alongside
    fn parse_post<'r>(&self, slug: &str, raw: &'r str) -> (PostMeta, &'r str) {
        let (fm, body) = FrontMatter::parse(raw);

        let date = fm.parse_date().unwrap_or_else(|| {
            if let Some(date) = &fm.date {
                tracing::warn!("Unrecognised date {:?} in post {}, using now", date, slug);
            }
            Utc::now()
        });

        let excerpt = fm
            .excerpt
            .unwrap_or_else(|| derive_excerpt(body, self.excerpt_length));

        let meta = PostMeta {
            slug: slug.to_string(),
            title: fm.title.unwrap_or_else(|| slug.to_string()),
            date,
            tags: fm.tags,
            cover: fm.cover.unwrap_or_default(),
            reading_minutes: reading_minutes(body, self.words_per_minute),
            excerpt,
        };

        (meta, body)
    }
}

/// Decode a requested slug and strip path separators so it names a file
/// directly inside the content directory
pub fn sanitize_slug(raw: &str) -> Option<String> {
    let decoded = percent_decode_str(raw).decode_utf8().ok()?;
    let safe: String = decoded.chars().filter(|c| *c != '/' && *c != '\\').collect();
    if safe.is_empty() {
        None
    } else {
        Some(safe)
    }
}

/// Check if a file is a markdown file
fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| POST_EXTENSIONS.contains(&e))
        .unwrap_or(false)
}

/// Filename without the extension
fn slug_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}
