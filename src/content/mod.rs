//! Content module - handles blog posts and markdown processing

mod frontmatter;
pub mod loader;
mod markdown;
mod post;

pub use frontmatter::{parse_date_string, FrontMatter};
pub use loader::{sanitize_slug, ContentError, ContentLoader};
pub use markdown::MarkdownRenderer;
pub use post::{derive_excerpt, reading_minutes, FullPost, PostMeta};
