//! List site content

use anyhow::Result;
use std::collections::HashMap;

use crate::content::{ContentLoader, PostMeta};
use crate::Folio;

/// List site content by type
pub fn run(folio: &Folio, content_type: &str) -> Result<()> {
    let loader = ContentLoader::new(folio);

    match content_type {
        "post" | "posts" => {
            let posts = loader.load_posts()?;
            println!("Posts ({}):", posts.len());
            for post in posts {
                println!(
                    "  {} - {} [{}] ({} min)",
                    post.date.format("%Y-%m-%d"),
                    post.title,
                    post.slug,
                    post.reading_minutes
                );
            }
        }
        "tag" | "tags" => {
            let posts = loader.load_posts()?;
            let tags = tag_counts(&posts);
            println!("Tags ({}):", tags.len());
            for (tag, count) in tags {
                println!("  {} ({})", tag, count);
            }
        }
        _ => {
            anyhow::bail!("Unknown type: {}. Available: post, tag", content_type);
        }
    }

    Ok(())
}

/// Tags with their post counts, most used first
fn tag_counts(posts: &[PostMeta]) -> Vec<(String, usize)> {
    let mut tags: HashMap<String, usize> = HashMap::new();
    for post in posts {
        for tag in &post.tags {
            *tags.entry(tag.clone()).or_insert(0) += 1;
        }
    }
    let mut tags: Vec<_> = tags.into_iter().collect();
    tags.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use chrono::Utc;
    use tempfile::TempDir;

    fn post(tags: &[&str]) -> PostMeta {
        PostMeta {
            slug: "p".to_string(),
            title: "P".to_string(),
            date: Utc::now(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            cover: String::new(),
            reading_minutes: 1,
            excerpt: String::new(),
        }
    }

    #[test]
    fn test_tag_counts() {
        let posts = vec![post(&["rust", "web"]), post(&["rust"]), post(&["art"])];
        assert_eq!(
            tag_counts(&posts),
            vec![
                ("rust".to_string(), 2),
                ("art".to_string(), 1),
                ("web".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_unknown_type() {
        let dir = TempDir::new().unwrap();
        let folio = Folio::with_config(dir.path(), SiteConfig::default());
        assert!(run(&folio, "category").is_err());
    }
}
