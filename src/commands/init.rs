//! Initialize a new site

use anyhow::Result;
use std::fs;
use std::path::Path;

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    let config_path = target_dir.join("_config.yml");
    if config_path.exists() {
        anyhow::bail!("A site already exists in {:?}", target_dir);
    }

    // Create directory structure
    fs::create_dir_all(target_dir.join("content/blog"))?;
    fs::create_dir_all(target_dir.join("public/images"))?;

    let config_content = r#"# Site
title: Jane Doe
description: Software engineer, photographer, reader
author: Jane Doe
url: http://localhost:4000

# Directory
content_dir: content/blog
static_dir: public

# Writing
words_per_minute: 200
excerpt_length: 160
highlight_theme: base16-ocean.dark

# Home page
latest_posts: 3
home:
  headline: Hi, I'm Jane.
  tagline: I build reliable software and take photos on the side.
  experience:
    - company: Acme
      role: Senior Engineer
      period: 2021 - present
      bullets:
        - Led the migration to a new billing platform
  photos:
    - /images/sample.jpg
  books:
    - The Pragmatic Programmer
  links:
    - label: GitHub
      href: https://github.com/

# Contact form
# Delivery also needs RESEND_API_KEY, CONTACT_TO and CONTACT_FROM in the environment.
contact:
  email: hello@example.com
  min_elapsed_ms: 1200
"#;

    fs::write(&config_path, config_content)?;

    let now = chrono::Local::now();
    let sample_post = format!(
        r#"---
title: Hello World
date: {}
tags: [meta]
excerpt: The first post on this site.
---

Welcome! This post lives in `content/blog/hello-world.md`.

## Writing posts

```bash
$ folio-rs new "My New Post"
```

## Running the site

```bash
$ folio-rs server
```
"#,
        now.format("%Y-%m-%d")
    );

    fs::write(target_dir.join("content/blog/hello-world.md"), sample_post)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentLoader;
    use crate::Folio;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_loadable_site() {
        let dir = TempDir::new().unwrap();
        init_site(dir.path()).unwrap();

        assert!(dir.path().join("public/images").is_dir());
        let folio = Folio::new(dir.path()).unwrap();
        assert_eq!(folio.config.title, "Jane Doe");
        assert_eq!(folio.config.home.experience.len(), 1);

        let posts = ContentLoader::new(&folio).load_posts().unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].slug, "hello-world");
        assert_eq!(posts[0].tags, vec!["meta"]);
    }

    #[test]
    fn test_init_refuses_existing_site() {
        let dir = TempDir::new().unwrap();
        init_site(dir.path()).unwrap();
        assert!(init_site(dir.path()).is_err());
    }
}
