//! Built-in site templates using the Tera template engine
//!
//! All templates are embedded directly in the binary.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::{HomeConfig, SiteConfig};
use crate::content::{FullPost, PostMeta};
use crate::helpers;

/// Template renderer with the embedded site theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Tera's escaper also rewrites `/`, which mangles paths in attributes;
        // templates escape text fields explicitly instead
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("site/layout.html")),
            ("home.html", include_str!("site/home.html")),
            ("blog.html", include_str!("site/blog.html")),
            ("post.html", include_str!("site/post.html")),
            ("not_found.html", include_str!("site/not_found.html")),
            ("error.html", include_str!("site/error.html")),
            (
                "partials/post_card.html",
                include_str!("site/partials/post_card.html"),
            ),
        ])?;

        tera.register_filter("strip_html", strip_html_filter);
        tera.register_filter("truncate_chars", truncate_chars_filter);
        tera.register_filter("date_format", date_format_filter);
        tera.register_filter("asset_url", asset_url_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }

    /// Landing page
    pub fn home(
        &self,
        config: &SiteConfig,
        latest: &[PostMeta],
        form_start: i64,
    ) -> Result<String> {
        let mut context = base_context(config);
        context.insert("home", &HomeView::from(&config.home));
        context.insert("posts", latest);
        context.insert("form_start", &form_start);
        self.render("home.html", &context)
    }

    /// Blog index
    pub fn blog_index(&self, config: &SiteConfig, posts: &[PostMeta]) -> Result<String> {
        let mut context = base_context(config);
        context.insert("page_title", &format!("Blog — {}", config.title));
        context.insert("posts", posts);
        self.render("blog.html", &context)
    }

    /// Single post
    pub fn post(&self, config: &SiteConfig, post: &FullPost) -> Result<String> {
        let mut context = base_context(config);
        context.insert("page_title", &format!("{} — {}", post.meta.title, config.title));
        context.insert("post", post);
        self.render("post.html", &context)
    }

    /// Not-found page
    pub fn not_found(&self, config: &SiteConfig) -> Result<String> {
        let mut context = base_context(config);
        context.insert("page_title", &format!("Not found — {}", config.title));
        self.render("not_found.html", &context)
    }

    /// Generic failure page
    pub fn error(&self, config: &SiteConfig) -> Result<String> {
        let mut context = base_context(config);
        context.insert("page_title", &format!("Error — {}", config.title));
        self.render("error.html", &context)
    }
}

/// Values every page needs
fn base_context(config: &SiteConfig) -> Context {
    let mut context = Context::new();
    context.insert("site", &SiteData::from(config));
    context.insert("page_title", &config.title);
    context.insert("nav", &nav_sections());
    context
}

/// In-page anchors of the landing page, in display order
fn nav_sections() -> Vec<MenuItem> {
    [
        ("work", "Work"),
        ("photos", "Photos"),
        ("books", "Books"),
        ("blog", "Blog"),
        ("contact", "Contact"),
    ]
    .into_iter()
    .map(|(id, name)| MenuItem {
        name: name.to_string(),
        path: format!("/#{}", id),
    })
    .collect()
}

/// Tera filter: strip HTML tags
fn strip_html_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("strip_html", "value", String, value);
    Ok(tera::Value::String(helpers::strip_html(&s)))
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 160,
    };
    let omission = match args.get("omission") {
        Some(val) => tera::try_get_value!("truncate_chars", "omission", String, val),
        None => "…".to_string(),
    };
    Ok(tera::Value::String(helpers::truncate(
        &s,
        length,
        Some(&omission),
    )))
}

/// Tera filter: format an ISO-8601 date string, "MMM D, YYYY" by default
fn date_format_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("date_format", "value", String, value);
    let Some(date) = crate::content::parse_date_string(&s) else {
        return Ok(tera::Value::String(s));
    };
    let formatted = match args.get("format") {
        Some(val) => {
            let format = tera::try_get_value!("date_format", "format", String, val);
            helpers::format_date(&date, &format)
        }
        None => helpers::medium_date(&date),
    };
    Ok(tera::Value::String(formatted))
}

/// Tera filter: root a relative asset path, leave full URLs alone
fn asset_url_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("asset_url", "value", String, value);
    Ok(tera::Value::String(asset_url(&s)))
}

fn asset_url(path: &str) -> String {
    if path.contains("://") || path.starts_with("//") || path.starts_with("data:") {
        path.to_string()
    } else {
        format!("/{}", path.trim_start_matches('/'))
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub description: String,
    pub author: String,
    pub url: String,
    pub contact_email: Option<String>,
    pub mailto: Option<String>,
    pub year: i32,
}

impl From<&SiteConfig> for SiteData {
    fn from(config: &SiteConfig) -> Self {
        use chrono::Datelike;

        let mailto = config.contact.email.as_ref().map(|address| {
            helpers::mailto(address, &format!("Hello from {}", config.host()))
        });
        Self {
            title: config.title.clone(),
            description: config.description.clone(),
            author: config.author.clone(),
            url: config.url.clone(),
            contact_email: config.contact.email.clone(),
            mailto,
            year: chrono::Utc::now().year(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HomeView<'a> {
    pub headline: &'a str,
    pub tagline: &'a str,
    pub experience: &'a [crate::config::Experience],
    pub photos: &'a [String],
    pub books: &'a [String],
    pub links: &'a [crate::config::LinkItem],
}

impl<'a> From<&'a HomeConfig> for HomeView<'a> {
    fn from(home: &'a HomeConfig) -> Self {
        Self {
            headline: &home.headline,
            tagline: &home.tagline,
            experience: &home.experience,
            photos: &home.photos,
            books: &home.books,
            links: &home.links,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MenuItem {
    pub name: String,
    pub path: String,
}
