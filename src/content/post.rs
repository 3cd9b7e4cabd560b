//! Post models

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

/// Listing entry for a blog post
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMeta {
    /// Filename without extension
    pub slug: String,

    /// Post title (falls back to the slug)
    pub title: String,

    /// Publication date
    #[serde(serialize_with = "iso_date")]
    pub date: DateTime<Utc>,

    /// Post tags
    pub tags: Vec<String>,

    /// Cover image reference, empty when absent
    pub cover: String,

    /// Estimated minutes to read, never below 1
    pub reading_minutes: u32,

    /// Explicit excerpt or the head of the body
    pub excerpt: String,
}

/// A post with its rendered body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FullPost {
    pub meta: PostMeta,
    pub content_html: String,
}

/// Serialize dates the way browsers print `Date#toISOString`
fn iso_date<S: Serializer>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&date.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Estimate reading time in whole minutes
pub fn reading_minutes(body: &str, words_per_minute: usize) -> u32 {
    let words = body.split_whitespace().count();
    let minutes = (words as f64 / words_per_minute.max(1) as f64).round() as u32;
    minutes.max(1)
}

/// First `length` characters of the body
pub fn derive_excerpt(body: &str, length: usize) -> String {
    body.chars().take(length).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_reading_minutes_minimum() {
        assert_eq!(reading_minutes("", 200), 1);
        assert_eq!(reading_minutes("one two three", 200), 1);
    }

    #[test]
    fn test_reading_minutes_rounding() {
        let words = |n: usize| vec!["word"; n].join(" ");
        assert_eq!(reading_minutes(&words(299), 200), 1);
        assert_eq!(reading_minutes(&words(300), 200), 2);
        assert_eq!(reading_minutes(&words(1000), 200), 5);
    }

    #[test]
    fn test_reading_minutes_monotonic() {
        let mut body = String::new();
        let mut last = reading_minutes(&body, 200);
        for _ in 0..1500 {
            body.push_str(" lorem");
            let current = reading_minutes(&body, 200);
            assert!(current >= last);
            last = current;
        }
        assert_eq!(last, 8);
    }

    #[test]
    fn test_derive_excerpt() {
        let body = "x".repeat(500);
        assert_eq!(derive_excerpt(&body, 160).len(), 160);
        assert_eq!(derive_excerpt("short", 160), "short");
        // multi-byte characters count once
        assert_eq!(derive_excerpt("héllo wörld", 4), "héll");
    }

    #[test]
    fn test_meta_json_shape() {
        let meta = PostMeta {
            slug: "hello".to_string(),
            title: "Hello".to_string(),
            date: Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(),
            tags: vec!["rust".to_string()],
            cover: String::new(),
            reading_minutes: 3,
            excerpt: "Hi".to_string(),
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["date"], "2024-01-15T00:00:00.000Z");
        assert_eq!(json["readingMinutes"], 3);
        assert_eq!(json["tags"][0], "rust");
    }
}
