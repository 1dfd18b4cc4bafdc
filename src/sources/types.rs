// src/sources/types.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    #[default]
    Post,
    Comment,
}

/// One post or comment as produced by a source adapter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentItem {
    #[serde(rename = "type", default)]
    pub kind: ContentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subreddit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_utc: Option<f64>,
    /// Adapter that produced the item (diagnostics only, never serialized).
    #[serde(skip)]
    pub source: String,
}

impl ContentItem {
    pub fn new(kind: ContentKind, body: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            kind,
            title: None,
            body: body.into(),
            url: url.into(),
            subreddit: None,
            created_utc: None,
            source: String::new(),
        }
    }

    pub fn post(body: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(ContentKind::Post, body, url)
    }

    pub fn comment(body: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(ContentKind::Comment, body, url)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        let t = title.into();
        self.title = if t.trim().is_empty() { None } else { Some(t) };
        self
    }

    pub fn with_subreddit(mut self, subreddit: Option<String>) -> Self {
        self.subreddit = subreddit.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn with_created_utc(mut self, ts: Option<f64>) -> Self {
        self.created_utc = ts;
        self
    }

    /// Items without a resolvable URL never enter the canonical record.
    pub fn has_url(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

/// Output of a single adapter, already split by category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceBatch {
    pub source: String,
    pub posts: Vec<ContentItem>,
    pub comments: Vec<ContentItem>,
}

impl SourceBatch {
    pub fn empty(source: &str) -> Self {
        Self {
            source: source.to_string(),
            ..Self::default()
        }
    }

    /// Tag items with their source, drop URL-less ones and split posts from comments.
    pub fn from_items(source: &str, items: Vec<ContentItem>) -> Self {
        let mut batch = Self::empty(source);
        for mut it in items {
            if !it.has_url() {
                continue;
            }
            it.source = source.to_string();
            match it.kind {
                ContentKind::Post => batch.posts.push(it),
                ContentKind::Comment => batch.comments.push(it),
            }
        }
        batch
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty() && self.comments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.posts.len() + self.comments.len()
    }
}

/// Best-effort content fetcher for one upstream (API, page scrape, feed).
#[async_trait::async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetch up to `limit` posts and `limit` comments for `handle`.
    async fn fetch(&self, handle: &str, limit: usize) -> Result<Vec<ContentItem>>;
    fn name(&self) -> &'static str;
}
