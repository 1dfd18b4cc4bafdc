// src/sources/old_reddit.rs
//! Unauthenticated scrape of the old.reddit.com profile page.
//! Degraded reliability: markup changes or bot walls simply yield fewer items.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;

use crate::sources::types::{ContentItem, ContentKind, ContentSource};
use crate::sources::{absolute_url, normalize_text};

pub const DEFAULT_PAGE_BASE: &str = "https://old.reddit.com";
pub const DEFAULT_MAX_PAGES: usize = 3;

static RE_THING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<div\s[^>]*class="[^"]*\bthing\b[^"]*"[^>]*>"#).expect("thing regex")
});
static RE_DATA_TYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bdata-type="([^"]*)""#).expect("data-type regex"));
static RE_PERMALINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bdata-permalink="([^"]*)""#).expect("data-permalink regex"));
static RE_SUBREDDIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bdata-subreddit="([^"]*)""#).expect("data-subreddit regex"));
static RE_TIMESTAMP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bdata-timestamp="(\d+)""#).expect("data-timestamp regex"));
static RE_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<a\s[^>]*class="[^"]*\btitle\b[^"]*"[^>]*>(.*?)</a>"#).expect("title regex")
});
static RE_BODY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)<div class="md">(.*?)</div>"#).expect("body regex"));
static RE_NEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<span class="next-button">\s*<a\s[^>]*href="([^"]+)""#).expect("next regex")
});

fn capture<'h>(re: &Regex, hay: &'h str) -> Option<&'h str> {
    re.captures(hay).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// One parsed profile page.
#[derive(Debug, Default)]
pub struct ProfilePage {
    pub items: Vec<ContentItem>,
    pub next_url: Option<String>,
}

/// Extract `thing` entries (comments and links) plus the pagination link.
pub fn parse_page(html: &str) -> ProfilePage {
    let starts: Vec<_> = RE_THING.find_iter(html).collect();
    let mut items = Vec::with_capacity(starts.len());

    for (i, m) in starts.iter().enumerate() {
        let tag = m.as_str();
        let end = starts.get(i + 1).map(|n| n.start()).unwrap_or(html.len());
        let chunk = &html[m.end()..end];

        let kind = match capture(&RE_DATA_TYPE, tag) {
            Some("comment") => ContentKind::Comment,
            Some("link") => ContentKind::Post,
            _ => continue,
        };
        let permalink = capture(&RE_PERMALINK, tag)
            .map(|p| html_escape::decode_html_entities(p).to_string())
            .unwrap_or_default();
        let body = capture(&RE_BODY, chunk).map(normalize_text).unwrap_or_default();
        let created = capture(&RE_TIMESTAMP, tag)
            .and_then(|t| t.parse::<f64>().ok())
            .map(|ms| ms / 1000.0);

        let mut item = ContentItem::new(kind, body, absolute_url(&permalink))
            .with_subreddit(capture(&RE_SUBREDDIT, tag).map(str::to_string))
            .with_created_utc(created);
        if kind == ContentKind::Post {
            if let Some(title) = capture(&RE_TITLE, chunk) {
                item = item.with_title(normalize_text(title));
            }
        }
        items.push(item);
    }

    let next_url = capture(&RE_NEXT, html).map(|u| html_escape::decode_html_entities(u).to_string());
    ProfilePage { items, next_url }
}

pub struct OldRedditPageSource {
    client: reqwest::Client,
    base_url: String,
    max_pages: usize,
}

impl OldRedditPageSource {
    pub fn new(user_agent: &str, timeout: Duration, max_pages: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .context("building old reddit client")?;
        Ok(Self {
            client,
            base_url: DEFAULT_PAGE_BASE.to_string(),
            max_pages: max_pages.max(1),
        })
    }

    pub fn with_base_url(mut self, base: &str) -> Self {
        self.base_url = base.trim_end_matches('/').to_string();
        self
    }

    async fn get_page(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("old reddit get {url}"))?;
        if !resp.status().is_success() {
            bail!("old reddit page returned {}", resp.status());
        }
        resp.text().await.context("old reddit .text()")
    }
}

#[async_trait]
impl ContentSource for OldRedditPageSource {
    async fn fetch(&self, handle: &str, limit: usize) -> Result<Vec<ContentItem>> {
        let mut url = format!("{}/user/{handle}/", self.base_url);
        let mut posts = Vec::new();
        let mut comments = Vec::new();

        for page_no in 0..self.max_pages {
            let html = match self.get_page(&url).await {
                Ok(html) => html,
                // First page failing means the whole scrape failed; later pages are a bonus.
                Err(e) if page_no == 0 => return Err(e),
                Err(e) => {
                    tracing::warn!(target: "sources", source = "old_reddit", page = page_no + 1, error = ?e, "stopping pagination");
                    break;
                }
            };
            let page = parse_page(&html);
            tracing::debug!(target: "sources", source = "old_reddit", page = page_no + 1, found = page.items.len(), "parsed page");

            for it in page.items {
                match it.kind {
                    ContentKind::Post if posts.len() < limit => posts.push(it),
                    ContentKind::Comment if comments.len() < limit => comments.push(it),
                    _ => {}
                }
            }
            if posts.len() >= limit && comments.len() >= limit {
                break;
            }
            match page.next_url {
                Some(next) if next != url => url = next,
                _ => break,
            }
        }

        posts.append(&mut comments);
        Ok(posts)
    }

    fn name(&self) -> &'static str {
        "old_reddit"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = include_str!("../../tests/fixtures/old_reddit_user.html");

    #[test]
    fn page_yields_links_and_comments_in_document_order() {
        let page = parse_page(PAGE);
        let kinds: Vec<_> = page.items.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![ContentKind::Comment, ContentKind::Post, ContentKind::Comment]
        );
    }

    #[test]
    fn comment_body_and_permalink_are_extracted() {
        let page = parse_page(PAGE);
        let c = &page.items[0];
        assert_eq!(c.body, "Rust's borrow checker & I are friends now.");
        assert_eq!(
            c.url,
            "https://www.reddit.com/r/rust/comments/xyz789/borrowck/c0ffee/"
        );
        assert_eq!(c.subreddit.as_deref(), Some("rust"));
        assert_eq!(c.created_utc, Some(1_700_000_000.0));
    }

    #[test]
    fn link_title_is_extracted() {
        let page = parse_page(PAGE);
        let p = &page.items[1];
        assert_eq!(p.title.as_deref(), Some("My first crate"));
        assert_eq!(p.body, "It parses things.");
    }

    #[test]
    fn next_link_is_decoded() {
        let page = parse_page(PAGE);
        assert_eq!(
            page.next_url.as_deref(),
            Some("https://old.reddit.com/user/ferris/?count=25&after=t1_c0ffee")
        );
    }

    #[test]
    fn markup_without_things_is_empty() {
        let page = parse_page("<html><body>Our CDN was unable to reach our servers</body></html>");
        assert!(page.items.is_empty());
        assert!(page.next_url.is_none());
    }
}
