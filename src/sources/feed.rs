// src/sources/feed.rs
//! Unauthenticated Atom feed of a user's profile (`/user/<handle>/.rss`).

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;
use std::time::Duration;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::sources::types::{ContentItem, ContentKind, ContentSource};
use crate::sources::{absolute_url, normalize_text, REDDIT_BASE_URL};

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(rename = "entry", default)]
    entries: Vec<Entry>,
}
#[derive(Debug, Deserialize)]
struct Entry {
    id: Option<String>,
    title: Option<String>,
    link: Option<Link>,
    content: Option<Content>,
    updated: Option<String>,
    category: Option<Category>,
}
#[derive(Debug, Deserialize)]
struct Link {
    #[serde(rename = "@href")]
    href: String,
}
#[derive(Debug, Deserialize)]
struct Content {
    #[serde(rename = "$text", default)]
    text: String,
}
#[derive(Debug, Deserialize)]
struct Category {
    #[serde(rename = "@term")]
    term: Option<String>,
}

fn parse_rfc3339_to_unix(ts: &str) -> Option<f64> {
    OffsetDateTime::parse(ts.trim(), &Rfc3339)
        .ok()
        .map(|dt| dt.unix_timestamp() as f64)
}

/// Parse the Atom document; `t1_*` ids are comments, `t3_*` posts, anything else is skipped.
pub fn parse_feed(xml: &str) -> Result<Vec<ContentItem>> {
    let feed: Feed = from_str(xml).context("parsing user atom feed")?;
    let mut out = Vec::with_capacity(feed.entries.len());
    for e in feed.entries {
        let kind = match e.id.as_deref().map(str::trim) {
            Some(id) if id.starts_with("t1_") => ContentKind::Comment,
            Some(id) if id.starts_with("t3_") => ContentKind::Post,
            _ => continue,
        };
        let url = absolute_url(e.link.as_ref().map(|l| l.href.as_str()).unwrap_or_default());
        let body = e.content.map(|c| normalize_text(&c.text)).unwrap_or_default();
        let mut item = ContentItem::new(kind, body, url)
            .with_subreddit(e.category.and_then(|c| c.term))
            .with_created_utc(e.updated.as_deref().and_then(parse_rfc3339_to_unix));
        if kind == ContentKind::Post {
            if let Some(title) = e.title {
                item = item.with_title(normalize_text(&title));
            }
        }
        out.push(item);
    }
    Ok(out)
}

pub struct UserFeedSource {
    client: reqwest::Client,
    base_url: String,
}

impl UserFeedSource {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .context("building feed client")?;
        Ok(Self {
            client,
            base_url: REDDIT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base: &str) -> Self {
        self.base_url = base.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl ContentSource for UserFeedSource {
    async fn fetch(&self, handle: &str, limit: usize) -> Result<Vec<ContentItem>> {
        let url = format!("{}/user/{handle}/.rss", self.base_url);
        let limit_s = (limit * 2).to_string();
        let resp = self
            .client
            .get(&url)
            .query(&[("limit", limit_s.as_str())])
            .send()
            .await
            .context("feed http get()")?;
        if !resp.status().is_success() {
            bail!("user feed returned {}", resp.status());
        }
        let body = resp.text().await.context("feed http .text()")?;
        let items = parse_feed(&body)?;

        let (mut posts, mut comments): (Vec<_>, Vec<_>) =
            items.into_iter().partition(|i| i.kind == ContentKind::Post);
        posts.truncate(limit);
        comments.truncate(limit);
        posts.append(&mut comments);
        Ok(posts)
    }

    fn name(&self) -> &'static str {
        "user_feed"
    }
}
