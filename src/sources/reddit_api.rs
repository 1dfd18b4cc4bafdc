// src/sources/reddit_api.rs
//! Authenticated Reddit API adapter (OAuth client-credentials, app-only).

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::sources::types::{ContentItem, ContentKind, ContentSource};
use crate::sources::{absolute_url, normalize_text};

pub const DEFAULT_AUTH_BASE: &str = "https://www.reddit.com";
pub const DEFAULT_API_BASE: &str = "https://oauth.reddit.com";

#[derive(Debug, Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

pub struct RedditApiSource {
    client: reqwest::Client,
    credentials: Option<RedditCredentials>,
    auth_base: String,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct TokenResp {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}
#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Thing>,
}
#[derive(Debug, Deserialize)]
struct Thing {
    kind: String,
    data: ThingData,
}
#[derive(Debug, Deserialize)]
struct ThingData {
    title: Option<String>,
    selftext: Option<String>,
    body: Option<String>,
    subreddit: Option<String>,
    created_utc: Option<f64>,
    permalink: Option<String>,
}

/// Parse a Reddit listing (`t3` submissions and/or `t1` comments).
pub fn parse_listing(json: &str) -> Result<Vec<ContentItem>> {
    let listing: Listing = serde_json::from_str(json).context("parsing reddit listing json")?;
    let mut out = Vec::with_capacity(listing.data.children.len());
    for thing in listing.data.children {
        let d = thing.data;
        let (kind, raw_body) = match thing.kind.as_str() {
            "t3" => (ContentKind::Post, d.selftext),
            "t1" => (ContentKind::Comment, d.body),
            _ => continue,
        };
        let url = absolute_url(d.permalink.as_deref().unwrap_or_default());
        let mut item = ContentItem::new(kind, normalize_text(raw_body.as_deref().unwrap_or_default()), url)
            .with_subreddit(d.subreddit)
            .with_created_utc(d.created_utc);
        if let Some(title) = d.title.filter(|_| kind == ContentKind::Post) {
            item = item.with_title(normalize_text(&title));
        }
        out.push(item);
    }
    Ok(out)
}

impl RedditApiSource {
    /// `credentials == None` keeps the adapter in the chain but every fetch fails fast.
    pub fn new(credentials: Option<RedditCredentials>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .context("building reddit api client")?;
        Ok(Self {
            client,
            credentials,
            auth_base: DEFAULT_AUTH_BASE.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
        })
    }

    pub fn with_base_urls(mut self, auth_base: &str, api_base: &str) -> Self {
        self.auth_base = auth_base.trim_end_matches('/').to_string();
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    async fn access_token(&self, creds: &RedditCredentials) -> Result<String> {
        let resp = self
            .client
            .post(format!("{}/api/v1/access_token", self.auth_base))
            .basic_auth(&creds.client_id, Some(&creds.client_secret))
            .header(reqwest::header::USER_AGENT, &creds.user_agent)
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .context("reddit token request")?;
        if !resp.status().is_success() {
            bail!("reddit token endpoint returned {}", resp.status());
        }
        let token: TokenResp = resp.json().await.context("reddit token json")?;
        Ok(token.access_token)
    }

    async fn listing(
        &self,
        creds: &RedditCredentials,
        token: &str,
        handle: &str,
        section: &str,
        limit: usize,
    ) -> Result<Vec<ContentItem>> {
        let url = format!("{}/user/{handle}/{section}", self.api_base);
        let limit = limit.to_string();
        let resp = self
            .client
            .get(&url)
            .bearer_auth(token)
            .header(reqwest::header::USER_AGENT, &creds.user_agent)
            .query(&[("limit", limit.as_str()), ("sort", "new"), ("raw_json", "1")])
            .send()
            .await
            .with_context(|| format!("reddit {section} request"))?;
        if !resp.status().is_success() {
            bail!("reddit {section} listing returned {}", resp.status());
        }
        let body = resp.text().await.context("reddit listing .text()")?;
        parse_listing(&body)
    }
}

#[async_trait]
impl ContentSource for RedditApiSource {
    async fn fetch(&self, handle: &str, limit: usize) -> Result<Vec<ContentItem>> {
        let creds = self
            .credentials
            .as_ref()
            .ok_or_else(|| anyhow!("reddit api credentials are not configured"))?;
        let token = self.access_token(creds).await?;

        let (posts, comments) = tokio::join!(
            self.listing(creds, &token, handle, "submitted", limit),
            self.listing(creds, &token, handle, "comments", limit),
        );

        // One failing listing still leaves the other usable.
        let mut out = Vec::new();
        for (section, res) in [("submitted", posts), ("comments", comments)] {
            match res {
                Ok(mut v) => {
                    v.truncate(limit);
                    out.append(&mut v);
                }
                Err(e) => {
                    tracing::warn!(target: "sources", source = "reddit_api", section, error = ?e, "listing failed")
                }
            }
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "reddit_api"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = include_str!("../../tests/fixtures/reddit_listing.json");

    #[test]
    fn listing_maps_submissions_and_comments() {
        let items = parse_listing(LISTING).unwrap();
        assert_eq!(items.len(), 3);

        let post = &items[0];
        assert_eq!(post.kind, ContentKind::Post);
        assert_eq!(post.title.as_deref(), Some("Moving day"));
        assert_eq!(post.body, "We are moving the servers tonight & tomorrow.");
        assert_eq!(
            post.url,
            "https://www.reddit.com/r/announcements/comments/aaa111/moving_day/"
        );
        assert_eq!(post.subreddit.as_deref(), Some("announcements"));

        let comment = &items[1];
        assert_eq!(comment.kind, ContentKind::Comment);
        assert!(comment.title.is_none());
        assert_eq!(comment.body, "Thanks for the feedback, we hear you.");
    }

    #[test]
    fn listing_without_permalink_yields_empty_url() {
        let items = parse_listing(LISTING).unwrap();
        assert!(items[2].url.is_empty());
    }

    #[test]
    fn garbage_listing_is_an_error() {
        assert!(parse_listing("<html>rate limited</html>").is_err());
    }

    #[tokio::test]
    async fn missing_credentials_fail_fast() {
        let src = RedditApiSource::new(None, Duration::from_secs(1)).unwrap();
        assert!(src.fetch("spez", 5).await.is_err());
    }
}
