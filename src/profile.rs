// src/profile.rs
//! Profile-level metadata (`about.json`) and user identifier handling.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use metrics::counter;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::sources::REDDIT_BASE_URL;

const PROFILE_URL_MARKER: &str = "reddit.com/user/";

static RE_HANDLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,20}$").expect("handle regex"));

/// Pull the handle out of a profile URL (`.../user/<handle>/...`) or take the trimmed input.
pub fn extract_handle(input: &str) -> String {
    let input = input.trim();
    if let Some(pos) = input.find(PROFILE_URL_MARKER) {
        let rest = &input[pos + PROFILE_URL_MARKER.len()..];
        let rest = rest.split(['?', '#']).next().unwrap_or_default();
        return rest
            .trim_end_matches('/')
            .split('/')
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();
    }
    input.strip_prefix("u/").unwrap_or(input).to_string()
}

/// Reddit usernames: 1..=20 chars of letters, digits, `_` and `-`.
pub fn is_valid_handle(handle: &str) -> bool {
    RE_HANDLE.is_match(handle)
}

/// Profile facts. Every field is optional; absence is a valid terminal state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileMetadata {
    pub name: Option<String>,
    pub profile_picture: Option<String>,
    pub snoovatar: Option<String>,
    pub occupation: Option<String>,
    pub status: Option<String>,
    pub location: Option<String>,
    pub comment_karma: Option<i64>,
    pub post_karma: Option<i64>,
    pub total_karma: Option<i64>,
    pub created_utc: Option<f64>,
    pub is_mod: Option<bool>,
    pub is_gold: Option<bool>,
    pub verified: Option<bool>,
    pub has_verified_email: Option<bool>,
    pub accept_chats: Option<bool>,
    pub accept_pms: Option<bool>,
    pub accept_followers: Option<bool>,
}

impl ProfileMetadata {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Debug, Deserialize)]
struct About {
    data: AboutData,
}
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AboutData {
    name: Option<String>,
    icon_img: Option<String>,
    snoovatar_img: Option<String>,
    comment_karma: Option<i64>,
    link_karma: Option<i64>,
    total_karma: Option<i64>,
    created_utc: Option<f64>,
    is_mod: Option<bool>,
    is_gold: Option<bool>,
    verified: Option<bool>,
    has_verified_email: Option<bool>,
    accept_chats: Option<bool>,
    accept_pms: Option<bool>,
    accept_followers: Option<bool>,
    subreddit: Option<ProfileSubreddit>,
}
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProfileSubreddit {
    public_description: Option<String>,
    title: Option<String>,
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn image_url(v: Option<String>) -> Option<String> {
    non_empty(v).map(|s| html_escape::decode_html_entities(&s).to_string())
}

/// Map an `about.json` document onto [`ProfileMetadata`].
pub fn parse_about(json: &str) -> Result<ProfileMetadata> {
    let about: About = serde_json::from_str(json).context("parsing about.json")?;
    let d = about.data;
    let sub = d.subreddit.unwrap_or_default();
    Ok(ProfileMetadata {
        name: non_empty(d.name),
        profile_picture: image_url(d.icon_img),
        snoovatar: image_url(d.snoovatar_img),
        occupation: non_empty(sub.public_description),
        status: non_empty(sub.title),
        // Reddit exposes no location field.
        location: None,
        comment_karma: d.comment_karma,
        post_karma: d.link_karma,
        total_karma: d.total_karma,
        created_utc: d.created_utc,
        is_mod: d.is_mod,
        is_gold: d.is_gold,
        verified: d.verified,
        has_verified_email: d.has_verified_email,
        accept_chats: d.accept_chats,
        accept_pms: d.accept_pms,
        accept_followers: d.accept_followers,
    })
}

/// Single best-effort metadata lookup; failures yield an all-absent record.
#[async_trait]
pub trait ProfileFetcher: Send + Sync {
    async fn fetch_metadata(&self, handle: &str) -> ProfileMetadata;
}

pub struct RedditAboutFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl RedditAboutFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .context("building about.json client")?;
        Ok(Self {
            client,
            base_url: REDDIT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base: &str) -> Self {
        self.base_url = base.trim_end_matches('/').to_string();
        self
    }

    async fn try_fetch(&self, handle: &str) -> Result<ProfileMetadata> {
        let url = format!("{}/user/{handle}/about.json", self.base_url);
        let resp = self.client.get(&url).send().await.context("about.json get()")?;
        if !resp.status().is_success() {
            bail!("about.json returned {}", resp.status());
        }
        let body = resp.text().await.context("about.json .text()")?;
        parse_about(&body)
    }
}

#[async_trait]
impl ProfileFetcher for RedditAboutFetcher {
    async fn fetch_metadata(&self, handle: &str) -> ProfileMetadata {
        match self.try_fetch(handle).await {
            Ok(meta) => meta,
            Err(e) => {
                tracing::warn!(target: "profile", error = ?e, "metadata fetch failed");
                counter!("persona_metadata_errors_total").increment(1);
                ProfileMetadata::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_from_profile_url() {
        assert_eq!(extract_handle("https://www.reddit.com/user/spez/"), "spez");
        assert_eq!(extract_handle("https://www.reddit.com/user/kojied"), "kojied");
        assert_eq!(
            extract_handle("https://old.reddit.com/user/spez/comments/?sort=top"),
            "spez"
        );
    }

    #[test]
    fn handle_from_raw_input_is_trimmed() {
        assert_eq!(extract_handle("  spez  "), "spez");
        assert_eq!(extract_handle("u/spez"), "spez");
    }

    #[test]
    fn handle_validation() {
        assert!(is_valid_handle("spez"));
        assert!(is_valid_handle("Some_User-42"));
        assert!(!is_valid_handle(""));
        assert!(!is_valid_handle("has space"));
        assert!(!is_valid_handle("waaaaaaaaaaaaaaaaaaaay_too_long"));
    }

    #[test]
    fn about_maps_fields_and_drops_empty_strings() {
        let json = r#"{"kind":"t2","data":{
            "name":"spez","icon_img":"https://styles.redditmedia.com/a.png?width=256&amp;s=1",
            "snoovatar_img":"","comment_karma":10,"link_karma":20,"total_karma":30,
            "created_utc":1118030400.0,"is_mod":true,"is_gold":false,"verified":true,
            "has_verified_email":true,"accept_followers":true,
            "subreddit":{"public_description":"CEO","title":" "}}}"#;
        let m = parse_about(json).unwrap();
        assert_eq!(m.name.as_deref(), Some("spez"));
        assert_eq!(
            m.profile_picture.as_deref(),
            Some("https://styles.redditmedia.com/a.png?width=256&s=1")
        );
        assert!(m.snoovatar.is_none());
        assert_eq!(m.post_karma, Some(20));
        assert_eq!(m.occupation.as_deref(), Some("CEO"));
        assert!(m.status.is_none());
        assert!(m.location.is_none());
        assert!(m.accept_chats.is_none());
    }

    #[test]
    fn suspended_profile_is_sparse_not_error() {
        let m = parse_about(r#"{"kind":"t2","data":{"is_suspended":true,"name":"gone"}}"#).unwrap();
        assert_eq!(m.name.as_deref(), Some("gone"));
        assert!(m.total_karma.is_none());
    }

    #[tokio::test]
    async fn unreachable_endpoint_yields_absent_record() {
        let f = RedditAboutFetcher::new("test-agent", Duration::from_millis(300))
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        let m = f.fetch_metadata("spez").await;
        assert!(m.is_empty());
    }
}
