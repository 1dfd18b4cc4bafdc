// tests/common/mod.rs
// Test doubles shared by the integration tests. No network, no global recorder.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;

use reddit_persona::llm::{CompletionFuture, CompletionProvider};
use reddit_persona::profile::{ProfileFetcher, ProfileMetadata};
use reddit_persona::sources::{ContentItem, ContentSource};

/// A schema-valid persona document citing the URL used by [`sample_items`].
pub fn valid_persona_json() -> String {
    json!({
        "introversion_extroversion": 3,
        "intuition_sensing": 7,
        "feeling_thinking": 8,
        "perceiving_judging": 6,
        "behaviors_and_habits": [{"text": "Ships side projects on weekends", "url": "https://www.reddit.com/r/rust/comments/p0/post_0/"}],
        "goals_and_needs": [{"text": "Wants feedback on code", "url": "https://www.reddit.com/r/rust/comments/p0/post_0/"}],
        "frustrations": [{"text": "Borrow checker fights", "url": "https://www.reddit.com/r/rust/comments/p0/post_0/"}],
        "motivations": [{"text": "Learning by building", "url": "https://www.reddit.com/r/rust/comments/p0/post_0/"}],
        "keywords": ["curious", "builder", "patient", "technical"],
        "personality_type": "INTJ"
    })
    .to_string()
}

/// `n` posts with distinct URLs, tagged by `prefix`.
pub fn sample_items(prefix: &str, n: usize) -> Vec<ContentItem> {
    (0..n)
        .map(|i| {
            ContentItem::post(
                format!("{prefix} body {i}"),
                format!("https://www.reddit.com/r/rust/comments/{prefix}{i}/post_{i}/"),
            )
            .with_title(format!("{prefix} title {i}"))
        })
        .collect()
}

/// Source returning fixed items, optionally after a delay or as an error.
pub struct StubSource {
    pub name: &'static str,
    pub items: Vec<ContentItem>,
    pub delay: Option<Duration>,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl StubSource {
    pub fn new(name: &'static str, items: Vec<ContentItem>) -> Self {
        Self {
            name,
            items,
            delay: None,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

#[async_trait]
impl ContentSource for StubSource {
    async fn fetch(&self, _handle: &str, limit: usize) -> anyhow::Result<Vec<ContentItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        if self.fail {
            anyhow::bail!("stub source {} is down", self.name);
        }
        Ok(self.items.iter().take(limit).cloned().collect())
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Metadata fetcher returning a fixed record (default = everything absent).
#[derive(Default)]
pub struct StubFetcher {
    pub meta: ProfileMetadata,
    pub delay: Option<Duration>,
}

#[async_trait]
impl ProfileFetcher for StubFetcher {
    async fn fetch_metadata(&self, _handle: &str) -> ProfileMetadata {
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        self.meta.clone()
    }
}

/// Provider that replays a script; `None` entries are transport failures.
/// Once the script runs out the last entry repeats.
pub struct ScriptedProvider {
    script: Vec<Option<String>>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Option<String>>) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

impl CompletionProvider for ScriptedProvider {
    fn complete<'a>(&'a self, prompt: &'a str) -> CompletionFuture<'a> {
        let i = self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt.to_string());
        let step = self
            .script
            .get(i)
            .or_else(|| self.script.last())
            .cloned()
            .flatten();
        Box::pin(async move {
            match step {
                Some(text) => Ok(text),
                None => Err(anyhow::anyhow!("scripted transport failure")),
            }
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
