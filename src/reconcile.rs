// src/reconcile.rs
//! # Reconciliation
//! Pure merge of profile metadata and per-source batches into one canonical record.
//! No I/O, suitable for unit tests.
//!
//! Policy: batches are concatenated in the order given (declared source priority,
//! authoritative API first), each source capped per category *before* concatenation
//! so the worst-case prompt size is fixed regardless of how much a scraper returns.
//! No cross-source dedup: duplicates only lower information density.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::profile::ProfileMetadata;
use crate::sources::{ContentItem, ContentKind, SourceBatch};

pub const DEFAULT_PER_SOURCE_CAP: usize = 10;

/// Merged view of a user before LLM processing. Built fresh per request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalUserRecord {
    pub username: String,
    #[serde(flatten)]
    pub profile: ProfileMetadata,
    #[serde(default)]
    pub posts: Vec<ContentItem>,
    #[serde(default)]
    pub comments: Vec<ContentItem>,
}

impl CanonicalUserRecord {
    /// Posts first, then comments.
    pub fn content(&self) -> impl Iterator<Item = &ContentItem> {
        self.posts.iter().chain(self.comments.iter())
    }

    pub fn content_len(&self) -> usize {
        self.posts.len() + self.comments.len()
    }

    pub fn content_urls(&self) -> HashSet<&str> {
        self.content().map(|it| it.url.as_str()).collect()
    }

    /// Re-apply record invariants to a caller-supplied payload:
    /// URL-less items are dropped and `kind` follows the list an item sits in.
    pub fn normalized(mut self) -> Self {
        self.username = self.username.trim().to_string();
        self.posts.retain(ContentItem::has_url);
        self.comments.retain(ContentItem::has_url);
        for it in self.posts.iter_mut() {
            it.kind = ContentKind::Post;
        }
        for it in self.comments.iter_mut() {
            it.kind = ContentKind::Comment;
        }
        self
    }
}

fn take_capped(items: Vec<ContentItem>, cap: usize) -> impl Iterator<Item = ContentItem> {
    items.into_iter().filter(ContentItem::has_url).take(cap)
}

/// Merge metadata with batches in priority order, capping each source per category.
pub fn merge(
    username: &str,
    metadata: ProfileMetadata,
    batches: Vec<SourceBatch>,
    per_source_cap: usize,
) -> CanonicalUserRecord {
    let mut posts = Vec::new();
    let mut comments = Vec::new();

    for batch in batches {
        let (p0, c0) = (posts.len(), comments.len());
        posts.extend(take_capped(batch.posts, per_source_cap));
        comments.extend(take_capped(batch.comments, per_source_cap));
        tracing::debug!(
            target: "reconcile",
            source = %batch.source,
            posts = posts.len() - p0,
            comments = comments.len() - c0,
            "merged source batch"
        );
    }

    if posts.is_empty() && comments.is_empty() {
        tracing::info!(target: "reconcile", "no content from any source; record carries metadata only");
    }

    CanonicalUserRecord {
        username: username.to_string(),
        profile: metadata,
        posts,
        comments,
    }
}
