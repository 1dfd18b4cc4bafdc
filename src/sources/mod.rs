// src/sources/mod.rs
pub mod feed;
pub mod old_reddit;
pub mod reddit_api;
pub mod types;

pub use types::{ContentItem, ContentKind, ContentSource, SourceBatch};

use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const REDDIT_BASE_URL: &str = "https://www.reddit.com";
pub const MAX_BODY_CHARS: usize = 2000;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "persona_source_items_total",
            "Items accepted from content sources."
        );
        describe_counter!(
            "persona_source_errors_total",
            "Content source fetch/parse errors."
        );
        describe_counter!(
            "persona_source_timeouts_total",
            "Content source fetches cut by the per-source timeout."
        );
        describe_histogram!(
            "persona_source_fetch_ms",
            "Content source fetch time in milliseconds."
        );
    });
}

static RE_TAGS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<!--.*?-->|</?[a-z][^>]*>").expect("html tag regex")
});
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Normalize scraped/API text: strip markup, decode entities, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) Strip HTML tags and comments (tags become spaces so paragraphs don't glue)
    let out = RE_TAGS.replace_all(s, " ");

    // 2) HTML entity decode (after stripping, so escaped `&lt;b&gt;` stays literal)
    let mut out = html_escape::decode_html_entities(&out).to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    out = RE_WS.replace_all(&out, " ").trim().to_string();

    // 5) Length cap
    if out.chars().count() > MAX_BODY_CHARS {
        out = out.chars().take(MAX_BODY_CHARS).collect();
    }

    out
}

/// Turn a Reddit permalink into an absolute URL. Empty input stays empty.
pub fn absolute_url(permalink: &str) -> String {
    let p = permalink.trim();
    if p.is_empty() {
        String::new()
    } else if p.starts_with("http://") || p.starts_with("https://") {
        p.to_string()
    } else if p.starts_with('/') {
        format!("{REDDIT_BASE_URL}{p}")
    } else {
        format!("{REDDIT_BASE_URL}/{p}")
    }
}

/// Run one source under a hard timeout. Never fails: errors degrade to an empty batch.
pub async fn fetch_best_effort(
    source: &dyn ContentSource,
    handle: &str,
    limit: usize,
    timeout: Duration,
) -> SourceBatch {
    ensure_metrics_described();
    let name = source.name();
    let t0 = Instant::now();

    let items = match tokio::time::timeout(timeout, source.fetch(handle, limit)).await {
        Ok(Ok(items)) => items,
        Ok(Err(e)) => {
            tracing::warn!(target: "sources", source = name, error = ?e, "source fetch failed");
            counter!("persona_source_errors_total", "source" => name).increment(1);
            Vec::new()
        }
        Err(_) => {
            tracing::warn!(
                target: "sources",
                source = name,
                timeout_ms = timeout.as_millis() as u64,
                "source fetch timed out"
            );
            counter!("persona_source_timeouts_total", "source" => name).increment(1);
            Vec::new()
        }
    };

    let batch = SourceBatch::from_items(name, items);
    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("persona_source_fetch_ms", "source" => name).record(ms);
    counter!("persona_source_items_total", "source" => name).increment(batch.len() as u64);
    tracing::info!(
        target: "sources",
        source = name,
        posts = batch.posts.len(),
        comments = batch.comments.len(),
        elapsed_ms = ms as u64,
        "source fetch finished"
    );
    batch
}

/// Fetch from every source concurrently; results come back in declared order.
/// A slow or failing source only empties its own slot.
pub async fn collect_all(
    sources: &[Arc<dyn ContentSource>],
    handle: &str,
    limit: usize,
    timeout: Duration,
) -> Vec<SourceBatch> {
    let tasks: Vec<_> = sources
        .iter()
        .map(|src| {
            let src = Arc::clone(src);
            let handle = handle.to_string();
            let name = src.name();
            let task = tokio::spawn(async move {
                fetch_best_effort(src.as_ref(), &handle, limit, timeout).await
            });
            (name, task)
        })
        .collect();

    let mut out = Vec::with_capacity(tasks.len());
    for (name, task) in tasks {
        match task.await {
            Ok(batch) => out.push(batch),
            Err(e) => {
                tracing::error!(target: "sources", source = name, error = ?e, "source task panicked");
                counter!("persona_source_errors_total", "source" => name).increment(1);
                out.push(SourceBatch::empty(name));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_strips_markup_and_collapses_ws() {
        let s = "<!-- SC_OFF --><div class=\"md\"><p>Hello&nbsp;&amp;\n\n world</p><p>“ok”</p></div>";
        assert_eq!(normalize_text(s), r#"Hello & world "ok""#);
    }

    #[test]
    fn normalize_text_keeps_escaped_angle_brackets_literal() {
        assert_eq!(normalize_text("use &lt;b&gt; tags"), "use <b> tags");
    }

    #[test]
    fn normalize_text_caps_length() {
        let long = "x".repeat(MAX_BODY_CHARS + 50);
        assert_eq!(normalize_text(&long).chars().count(), MAX_BODY_CHARS);
    }

    #[test]
    fn absolute_url_handles_relative_and_absolute() {
        assert_eq!(
            absolute_url("/r/rust/comments/abc/x/"),
            "https://www.reddit.com/r/rust/comments/abc/x/"
        );
        assert_eq!(absolute_url("https://example.test/a"), "https://example.test/a");
        assert_eq!(absolute_url("  "), "");
    }
}
