//! LLM gateway: ordered provider fallback with per-provider timeouts.
//! Provider failures are soft; only "every provider failed" reaches the caller (as `None`).

pub mod openai_compat;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;

pub use openai_compat::ChatCompletionsProvider;

pub const DEFAULT_COMPLETION_TIMEOUT: Duration = Duration::from_secs(30);

/// Boxed future returned by providers (object-safe async).
pub type CompletionFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>>;

/// One backend that turns a prompt into completion text.
pub trait CompletionProvider: Send + Sync {
    fn complete<'a>(&'a self, prompt: &'a str) -> CompletionFuture<'a>;
    /// Provider name for diagnostics/metrics.
    fn name(&self) -> &str;
    fn timeout(&self) -> Duration {
        DEFAULT_COMPLETION_TIMEOUT
    }
}

/// Convenient alias used by callers.
pub type DynProvider = Arc<dyn CompletionProvider>;

/// First non-empty completion and the provider that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub provider: String,
    pub text: String,
}

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "persona_llm_provider_errors_total",
            "LLM provider failures (status, transport, timeout, empty body)."
        );
        describe_counter!(
            "persona_llm_exhausted_total",
            "Gateway calls where every provider failed."
        );
        describe_histogram!("persona_llm_latency_ms", "Provider completion latency in milliseconds.");
    });
}

#[derive(Clone, Default)]
pub struct LlmGateway {
    providers: Vec<DynProvider>,
}

impl LlmGateway {
    pub fn new(providers: Vec<DynProvider>) -> Self {
        Self { providers }
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    /// Try providers in order; return the first non-empty completion.
    pub async fn complete(&self, prompt: &str) -> Option<Completion> {
        ensure_metrics_described();

        for provider in &self.providers {
            let name = provider.name().to_string();
            let t0 = Instant::now();
            tracing::info!(target: "llm", provider = %name, prompt_chars = prompt.chars().count(), "calling provider");

            let failure = match tokio::time::timeout(provider.timeout(), provider.complete(prompt)).await {
                Ok(Ok(text)) => {
                    let text = text.trim().to_string();
                    if !text.is_empty() {
                        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
                        histogram!("persona_llm_latency_ms", "provider" => name.clone()).record(ms);
                        tracing::info!(target: "llm", provider = %name, chars = text.len(), elapsed_ms = ms as u64, "completion received");
                        return Some(Completion { provider: name, text });
                    }
                    "empty completion".to_string()
                }
                Ok(Err(e)) => format!("{e:#}"),
                Err(_) => format!("timed out after {}s", provider.timeout().as_secs()),
            };

            tracing::warn!(target: "llm", provider = %name, error = %failure, "provider failed; falling through");
            counter!("persona_llm_provider_errors_total", "provider" => name).increment(1);
        }

        tracing::warn!(target: "llm", providers = self.providers.len(), "all providers exhausted");
        counter!("persona_llm_exhausted_total").increment(1);
        None
    }
}

/// Deterministic provider for tests/local runs.
#[derive(Clone)]
pub struct MockProvider {
    pub fixed: String,
}

impl MockProvider {
    /// A provider that always answers with a schema-valid persona document.
    pub fn persona() -> Self {
        Self {
            fixed: MOCK_PERSONA_JSON.to_string(),
        }
    }
}

impl CompletionProvider for MockProvider {
    fn complete<'a>(&'a self, _prompt: &'a str) -> CompletionFuture<'a> {
        let out = self.fixed.clone();
        Box::pin(async move { Ok(out) })
    }
    fn name(&self) -> &str {
        "mock"
    }
}

pub const MOCK_PERSONA_JSON: &str = r#"{"introversion_extroversion":5,"intuition_sensing":5,"feeling_thinking":5,"perceiving_judging":5,"behaviors_and_habits":[{"text":"Neutral persona (mock).","url":"https://www.reddit.com/"}],"goals_and_needs":[{"text":"Neutral persona (mock).","url":"https://www.reddit.com/"}],"frustrations":[{"text":"Neutral persona (mock).","url":"https://www.reddit.com/"}],"motivations":[{"text":"Neutral persona (mock).","url":"https://www.reddit.com/"}],"keywords":["balanced","calm","steady","plain"],"personality_type":null,"emotional_regulation":null}"#;
