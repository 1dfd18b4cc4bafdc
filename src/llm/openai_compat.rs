// src/llm/openai_compat.rs
//! OpenAI-compatible Chat Completions provider (OpenRouter, OpenAI, local gateways).

use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use serde::{Deserialize, Serialize};

use crate::llm::{CompletionFuture, CompletionProvider};

pub struct ChatCompletionsProvider {
    http: reqwest::Client,
    name: String,
    endpoint: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}
#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
}
#[derive(Deserialize)]
struct Resp {
    #[serde(default)]
    choices: Vec<Choice>,
}
#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}
#[derive(Deserialize)]
struct ChoiceMsg {
    #[serde(default)]
    content: Option<String>,
}

/// Pull the first choice's text out of a Chat Completions response body.
pub fn extract_content(body: &str) -> anyhow::Result<String> {
    let resp: Resp = serde_json::from_str(body).context("chat completions json")?;
    resp.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|s| s.trim().to_string())
        .ok_or_else(|| anyhow!("response has no choices/content"))
}

impl ChatCompletionsProvider {
    pub fn new(
        name: &str,
        endpoint: &str,
        api_key: &str,
        model: &str,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("reddit-persona/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()
            .context("building llm http client")?;
        Ok(Self {
            http,
            name: name.to_string(),
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            timeout,
        })
    }

    async fn complete_impl(&self, prompt: &str) -> anyhow::Result<String> {
        if self.api_key.is_empty() {
            bail!("no api key configured");
        }
        let req = Req {
            model: &self.model,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
        };
        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("chat completions request")?;

        let status = resp.status();
        let body = resp.text().await.context("chat completions .text()")?;
        if !status.is_success() {
            let snippet: String = body.chars().take(300).collect();
            bail!("provider returned {status}: {snippet}");
        }
        extract_content(&body)
    }
}

impl CompletionProvider for ChatCompletionsProvider {
    fn complete<'a>(&'a self, prompt: &'a str) -> CompletionFuture<'a> {
        Box::pin(self.complete_impl(prompt))
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn timeout(&self) -> Duration {
        self.timeout
    }
}
