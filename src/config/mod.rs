// src/config/mod.rs
//! Service configuration (`config/persona.toml`), with env indirection for secrets.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs};

use crate::persona::{DEFAULT_MAX_ATTEMPTS, DEFAULT_PROMPT_CHAR_BUDGET};
use crate::reconcile::DEFAULT_PER_SOURCE_CAP;
use crate::sources::old_reddit::DEFAULT_MAX_PAGES;

pub const DEFAULT_CONFIG_PATH: &str = "config/persona.toml";
pub const ENV_CONFIG_PATH: &str = "PERSONA_CONFIG_PATH";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36";

pub const SOURCE_REDDIT_API: &str = "reddit_api";
pub const SOURCE_OLD_REDDIT: &str = "old_reddit";
pub const SOURCE_USER_FEED: &str = "user_feed";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaConfig {
    pub sources: SourcesConfig,
    pub reddit_api: RedditApiConfig,
    pub metadata: MetadataConfig,
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Declared priority: earlier sources occupy the head of each content list.
    pub order: Vec<String>,
    pub per_source_cap: usize,
    pub fetch_limit: usize,
    pub timeout_secs: u64,
    pub max_pages: usize,
    pub user_agent: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            order: vec![
                SOURCE_REDDIT_API.to_string(),
                SOURCE_OLD_REDDIT.to_string(),
                SOURCE_USER_FEED.to_string(),
            ],
            per_source_cap: DEFAULT_PER_SOURCE_CAP,
            fetch_limit: 20,
            timeout_secs: 20,
            max_pages: DEFAULT_MAX_PAGES,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// "ENV" (case-insensitive) in a secret field means: read the variable named by `*_env`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditApiConfig {
    pub client_id: String,
    pub client_id_env: String,
    pub client_secret: String,
    pub client_secret_env: String,
    pub user_agent: String,
    pub user_agent_env: String,
}

impl Default for RedditApiConfig {
    fn default() -> Self {
        Self {
            client_id: "ENV".into(),
            client_id_env: "REDDIT_CLIENT_ID".into(),
            client_secret: "ENV".into(),
            client_secret_env: "REDDIT_CLIENT_SECRET".into(),
            user_agent: "ENV".into(),
            user_agent_env: "REDDIT_USER_AGENT".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    pub timeout_secs: u64,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub max_attempts: usize,
    pub prompt_char_budget: usize,
    /// Tried in order.
    pub providers: Vec<ProviderConfig>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            prompt_char_budget: DEFAULT_PROMPT_CHAR_BUDGET,
            providers: vec![ProviderConfig::default()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub name: String,
    pub endpoint: String,
    pub api_key: String,
    pub api_key_env: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: "openrouter".into(),
            endpoint: "https://openrouter.ai/api/v1/chat/completions".into(),
            api_key: "ENV".into(),
            api_key_env: "OPENROUTER_KEY".into(),
            model: "google/gemma-3n-e2b-it:free".into(),
            timeout_secs: 30,
        }
    }
}

/// Resolve a secret value; `None` when empty or when the referenced env var is unset/empty.
pub fn resolve_secret(value: &str, env_name: &str) -> Option<String> {
    let v = value.trim();
    let resolved = if v.eq_ignore_ascii_case("env") {
        env::var(env_name.trim()).ok()?
    } else {
        v.to_string()
    };
    let resolved = resolved.trim().to_string();
    (!resolved.is_empty()).then_some(resolved)
}

impl ProviderConfig {
    pub fn api_key(&self) -> Option<String> {
        resolve_secret(&self.api_key, &self.api_key_env)
    }
}

impl PersonaConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading persona config from {}", path.display()))?;
        let cfg: PersonaConfig = toml::from_str(&data)
            .with_context(|| format!("parsing persona config {}", path.display()))?;
        Ok(cfg.sanitized())
    }

    /// 1) $PERSONA_CONFIG_PATH (must exist)
    /// 2) config/persona.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from_file(&pb);
            }
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default_p.exists() {
            return Self::load_from_file(&default_p);
        }
        Ok(Self::default().sanitized())
    }

    /// Replace unusable numbers with defaults and normalize names.
    pub fn sanitized(mut self) -> Self {
        let d = SourcesConfig::default();
        let s = &mut self.sources;
        s.order = s
            .order
            .iter()
            .map(|n| n.trim().to_ascii_lowercase())
            .filter(|n| !n.is_empty())
            .collect();
        if s.per_source_cap == 0 {
            s.per_source_cap = d.per_source_cap;
        }
        if s.fetch_limit == 0 {
            s.fetch_limit = d.fetch_limit;
        }
        if s.timeout_secs == 0 {
            s.timeout_secs = d.timeout_secs;
        }
        if s.max_pages == 0 {
            s.max_pages = d.max_pages;
        }
        if s.user_agent.trim().is_empty() {
            s.user_agent = d.user_agent;
        }
        if self.metadata.timeout_secs == 0 {
            self.metadata.timeout_secs = MetadataConfig::default().timeout_secs;
        }
        if self.llm.max_attempts == 0 {
            self.llm.max_attempts = DEFAULT_MAX_ATTEMPTS;
        }
        if self.llm.prompt_char_budget == 0 {
            self.llm.prompt_char_budget = DEFAULT_PROMPT_CHAR_BUDGET;
        }
        for p in self.llm.providers.iter_mut() {
            if p.timeout_secs == 0 {
                p.timeout_secs = ProviderConfig::default().timeout_secs;
            }
        }
        self
    }
}
