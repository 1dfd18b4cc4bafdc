// src/bootstrap.rs
use crate::config::{
    resolve_secret, PersonaConfig, SOURCE_OLD_REDDIT, SOURCE_REDDIT_API, SOURCE_USER_FEED,
};
use crate::llm::{ChatCompletionsProvider, DynProvider, LlmGateway, MockProvider};
use crate::profile::RedditAboutFetcher;
use crate::service::{PersonaService, ServiceSettings};
use crate::sources::feed::UserFeedSource;
use crate::sources::old_reddit::OldRedditPageSource;
use crate::sources::reddit_api::{RedditApiSource, RedditCredentials};
use crate::sources::ContentSource;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// `AI_TEST_MODE=mock` swaps every configured provider for a deterministic mock.
pub fn mock_mode() -> bool {
    std::env::var("AI_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
}

/// Build the provider chain in configured order. Providers without a key are skipped.
pub fn build_gateway(cfg: &PersonaConfig) -> anyhow::Result<LlmGateway> {
    if mock_mode() {
        info!("AI_TEST_MODE=mock: using mock completion provider");
        return Ok(LlmGateway::new(vec![Arc::new(MockProvider::persona())]));
    }

    let mut providers: Vec<DynProvider> = Vec::with_capacity(cfg.llm.providers.len());
    for p in &cfg.llm.providers {
        let Some(key) = p.api_key() else {
            warn!(provider = %p.name, "no api key resolved; provider skipped");
            continue;
        };
        let provider = ChatCompletionsProvider::new(
            &p.name,
            &p.endpoint,
            &key,
            &p.model,
            Duration::from_secs(p.timeout_secs),
        )?;
        providers.push(Arc::new(provider));
    }
    if providers.is_empty() {
        warn!("no LLM providers available; persona generation will report no response");
    }
    Ok(LlmGateway::new(providers))
}

fn reddit_credentials(cfg: &PersonaConfig) -> Option<RedditCredentials> {
    let api = &cfg.reddit_api;
    let client_id = resolve_secret(&api.client_id, &api.client_id_env)?;
    let client_secret = resolve_secret(&api.client_secret, &api.client_secret_env)?;
    let user_agent = resolve_secret(&api.user_agent, &api.user_agent_env)
        .unwrap_or_else(|| cfg.sources.user_agent.clone());
    Some(RedditCredentials {
        client_id,
        client_secret,
        user_agent,
    })
}

/// Sources in declared order; unknown names are logged and ignored.
pub fn build_sources(cfg: &PersonaConfig) -> anyhow::Result<Vec<Arc<dyn ContentSource>>> {
    let s = &cfg.sources;
    let timeout = Duration::from_secs(s.timeout_secs);
    let mut out: Vec<Arc<dyn ContentSource>> = Vec::with_capacity(s.order.len());

    for name in &s.order {
        let source: Arc<dyn ContentSource> = match name.as_str() {
            SOURCE_REDDIT_API => {
                let creds = reddit_credentials(cfg);
                if creds.is_none() {
                    warn!(source = SOURCE_REDDIT_API, "reddit api credentials missing; source will yield nothing");
                }
                Arc::new(RedditApiSource::new(creds, timeout)?)
            }
            SOURCE_OLD_REDDIT => Arc::new(OldRedditPageSource::new(&s.user_agent, timeout, s.max_pages)?),
            SOURCE_USER_FEED => Arc::new(UserFeedSource::new(&s.user_agent, timeout)?),
            other => {
                warn!(source = other, "unknown source in config; ignored");
                continue;
            }
        };
        out.push(source);
    }
    Ok(out)
}

pub fn build_service(cfg: &PersonaConfig) -> anyhow::Result<PersonaService> {
    let sources = build_sources(cfg)?;
    let metadata = Arc::new(RedditAboutFetcher::new(
        &cfg.sources.user_agent,
        Duration::from_secs(cfg.metadata.timeout_secs),
    )?);
    let gateway = build_gateway(cfg)?;
    let settings = ServiceSettings {
        per_source_cap: cfg.sources.per_source_cap,
        fetch_limit: cfg.sources.fetch_limit,
        source_timeout: Duration::from_secs(cfg.sources.timeout_secs),
        max_attempts: cfg.llm.max_attempts,
        prompt_char_budget: cfg.llm.prompt_char_budget,
    };

    let service = PersonaService::new(sources, metadata, gateway, settings);
    // Safe diagnostics: names and counts only, never keys.
    info!(
        sources = ?service.source_names(),
        providers = ?service.gateway().provider_names(),
        max_attempts = settings.max_attempts,
        "persona service ready"
    );
    Ok(service)
}
