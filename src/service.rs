// src/service.rs
//! The two request/response operations: resolve a user, generate a persona.
//! Stateless per call; collaborators are injected so each can be swapped for a test double.

use std::sync::Arc;
use std::time::Duration;

use crate::error::PersonaError;
use crate::llm::LlmGateway;
use crate::persona::{PersonaGenerator, PersonaRecord, DEFAULT_MAX_ATTEMPTS, DEFAULT_PROMPT_CHAR_BUDGET};
use crate::profile::{extract_handle, is_valid_handle, ProfileFetcher, ProfileMetadata};
use crate::reconcile::{merge, CanonicalUserRecord, DEFAULT_PER_SOURCE_CAP};
use crate::sources::{collect_all, ContentSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSettings {
    pub per_source_cap: usize,
    pub fetch_limit: usize,
    pub source_timeout: Duration,
    pub max_attempts: usize,
    pub prompt_char_budget: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            per_source_cap: DEFAULT_PER_SOURCE_CAP,
            fetch_limit: 20,
            source_timeout: Duration::from_secs(20),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            prompt_char_budget: DEFAULT_PROMPT_CHAR_BUDGET,
        }
    }
}

pub struct PersonaService {
    sources: Vec<Arc<dyn ContentSource>>,
    metadata: Arc<dyn ProfileFetcher>,
    gateway: LlmGateway,
    settings: ServiceSettings,
}

impl PersonaService {
    /// `sources` in priority order (authoritative API first).
    pub fn new(
        sources: Vec<Arc<dyn ContentSource>>,
        metadata: Arc<dyn ProfileFetcher>,
        gateway: LlmGateway,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            sources,
            metadata,
            gateway,
            settings,
        }
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub fn gateway(&self) -> &LlmGateway {
        &self.gateway
    }

    pub fn settings(&self) -> ServiceSettings {
        self.settings
    }

    /// Metadata and every source run concurrently; partial results are fine.
    /// Only an unusable identifier is terminal.
    pub async fn resolve_user(&self, identifier: &str) -> Result<CanonicalUserRecord, PersonaError> {
        let handle = extract_handle(identifier);
        if !is_valid_handle(&handle) {
            tracing::info!(target: "service", handle_len = handle.len(), "rejecting unusable handle");
            return Err(PersonaError::NotFound);
        }

        let s = self.settings;
        let metadata = async {
            tokio::time::timeout(s.source_timeout, self.metadata.fetch_metadata(&handle))
                .await
                .unwrap_or_else(|_| {
                    tracing::warn!(target: "service", "metadata fetch timed out");
                    ProfileMetadata::default()
                })
        };
        let (metadata, batches) = tokio::join!(
            metadata,
            collect_all(&self.sources, &handle, s.fetch_limit, s.source_timeout),
        );
        let record = merge(&handle, metadata, batches, s.per_source_cap);

        tracing::info!(
            target: "service",
            handle = %handle,
            posts = record.posts.len(),
            comments = record.comments.len(),
            has_metadata = !record.profile.is_empty(),
            "user resolved"
        );
        Ok(record)
    }

    pub async fn generate_persona(
        &self,
        record: CanonicalUserRecord,
    ) -> Result<PersonaRecord, PersonaError> {
        let record = record.normalized();
        PersonaGenerator::new(&self.gateway)
            .with_max_attempts(self.settings.max_attempts)
            .with_prompt_budget(self.settings.prompt_char_budget)
            .generate(record)
            .await
    }
}
