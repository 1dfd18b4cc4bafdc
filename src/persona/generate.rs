// src/persona/generate.rs
//! Bounded retry of the whole round trip: prompt -> gateway -> parse -> finalize.
//! Attempts are sequential and independent; a later sample may succeed where an
//! earlier one drifted out of format.

use metrics::{counter, histogram};
use sha2::{Digest, Sha256};

use crate::error::PersonaError;
use crate::llm::LlmGateway;
use crate::persona::parser::parse_persona;
use crate::persona::prompt::{build_prompt, DEFAULT_PROMPT_CHAR_BUDGET};
use crate::persona::record::{finalize, PersonaRecord};
use crate::reconcile::CanonicalUserRecord;

pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

/// Short stable id for logs; never log the prompt or completion itself.
pub(crate) fn anon_id(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttemptFailure {
    NoResponse,
    Format,
}

pub struct PersonaGenerator<'a> {
    gateway: &'a LlmGateway,
    max_attempts: usize,
    prompt_budget: usize,
}

impl<'a> PersonaGenerator<'a> {
    pub fn new(gateway: &'a LlmGateway) -> Self {
        Self {
            gateway,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            prompt_budget: DEFAULT_PROMPT_CHAR_BUDGET,
        }
    }

    pub fn with_max_attempts(mut self, n: usize) -> Self {
        self.max_attempts = n.max(1);
        self
    }

    pub fn with_prompt_budget(mut self, chars: usize) -> Self {
        self.prompt_budget = chars.max(1);
        self
    }

    pub async fn generate(&self, record: CanonicalUserRecord) -> Result<PersonaRecord, PersonaError> {
        let prompt = build_prompt(&record, self.prompt_budget);
        let prompt_id = anon_id(&prompt);
        let mut failures = Vec::with_capacity(self.max_attempts);

        for attempt in 1..=self.max_attempts {
            counter!("persona_generation_attempts_total").increment(1);

            let Some(completion) = self.gateway.complete(&prompt).await else {
                tracing::warn!(target: "persona", %prompt_id, attempt, "no completion from any provider");
                failures.push(AttemptFailure::NoResponse);
                continue;
            };
            let completion_id = anon_id(&completion.text);

            let parsed = match parse_persona(&completion.text) {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!(
                        target: "persona",
                        %prompt_id, %completion_id, attempt,
                        provider = %completion.provider,
                        error = %e,
                        "completion did not parse"
                    );
                    failures.push(AttemptFailure::Format);
                    continue;
                }
            };

            match finalize(record.clone(), parsed.traits) {
                Ok(persona) => {
                    tracing::info!(
                        target: "persona",
                        %prompt_id, %completion_id, attempt,
                        provider = %completion.provider,
                        stage = parsed.stage.as_str(),
                        "persona generated"
                    );
                    histogram!("persona_generation_attempts").record(attempt as f64);
                    return Ok(persona);
                }
                Err(e) => {
                    tracing::warn!(target: "persona", %prompt_id, attempt, error = %e, "persona failed boundary validation");
                    failures.push(AttemptFailure::Format);
                }
            }
        }

        counter!("persona_generation_failures_total").increment(1);
        let attempts = failures.len();
        if failures.iter().all(|f| *f == AttemptFailure::NoResponse) {
            Err(PersonaError::UpstreamEmpty { attempts })
        } else {
            Err(PersonaError::GenerationFailed { attempts })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anon_id_is_short_and_stable() {
        assert_eq!(anon_id("abc"), anon_id("abc"));
        assert_eq!(anon_id("abc").len(), 12);
        assert_ne!(anon_id("abc"), anon_id("abd"));
    }
}
