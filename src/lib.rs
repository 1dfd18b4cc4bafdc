// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod llm;
pub mod metrics;
pub mod persona;
pub mod profile;
pub mod reconcile;
pub mod service;
pub mod sources;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::error::PersonaError;
pub use crate::reconcile::CanonicalUserRecord;
pub use crate::service::{PersonaService, ServiceSettings};

use axum::Router;
use tracing::info;

/// Build the full HTTP app from `PersonaConfig::load_default()` (without `/metrics`).
///
/// Example usage in a test:
/// ```ignore
/// std::env::set_var("AI_TEST_MODE", "mock");
/// let app = reddit_persona::app().await?;
/// ```
pub async fn app() -> anyhow::Result<Router> {
    let cfg = config::PersonaConfig::load_default()?;
    let service = bootstrap::build_service(&cfg)?;
    info!("router assembled");
    Ok(api::create_router(AppState::new(service)))
}
