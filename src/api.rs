use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::error::PersonaError;
use crate::persona::PersonaRecord;
use crate::reconcile::CanonicalUserRecord;
use crate::service::PersonaService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PersonaService>,
}

impl AppState {
    pub fn new(service: PersonaService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/scrape", post(scrape_user))
        .route("/generate_persona", post(generate_persona))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Alias kept for callers that build the router as `crate::router(state)`.
pub fn router(state: AppState) -> Router {
    create_router(state)
}

#[derive(serde::Deserialize)]
struct ScrapeReq {
    /// Raw handle or profile URL.
    username: String,
}

async fn scrape_user(
    State(state): State<AppState>,
    Json(body): Json<ScrapeReq>,
) -> Result<Json<CanonicalUserRecord>, PersonaError> {
    let record = state.service.resolve_user(&body.username).await?;
    Ok(Json(record))
}

async fn generate_persona(
    State(state): State<AppState>,
    Json(record): Json<CanonicalUserRecord>,
) -> Result<Json<PersonaRecord>, PersonaError> {
    let persona = state.service.generate_persona(record).await?;
    Ok(Json(persona))
}
