// src/error.rs
//! Caller-facing failure taxonomy. Source and per-attempt format failures are
//! recovered internally and never show up here.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersonaError {
    #[error("User not found")]
    NotFound,
    #[error("LLM returned no response after {attempts} attempts")]
    UpstreamEmpty { attempts: usize },
    #[error("Persona generation failed after {attempts} attempts")]
    GenerationFailed { attempts: usize },
}

impl PersonaError {
    pub fn status(&self) -> StatusCode {
        match self {
            PersonaError::NotFound => StatusCode::NOT_FOUND,
            PersonaError::UpstreamEmpty { .. } => StatusCode::BAD_GATEWAY,
            PersonaError::GenerationFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PersonaError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
