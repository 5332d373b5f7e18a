//! Game Session HTTP Routes
//!
//! Create and look up game sessions.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};

use crate::sessions::{ResultExt, Session, SessionError, SessionRepository};

use super::errors::ApiResult;

/// Shared state for the session routes
pub struct GameState {
    pub repository: SessionRepository,
}

impl GameState {
    pub fn new(repository: SessionRepository) -> Self {
        Self { repository }
    }
}

/// Session routes with shared state
pub fn game_routes(state: Arc<GameState>) -> Router {
    Router::new()
        .route("/game", post(create_game_handler))
        .route("/game/:id", get(get_game_handler))
        .with_state(state)
}

/// Create or overwrite a session and echo it back
async fn create_game_handler(
    State(state): State<Arc<GameState>>,
    body: Bytes,
) -> ApiResult<Json<Session>> {
    let session: Session = serde_json::from_slice(&body)
        .map_err(|e| SessionError::invalid(e.to_string()))
        .context("Could not decode session")?;

    state
        .repository
        .store(&session)
        .await
        .context("Error storing session")?;

    Ok(Json(session))
}

/// Look up a session by id
async fn get_game_handler(
    State(state): State<Arc<GameState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Session>> {
    let session = state
        .repository
        .fetch(&id)
        .await
        .with_context(|| format!("Error getting session {}", id))?;

    Ok(Json(session))
}
