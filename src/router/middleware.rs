//! Configuration forms of registered middlewares.

use axum::Json;
use axum::extract::{Path, State};

use crate::AppState;
use crate::error::{Result, ServerError};
use crate::middleware::Form;

/// Names of every registered middleware.
pub async fn list(State(state): State<AppState>) -> Json<Vec<&'static str>> {
    Json(state.registry.names())
}

/// Handler returning the configuration form of middleware `name`.
pub async fn setup(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Form>> {
    state
        .registry
        .get(&name)
        .map(|middleware| Json(middleware.setup()))
        .ok_or(ServerError::UnknownMiddleware(name))
}
