use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::AppState;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.dashboard.snapshot().await;
    let body = json!({
        "status": "ok",
        "mounted": state.dashboard.is_mounted(),
        "loading": snapshot.loading,
        "candidates": snapshot.candidates.len(),
    });
    (StatusCode::OK, Json(body))
}
