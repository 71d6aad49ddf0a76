pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use crate::services::{candidate_service::CandidateStore, dashboard_service::Dashboard};
use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub dashboard: Dashboard,
}

impl AppState {
    pub fn new(store: Arc<dyn CandidateStore>) -> Self {
        Self {
            dashboard: Dashboard::new(store),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/candidates", get(routes::dashboard::list_candidates))
        .route("/api/search", put(routes::dashboard::set_search))
        .route("/api/refresh", post(routes::dashboard::refresh))
        .route("/api/selected", get(routes::dashboard::get_selected))
        .route(
            "/api/candidates/:id/select",
            post(routes::dashboard::select_candidate),
        )
        .route(
            "/api/candidates/:id/status",
            post(routes::dashboard::update_candidate_status),
        )
        .with_state(state)
}
