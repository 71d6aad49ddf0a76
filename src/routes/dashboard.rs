use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::dto::dashboard_dto::{
    CandidateDetail, CandidateListResponse, SearchPayload, SelectedResponse, SetStatusPayload,
};
use crate::error::{Error, Result};
use crate::models::candidate::CandidateStatus;
use crate::AppState;

pub async fn list_candidates(State(state): State<AppState>) -> Json<CandidateListResponse> {
    let snapshot = state.dashboard.snapshot().await;
    Json(CandidateListResponse::from(&snapshot))
}

pub async fn set_search(
    State(state): State<AppState>,
    Json(payload): Json<SearchPayload>,
) -> Json<CandidateListResponse> {
    state.dashboard.set_search_term(payload.term).await;
    list_candidates(State(state)).await
}

pub async fn refresh(State(state): State<AppState>) -> Json<CandidateListResponse> {
    state.dashboard.refresh(false).await;
    list_candidates(State(state)).await
}

pub async fn select_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CandidateDetail>> {
    let candidate = state.dashboard.select(id).await?;
    Ok(Json(CandidateDetail::from(&candidate)))
}

pub async fn get_selected(State(state): State<AppState>) -> Json<SelectedResponse> {
    let snapshot = state.dashboard.snapshot().await;
    Json(SelectedResponse {
        candidate: snapshot.selected.as_ref().map(CandidateDetail::from),
    })
}

pub async fn update_candidate_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetStatusPayload>,
) -> Result<Json<CandidateDetail>> {
    let status: CandidateStatus = payload.status.parse().map_err(Error::BadRequest)?;
    let candidate = state.dashboard.set_status(id, status).await?;
    Ok(Json(CandidateDetail::from(&candidate)))
}
