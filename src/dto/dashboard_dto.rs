use crate::models::candidate::{Candidate, CandidateStatus};
use crate::services::analysis_service::{self, AnalysisView};
use crate::services::dashboard_service::DashboardState;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct SearchPayload {
    pub term: String,
}

#[derive(Debug, Deserialize)]
pub struct SetStatusPayload {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CandidateListItem {
    pub id: Uuid,
    pub full_name: String,
    pub status: CandidateStatus,
    pub match_score: Option<f64>,
    pub created_on: NaiveDate,
    pub selected: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CandidateListResponse {
    pub loading: bool,
    pub search_term: String,
    pub candidates: Vec<CandidateListItem>,
}

impl From<&DashboardState> for CandidateListResponse {
    fn from(state: &DashboardState) -> Self {
        let candidates = state
            .filtered()
            .into_iter()
            .map(|c| CandidateListItem {
                id: c.id,
                full_name: c.display_name().to_string(),
                status: c.status(),
                match_score: c.match_score,
                created_on: c.created_at.date_naive(),
                selected: state.is_selected(c.id),
            })
            .collect();

        Self {
            loading: state.loading,
            search_term: state.search_term.clone(),
            candidates,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusAction {
    pub status: CandidateStatus,
    pub active: bool,
}

/// Link to an external page, opened in a new browsing context with no
/// opener reference back to the dashboard.
#[derive(Debug, Serialize)]
pub struct ExternalLink {
    pub label: &'static str,
    pub href: String,
    pub target: &'static str,
    pub rel: &'static str,
}

impl ExternalLink {
    fn new(label: &'static str, href: Option<&str>) -> Option<Self> {
        let href = href.map(str::trim).filter(|h| !h.is_empty())?;
        Some(Self {
            label,
            href: href.to_string(),
            target: "_blank",
            rel: "noopener noreferrer",
        })
    }
}

#[derive(Debug, Serialize)]
pub struct CandidateDetail {
    pub id: Uuid,
    pub full_name: String,
    pub applied_job_title: Option<String>,
    pub status: CandidateStatus,
    pub match_score: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub analysis: AnalysisView,
    pub actions: Vec<StatusAction>,
    pub links: Vec<ExternalLink>,
}

impl From<&Candidate> for CandidateDetail {
    fn from(c: &Candidate) -> Self {
        let status = c.status();
        let actions = CandidateStatus::ACTIONS
            .iter()
            .map(|s| StatusAction {
                status: *s,
                active: *s == status,
            })
            .collect();
        let links = [
            ExternalLink::new("View CV", c.resume_url.as_deref()),
            ExternalLink::new("LinkedIn", c.linkedin_url.as_deref()),
        ]
        .into_iter()
        .flatten()
        .collect();

        Self {
            id: c.id,
            full_name: c.display_name().to_string(),
            applied_job_title: c.applied_job_title.clone(),
            status,
            match_score: c.match_score,
            created_at: c.created_at,
            analysis: analysis_service::render(c.ai_analysis.as_ref()),
            actions,
            links,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SelectedResponse {
    pub candidate: Option<CandidateDetail>,
}
