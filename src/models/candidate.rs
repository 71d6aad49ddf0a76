use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Candidate {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub applied_job_title: Option<String>,
    pub status: Option<String>,
    pub match_score: Option<f64>,
    pub ai_analysis: Option<JsonValue>,
    pub resume_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Candidate {
    /// Stored status, with absent or unrecognized labels read as pending.
    pub fn status(&self) -> CandidateStatus {
        self.status
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or("")
    }

    /// Case-insensitive substring match on the name. Rows without a name
    /// only match the empty term.
    pub fn matches_search(&self, term: &str) -> bool {
        let needle = term.to_lowercase();
        match &self.full_name {
            Some(name) => name.to_lowercase().contains(&needle),
            None => needle.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateStatus {
    #[default]
    Pending,
    Shortlisted,
    Selected,
    Rejected,
}

impl CandidateStatus {
    /// Statuses a recruiter can assign, in button order.
    pub const ACTIONS: [CandidateStatus; 3] = [
        CandidateStatus::Shortlisted,
        CandidateStatus::Selected,
        CandidateStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateStatus::Pending => "pending",
            CandidateStatus::Shortlisted => "shortlisted",
            CandidateStatus::Selected => "selected",
            CandidateStatus::Rejected => "rejected",
        }
    }

    pub fn is_assignable(&self) -> bool {
        Self::ACTIONS.contains(self)
    }
}

impl fmt::Display for CandidateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CandidateStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" | "" => Ok(CandidateStatus::Pending),
            "shortlisted" => Ok(CandidateStatus::Shortlisted),
            "selected" => Ok(CandidateStatus::Selected),
            "rejected" => Ok(CandidateStatus::Rejected),
            other => Err(format!("unknown candidate status '{}'", other)),
        }
    }
}
