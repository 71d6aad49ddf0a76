#![allow(dead_code)]

use async_trait::async_trait;
use candidate_dashboard::error::{Error, Result};
use candidate_dashboard::models::candidate::{Candidate, CandidateStatus};
use candidate_dashboard::services::candidate_service::CandidateStore;
use chrono::{Duration, Utc};
use serde_json::Value as JsonValue;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use uuid::Uuid;

/// Candidate table held in memory. Rows are kept newest first.
#[derive(Default)]
pub struct InMemoryStore {
    rows: Mutex<Vec<Candidate>>,
    writes: Mutex<Vec<(Uuid, CandidateStatus)>>,
    write_gate: Option<Arc<Notify>>,
    fail_writes: AtomicBool,
}

impl InMemoryStore {
    pub fn new(mut rows: Vec<Candidate>) -> Self {
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Self {
            rows: Mutex::new(rows),
            ..Default::default()
        }
    }

    /// Holds every status write until the gate is notified.
    pub fn with_write_gate(mut self, gate: Arc<Notify>) -> Self {
        self.write_gate = Some(gate);
        self
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn insert(&self, row: Candidate) {
        let mut rows = self.rows.lock().unwrap();
        rows.push(row);
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }

    pub fn remove(&self, id: Uuid) {
        self.rows.lock().unwrap().retain(|c| c.id != id);
    }

    pub fn writes(&self) -> Vec<(Uuid, CandidateStatus)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl CandidateStore for InMemoryStore {
    async fn list_candidates(&self) -> Result<Vec<Candidate>> {
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn update_status(&self, id: Uuid, status: CandidateStatus) -> Result<()> {
        if let Some(gate) = &self.write_gate {
            gate.notified().await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Remote("403 Forbidden: row is locked".into()));
        }
        if let Some(row) = self.rows.lock().unwrap().iter_mut().find(|c| c.id == id) {
            row.status = Some(status.as_str().to_string());
        }
        self.writes.lock().unwrap().push((id, status));
        Ok(())
    }
}

pub fn candidate(name: &str, age_minutes: i64, analysis: Option<JsonValue>) -> Candidate {
    Candidate {
        id: Uuid::new_v4(),
        full_name: Some(name.to_string()),
        applied_job_title: Some("Platform Engineer".to_string()),
        status: None,
        match_score: Some(70.0),
        ai_analysis: analysis,
        resume_url: Some(format!("https://files.example.com/{}.pdf", age_minutes)),
        linkedin_url: None,
        created_at: Utc::now() - Duration::minutes(age_minutes),
    }
}
