use crate::error::{Error, Result};
use crate::models::candidate::{Candidate, CandidateStatus};
use crate::services::candidate_service::CandidateStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct DashboardState {
    pub candidates: Vec<Candidate>,
    pub selected: Option<Candidate>,
    pub search_term: String,
    pub loading: bool,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            candidates: Vec::new(),
            selected: None,
            search_term: String::new(),
            loading: true,
        }
    }
}

impl DashboardState {
    /// Rows matching the current search term, in stored order.
    pub fn filtered(&self) -> Vec<&Candidate> {
        self.candidates
            .iter()
            .filter(|c| c.matches_search(&self.search_term))
            .collect()
    }

    pub fn is_selected(&self, id: Uuid) -> bool {
        self.selected.as_ref().map(|c| c.id) == Some(id)
    }

    fn apply_fetch(&mut self, rows: Vec<Candidate>, is_initial_load: bool) {
        self.selected = reconcile_selection(self.selected.as_ref(), &rows, is_initial_load);
        self.candidates = rows;
    }

    fn apply_status(&mut self, id: Uuid, status: CandidateStatus) -> Option<Candidate> {
        let mut updated = None;
        if let Some(row) = self.candidates.iter_mut().find(|c| c.id == id) {
            row.status = Some(status.as_str().to_string());
            updated = Some(row.clone());
        }
        if let Some(selected) = self.selected.as_mut().filter(|c| c.id == id) {
            selected.status = Some(status.as_str().to_string());
            updated.get_or_insert_with(|| selected.clone());
        }
        updated
    }
}

/// Selection after a fetch: first row on an initial load with nothing
/// selected, otherwise the fresh copy of the selected row, otherwise the
/// previous selection as it was.
pub fn reconcile_selection(
    previous: Option<&Candidate>,
    rows: &[Candidate],
    is_initial_load: bool,
) -> Option<Candidate> {
    match previous {
        None if is_initial_load => rows.first().cloned(),
        None => None,
        Some(prev) => rows
            .iter()
            .find(|c| c.id == prev.id)
            .cloned()
            .or_else(|| Some(prev.clone())),
    }
}

/// The dashboard's state container. Cloning shares the same state.
#[derive(Clone)]
pub struct Dashboard {
    store: Arc<dyn CandidateStore>,
    state: Arc<RwLock<DashboardState>>,
    mounted: Arc<AtomicBool>,
}

impl Dashboard {
    pub fn new(store: Arc<dyn CandidateStore>) -> Self {
        Self {
            store,
            state: Arc::new(RwLock::new(DashboardState::default())),
            mounted: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    /// Tears the dashboard down. Fetches still in flight are discarded.
    pub fn unmount(&self) {
        if self.mounted.swap(false, Ordering::SeqCst) {
            tracing::info!("Dashboard unmounted");
        }
    }

    pub async fn snapshot(&self) -> DashboardState {
        self.state.read().await.clone()
    }

    /// Re-reads every candidate. Returns whether the result was applied.
    pub async fn refresh(&self, is_initial_load: bool) -> bool {
        let fetched = self.store.list_candidates().await;

        if !self.is_mounted() {
            tracing::debug!("Dropping fetch result after unmount");
            return false;
        }

        let mut state = self.state.write().await;
        state.loading = false;
        match fetched {
            Ok(rows) => {
                tracing::debug!(count = rows.len(), is_initial_load, "Candidates refreshed");
                state.apply_fetch(rows, is_initial_load);
                true
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    is_initial_load,
                    "Candidate fetch failed, keeping previous state"
                );
                false
            }
        }
    }

    /// Applies `status` locally, then writes it to the store.
    ///
    /// A rejected write is returned to the caller after a refresh pulls the
    /// remote truth back in; there is no separate rollback.
    pub async fn set_status(&self, id: Uuid, status: CandidateStatus) -> Result<Candidate> {
        if !status.is_assignable() {
            return Err(Error::BadRequest(format!(
                "Status '{}' cannot be assigned",
                status
            )));
        }

        let updated = {
            let mut state = self.state.write().await;
            state.apply_status(id, status)
        }
        .ok_or_else(|| Error::NotFound(format!("Candidate {} not found", id)))?;

        tracing::info!(candidate_id = %id, status = %status, "Updating candidate status");
        if let Err(e) = self.store.update_status(id, status).await {
            tracing::warn!(candidate_id = %id, error = %e, "Status write failed, reconciling");
            self.refresh(false).await;
            return Err(e);
        }

        Ok(updated)
    }

    pub async fn select(&self, id: Uuid) -> Result<Candidate> {
        let mut state = self.state.write().await;
        let candidate = state
            .candidates
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Candidate {} not found", id)))?;
        state.selected = Some(candidate.clone());
        Ok(candidate)
    }

    pub async fn set_search_term(&self, term: impl Into<String>) {
        self.state.write().await.search_term = term.into();
    }
}
