use crate::error::Result;
use crate::models::candidate::{Candidate, CandidateStatus};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// Remote owner of the candidate rows.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CandidateStore: Send + Sync {
    /// Every row, newest `created_at` first.
    async fn list_candidates(&self) -> Result<Vec<Candidate>>;

    async fn update_status(&self, id: Uuid, status: CandidateStatus) -> Result<()>;
}

#[derive(Clone)]
pub struct CandidateService {
    pool: PgPool,
}

impl CandidateService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CandidateStore for CandidateService {
    async fn list_candidates(&self) -> Result<Vec<Candidate>> {
        let candidates = sqlx::query_as::<_, Candidate>(
            r#"
            SELECT id, full_name, applied_job_title, status, match_score, ai_analysis,
                   resume_url, linkedin_url, created_at
            FROM candidates
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(candidates)
    }

    async fn update_status(&self, id: Uuid, status: CandidateStatus) -> Result<()> {
        let result = sqlx::query(r#"UPDATE candidates SET status = $1 WHERE id = $2"#)
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            tracing::warn!(candidate_id = %id, "status update matched no rows");
        }
        Ok(())
    }
}
