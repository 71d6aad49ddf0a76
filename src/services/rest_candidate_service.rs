use crate::config::RestConfig;
use crate::error::{Error, Result};
use crate::models::candidate::{Candidate, CandidateStatus};
use crate::services::candidate_service::CandidateStore;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::json;
use url::Url;
use uuid::Uuid;

const TABLE: &str = "candidates";

/// Candidate rows behind a PostgREST-style hosted table endpoint.
#[derive(Clone)]
pub struct RestCandidateService {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestCandidateService {
    pub fn new(config: &RestConfig, client: Client) -> Self {
        Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn table_url(&self) -> Result<Url> {
        Ok(Url::parse(&format!("{}/{}", self.base_url, TABLE))?)
    }

    pub fn list_url(&self) -> Result<Url> {
        let mut url = self.table_url()?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("order", "created_at.desc");
        Ok(url)
    }

    pub fn row_url(&self, id: Uuid) -> Result<Url> {
        let mut url = self.table_url()?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{}", id));
        Ok(url)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }
}

async fn ensure_success(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(Error::Remote(format!("{}: {}", status, body)))
}

#[async_trait]
impl CandidateStore for RestCandidateService {
    async fn list_candidates(&self) -> Result<Vec<Candidate>> {
        let resp = self
            .authorized(self.client.get(self.list_url()?))
            .send()
            .await?;
        let candidates = ensure_success(resp).await?.json::<Vec<Candidate>>().await?;
        Ok(candidates)
    }

    async fn update_status(&self, id: Uuid, status: CandidateStatus) -> Result<()> {
        let resp = self
            .authorized(self.client.patch(self.row_url(id)?))
            .header("Prefer", "return=minimal")
            .json(&json!({ "status": status.as_str() }))
            .send()
            .await?;
        ensure_success(resp).await?;
        Ok(())
    }
}
