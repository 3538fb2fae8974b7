//! Record store client.
//!
//! Talks to a PostgREST-style HTTP API: rows are read with query-string
//! filters, patched with a JSON body, and the batch selection query combines
//! status, null-artifact, and source-URL filters server-side.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use solguide_shared::{
    LIVE_STATUSES, Opportunity, RecordStoreConfig, Result, SolguideError, VolumeRequirement,
};

const USER_AGENT: &str = concat!("Solguide/", env!("CARGO_PKG_VERSION"));

/// The generated fields written back to an opportunity row after a
/// successful run.
#[derive(Debug, Clone, Serialize)]
pub struct RecordPatch {
    pub consolidated_instructions_url: String,
    pub instructions_plain_text: String,
    pub instructions_volume_structure: Vec<VolumeRequirement>,
    pub instructions_checklist: Vec<String>,
    pub instructions_generated_at: DateTime<Utc>,
}

/// Read and write access to opportunity rows.
#[allow(async_fn_in_trait)]
pub trait RecordStore: Send + Sync {
    /// Read one opportunity row by id.
    async fn fetch_opportunity(&self, id: i64) -> Result<Opportunity>;

    /// Patch the generated fields on one row.
    async fn apply_patch(&self, id: i64, patch: &RecordPatch) -> Result<()>;

    /// Ids of live opportunities with no artifact URL and at least one
    /// source URL.
    async fn pending_opportunity_ids(&self) -> Result<Vec<i64>>;
}

/// HTTP client for a PostgREST-style record store.
pub struct HttpRecordStore {
    client: Client,
    endpoint: String,
    table: String,
    api_key: String,
}

impl HttpRecordStore {
    pub fn new(
        endpoint: impl Into<String>,
        table: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| {
                SolguideError::RecordUpdate(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            table: table.into(),
            api_key: api_key.into(),
        })
    }

    /// Build a store from config, reading the API key from the configured
    /// environment variable.
    pub fn from_config(config: &RecordStoreConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            SolguideError::config(format!(
                "record store API key not set ({})",
                config.api_key_env
            ))
        })?;
        Self::new(&config.endpoint, &config.table, api_key)
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.endpoint, self.table)
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.api_key).bearer_auth(&self.api_key)
    }
}

impl RecordStore for HttpRecordStore {
    #[instrument(skip_all, fields(id = id))]
    async fn fetch_opportunity(&self, id: i64) -> Result<Opportunity> {
        let response = self
            .authed(self.client.get(self.table_url()))
            .query(&[("id", format!("eq.{id}")), ("limit", "1".into())])
            .send()
            .await
            .map_err(|e| SolguideError::RecordUpdate(format!("fetch row {id}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SolguideError::RecordUpdate(format!(
                "fetch row {id}: HTTP {status}"
            )));
        }

        let mut rows: Vec<Opportunity> = response
            .json()
            .await
            .map_err(|e| SolguideError::RecordUpdate(format!("decode row {id}: {e}")))?;

        if rows.is_empty() {
            return Err(SolguideError::RecordUpdate(format!(
                "opportunity {id} not found"
            )));
        }
        Ok(rows.remove(0))
    }

    #[instrument(skip_all, fields(id = id))]
    async fn apply_patch(&self, id: i64, patch: &RecordPatch) -> Result<()> {
        let response = self
            .authed(self.client.patch(self.table_url()))
            .query(&[("id", format!("eq.{id}"))])
            .json(patch)
            .send()
            .await
            .map_err(|e| SolguideError::RecordUpdate(format!("patch row {id}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SolguideError::RecordUpdate(format!(
                "patch row {id}: HTTP {status}"
            )));
        }

        debug!(id, "opportunity row patched");
        Ok(())
    }

    async fn pending_opportunity_ids(&self) -> Result<Vec<i64>> {
        #[derive(Deserialize)]
        struct IdRow {
            id: i64,
        }

        let status_filter = format!("in.({})", LIVE_STATUSES.join(","));
        let response = self
            .authed(self.client.get(self.table_url()))
            .query(&[
                ("select", "id,topic_number,status"),
                ("status", status_filter.as_str()),
                ("consolidated_instructions_url", "is.null"),
                (
                    "or",
                    "(component_instructions_url.not.is.null,solicitation_instructions_url.not.is.null)",
                ),
            ])
            .send()
            .await
            .map_err(|e| SolguideError::RecordUpdate(format!("pending query: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SolguideError::RecordUpdate(format!(
                "pending query: HTTP {status}"
            )));
        }

        let rows: Vec<IdRow> = response
            .json()
            .await
            .map_err(|e| SolguideError::RecordUpdate(format!("decode pending rows: {e}")))?;

        Ok(rows.into_iter().map(|r| r.id).collect())
    }
}
