//! Orchestration: fetch, extract, merge, render, store, patch.
//!
//! One opportunity is one unit of work. A failed source document degrades the
//! merge instead of aborting it; storage and record failures fail the item;
//! nothing fails the batch.

use std::time::Duration;

use chrono::{Duration as ChronoDuration, DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};

use solguide_extract::DocumentFetcher;
use solguide_merge::{analyze, merge};
use solguide_shared::{
    ConflictAnalysis, DocumentType, GenerationConfig, GenerationDebug, GenerationResult,
    MergePriority, Opportunity, OpportunitySummary, ParsedDocument, Result, SolguideError,
};

use crate::records::{RecordPatch, RecordStore};
use crate::storage::{storage_key, ObjectStore};

/// Totals for a whole batch run, alongside the per-item results.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub results: Vec<GenerationResult>,
}

/// Staleness policy: should this opportunity's guide be (re)generated?
///
/// Check order matters and is pinned by tests: a missing artifact always
/// regenerates, even for a closed opportunity, because that check runs before
/// the closed-status check. Closed opportunities with an artifact keep their
/// historical record untouched.
pub fn needs_regeneration(
    opportunity: &Opportunity,
    now: DateTime<Utc>,
    staleness_days: i64,
) -> bool {
    if opportunity.consolidated_instructions_url.is_none() {
        return true;
    }
    if !opportunity.status.is_live() {
        return false;
    }
    match opportunity.instructions_generated_at {
        Some(generated) => now - generated > ChronoDuration::days(staleness_days),
        None => false,
    }
}

/// The consolidation pipeline bound to a record store and an object store.
pub struct InstructionService<R, S> {
    records: R,
    storage: S,
    fetcher: DocumentFetcher,
    pacing: Duration,
    staleness_days: i64,
}

impl<R: RecordStore, S: ObjectStore> InstructionService<R, S> {
    pub fn new(records: R, storage: S, config: &GenerationConfig) -> Result<Self> {
        Ok(Self {
            records,
            storage,
            fetcher: DocumentFetcher::new(Duration::from_secs(config.fetch_timeout_secs))?,
            pacing: Duration::from_millis(config.pacing_ms),
            staleness_days: config.staleness_days,
        })
    }

    /// Run the full pipeline for one opportunity. Never panics and never
    /// returns `Err`; every outcome is a [`GenerationResult`].
    #[instrument(skip_all, fields(opportunity_id = id))]
    pub async fn generate_for_opportunity(&self, id: i64) -> GenerationResult {
        match self.try_generate(id).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "generation failed");
                GenerationResult::failed(id, "unknown", e.to_string())
            }
        }
    }

    async fn try_generate(&self, id: i64) -> Result<GenerationResult> {
        let opportunity = self.records.fetch_opportunity(id).await?;

        if !opportunity.has_sources() {
            info!(topic = %opportunity.topic_number, "no instruction URLs, skipping");
            return Ok(GenerationResult::failed(
                id,
                &opportunity.topic_number,
                SolguideError::NoSources.to_string(),
            ));
        }

        let component = self
            .fetch_source(
                opportunity.component_instructions_url.as_deref(),
                DocumentType::Component,
            )
            .await;
        let solicitation = self
            .fetch_source(
                opportunity.solicitation_instructions_url.as_deref(),
                DocumentType::Solicitation,
            )
            .await;

        // With a single source there is nothing to reconcile.
        let analysis = match (&component, &solicitation) {
            (Some(c), Some(s)) => analyze(&c.plain_text, &s.plain_text),
            _ => ConflictAnalysis::default(),
        };

        let summary = OpportunitySummary::from(&opportunity);
        let merged = merge(
            component.as_ref(),
            solicitation.as_ref(),
            &analysis,
            MergePriority::ComponentFirst,
            &summary,
        );

        let bytes = solguide_render::render(&merged.model)?;

        let key = storage_key(&opportunity.topic_number, Utc::now());
        let artifact_url = self.storage.store_pdf(&key, bytes).await?;

        let patch = RecordPatch {
            consolidated_instructions_url: artifact_url.clone(),
            instructions_plain_text: merged.plain_text.clone(),
            instructions_volume_structure: merged.model.volumes.clone(),
            instructions_checklist: merged.model.checklist.clone(),
            instructions_generated_at: Utc::now(),
        };
        self.records.apply_patch(id, &patch).await?;

        let debug = GenerationDebug {
            component_url: opportunity.component_instructions_url.clone(),
            solicitation_url: opportunity.solicitation_instructions_url.clone(),
            component_parsed: component.is_some(),
            solicitation_parsed: solicitation.is_some(),
            volumes_extracted: merged.model.volumes.len(),
            checklist_items_extracted: merged.model.checklist.len(),
            plain_text_length: merged.plain_text.len(),
            component_pages: component.as_ref().map(|d| d.page_count).unwrap_or(0),
            solicitation_pages: solicitation.as_ref().map(|d| d.page_count).unwrap_or(0),
        };

        info!(
            topic = %opportunity.topic_number,
            artifact_url = %artifact_url,
            "instruction guide generated"
        );
        Ok(GenerationResult::ok(
            id,
            &opportunity.topic_number,
            artifact_url,
            debug,
        ))
    }

    /// Fetch and parse one source document; a failure makes that document
    /// absent rather than failing the item.
    async fn fetch_source(
        &self,
        url: Option<&str>,
        document_type: DocumentType,
    ) -> Option<ParsedDocument> {
        let url = url?;
        match self.fetcher.fetch(url, document_type).await {
            Ok(doc) => Some(doc),
            Err(e) => {
                warn!(url = %url, %document_type, error = %e, "source document unavailable");
                None
            }
        }
    }

    /// Process ids strictly sequentially with a pacing sleep between items.
    /// One result per id; a failed item never aborts the rest.
    pub async fn generate_batch(&self, ids: &[i64]) -> Vec<GenerationResult> {
        let mut results = Vec::with_capacity(ids.len());

        for (index, &id) in ids.iter().enumerate() {
            results.push(self.generate_for_opportunity(id).await);

            if index + 1 < ids.len() {
                tokio::time::sleep(self.pacing).await;
            }
        }

        results
    }

    /// Generate for every live opportunity that has sources but no artifact.
    #[instrument(skip_all)]
    pub async fn generate_for_active(&self) -> Result<BatchSummary> {
        let ids = self.records.pending_opportunity_ids().await?;

        if ids.is_empty() {
            info!("no opportunities need instruction guides");
            return Ok(BatchSummary {
                total: 0,
                successful: 0,
                failed: 0,
                results: vec![],
            });
        }

        info!(count = ids.len(), "processing pending opportunities");
        let results = self.generate_batch(&ids).await;
        let successful = results.iter().filter(|r| r.success).count();

        Ok(BatchSummary {
            total: results.len(),
            successful,
            failed: results.len() - successful,
            results,
        })
    }

    /// Fetch the row and apply the staleness policy.
    pub async fn check_regeneration(&self, id: i64) -> Result<bool> {
        let opportunity = self.records.fetch_opportunity(id).await?;
        Ok(needs_regeneration(&opportunity, Utc::now(), self.staleness_days))
    }
}
