//! Core domain types for the instruction consolidation engine.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle statuses treated as "live" by the regeneration policy.
pub const LIVE_STATUSES: [&str; 3] = ["Open", "Prerelease", "Active"];

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Opportunity lifecycle status.
///
/// The upstream vocabulary is open-ended (new statuses appear without notice),
/// so this is a string wrapper rather than a closed enum. Only the three
/// [`LIVE_STATUSES`] values get special treatment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Status(pub String);

impl Status {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Whether the opportunity is still accepting or about to accept proposals.
    pub fn is_live(&self) -> bool {
        LIVE_STATUSES.contains(&self.0.as_str())
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Status {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// DocumentType
// ---------------------------------------------------------------------------

/// Which of the two source documents a parse came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    /// Agency-subcomponent-specific submission guidance.
    Component,
    /// Program-wide solicitation guidance.
    Solicitation,
    /// Broad Agency Announcement (treated like a solicitation downstream).
    Baa,
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Component => write!(f, "component"),
            Self::Solicitation => write!(f, "solicitation"),
            Self::Baa => write!(f, "baa"),
        }
    }
}

// ---------------------------------------------------------------------------
// Opportunity (record-store row)
// ---------------------------------------------------------------------------

/// One opportunity row as read from the external record store.
///
/// The engine reads this and later patches the four generated fields
/// (artifact URL, plain-text archive, volume structure, checklist) plus the
/// generation timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: i64,
    pub topic_number: String,
    #[serde(default)]
    pub topic_id: Option<String>,
    pub title: String,
    pub component: String,
    pub program: String,
    pub phase: String,
    pub status: Status,
    #[serde(default)]
    pub open_date: Option<String>,
    #[serde(default)]
    pub close_date: Option<String>,
    /// URL of the component-specific instruction document, when published.
    #[serde(default)]
    pub component_instructions_url: Option<String>,
    /// URL of the BAA/solicitation instruction document, when published.
    #[serde(default)]
    pub solicitation_instructions_url: Option<String>,
    /// URL of the most recently rendered consolidated guide, if any.
    #[serde(default)]
    pub consolidated_instructions_url: Option<String>,
    #[serde(default)]
    pub instructions_generated_at: Option<DateTime<Utc>>,
}

impl Opportunity {
    /// At least one source document URL is present.
    pub fn has_sources(&self) -> bool {
        self.component_instructions_url.is_some() || self.solicitation_instructions_url.is_some()
    }
}

// ---------------------------------------------------------------------------
// VolumeRequirement
// ---------------------------------------------------------------------------

/// One numbered proposal volume (e.g. "Volume 2: Technical Proposal") and its
/// bullet-level requirements. The volume number is the natural key within a
/// single parsed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeRequirement {
    pub volume_number: u32,
    pub volume_name: String,
    pub description: String,
    pub requirements: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_numbers: Option<String>,
}

// ---------------------------------------------------------------------------
// ParsedDocument
// ---------------------------------------------------------------------------

/// Structured output of one fetch+extract call. Immutable after creation and
/// never persisted directly; only its derivatives are.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub source_url: String,
    pub document_type: DocumentType,
    /// Full linear text of the source document.
    pub plain_text: String,
    pub volumes: Vec<VolumeRequirement>,
    pub checklist: Vec<String>,
    /// Label → date text, keys unique, casing as first seen.
    pub key_dates: BTreeMap<String, String>,
    pub submission_guidelines: Vec<String>,
    /// Email- and phone-shaped strings found in the document.
    pub contacts: Vec<String>,
    pub page_count: usize,
    pub extracted_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// ConflictAnalysis
// ---------------------------------------------------------------------------

/// Precedence claims and cross-references detected between the two source
/// texts. Transient — consumed immediately by the merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictAnalysis {
    /// The component document claims its requirements override the solicitation.
    pub component_supersedes: bool,
    /// The solicitation/BAA claims its requirements override the component.
    pub solicitation_supersedes: bool,
    /// Generic cross-reference phrases, deduplicated, capped at 5.
    pub cross_references: Vec<String>,
}

impl ConflictAnalysis {
    /// Anything worth surfacing in a relationship banner?
    pub fn has_findings(&self) -> bool {
        self.component_supersedes || self.solicitation_supersedes || !self.cross_references.is_empty()
    }

    /// Both documents claim precedence — genuinely contradictory sources.
    pub fn is_contradictory(&self) -> bool {
        self.component_supersedes && self.solicitation_supersedes
    }
}

// ---------------------------------------------------------------------------
// MergePriority
// ---------------------------------------------------------------------------

/// Which document wins when both define the same volume number.
///
/// Named explicitly so the rule is visible and testable rather than implied by
/// iteration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePriority {
    /// The component document's version of a duplicated volume is retained.
    ComponentFirst,
}

// ---------------------------------------------------------------------------
// ConsolidatedModel
// ---------------------------------------------------------------------------

/// Opportunity metadata carried into the rendered guide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpportunitySummary {
    pub topic_number: String,
    pub title: String,
    pub component: String,
    pub program: String,
    pub phase: String,
    pub status: Status,
    #[serde(default)]
    pub open_date: Option<String>,
    #[serde(default)]
    pub close_date: Option<String>,
}

impl From<&Opportunity> for OpportunitySummary {
    fn from(opp: &Opportunity) -> Self {
        Self {
            topic_number: opp.topic_number.clone(),
            title: opp.title.clone(),
            component: opp.component.clone(),
            program: opp.program.clone(),
            phase: opp.phase.clone(),
            status: opp.status.clone(),
            open_date: opp.open_date.clone(),
            close_date: opp.close_date.clone(),
        }
    }
}

/// The merge output and render input.
///
/// Invariant: no two volumes share a `volume_number`, and volumes are sorted
/// ascending by number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidatedModel {
    pub opportunity: OpportunitySummary,
    pub volumes: Vec<VolumeRequirement>,
    pub checklist: Vec<String>,
    pub key_dates: BTreeMap<String, String>,
    pub submission_guidelines: Vec<String>,
    pub contacts: Vec<String>,
    #[serde(default)]
    pub component_url: Option<String>,
    #[serde(default)]
    pub solicitation_url: Option<String>,
    pub generated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// GenerationResult
// ---------------------------------------------------------------------------

/// Counters and flags about what was parsed, for observability.
///
/// Lets a caller distinguish "nothing was available" from "something broke".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationDebug {
    pub component_url: Option<String>,
    pub solicitation_url: Option<String>,
    pub component_parsed: bool,
    pub solicitation_parsed: bool,
    pub volumes_extracted: usize,
    pub checklist_items_extracted: usize,
    pub plain_text_length: usize,
    pub component_pages: usize,
    pub solicitation_pages: usize,
}

/// Outcome of one attempted opportunity. Returned to the caller, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    pub success: bool,
    pub opportunity_id: i64,
    pub topic_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<GenerationDebug>,
}

impl GenerationResult {
    /// Successful generation with its artifact URL and debug counters.
    pub fn ok(
        opportunity_id: i64,
        topic_number: impl Into<String>,
        artifact_url: impl Into<String>,
        debug: GenerationDebug,
    ) -> Self {
        Self {
            success: true,
            opportunity_id,
            topic_number: topic_number.into(),
            artifact_url: Some(artifact_url.into()),
            error: None,
            debug: Some(debug),
        }
    }

    /// Failed generation with a human-readable error string.
    pub fn failed(
        opportunity_id: i64,
        topic_number: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            opportunity_id,
            topic_number: topic_number.into(),
            artifact_url: None,
            error: Some(error.into()),
            debug: None,
        }
    }
}
