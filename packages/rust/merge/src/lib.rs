//! Merge engine: reconciles up to two parsed source documents into one
//! consolidated model plus a plain-text archive.
//!
//! The merge never fails outright — a missing document is an empty
//! contribution, so the result degrades gracefully from "both documents
//! parsed" to "one document parsed" to an empty model.

pub mod analyzer;

pub use analyzer::analyze;

use std::collections::BTreeMap;

use chrono::Utc;
use tracing::debug;

use solguide_shared::{
    ConflictAnalysis, ConsolidatedModel, MergePriority, OpportunitySummary, ParsedDocument,
    VolumeRequirement,
};

/// Section marker for the component document's text in the archive.
const COMPONENT_SECTION_HEADER: &str = "=== COMPONENT INSTRUCTIONS ===";
/// Section marker for the solicitation document's text in the archive.
const SOLICITATION_SECTION_HEADER: &str = "=== BAA/SOLICITATION INSTRUCTIONS ===";
/// Header of the relationship-notes banner prepended when analysis found anything.
const RELATIONSHIP_HEADER: &str = "=== DOCUMENT RELATIONSHIP NOTES ===";

/// Merge output: the render input plus the full-text archive destined for the
/// record store.
#[derive(Debug, Clone)]
pub struct MergedInstructions {
    pub model: ConsolidatedModel,
    /// Relationship banner (if any) followed by both documents' full text
    /// under marked section headers, component first.
    pub plain_text: String,
}

/// Combine up to two parsed documents into one consolidated model.
///
/// Priority is explicit: with [`MergePriority::ComponentFirst`], when both
/// documents define the same volume number the component document's version is
/// retained whole and the solicitation's duplicate is discarded.
pub fn merge(
    component: Option<&ParsedDocument>,
    solicitation: Option<&ParsedDocument>,
    analysis: &ConflictAnalysis,
    priority: MergePriority,
    opportunity: &OpportunitySummary,
) -> MergedInstructions {
    let MergePriority::ComponentFirst = priority;
    let (first, second) = (component, solicitation);

    let mut plain_text = String::new();
    if analysis.has_findings() {
        plain_text.push_str(&relationship_banner(analysis));
    }

    let mut volumes: Vec<VolumeRequirement> = Vec::new();
    let mut checklist: Vec<String> = Vec::new();
    let mut key_dates: BTreeMap<String, String> = BTreeMap::new();
    let mut submission_guidelines: Vec<String> = Vec::new();
    let mut contacts: Vec<String> = Vec::new();

    for (doc, header) in [
        (first, COMPONENT_SECTION_HEADER),
        (second, SOLICITATION_SECTION_HEADER),
    ] {
        let Some(doc) = doc else { continue };

        plain_text.push_str(&format!("\n\n{header}\n\n{}", doc.plain_text));

        for vol in &doc.volumes {
            if volumes.iter().any(|v| v.volume_number == vol.volume_number) {
                // Later document's duplicate loses whole, by priority rule.
                debug!(
                    volume_number = vol.volume_number,
                    source = %doc.document_type,
                    "duplicate volume number discarded"
                );
                continue;
            }
            volumes.push(vol.clone());
        }

        for item in &doc.checklist {
            if !checklist.contains(item) {
                checklist.push(item.clone());
            }
        }

        // Later-assigned value wins on key collision.
        for (label, value) in &doc.key_dates {
            key_dates.insert(label.clone(), value.clone());
        }

        for line in &doc.submission_guidelines {
            if !submission_guidelines.contains(line) {
                submission_guidelines.push(line.clone());
            }
        }

        for contact in &doc.contacts {
            if !contacts.contains(contact) {
                contacts.push(contact.clone());
            }
        }
    }

    volumes.sort_by_key(|v| v.volume_number);

    let model = ConsolidatedModel {
        opportunity: opportunity.clone(),
        volumes,
        checklist,
        key_dates,
        submission_guidelines,
        contacts,
        component_url: component.map(|d| d.source_url.clone()),
        solicitation_url: solicitation.map(|d| d.source_url.clone()),
        generated_at: Utc::now(),
    };

    MergedInstructions { model, plain_text }
}

/// Render the relationship banner summarizing precedence and cross-references.
///
/// When both documents claim precedence the banner carries an explicit
/// conflict warning instead of silently picking a winner.
fn relationship_banner(analysis: &ConflictAnalysis) -> String {
    let mut banner = format!("{RELATIONSHIP_HEADER}\n\n");

    if analysis.is_contradictory() {
        banner.push_str(
            "CONFLICT WARNING: both source documents claim precedence over the other. \
             This guide does not pick a winner; verify against the contracting officer \
             before relying on either document where they disagree.\n",
        );
    } else if analysis.component_supersedes {
        banner.push_str(
            "Component-specific instructions take precedence over the BAA/solicitation \
             where the two conflict.\n",
        );
    } else if analysis.solicitation_supersedes {
        banner.push_str(
            "The BAA/solicitation instructions take precedence over the component-specific \
             instructions where the two conflict.\n",
        );
    }

    if !analysis.cross_references.is_empty() {
        banner.push_str("\nCross-references between the documents:\n");
        for note in &analysis.cross_references {
            banner.push_str(&format!("- {note}\n"));
        }
    }

    banner
}
