//! Cross-reference analyzer.
//!
//! Scans the concatenation of both source texts for phrases asserting that one
//! document's requirements supersede the other's, and for generic
//! cross-reference language. Pattern-based on purpose: superseding language in
//! solicitation boilerplate is formulaic, and flagging it for a human beats
//! arbitrating genuinely conflicting contractual text automatically.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use solguide_shared::ConflictAnalysis;

/// Cross-reference notes retained per analysis, to bound report size.
const MAX_CROSS_REFERENCES: usize = 5;

static COMPONENT_PRECEDENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    // "Component-specific instructions take precedence", "component
    // instructions supersede the BAA", "Component requirements override ..."
    Regex::new(
        r"(?i)component(?:-specific)?\s+(?:instructions?\s+|requirements?\s+)?(?:takes?\s+precedence|supersedes?|overrides?|governs?)",
    )
    .expect("valid regex")
});

static SOLICITATION_PRECEDENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:baa|solicitation)\s+(?:instructions?\s+|requirements?\s+)?(?:takes?\s+precedence|supersedes?|overrides?|governs?)",
    )
    .expect("valid regex")
});

static CROSS_REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    // "see the component-specific instructions", "as specified in the BAA",
    // "refer to the solicitation", "in accordance with the BAA"
    Regex::new(
        r"(?i)(?:see|refer\s+to|as\s+(?:specified|described|stated)\s+in|in\s+accordance\s+with)\s+the\s+(?:component(?:-specific)?\s+instructions?|baa|solicitation)",
    )
    .expect("valid regex")
});

/// Detect precedence claims and cross-references between the two source texts.
///
/// Callers skip analysis entirely when only one document exists; with a single
/// source there is nothing to reconcile.
pub fn analyze(component_text: &str, solicitation_text: &str) -> ConflictAnalysis {
    let combined = format!("{component_text}\n{solicitation_text}");

    let component_supersedes = COMPONENT_PRECEDENCE_RE.is_match(&combined);
    let solicitation_supersedes = SOLICITATION_PRECEDENCE_RE.is_match(&combined);

    let mut cross_references: Vec<String> = Vec::new();
    for m in CROSS_REFERENCE_RE.find_iter(&combined) {
        if cross_references.len() >= MAX_CROSS_REFERENCES {
            break;
        }
        let note = m.as_str().trim().to_string();
        if !cross_references
            .iter()
            .any(|n| n.eq_ignore_ascii_case(&note))
        {
            cross_references.push(note);
        }
    }

    debug!(
        component_supersedes,
        solicitation_supersedes,
        cross_references = cross_references.len(),
        "cross-reference analysis complete"
    );

    ConflictAnalysis {
        component_supersedes,
        solicitation_supersedes,
        cross_references,
    }
}
