//! Pattern-based extraction passes over a source document's linear text.
//!
//! Every pass is a bounded regular-expression scan with explicit caps on item
//! count and string length, so extraction terminates in time linear in the
//! document length and never produces unbounded output from malformed input.
//! There is deliberately no statistical model here: solicitation boilerplate
//! is formulaic enough that fixed patterns stay explainable and cheap.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use solguide_shared::VolumeRequirement;

/// Maximum checklist items retained per document.
const MAX_CHECKLIST_ITEMS: usize = 50;
/// Maximum requirements retained per volume.
const MAX_VOLUME_REQUIREMENTS: usize = 20;
/// Maximum emails and phones retained, each.
const MAX_CONTACTS_EACH: usize = 5;
/// Maximum guideline lines retained.
const MAX_GUIDELINE_LINES: usize = 10;
/// Volume descriptions are truncated to this many characters.
const MAX_DESCRIPTION_CHARS: usize = 300;

// ---------------------------------------------------------------------------
// Pass 1: Volumes
// ---------------------------------------------------------------------------

static VOLUME_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    // "Volume 2: Technical Proposal", "Vol. 3 - Company Information",
    // "VOLUME IV: Supporting Documents"
    Regex::new(r"(?i)\bvol(?:ume|\.)\s+(\d{1,2}|[ivx]{1,4})\s*[:\-]\s*([^\n]{1,120})")
        .expect("valid regex")
});

static REQUIREMENT_SENTENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:must|shall|should|required to)\s+[^.\n]{1,200}\.").expect("valid regex")
});

static BULLET_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*[•●○▪▫\-\*]\s+(\S[^\n]*)$").expect("valid regex"));

/// Extract numbered proposal volumes and their requirements.
///
/// Duplicate headers for the same volume number are merged into one entry:
/// the first-seen name and description win, requirement lists are combined.
pub fn extract_volumes(text: &str) -> Vec<VolumeRequirement> {
    // All header occurrences, in document order, with slice boundaries.
    let headers: Vec<(usize, usize, u32, String)> = VOLUME_HEADER_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let m = caps.get(0)?;
            let number = parse_volume_number(caps.get(1)?.as_str())?;
            let name = caps.get(2)?.as_str().trim().to_string();
            Some((m.start(), m.end(), number, name))
        })
        .collect();

    let mut volumes: Vec<VolumeRequirement> = Vec::new();

    for (i, (_, end, number, name)) in headers.iter().enumerate() {
        // Slice between this header and the next volume header (or EOF).
        let slice_end = headers
            .get(i + 1)
            .map(|(start, ..)| *start)
            .unwrap_or(text.len());
        let slice = &text[*end..slice_end];

        let requirements = extract_volume_requirements(slice);

        match volumes.iter_mut().find(|v| v.volume_number == *number) {
            Some(existing) => {
                // Duplicate header for an already-seen number: merge requirements.
                for req in requirements {
                    if !existing.requirements.contains(&req)
                        && existing.requirements.len() < MAX_VOLUME_REQUIREMENTS
                    {
                        existing.requirements.push(req);
                    }
                }
            }
            None => {
                volumes.push(VolumeRequirement {
                    volume_number: *number,
                    volume_name: name.clone(),
                    description: first_paragraph(slice, MAX_DESCRIPTION_CHARS),
                    requirements,
                    page_numbers: None,
                });
            }
        }
    }

    volumes.sort_by_key(|v| v.volume_number);
    volumes
}

/// Requirement candidates inside one volume's text slice: bullet lines and
/// must/shall/should sentences, 10–200 characters, deduplicated.
fn extract_volume_requirements(slice: &str) -> Vec<String> {
    let mut requirements: Vec<String> = Vec::new();

    let candidates = BULLET_LINE_RE
        .captures_iter(slice)
        .filter_map(|c| c.get(1).map(|m| m.as_str().trim().to_string()))
        .chain(
            REQUIREMENT_SENTENCE_RE
                .find_iter(slice)
                .map(|m| m.as_str().trim().to_string()),
        );

    for candidate in candidates {
        if requirements.len() >= MAX_VOLUME_REQUIREMENTS {
            break;
        }
        let len = candidate.chars().count();
        if (10..=200).contains(&len) && !requirements.contains(&candidate) {
            requirements.push(candidate);
        }
    }

    requirements
}

/// First non-empty paragraph of a slice, truncated to `max_chars`.
fn first_paragraph(slice: &str, max_chars: usize) -> String {
    let para = slice
        .split("\n\n")
        .map(str::trim)
        .find(|p| !p.is_empty())
        .unwrap_or("");
    truncate_chars(para, max_chars)
}

/// Normalize a volume label: Roman numerals I–X or decimal digits.
fn parse_volume_number(label: &str) -> Option<u32> {
    const ROMAN: [(&str, u32); 10] = [
        ("I", 1),
        ("II", 2),
        ("III", 3),
        ("IV", 4),
        ("V", 5),
        ("VI", 6),
        ("VII", 7),
        ("VIII", 8),
        ("IX", 9),
        ("X", 10),
    ];

    let upper = label.to_ascii_uppercase();
    if let Some((_, n)) = ROMAN.iter().find(|(r, _)| *r == upper) {
        return Some(*n);
    }
    match label.parse::<u32>() {
        Ok(n) if n > 0 => Some(n),
        _ => None,
    }
}

/// Truncate on a character boundary without splitting a code point.
fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

// ---------------------------------------------------------------------------
// Pass 2: Checklist
// ---------------------------------------------------------------------------

static CHECKLIST_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)checklist|required\s+documents|submission\s+requirements")
        .expect("valid regex")
});

static SECTION_END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z\d]+\.\s+[A-Z]").expect("valid regex"));

static CHECKLIST_ITEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Bulleted, numbered, or lettered list lines.
    Regex::new(r"^(?:[•●○▪▫\-]\s*|\d+[.)]\s*|[A-Za-z][.)]\s+)(.+)$").expect("valid regex")
});

/// Extract checklist items: list lines inside a checklist-style section, plus
/// document-wide must/shall sentences. Deduplicated, capped.
pub fn extract_checklist(text: &str) -> Vec<String> {
    let mut checklist: Vec<String> = Vec::new();
    let mut in_section = false;

    for line in text.lines() {
        let line = line.trim();

        if CHECKLIST_HEADER_RE.is_match(line) {
            in_section = true;
            continue;
        }

        // A new major section heading ends the checklist.
        if in_section && SECTION_END_RE.is_match(line) {
            in_section = false;
        }

        if in_section {
            if let Some(caps) = CHECKLIST_ITEM_RE.captures(line) {
                let item = caps[1].trim().to_string();
                if item.chars().count() > 10 && !checklist.contains(&item) {
                    checklist.push(item);
                }
            }
        }
    }

    // Mandatory-language sentences from anywhere in the document.
    for m in REQUIREMENT_SENTENCE_RE.find_iter(text) {
        if checklist.len() >= MAX_CHECKLIST_ITEMS {
            break;
        }
        let sentence = m.as_str().trim().to_string();
        let len = sentence.chars().count();
        if (20..=200).contains(&len) && !checklist.contains(&sentence) {
            checklist.push(sentence);
        }
    }

    checklist.truncate(MAX_CHECKLIST_ITEMS);
    checklist
}

// ---------------------------------------------------------------------------
// Pass 3: Key dates
// ---------------------------------------------------------------------------

static KEY_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(submission\s+deadline|proposal\s+due|due\s+date|close\s+date|open\s+date|questions?\s+due)[:\s]+([^\n]+)",
    )
    .expect("valid regex")
});

/// Extract key dates anchored on fixed label phrases, value running to the end
/// of the line. Keys are unique (case-insensitive), casing as first seen.
pub fn extract_key_dates(text: &str) -> BTreeMap<String, String> {
    let mut dates: BTreeMap<String, String> = BTreeMap::new();

    for caps in KEY_DATE_RE.captures_iter(text) {
        let label = caps[1].trim().to_string();
        let value = caps[2].trim().to_string();
        if value.is_empty() {
            continue;
        }
        let already_seen = dates.keys().any(|k| k.eq_ignore_ascii_case(&label));
        if !already_seen {
            dates.insert(label, value);
        }
    }

    dates
}

// ---------------------------------------------------------------------------
// Pass 4: Submission guidelines
// ---------------------------------------------------------------------------

static GUIDELINES_SECTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    // First submission process/procedure/guidelines section, lazily up to the
    // next paragraph that starts with a capital, a numbered heading, or EOF.
    Regex::new(r"(?is)submission\s+(?:process|procedure|guidelines)[:\s]+(.*?)(?:\n\n[A-Z]|\n\d+\.|\z)")
        .expect("valid regex")
});

/// Extract submission guidelines: up to 10 substantive lines from the first
/// submission process/procedure/guidelines section.
pub fn extract_submission_guidelines(text: &str) -> Vec<String> {
    let Some(caps) = GUIDELINES_SECTION_RE.captures(text) else {
        return Vec::new();
    };

    caps[1]
        .lines()
        .map(str::trim)
        .filter(|l| l.chars().count() > 20)
        .take(MAX_GUIDELINE_LINES)
        .map(String::from)
        .collect()
}

// ---------------------------------------------------------------------------
// Pass 5: Contacts
// ---------------------------------------------------------------------------

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\w.\-]+@[\w.\-]+\.\w+").expect("valid regex"));

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}").expect("valid regex")
});

/// Extract email- and US-phone-shaped substrings, deduplicated, capped at 5 each.
pub fn extract_contacts(text: &str) -> Vec<String> {
    let mut contacts: Vec<String> = Vec::new();

    for re in [&*EMAIL_RE, &*PHONE_RE] {
        let mut seen = 0usize;
        for m in re.find_iter(text) {
            if seen >= MAX_CONTACTS_EACH {
                break;
            }
            let value = m.as_str().to_string();
            if !contacts.contains(&value) {
                contacts.push(value);
                seen += 1;
            }
        }
    }

    contacts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volumes_with_arabic_and_roman_numbers() {
        let text = "Volume 1: Cost Proposal\n\nProvide a full cost breakdown.\n\n\
                    VOLUME II: Technical Proposal\n\nOfferors must describe the technical approach in detail.\n\n\
                    Vol. 3 - Company Information\n\nCompany history goes here.";
        let volumes = extract_volumes(text);

        assert_eq!(volumes.len(), 3);
        assert_eq!(volumes[0].volume_number, 1);
        assert_eq!(volumes[0].volume_name, "Cost Proposal");
        assert_eq!(volumes[1].volume_number, 2);
        assert_eq!(volumes[1].volume_name, "Technical Proposal");
        assert_eq!(volumes[2].volume_number, 3);
        assert_eq!(volumes[2].volume_name, "Company Information");
    }

    #[test]
    fn duplicate_volume_headers_merge_on_number() {
        let text = "Volume 2: Technical Proposal\n\n\
                    Offerors shall describe the proposed innovation clearly.\n\n\
                    Volume 2: Technical Volume\n\n\
                    Offerors must include a work plan and schedule.";
        let volumes = extract_volumes(text);

        assert_eq!(volumes.len(), 1);
        // First-seen name wins; requirements from both occurrences merge.
        assert_eq!(volumes[0].volume_name, "Technical Proposal");
        assert!(
            volumes[0]
                .requirements
                .iter()
                .any(|r| r.contains("innovation"))
        );
        assert!(
            volumes[0]
                .requirements
                .iter()
                .any(|r| r.contains("work plan"))
        );
    }

    #[test]
    fn volume_description_is_first_paragraph_truncated() {
        let long_para = "A ".repeat(400);
        let text = format!("Volume 1: Cost Proposal\n\n{long_para}\n\nSecond paragraph.");
        let volumes = extract_volumes(&text);

        assert_eq!(volumes.len(), 1);
        assert!(volumes[0].description.chars().count() <= 300);
        assert!(volumes[0].description.starts_with("A A"));
    }

    #[test]
    fn volume_requirements_honor_length_bounds() {
        let text = "Volume 1: Cost Proposal\n\n\
                    - Short\n\
                    - Provide a detailed cost breakdown by task and labor category\n\
                    The offeror shall submit rates.\n";
        let volumes = extract_volumes(&text);
        let reqs = &volumes[0].requirements;

        assert!(reqs.iter().any(|r| r.contains("cost breakdown")));
        assert!(!reqs.iter().any(|r| r == "Short"));
        assert!(reqs.iter().all(|r| {
            let n = r.chars().count();
            (10..=200).contains(&n)
        }));
    }

    #[test]
    fn volumes_sorted_ascending() {
        let text = "Volume 3: Company Information\n\nText.\n\nVolume 1: Cost Proposal\n\nText.";
        let volumes = extract_volumes(text);
        assert_eq!(volumes[0].volume_number, 1);
        assert_eq!(volumes[1].volume_number, 3);
    }

    #[test]
    fn checklist_section_items_extracted() {
        let text = "Submission Requirements\n\
                    • Complete SF 1449 form before the deadline\n\
                    1. Include all required certifications\n\
                    a) Provide past performance references\n\
                    x\n\
                    A. NEXT MAJOR SECTION\n\
                    • This bullet is outside the checklist section entirely\n";
        let checklist = extract_checklist(text);

        assert!(checklist.iter().any(|i| i.contains("SF 1449")));
        assert!(checklist.iter().any(|i| i.contains("certifications")));
        assert!(checklist.iter().any(|i| i.contains("past performance")));
        assert!(!checklist.iter().any(|i| i.contains("outside the checklist")));
    }

    #[test]
    fn checklist_deduplicates_and_caps() {
        let mut text = String::from("Checklist\n");
        for i in 0..80 {
            text.push_str(&format!("• Required submission element number {i} of the proposal\n"));
        }
        // Duplicate line should collapse.
        text.push_str("• Required submission element number 0 of the proposal\n");

        let checklist = extract_checklist(&text);
        assert!(checklist.len() <= 50);
        let first = "Required submission element number 0 of the proposal";
        assert_eq!(checklist.iter().filter(|i| i.as_str() == first).count(), 1);
    }

    #[test]
    fn key_dates_anchor_and_value() {
        let text = "Questions due: February 1, 2026\nSubmission deadline: March 15, 2026\n";
        let dates = extract_key_dates(text);

        assert_eq!(dates.get("Submission deadline").map(String::as_str), Some("March 15, 2026"));
        assert_eq!(dates.get("Questions due").map(String::as_str), Some("February 1, 2026"));
    }

    #[test]
    fn key_dates_first_seen_casing_wins() {
        let text = "Close Date: June 1, 2026\nclose date: June 2, 2026\n";
        let dates = extract_key_dates(text);

        assert_eq!(dates.len(), 1);
        assert_eq!(dates.get("Close Date").map(String::as_str), Some("June 1, 2026"));
    }

    #[test]
    fn submission_guidelines_capped_at_ten_lines() {
        let mut text = String::from("Submission Process:\n");
        for i in 0..15 {
            text.push_str(&format!("Step {i}: upload the relevant volume through the portal\n"));
        }
        text.push_str("\n\nNext Section Title\n");

        let guidelines = extract_submission_guidelines(&text);
        assert_eq!(guidelines.len(), 10);
        assert!(guidelines[0].contains("Step 0"));
    }

    #[test]
    fn contacts_dedup_and_cap() {
        let text = "Contact john.doe@af.mil or jane@navy.mil, john.doe@af.mil again. \
                    Call (703) 555-1234 or 202-555-9876.";
        let contacts = extract_contacts(text);

        assert!(contacts.contains(&"john.doe@af.mil".to_string()));
        assert_eq!(
            contacts.iter().filter(|c| c.as_str() == "john.doe@af.mil").count(),
            1
        );
        assert!(contacts.iter().any(|c| c.contains("555-1234")));

        let many: String = (0..9)
            .map(|i| format!("person{i}@example.com "))
            .collect();
        let capped = extract_contacts(&many);
        assert_eq!(capped.len(), 5);
    }

    #[test]
    fn roman_numeral_normalization() {
        assert_eq!(parse_volume_number("IV"), Some(4));
        assert_eq!(parse_volume_number("ix"), Some(9));
        assert_eq!(parse_volume_number("X"), Some(10));
        assert_eq!(parse_volume_number("7"), Some(7));
        assert_eq!(parse_volume_number("0"), None);
        assert_eq!(parse_volume_number("XLII"), None);
    }
}
