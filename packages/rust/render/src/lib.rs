//! PDF renderer: turns a [`ConsolidatedModel`] into a paginated Letter-size
//! instruction guide.
//!
//! Rendering is two-pass. [`build_page_plan`] lays all content out into an
//! ordered sequence of [`Page`]s of positioned text spans; once the total page
//! count is known, [`stamp_footers`] adds the "Page k of N" line to every
//! page; [`paint`] then draws the plan with `printpdf`. Keeping the plan as
//! plain data makes pagination testable without decoding PDF bytes.

pub mod sanitize;
pub mod wrap;

pub use sanitize::sanitize;
pub use wrap::{text_width_mm, wrap};

use std::io::BufWriter;

use printpdf::{BuiltinFont, Mm, PdfDocument};
use tracing::{info, instrument};

use solguide_shared::{ConsolidatedModel, Result, SolguideError, VolumeRequirement};

// ---------------------------------------------------------------------------
// Page geometry
// ---------------------------------------------------------------------------

/// US Letter, in millimeters.
pub const PAGE_WIDTH_MM: f64 = 215.9;
pub const PAGE_HEIGHT_MM: f64 = 279.4;

const MARGIN_MM: f64 = 20.0;
const TOP_Y_MM: f64 = PAGE_HEIGHT_MM - 25.0;
const BOTTOM_MARGIN_MM: f64 = 25.0;
const FOOTER_Y_MM: f64 = 12.0;
const FOOTER_SIZE_PT: f64 = 8.0;

/// Usable text column width.
const TEXT_WIDTH_MM: f64 = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;

/// Vertical advance for a line of text at `size_pt`.
fn line_height(size_pt: f64) -> f64 {
    size_pt * 0.5
}

// ---------------------------------------------------------------------------
// Page plan
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Regular,
    Bold,
}

/// One positioned, sanitized run of text.
#[derive(Debug, Clone)]
pub struct TextSpan {
    pub text: String,
    pub x_mm: f64,
    pub y_mm: f64,
    pub size_pt: f64,
    pub style: FontStyle,
}

/// One planned page.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub spans: Vec<TextSpan>,
}

/// Accumulates spans down a single page with a descending cursor.
///
/// Once the cursor would cross the bottom margin, further lines are dropped
/// and `truncated` is set. Sections that must not lose content (the
/// checklist) check [`PageBuilder::fits`] up front and start a new page
/// instead; every other section truncates silently.
struct PageBuilder {
    spans: Vec<TextSpan>,
    cursor_mm: f64,
    truncated: bool,
}

impl PageBuilder {
    fn new() -> Self {
        Self {
            spans: Vec::new(),
            cursor_mm: TOP_Y_MM,
            truncated: false,
        }
    }

    fn fits(&self, needed_mm: f64) -> bool {
        self.cursor_mm - needed_mm >= BOTTOM_MARGIN_MM
    }

    /// Push one line at `x_mm`. Returns false once the page is full.
    fn line(&mut self, text: &str, size_pt: f64, style: FontStyle, x_mm: f64) -> bool {
        let height = line_height(size_pt);
        if !self.fits(height) {
            self.truncated = true;
            return false;
        }
        self.cursor_mm -= height;
        self.spans.push(TextSpan {
            text: sanitize(text),
            x_mm,
            y_mm: self.cursor_mm,
            size_pt,
            style,
        });
        true
    }

    /// Push one horizontally centered line.
    fn centered(&mut self, text: &str, size_pt: f64, style: FontStyle) -> bool {
        let clean = sanitize(text);
        let x = ((PAGE_WIDTH_MM - text_width_mm(&clean, size_pt)) / 2.0).max(MARGIN_MM);
        self.line(&clean, size_pt, style, x)
    }

    /// Wrap `text` into the column at `x_mm` and push every line that fits.
    fn wrapped(&mut self, text: &str, size_pt: f64, style: FontStyle, x_mm: f64) {
        let width = PAGE_WIDTH_MM - MARGIN_MM - x_mm;
        for line in wrap(&sanitize(text), size_pt, width) {
            if !self.line(&line, size_pt, style, x_mm) {
                break;
            }
        }
    }

    /// Wrap `text` centered line by line.
    fn centered_wrapped(&mut self, text: &str, size_pt: f64, style: FontStyle) {
        for line in wrap(&sanitize(text), size_pt, TEXT_WIDTH_MM) {
            if !self.centered(&line, size_pt, style) {
                break;
            }
        }
    }

    fn gap(&mut self, mm: f64) {
        self.cursor_mm -= mm;
    }

    fn finish(self) -> Page {
        Page { spans: self.spans }
    }
}

/// Lay the full guide out as an ordered page sequence, footers not yet
/// stamped.
///
/// Section order: cover, table of contents, quick reference, one page per
/// volume, checklist page(s), source documents.
pub fn build_page_plan(model: &ConsolidatedModel) -> Vec<Page> {
    let mut pages = vec![cover_page(model), toc_page(model), quick_reference_page(model)];

    if model.volumes.is_empty() {
        let mut builder = PageBuilder::new();
        builder.line("Volume Requirements", 18.0, FontStyle::Bold, MARGIN_MM);
        builder.gap(4.0);
        builder.wrapped(
            "No volume structure was extracted. Refer to the source documents for \
             the required proposal volumes.",
            10.0,
            FontStyle::Regular,
            MARGIN_MM,
        );
        pages.push(builder.finish());
    } else {
        for (index, volume) in model.volumes.iter().enumerate() {
            pages.push(volume_page(volume, index == 0));
        }
    }

    pages.extend(checklist_pages(model));
    pages.push(sources_page(model));
    pages
}

fn cover_page(model: &ConsolidatedModel) -> Page {
    let opp = &model.opportunity;
    let mut builder = PageBuilder::new();

    builder.gap(20.0);
    builder.centered("Consolidated Submission Instructions", 24.0, FontStyle::Bold);
    builder.gap(16.0);

    builder.centered_wrapped(&opp.title, 16.0, FontStyle::Regular);
    builder.gap(8.0);

    builder.centered(&format!("Topic Number: {}", opp.topic_number), 12.0, FontStyle::Regular);
    builder.gap(2.0);
    builder.centered(&format!("Component: {}", opp.component), 12.0, FontStyle::Regular);
    builder.centered(&format!("Program: {}", opp.program), 12.0, FontStyle::Regular);
    builder.centered(&format!("Phase: {}", opp.phase), 12.0, FontStyle::Regular);

    if opp.open_date.is_some() || opp.close_date.is_some() {
        builder.gap(6.0);
        if let Some(open) = &opp.open_date {
            builder.centered(&format!("Open Date: {open}"), 12.0, FontStyle::Regular);
        }
        if let Some(close) = &opp.close_date {
            builder.centered(&format!("Close Date: {close}"), 12.0, FontStyle::Regular);
        }
    }

    builder.gap(20.0);
    builder.centered("IMPORTANT NOTICE", 10.0, FontStyle::Bold);
    builder.gap(3.0);
    builder.centered_wrapped(
        "This document is a consolidated reference guide extracted from official \
         BAA and component instructions. Always verify requirements against the \
         original source documents listed at the end of this guide. Instructions \
         may be updated after this document was generated.",
        9.0,
        FontStyle::Regular,
    );

    builder.gap(16.0);
    builder.centered(
        &format!("Generated: {}", model.generated_at.format("%Y-%m-%d %H:%M UTC")),
        8.0,
        FontStyle::Regular,
    );

    builder.finish()
}

fn toc_page(model: &ConsolidatedModel) -> Page {
    let mut builder = PageBuilder::new();
    builder.line("Table of Contents", 18.0, FontStyle::Bold, MARGIN_MM);
    builder.gap(6.0);

    builder.line("1. Quick Reference Guide", 11.0, FontStyle::Regular, MARGIN_MM);
    builder.gap(2.0);
    builder.line("2. Volume Requirements", 11.0, FontStyle::Regular, MARGIN_MM);
    for volume in &model.volumes {
        builder.gap(1.0);
        builder.line(
            &format!("{}. {}", volume.volume_number, volume.volume_name),
            11.0,
            FontStyle::Regular,
            MARGIN_MM + 8.0,
        );
    }
    builder.gap(2.0);
    builder.line("3. Submission Checklist", 11.0, FontStyle::Regular, MARGIN_MM);
    builder.gap(2.0);
    builder.line("4. Source Documents", 11.0, FontStyle::Regular, MARGIN_MM);

    builder.finish()
}

fn quick_reference_page(model: &ConsolidatedModel) -> Page {
    let mut builder = PageBuilder::new();
    builder.line("Quick Reference Guide", 18.0, FontStyle::Bold, MARGIN_MM);
    builder.gap(6.0);

    if !model.key_dates.is_empty() {
        builder.line("Key Dates", 14.0, FontStyle::Bold, MARGIN_MM);
        builder.gap(3.0);
        for (label, value) in &model.key_dates {
            builder.wrapped(
                &format!("{label}: {value}"),
                10.0,
                FontStyle::Regular,
                MARGIN_MM,
            );
            builder.gap(1.5);
        }
        builder.gap(5.0);
    }

    if !model.contacts.is_empty() {
        builder.line("Contact Information", 14.0, FontStyle::Bold, MARGIN_MM);
        builder.gap(3.0);
        for contact in &model.contacts {
            builder.line(contact, 10.0, FontStyle::Regular, MARGIN_MM);
            builder.gap(1.5);
        }
        builder.gap(5.0);
    }

    builder.line("Volume Summary", 14.0, FontStyle::Bold, MARGIN_MM);
    builder.gap(3.0);
    for volume in &model.volumes {
        builder.line(
            &format!("Volume {}: {}", volume.volume_number, volume.volume_name),
            10.0,
            FontStyle::Regular,
            MARGIN_MM,
        );
        builder.gap(1.0);
    }

    builder.finish()
}

/// One volume per page. Overflowing requirements are truncated at the bottom
/// margin rather than continued.
fn volume_page(volume: &VolumeRequirement, first: bool) -> Page {
    let mut builder = PageBuilder::new();

    if first {
        builder.line("Volume Requirements", 18.0, FontStyle::Bold, MARGIN_MM);
        builder.gap(6.0);
    }

    builder.wrapped(
        &format!("Volume {}: {}", volume.volume_number, volume.volume_name),
        14.0,
        FontStyle::Bold,
        MARGIN_MM,
    );
    builder.gap(3.0);

    if !volume.description.is_empty() {
        builder.wrapped(&volume.description, 10.0, FontStyle::Regular, MARGIN_MM);
        builder.gap(3.0);
    }

    if !volume.requirements.is_empty() {
        builder.line("Requirements:", 11.0, FontStyle::Bold, MARGIN_MM);
        builder.gap(2.0);
        for requirement in &volume.requirements {
            builder.wrapped(
                &format!("- {requirement}"),
                9.0,
                FontStyle::Regular,
                MARGIN_MM + 4.0,
            );
            builder.gap(1.5);
        }
    }

    builder.finish()
}

/// The one section that paginates instead of truncating: the checklist is the
/// artifact's point, so dropped items would defeat it.
fn checklist_pages(model: &ConsolidatedModel) -> Vec<Page> {
    let mut pages = Vec::new();
    let mut builder = PageBuilder::new();

    builder.line("Submission Checklist", 18.0, FontStyle::Bold, MARGIN_MM);
    builder.gap(4.0);
    builder.wrapped(
        "Use this checklist to ensure your proposal includes all required elements. \
         Check the source documents for the most up-to-date requirements.",
        10.0,
        FontStyle::Regular,
        MARGIN_MM,
    );
    builder.gap(5.0);

    if model.checklist.is_empty() {
        builder.wrapped(
            "No specific checklist items were extracted. Refer to the source documents.",
            10.0,
            FontStyle::Regular,
            MARGIN_MM,
        );
        pages.push(builder.finish());
        return pages;
    }

    for (index, item) in model.checklist.iter().enumerate() {
        let text = format!("{}. [ ] {item}", index + 1);
        let lines = wrap(&sanitize(&text), 10.0, TEXT_WIDTH_MM);
        let needed = lines.len() as f64 * line_height(10.0) + 2.0;

        if !builder.fits(needed) {
            pages.push(builder.finish());
            builder = PageBuilder::new();
            builder.line("Submission Checklist (continued)", 18.0, FontStyle::Bold, MARGIN_MM);
            builder.gap(5.0);
        }

        for line in &lines {
            builder.line(line, 10.0, FontStyle::Regular, MARGIN_MM);
        }
        builder.gap(2.0);
    }

    pages.push(builder.finish());
    pages
}

fn sources_page(model: &ConsolidatedModel) -> Page {
    let mut builder = PageBuilder::new();
    builder.line("Source Documents", 18.0, FontStyle::Bold, MARGIN_MM);
    builder.gap(4.0);
    builder.wrapped(
        "This consolidated guide was generated from the following official documents. \
         Always verify requirements against the original sources:",
        10.0,
        FontStyle::Regular,
        MARGIN_MM,
    );
    builder.gap(6.0);

    if let Some(url) = &model.component_url {
        builder.line("Component Instructions:", 11.0, FontStyle::Bold, MARGIN_MM);
        builder.gap(1.5);
        builder.wrapped(url, 9.0, FontStyle::Regular, MARGIN_MM);
        builder.gap(5.0);
    }

    if let Some(url) = &model.solicitation_url {
        builder.line("BAA/Solicitation Instructions:", 11.0, FontStyle::Bold, MARGIN_MM);
        builder.gap(1.5);
        builder.wrapped(url, 9.0, FontStyle::Regular, MARGIN_MM);
        builder.gap(5.0);
    }

    builder.gap(8.0);
    builder.wrapped(
        "Note: source document URLs may become inactive after the solicitation \
         closes. The full instruction text is archived alongside the opportunity \
         record for historical reference.",
        8.0,
        FontStyle::Regular,
        MARGIN_MM,
    );

    builder.finish()
}

// ---------------------------------------------------------------------------
// Footers and paint
// ---------------------------------------------------------------------------

/// Second pass: stamp "Page k of N" on every planned page.
pub fn stamp_footers(pages: &mut [Page], topic_number: &str) {
    let total = pages.len();
    for (index, page) in pages.iter_mut().enumerate() {
        let text = sanitize(&format!(
            "Solguide - {topic_number} - Page {} of {total}",
            index + 1
        ));
        let x = ((PAGE_WIDTH_MM - text_width_mm(&text, FOOTER_SIZE_PT)) / 2.0).max(MARGIN_MM);
        page.spans.push(TextSpan {
            text,
            x_mm: x,
            y_mm: FOOTER_Y_MM,
            size_pt: FOOTER_SIZE_PT,
            style: FontStyle::Regular,
        });
    }
}

/// Draw a stamped page plan into PDF bytes.
pub fn paint(pages: &[Page], title: &str) -> Result<Vec<u8>> {
    let (doc, first_page, first_layer) = PdfDocument::new(
        title,
        Mm(PAGE_WIDTH_MM as f32),
        Mm(PAGE_HEIGHT_MM as f32),
        "Layer 1",
    );
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| SolguideError::Render(format!("font error: {e}")))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| SolguideError::Render(format!("font error: {e}")))?;

    let mut indices = vec![(first_page, first_layer)];
    for _ in 1..pages.len() {
        indices.push(doc.add_page(
            Mm(PAGE_WIDTH_MM as f32),
            Mm(PAGE_HEIGHT_MM as f32),
            "Layer 1",
        ));
    }

    for (page, (page_index, layer_index)) in pages.iter().zip(indices) {
        let layer = doc.get_page(page_index).get_layer(layer_index);
        for span in &page.spans {
            let font = match span.style {
                FontStyle::Regular => &regular,
                FontStyle::Bold => &bold,
            };
            layer.use_text(
                span.text.as_str(),
                span.size_pt as f32,
                Mm(span.x_mm as f32),
                Mm(span.y_mm as f32),
                font,
            );
        }
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| SolguideError::Render(format!("save error: {e}")))?;
    buf.into_inner()
        .map_err(|e| SolguideError::Render(format!("buffer error: {e}")))
}

/// Full pipeline: plan, stamp footers, paint.
#[instrument(skip_all, fields(topic = %model.opportunity.topic_number))]
pub fn render(model: &ConsolidatedModel) -> Result<Vec<u8>> {
    let mut pages = build_page_plan(model);
    stamp_footers(&mut pages, &model.opportunity.topic_number);

    let title = format!("Consolidated Instructions - {}", model.opportunity.topic_number);
    let bytes = paint(&pages, &title)?;

    info!(
        pages = pages.len(),
        bytes = bytes.len(),
        "rendered instruction guide"
    );
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use solguide_shared::{OpportunitySummary, Status};

    fn volume(number: u32, name: &str, requirements: usize) -> VolumeRequirement {
        VolumeRequirement {
            volume_number: number,
            volume_name: name.into(),
            description: "Prepared in accordance with the component instructions.".into(),
            requirements: (0..requirements)
                .map(|i| format!("Requirement {i} must be addressed in this volume."))
                .collect(),
            page_numbers: None,
        }
    }

    fn model(volumes: usize, checklist_items: usize) -> ConsolidatedModel {
        let mut key_dates = BTreeMap::new();
        key_dates.insert("Submission deadline".to_string(), "March 15, 2026".to_string());

        ConsolidatedModel {
            opportunity: OpportunitySummary {
                topic_number: "AF254-0001".into(),
                title: "Hypersonic Widget Research".into(),
                component: "USAF".into(),
                program: "SBIR".into(),
                phase: "Phase I".into(),
                status: Status::from("Open"),
                open_date: Some("2026-01-01".into()),
                close_date: Some("2026-03-15".into()),
            },
            volumes: (1..=volumes as u32)
                .map(|n| volume(n, &format!("Volume Name {n}"), 4))
                .collect(),
            checklist: (0..checklist_items)
                .map(|i| {
                    format!(
                        "Checklist item {i}: include the signed certification form and \
                         verify the page limit before uploading the final package."
                    )
                })
                .collect(),
            key_dates,
            submission_guidelines: vec!["Submit through DSIP before the deadline.".into()],
            contacts: vec!["help.desk@example.mil".into(), "555-123-4567".into()],
            component_url: Some("https://example.mil/component.pdf".into()),
            solicitation_url: Some("https://example.mil/baa.pdf".into()),
            generated_at: Utc::now(),
        }
    }

    fn footer_of(page: &Page) -> &TextSpan {
        let footers: Vec<&TextSpan> = page
            .spans
            .iter()
            .filter(|s| (s.y_mm - FOOTER_Y_MM).abs() < f64::EPSILON)
            .collect();
        assert_eq!(footers.len(), 1, "expected exactly one footer per page");
        footers[0]
    }

    #[test]
    fn plan_follows_section_order() {
        let plan = build_page_plan(&model(2, 5));

        assert!(plan[0].spans.iter().any(|s| s.text == "IMPORTANT NOTICE"));
        assert!(plan[1].spans.iter().any(|s| s.text == "Table of Contents"));
        assert!(plan[2].spans.iter().any(|s| s.text == "Quick Reference Guide"));
        assert!(plan[3].spans.iter().any(|s| s.text.starts_with("Volume 1:")));
        assert!(plan[4].spans.iter().any(|s| s.text.starts_with("Volume 2:")));
        assert!(plan[5].spans.iter().any(|s| s.text == "Submission Checklist"));
        assert!(
            plan.last()
                .unwrap()
                .spans
                .iter()
                .any(|s| s.text == "Source Documents")
        );
    }

    #[test]
    fn footers_count_strictly_from_one_to_n() {
        let mut plan = build_page_plan(&model(3, 40));
        stamp_footers(&mut plan, "AF254-0001");

        let total = plan.len();
        for (index, page) in plan.iter().enumerate() {
            let expected = format!("Solguide - AF254-0001 - Page {} of {total}", index + 1);
            assert_eq!(footer_of(page).text, expected);
        }
    }

    #[test]
    fn long_checklist_continues_onto_additional_pages() {
        let plan = build_page_plan(&model(1, 40));

        let checklist_pages = plan
            .iter()
            .filter(|p| {
                p.spans
                    .iter()
                    .any(|s| s.text.starts_with("Submission Checklist"))
            })
            .count();
        assert!(checklist_pages >= 2, "40 items should paginate");

        // Every item survived pagination.
        let last_item: Vec<&TextSpan> = plan
            .iter()
            .flat_map(|p| &p.spans)
            .filter(|s| s.text.starts_with("40. [ ]"))
            .collect();
        assert_eq!(last_item.len(), 1);
    }

    #[test]
    fn overlong_volume_truncates_to_one_page() {
        let mut data = model(1, 0);
        data.volumes[0] = volume(1, "Technical", 200);

        let plan = build_page_plan(&data);
        // The quick-reference page also names the volume, so key on the
        // requirements label that only volume pages carry.
        let volume_pages = plan
            .iter()
            .filter(|p| p.spans.iter().any(|s| s.text == "Requirements:"))
            .count();
        assert_eq!(volume_pages, 1);
    }

    #[test]
    fn spans_stay_inside_page_bounds() {
        let mut plan = build_page_plan(&model(3, 40));
        stamp_footers(&mut plan, "AF254-0001");

        for page in &plan {
            for span in &page.spans {
                assert!(span.y_mm >= 0.0 && span.y_mm <= PAGE_HEIGHT_MM);
                assert!(span.x_mm >= 0.0 && span.x_mm < PAGE_WIDTH_MM);
            }
        }
    }

    #[test]
    fn empty_model_still_renders_every_section() {
        let mut data = model(0, 0);
        data.volumes.clear();
        data.checklist.clear();
        data.key_dates.clear();
        data.contacts.clear();
        data.component_url = None;
        data.solicitation_url = None;

        let plan = build_page_plan(&data);
        // Cover, TOC, quick reference, empty-volumes page, checklist, sources.
        assert_eq!(plan.len(), 6);
        assert!(
            plan[5]
                .spans
                .iter()
                .all(|s| !s.text.contains("Component Instructions:"))
        );
    }

    #[test]
    fn render_produces_pdf_with_planned_page_count() {
        let data = model(3, 40);
        let plan = build_page_plan(&data);
        let bytes = render(&data).unwrap();

        assert!(bytes.starts_with(b"%PDF"));
        let parsed = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(parsed.get_pages().len(), plan.len());
    }
}
