//! Source-document fetcher and extractor.
//!
//! Given a URL and a document-type tag, [`DocumentFetcher::fetch`] retrieves
//! the PDF over HTTP, extracts linear text plus a page count, and runs the
//! five extraction passes in [`passes`] to produce a
//! [`ParsedDocument`](solguide_shared::ParsedDocument).

pub mod passes;

use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use tracing::{debug, info, instrument};

use solguide_shared::{DocumentType, ParsedDocument, Result, SolguideError};

/// User-Agent string for source-document requests.
const USER_AGENT: &str = concat!("Solguide/", env!("CARGO_PKG_VERSION"));

/// HTTP fetcher for source instruction documents.
pub struct DocumentFetcher {
    client: Client,
}

impl DocumentFetcher {
    /// Create a fetcher with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(timeout)
            .build()
            .map_err(|e| SolguideError::fetch(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Fetch one source document and extract its structured content.
    ///
    /// A non-2xx response is a [`SolguideError::Fetch`]; a text-extraction
    /// failure on a successful fetch is a [`SolguideError::Extract`]. Both are
    /// surfaced to the caller, never swallowed here.
    #[instrument(skip(self), fields(url = %url, document_type = %document_type))]
    pub async fn fetch(&self, url: &str, document_type: DocumentType) -> Result<ParsedDocument> {
        debug!("fetching source document");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SolguideError::fetch(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SolguideError::fetch(format!("{url}: HTTP {status}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SolguideError::fetch(format!("{url}: body read failed: {e}")))?;

        let pages = pdf_extract::extract_text_from_mem_by_pages(&bytes)
            .map_err(|e| SolguideError::extract(format!("{url}: {e}")))?;

        let page_count = pages.len();
        let plain_text = pages.join("\n\n");

        let doc = parse_text(url, document_type, plain_text, page_count);

        info!(
            page_count = doc.page_count,
            volumes = doc.volumes.len(),
            checklist_items = doc.checklist.len(),
            key_dates = doc.key_dates.len(),
            contacts = doc.contacts.len(),
            text_len = doc.plain_text.len(),
            "document extracted"
        );

        Ok(doc)
    }
}

/// Run the five extraction passes over already-extracted text.
///
/// Split out from [`DocumentFetcher::fetch`] so the passes can be exercised
/// without network or PDF decoding.
pub fn parse_text(
    source_url: &str,
    document_type: DocumentType,
    plain_text: String,
    page_count: usize,
) -> ParsedDocument {
    let volumes = passes::extract_volumes(&plain_text);
    let checklist = passes::extract_checklist(&plain_text);
    let key_dates = passes::extract_key_dates(&plain_text);
    let submission_guidelines = passes::extract_submission_guidelines(&plain_text);
    let contacts = passes::extract_contacts(&plain_text);

    ParsedDocument {
        source_url: source_url.to_string(),
        document_type,
        plain_text,
        volumes,
        checklist,
        key_dates,
        submission_guidelines,
        contacts,
        page_count,
        extracted_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Generate a valid one-page PDF with text using lopdf (the library that
    /// pdf-extract uses internally).
    fn make_test_pdf(text: &str) -> Vec<u8> {
        use lopdf::dictionary;
        use lopdf::{Document, Object, Stream};

        let mut doc = Document::with_version("1.4");

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        // Page content stream: BT /F1 12 Tf (text) Tj ET
        let content = format!("BT /F1 12 Tf 100 700 Td ({text}) Tj ET");
        let content_stream = Stream::new(dictionary! {}, content.into_bytes());
        let content_id = doc.add_object(content_stream);

        let resources = dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        };

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => resources,
        });

        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        });

        if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(page_id) {
            dict.set("Parent", pages_id);
        }

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });

        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn parse_text_runs_all_passes() {
        let text = "Volume 1: Cost Proposal\n\nProvide a complete cost breakdown.\n\n\
                    Submission deadline: March 15, 2026\n\
                    Contact help@dsip.mil for questions.\n"
            .to_string();

        let doc = parse_text("https://example.com/baa.pdf", DocumentType::Solicitation, text, 3);

        assert_eq!(doc.page_count, 3);
        assert_eq!(doc.document_type, DocumentType::Solicitation);
        assert_eq!(doc.volumes.len(), 1);
        assert_eq!(
            doc.key_dates.get("Submission deadline").map(String::as_str),
            Some("March 15, 2026")
        );
        assert_eq!(doc.contacts, vec!["help@dsip.mil".to_string()]);
    }

    #[tokio::test]
    async fn fetch_extracts_pdf_from_mock_server() {
        let server = wiremock::MockServer::start().await;
        let pdf = make_test_pdf("Volume 1: Cost Proposal - full cost breakdown required");

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/component.pdf"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_raw(pdf, "application/pdf"),
            )
            .mount(&server)
            .await;

        let fetcher = DocumentFetcher::new(Duration::from_secs(5)).unwrap();
        let url = format!("{}/component.pdf", server.uri());
        let doc = fetcher.fetch(&url, DocumentType::Component).await.unwrap();

        assert_eq!(doc.page_count, 1);
        assert!(doc.plain_text.contains("Cost Proposal"));
        assert_eq!(doc.source_url, url);
    }

    #[tokio::test]
    async fn fetch_non_2xx_is_fetch_error() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/missing.pdf"))
            .respond_with(wiremock::ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = DocumentFetcher::new(Duration::from_secs(5)).unwrap();
        let url = format!("{}/missing.pdf", server.uri());
        let err = fetcher
            .fetch(&url, DocumentType::Component)
            .await
            .unwrap_err();

        assert!(matches!(err, SolguideError::Fetch(_)));
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn fetch_garbage_body_is_extract_error() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/not-a-pdf"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_raw(b"this is not a pdf".to_vec(), "application/pdf"),
            )
            .mount(&server)
            .await;

        let fetcher = DocumentFetcher::new(Duration::from_secs(5)).unwrap();
        let url = format!("{}/not-a-pdf", server.uri());
        let err = fetcher
            .fetch(&url, DocumentType::Baa)
            .await
            .unwrap_err();

        assert!(matches!(err, SolguideError::Extract(_)));
    }
}
