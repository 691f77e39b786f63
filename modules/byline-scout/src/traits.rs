// Collaborator boundaries for the lead-resolution pipeline.
//
// Feed fetch, page render, email verification and spreadsheet sync each sit
// behind one trait returning a tagged Result. Fakes live in `crate::testing`.

use std::time::Duration;

use async_trait::async_trait;

use byline_common::{FetchError, PublishError, RenderError, Verdict, VerifyError};

pub use browserless_client::{ResourceType, WaitUntil};

// ---------------------------------------------------------------------------
// FeedFetcher
// ---------------------------------------------------------------------------

#[async_trait]
pub trait FeedFetcher: Send + Sync {
    /// Fetch the raw feed payload.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

// ---------------------------------------------------------------------------
// PageRenderer
// ---------------------------------------------------------------------------

/// Sub-resources skipped when rendering pages for email discovery.
pub const NON_ESSENTIAL_RESOURCES: [ResourceType; 5] = [
    ResourceType::Image,
    ResourceType::Stylesheet,
    ResourceType::Font,
    ResourceType::Media,
    ResourceType::CspReport,
];

#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub url: String,
    pub blocked: Vec<ResourceType>,
    pub timeout: Duration,
    pub wait_until: WaitUntil,
}

impl RenderRequest {
    /// DOM-ready render with non-essential sub-resources blocked.
    pub fn lightweight(url: &str, timeout: Duration) -> Self {
        Self {
            url: url.to_string(),
            blocked: NON_ESSENTIAL_RESOURCES.to_vec(),
            timeout,
            wait_until: WaitUntil::DomContentLoaded,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    pub text: String,
    pub href: String,
}

/// Visible text and hyperlinks of a rendered page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedPage {
    pub url: String,
    pub text: String,
    pub links: Vec<PageLink>,
}

#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, request: &RenderRequest) -> Result<RenderedPage, RenderError>;
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// EmailVerifier
// ---------------------------------------------------------------------------

#[async_trait]
pub trait EmailVerifier: Send + Sync {
    /// Ask the verification service about one address. The caller bounds the
    /// call with its own deadline.
    async fn verify(&self, email: &str) -> Result<Verdict, VerifyError>;
}

#[async_trait]
impl EmailVerifier for emailverify_client::EmailVerifyClient {
    async fn verify(&self, email: &str) -> Result<Verdict, VerifyError> {
        match self.verify(email).await {
            Ok(resp) => Ok(Verdict::parse(&resp.result)),
            Err(emailverify_client::EmailVerifyError::Timeout(_)) => Err(VerifyError::Timeout),
            Err(e) => Err(VerifyError::Api(e.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// SheetSink
// ---------------------------------------------------------------------------

#[async_trait]
pub trait SheetSink: Send + Sync {
    async fn append_rows(&self, destination: &str, rows: &[Vec<String>])
        -> Result<(), PublishError>;
}

#[async_trait]
impl SheetSink for sheets_client::SheetsClient {
    async fn append_rows(
        &self,
        destination: &str,
        rows: &[Vec<String>],
    ) -> Result<(), PublishError> {
        match self.append_rows(destination, rows).await {
            Ok(_) => Ok(()),
            Err(sheets_client::SheetsError::NotFound(what)) => Err(PublishError::NotFound(what)),
            Err(e) => Err(PublishError::Api(e.to_string())),
        }
    }
}
