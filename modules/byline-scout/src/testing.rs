// Test mocks for the lead-resolution pipeline.
//
// One mock per trait boundary:
// - MockFeedFetcher (FeedFetcher): HashMap-based URL→payload
// - MockRenderer (PageRenderer): HashMap-based URL→page, records renders
// - MockVerifier (EmailVerifier): scripted per-address answers, records calls
// - MockSheetSink (SheetSink): records appended rows, can be made to fail
//
// Plus helpers for building outlets, records and RSS payloads.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use byline_common::{
    FetchError, JournalistRecord, Outlet, PublishError, RenderError, Verdict, VerifyError,
};

use crate::traits::{
    EmailVerifier, FeedFetcher, PageLink, PageRenderer, RenderRequest, RenderedPage, SheetSink,
};

// ---------------------------------------------------------------------------
// MockFeedFetcher
// ---------------------------------------------------------------------------

/// Unregistered URLs answer HTTP 404.
pub struct MockFeedFetcher {
    feeds: HashMap<String, Result<Vec<u8>, FetchError>>,
    fetched: Mutex<Vec<String>>,
}

impl MockFeedFetcher {
    pub fn new() -> Self {
        Self {
            feeds: HashMap::new(),
            fetched: Mutex::new(Vec::new()),
        }
    }

    pub fn with_feed(mut self, url: &str, payload: Vec<u8>) -> Self {
        self.feeds.insert(url.to_string(), Ok(payload));
        self
    }

    pub fn with_error(mut self, url: &str, error: FetchError) -> Self {
        self.feeds.insert(url.to_string(), Err(error));
        self
    }

    pub fn fetched_urls(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

impl Default for MockFeedFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedFetcher for MockFeedFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.fetched.lock().unwrap().push(url.to_string());
        self.feeds
            .get(url)
            .cloned()
            .unwrap_or(Err(FetchError::Status(404)))
    }
}

// ---------------------------------------------------------------------------
// MockRenderer
// ---------------------------------------------------------------------------

/// Unregistered URLs fail to render.
pub struct MockRenderer {
    pages: HashMap<String, Result<RenderedPage, RenderError>>,
    hanging: HashSet<String>,
    rendered: Mutex<Vec<String>>,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            hanging: HashSet::new(),
            rendered: Mutex::new(Vec::new()),
        }
    }

    pub fn on_page(mut self, url: &str, text: &str, links: Vec<PageLink>) -> Self {
        let page = RenderedPage {
            url: url.to_string(),
            text: text.to_string(),
            links,
        };
        self.pages.insert(url.to_string(), Ok(page));
        self
    }

    pub fn on_error(mut self, url: &str, error: RenderError) -> Self {
        self.pages.insert(url.to_string(), Err(error));
        self
    }

    /// Never answers within any test deadline.
    pub fn on_hang(mut self, url: &str) -> Self {
        self.hanging.insert(url.to_string());
        self
    }

    pub fn rendered_urls(&self) -> Vec<String> {
        self.rendered.lock().unwrap().clone()
    }
}

impl Default for MockRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageRenderer for MockRenderer {
    async fn render(&self, request: &RenderRequest) -> Result<RenderedPage, RenderError> {
        self.rendered.lock().unwrap().push(request.url.clone());
        if self.hanging.contains(&request.url) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            return Err(RenderError::Timeout(request.url.clone()));
        }
        self.pages
            .get(&request.url)
            .cloned()
            .unwrap_or_else(|| Err(RenderError::Failed(format!("no page for {}", request.url))))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ---------------------------------------------------------------------------
// MockVerifier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum VerifyScript {
    Verdict(Verdict),
    Error(VerifyError),
    /// Never answers within any test deadline.
    Hang,
}

/// Answers from a per-address script. Unscripted addresses get an API error.
pub struct MockVerifier {
    scripts: HashMap<String, VerifyScript>,
    calls: Mutex<Vec<String>>,
}

impl MockVerifier {
    pub fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn script(mut self, email: &str, answer: VerifyScript) -> Self {
        self.scripts.insert(email.to_string(), answer);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmailVerifier for MockVerifier {
    async fn verify(&self, email: &str) -> Result<Verdict, VerifyError> {
        self.calls.lock().unwrap().push(email.to_string());
        match self.scripts.get(email).cloned() {
            Some(VerifyScript::Verdict(verdict)) => Ok(verdict),
            Some(VerifyScript::Error(error)) => Err(error),
            Some(VerifyScript::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(VerifyError::Timeout)
            }
            None => Err(VerifyError::Api(format!("unscripted address {email}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// MockSheetSink
// ---------------------------------------------------------------------------

pub struct MockSheetSink {
    failure: Option<PublishError>,
    calls: Mutex<Vec<(String, Vec<Vec<String>>)>>,
}

impl MockSheetSink {
    pub fn new() -> Self {
        Self {
            failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: PublishError) -> Self {
        Self {
            failure: Some(error),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every `(destination, rows)` pair received, including failed attempts.
    pub fn calls(&self) -> Vec<(String, Vec<Vec<String>>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockSheetSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SheetSink for MockSheetSink {
    async fn append_rows(
        &self,
        destination: &str,
        rows: &[Vec<String>],
    ) -> Result<(), PublishError> {
        self.calls
            .lock()
            .unwrap()
            .push((destination.to_string(), rows.to_vec()));
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Outlet tagged with the "Ontario" region.
pub fn outlet(name: &str, base_url: &str, feed_url: &str) -> Outlet {
    Outlet::new(name, base_url, "Ontario", feed_url)
}

pub fn record(first_name: &str, last_name: &str, email: &str) -> JournalistRecord {
    JournalistRecord {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email: email.to_string(),
        country: "Canada".to_string(),
        ..Default::default()
    }
}

pub fn rss_item(title: &str, link: &str, author: &str) -> String {
    format!(
        "<item><title>{title}</title><link>{link}</link><dc:creator>{author}</dc:creator></item>"
    )
}

pub fn rss_feed(items: &[String]) -> Vec<u8> {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/">
<channel>
<title>Test Feed</title>
<link>https://news.example/</link>
<description>Test</description>
{}
</channel>
</rss>"#,
        items.concat()
    )
    .into_bytes()
}
