use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use scraper::{Html, Selector};
use tracing::{info, warn};

use browserless_client::{BrowserlessClient, BrowserlessError, ContentOptions};
use byline_common::RenderError;

use crate::traits::{PageLink, PageRenderer, RenderRequest, RenderedPage, ResourceType};

static BODY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("valid body selector"));
static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid anchor selector"));

/// Elements whose text is never shown to a reader.
const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

// --- HTML -> RenderedPage ---

/// Reduce a DOM dump to its visible body text and hyperlinks.
pub fn html_to_page(url: &str, html: &str) -> RenderedPage {
    let document = Html::parse_document(html);
    let root = document
        .select(&BODY)
        .next()
        .unwrap_or_else(|| document.root_element());

    let mut chunks = Vec::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
        });
        let trimmed = text.trim();
        if !hidden && !trimmed.is_empty() {
            chunks.push(trimmed);
        }
    }

    let links = document
        .select(&ANCHOR)
        .filter_map(|a| {
            let href = a.value().attr("href")?.trim();
            if href.is_empty() {
                return None;
            }
            let text = a.text().collect::<Vec<_>>().join(" ");
            Some(PageLink {
                text: text.split_whitespace().collect::<Vec<_>>().join(" "),
                href: href.to_string(),
            })
        })
        .collect();

    RenderedPage {
        url: url.to_string(),
        text: chunks.join(" "),
        links,
    }
}

// --- Browserless ---

pub struct BrowserlessRenderer {
    client: BrowserlessClient,
}

impl BrowserlessRenderer {
    pub fn new(client: BrowserlessClient) -> Self {
        info!(base_url = client.base_url(), "Using BrowserlessRenderer");
        Self { client }
    }
}

#[async_trait]
impl PageRenderer for BrowserlessRenderer {
    async fn render(&self, request: &RenderRequest) -> Result<RenderedPage, RenderError> {
        let options = ContentOptions {
            reject_resource_types: request.blocked.clone(),
            wait_until: request.wait_until,
            timeout: request.timeout,
        };

        match self.client.content_with(&request.url, &options).await {
            Ok(html) => Ok(html_to_page(&request.url, &html)),
            Err(BrowserlessError::Timeout(_)) => Err(RenderError::Timeout(request.url.clone())),
            Err(e) => Err(RenderError::Failed(e.to_string())),
        }
    }

    fn name(&self) -> &str {
        "browserless"
    }
}

// --- Local headless Chromium ---

/// Max attempts for transient launch failures (e.g. "Cannot fork").
const CHROME_MAX_ATTEMPTS: u32 = 3;
/// Backoff is base * 3^attempt plus up to 1s of jitter.
const CHROME_RETRY_BASE: Duration = Duration::from_secs(3);

pub struct ChromeRenderer {
    chrome_bin: String,
    retry_base: Duration,
}

impl ChromeRenderer {
    pub fn new(chrome_bin: &str) -> Self {
        info!(chrome_bin, "Using ChromeRenderer (dump-dom)");
        Self {
            chrome_bin: chrome_bin.to_string(),
            retry_base: CHROME_RETRY_BASE,
        }
    }

    fn is_transient(message: &str) -> bool {
        message.contains("Cannot fork") || message.contains("Resource temporarily unavailable")
    }

    async fn backoff(&self, url: &str, attempt: u32, reason: &str) {
        let backoff = self.retry_base * 3u32.pow(attempt);
        let jitter = Duration::from_millis(rand::rng().random_range(0..1000));
        warn!(
            url,
            attempt = attempt + 1,
            backoff_secs = backoff.as_secs(),
            reason,
            "Chrome render failed, retrying after backoff"
        );
        tokio::time::sleep(backoff + jitter).await;
    }

    /// Launch Chrome --dump-dom and return the serialized DOM.
    async fn run_chrome(&self, request: &RenderRequest) -> Result<String, RenderError> {
        let url = request.url.as_str();
        let parsed = url::Url::parse(url).map_err(|e| RenderError::Failed(format!("{url}: {e}")))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(RenderError::Failed(format!(
                "only http/https URLs can be rendered, got {}",
                parsed.scheme()
            )));
        }

        let mut args = vec![
            "--headless".to_string(),
            "--no-sandbox".to_string(),
            "--disable-gpu".to_string(),
            "--disable-dev-shm-usage".to_string(),
        ];
        if request.blocked.contains(&ResourceType::Image) {
            args.push("--blink-settings=imagesEnabled=false".to_string());
        }

        for attempt in 0..CHROME_MAX_ATTEMPTS {
            let profile = tempfile::tempdir()
                .map_err(|e| RenderError::Failed(format!("temp profile dir: {e}")))?;

            let result = tokio::time::timeout(
                request.timeout,
                tokio::process::Command::new(&self.chrome_bin)
                    .args(&args)
                    .arg(format!("--user-data-dir={}", profile.path().display()))
                    .arg("--dump-dom")
                    .arg(url)
                    .kill_on_drop(true)
                    .output(),
            )
            .await;

            let retry_left = attempt + 1 < CHROME_MAX_ATTEMPTS;
            match result {
                Err(_) => return Err(RenderError::Timeout(url.to_string())),
                Ok(Err(e)) => {
                    let msg = e.to_string();
                    if Self::is_transient(&msg) && retry_left {
                        self.backoff(url, attempt, "launch").await;
                        continue;
                    }
                    return Err(RenderError::Failed(format!("failed to run Chrome: {msg}")));
                }
                Ok(Ok(output)) if output.status.success() => {
                    if output.stdout.is_empty() && retry_left {
                        self.backoff(url, attempt, "empty DOM").await;
                        continue;
                    }
                    return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
                }
                Ok(Ok(output)) => {
                    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
                    if Self::is_transient(&stderr) && retry_left {
                        self.backoff(url, attempt, "fork").await;
                        continue;
                    }
                    return Err(RenderError::Failed(format!("Chrome exited with error: {stderr}")));
                }
            }
        }

        Ok(String::new())
    }
}

#[async_trait]
impl PageRenderer for ChromeRenderer {
    async fn render(&self, request: &RenderRequest) -> Result<RenderedPage, RenderError> {
        let html = self.run_chrome(request).await?;
        if html.trim().is_empty() {
            warn!(url = %request.url, renderer = "chrome", "Empty DOM output");
        }
        Ok(html_to_page(&request.url, &html))
    }

    fn name(&self) -> &str {
        "chrome"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visible_text_skips_scripts_and_styles() {
        let html = r#"<html><head><title>T</title><style>.a{color:red}</style></head>
            <body>
              <h1>Headline</h1>
              <script>var tracker = "ads@tracker.example";</script>
              <p>Reach me at  jane@news.example</p>
              <noscript>enable js</noscript>
            </body></html>"#;

        let page = html_to_page("https://news.example/a1", html);
        assert_eq!(page.url, "https://news.example/a1");
        assert!(page.text.contains("Headline"));
        assert!(page.text.contains("jane@news.example"));
        assert!(!page.text.contains("tracker"));
        assert!(!page.text.contains("color:red"));
        assert!(!page.text.contains("enable js"));
    }

    #[test]
    fn links_keep_text_and_raw_href() {
        let html = r#"<body>
              <a href="/author/jane-doe">By
                 Jane Doe</a>
              <a href="mailto:john@news.example?subject=Hi">John Smith</a>
              <a>no target</a>
              <a href="  ">blank</a>
            </body>"#;

        let page = html_to_page("https://news.example/a1", html);
        assert_eq!(
            page.links,
            vec![
                PageLink {
                    text: "By Jane Doe".into(),
                    href: "/author/jane-doe".into(),
                },
                PageLink {
                    text: "John Smith".into(),
                    href: "mailto:john@news.example?subject=Hi".into(),
                },
            ]
        );
    }

    #[test]
    fn empty_dom_is_an_empty_page() {
        let page = html_to_page("https://news.example/", "");
        assert!(page.text.is_empty());
        assert!(page.links.is_empty());
    }

    #[tokio::test]
    async fn missing_chrome_binary_fails_without_retrying() {
        let renderer = ChromeRenderer::new("/nonexistent/chromium-for-tests");
        let request = RenderRequest::lightweight("https://news.example/a1", Duration::from_secs(5));
        let err = renderer.render(&request).await.unwrap_err();
        assert!(matches!(err, RenderError::Failed(_)));
    }

    #[tokio::test]
    async fn non_http_urls_are_rejected() {
        let renderer = ChromeRenderer::new("chromium");
        let request = RenderRequest::lightweight("file:///etc/passwd", Duration::from_secs(5));
        let err = renderer.render(&request).await.unwrap_err();
        assert!(matches!(err, RenderError::Failed(_)));
    }
}
