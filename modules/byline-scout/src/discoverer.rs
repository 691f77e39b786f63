//! Best-effort email discovery from an article page or its author page.
//!
//! Absence is a normal outcome. Render failures are logged and treated as
//! "nothing found" so one slow page never aborts the run.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use byline_common::RenderError;
use regex::Regex;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use url::Url;

use crate::traits::{PageLink, PageRenderer, RenderRequest, RenderedPage};

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("valid email regex")
});

const MAILTO: &str = "mailto:";

pub struct EmailDiscoverer {
    renderer: Arc<dyn PageRenderer>,
    timeout: Duration,
}

impl EmailDiscoverer {
    pub fn new(renderer: Arc<dyn PageRenderer>, timeout: Duration) -> Self {
        Self { renderer, timeout }
    }

    pub async fn discover(&self, article_url: &str, author_name: &str) -> Option<String> {
        let article = self.render(article_url).await?;

        let page = match author_link(&article, author_name) {
            Some(link) => {
                if let Some(address) = mailto_address(&link.href) {
                    info!(author = author_name, email = %address, "Found mailto link on article");
                    return Some(address);
                }
                match absolute_url(article_url, &link.href) {
                    Some(author_url) => {
                        debug!(author = author_name, url = %author_url, "Following author link");
                        self.render(&author_url).await?
                    }
                    None => article,
                }
            }
            None => article,
        };

        let found = first_email(&page.text);
        match &found {
            Some(email) => info!(author = author_name, email = %email, url = %page.url, "Discovered email"),
            None => debug!(author = author_name, url = %page.url, "No email on page"),
        }
        found
    }

    async fn render(&self, url: &str) -> Option<RenderedPage> {
        let request = RenderRequest::lightweight(url, self.timeout);
        let rendered = timeout(self.timeout, self.renderer.render(&request))
            .await
            .unwrap_or_else(|_| Err(RenderError::Timeout(url.to_string())));
        match rendered {
            Ok(page) => Some(page),
            Err(e) => {
                warn!(url, renderer = self.renderer.name(), error = %e, "Render failed, no email");
                None
            }
        }
    }
}

/// First hyperlink whose text mentions the author, case-insensitively.
pub fn author_link<'a>(page: &'a RenderedPage, author_name: &str) -> Option<&'a PageLink> {
    let needle = author_name.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    if needle.is_empty() {
        return None;
    }
    page.links
        .iter()
        .find(|link| link.text.to_lowercase().contains(&needle))
}

/// `mailto:jane@x.com?subject=hi` -> `jane@x.com`.
pub fn mailto_address(href: &str) -> Option<String> {
    let scheme = href.get(..MAILTO.len())?;
    if !scheme.eq_ignore_ascii_case(MAILTO) {
        return None;
    }
    let rest = &href[MAILTO.len()..];
    let address = rest.split('?').next().unwrap_or_default().trim();
    (!address.is_empty()).then(|| address.to_string())
}

/// Resolve `href` against the article's origin. Absolute targets pass through.
pub fn absolute_url(article_url: &str, href: &str) -> Option<String> {
    if let Ok(absolute) = Url::parse(href) {
        return matches!(absolute.scheme(), "http" | "https").then(|| absolute.to_string());
    }
    let base = Url::parse(article_url).ok()?;
    let origin = base.origin().ascii_serialization();
    let origin = Url::parse(&origin).ok()?;
    origin.join(href).ok().map(|u| u.to_string())
}

pub fn first_email(text: &str) -> Option<String> {
    EMAIL_PATTERN.find(text).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockRenderer;

    fn link(text: &str, href: &str) -> PageLink {
        PageLink {
            text: text.into(),
            href: href.into(),
        }
    }

    // ---------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------

    #[test]
    fn mailto_strips_scheme_and_query() {
        assert_eq!(
            mailto_address("mailto:jane@news.example?subject=Tip").as_deref(),
            Some("jane@news.example")
        );
        assert_eq!(
            mailto_address("MAILTO:jane@news.example").as_deref(),
            Some("jane@news.example")
        );
        assert_eq!(mailto_address("/author/jane"), None);
        assert_eq!(mailto_address("mailto:"), None);
    }

    #[test]
    fn relative_links_resolve_against_origin() {
        assert_eq!(
            absolute_url("https://news.example/2024/01/story?x=1", "/author/jane-doe").as_deref(),
            Some("https://news.example/author/jane-doe")
        );
        assert_eq!(
            absolute_url("https://news.example/2024/01/story", "author/jane").as_deref(),
            Some("https://news.example/author/jane")
        );
        assert_eq!(
            absolute_url("https://news.example/a1", "https://other.example/staff/jane").as_deref(),
            Some("https://other.example/staff/jane")
        );
        assert_eq!(absolute_url("https://news.example/a1", "javascript:void(0)"), None);
    }

    #[test]
    fn author_link_matches_case_insensitive_substring() {
        let page = RenderedPage {
            url: "https://news.example/a1".into(),
            text: String::new(),
            links: vec![link("Home", "/"), link("By JANE DOE", "/author/jane")],
        };
        assert_eq!(author_link(&page, "Jane Doe").map(|l| l.href.as_str()), Some("/author/jane"));
        assert!(author_link(&page, "John Smith").is_none());
    }

    #[test]
    fn email_pattern_needs_two_letter_tld() {
        assert_eq!(
            first_email("write to jane.doe+tips@news.example.com today").as_deref(),
            Some("jane.doe+tips@news.example.com")
        );
        assert_eq!(first_email("not-an-email@host.c"), None);
        assert_eq!(first_email("nothing here"), None);
    }

    // ---------------------------------------------------------------
    // Protocol
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn mailto_on_article_short_circuits() {
        let renderer = Arc::new(MockRenderer::new().on_page(
            "https://news.example/a1",
            "Contact sales@news.example",
            vec![link("Jane Doe", "mailto:jane@news.example")],
        ));
        let discoverer = EmailDiscoverer::new(renderer.clone(), Duration::from_secs(1));

        let email = discoverer.discover("https://news.example/a1", "Jane Doe").await;
        assert_eq!(email.as_deref(), Some("jane@news.example"));
        assert_eq!(renderer.rendered_urls(), vec!["https://news.example/a1"]);
    }

    #[tokio::test]
    async fn author_page_is_followed_and_scanned() {
        let renderer = Arc::new(
            MockRenderer::new()
                .on_page(
                    "https://news.example/2024/story",
                    "Story body, press@news.example",
                    vec![link("Jane Doe", "/author/jane-doe")],
                )
                .on_page(
                    "https://news.example/author/jane-doe",
                    "Jane covers city hall. Email: jane.doe@news.example",
                    vec![],
                ),
        );
        let discoverer = EmailDiscoverer::new(renderer.clone(), Duration::from_secs(1));

        let email = discoverer
            .discover("https://news.example/2024/story", "Jane Doe")
            .await;
        assert_eq!(email.as_deref(), Some("jane.doe@news.example"));
        assert_eq!(
            renderer.rendered_urls(),
            vec![
                "https://news.example/2024/story",
                "https://news.example/author/jane-doe"
            ]
        );
    }

    #[tokio::test]
    async fn without_author_link_the_article_text_is_scanned() {
        let renderer = Arc::new(MockRenderer::new().on_page(
            "https://news.example/a1",
            "Tips: tips@news.example",
            vec![],
        ));
        let discoverer = EmailDiscoverer::new(renderer, Duration::from_secs(1));

        let email = discoverer.discover("https://news.example/a1", "Jane Doe").await;
        assert_eq!(email.as_deref(), Some("tips@news.example"));
    }

    #[tokio::test]
    async fn render_timeout_yields_none() {
        let renderer = Arc::new(MockRenderer::new().on_error(
            "https://news.example/a1",
            RenderError::Timeout("https://news.example/a1".into()),
        ));
        let discoverer = EmailDiscoverer::new(renderer, Duration::from_secs(1));

        assert_eq!(discoverer.discover("https://news.example/a1", "Jane Doe").await, None);
    }

    #[tokio::test]
    async fn failed_author_page_yields_none() {
        let renderer = Arc::new(
            MockRenderer::new()
                .on_page(
                    "https://news.example/a1",
                    "desk@news.example",
                    vec![link("Jane Doe", "/author/jane")],
                )
                .on_error(
                    "https://news.example/author/jane",
                    RenderError::Failed("boom".into()),
                ),
        );
        let discoverer = EmailDiscoverer::new(renderer, Duration::from_secs(1));

        assert_eq!(discoverer.discover("https://news.example/a1", "Jane Doe").await, None);
    }

    #[tokio::test]
    async fn hanging_renderer_is_cut_off_at_the_deadline() {
        let renderer = Arc::new(MockRenderer::new().on_hang("https://news.example/a1"));
        let discoverer = EmailDiscoverer::new(renderer, Duration::from_millis(100));

        let started = std::time::Instant::now();
        let email = discoverer.discover("https://news.example/a1", "Jane Doe").await;

        assert_eq!(email, None);
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
