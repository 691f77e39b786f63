pub mod error;

pub use error::{BrowserlessError, Result};

use std::time::Duration;

use serde::Serialize;

/// Slack added on top of the navigation timeout for the HTTP round trip.
const REQUEST_SLACK: Duration = Duration::from_secs(5);

/// Sub-resource types Browserless can refuse to load while rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Image,
    Stylesheet,
    Font,
    Media,
    #[serde(rename = "cspviolationreport")]
    CspReport,
}

/// Navigation event Browserless waits for before returning the DOM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitUntil {
    Load,
    DomContentLoaded,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GotoOptions {
    wait_until: WaitUntil,
    timeout: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ContentBody<'a> {
    url: &'a str,
    reject_resource_types: &'a [ResourceType],
    goto_options: GotoOptions,
}

/// Options for a single `/content` render.
#[derive(Debug, Clone)]
pub struct ContentOptions {
    pub reject_resource_types: Vec<ResourceType>,
    pub wait_until: WaitUntil,
    pub timeout: Duration,
}

impl Default for ContentOptions {
    fn default() -> Self {
        Self {
            reject_resource_types: Vec::new(),
            wait_until: WaitUntil::Load,
            timeout: Duration::from_secs(30),
        }
    }
}

pub struct BrowserlessClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl BrowserlessClient {
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self> {
        let client = reqwest::Client::builder().build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch fully-rendered HTML content for a URL via Browserless /content endpoint.
    pub async fn content(&self, url: &str) -> Result<String> {
        self.content_with(url, &ContentOptions::default()).await
    }

    /// Fetch rendered HTML with resource blocking, a wait condition and a navigation timeout.
    ///
    /// A navigation timeout inside Browserless (HTTP 408) and a client-side
    /// timeout both surface as [`BrowserlessError::Timeout`].
    pub async fn content_with(&self, url: &str, options: &ContentOptions) -> Result<String> {
        let mut endpoint = format!("{}/content", self.base_url);
        if let Some(ref token) = self.token {
            endpoint.push_str(&format!("?token={token}"));
        }

        let body = ContentBody {
            url,
            reject_resource_types: &options.reject_resource_types,
            goto_options: GotoOptions {
                wait_until: options.wait_until,
                timeout: options.timeout.as_millis() as u64,
            },
        };

        tracing::debug!(url, timeout_ms = body.goto_options.timeout, "Browserless content request");

        let resp = self
            .client
            .post(&endpoint)
            .timeout(options.timeout + REQUEST_SLACK)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if status.as_u16() == 408 {
            return Err(BrowserlessError::Timeout(url.to_string()));
        }
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(BrowserlessError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_body_uses_browserless_field_names() {
        let blocked = [ResourceType::Image, ResourceType::CspReport];
        let body = ContentBody {
            url: "https://news.example/a1",
            reject_resource_types: &blocked,
            goto_options: GotoOptions {
                wait_until: WaitUntil::DomContentLoaded,
                timeout: 60_000,
            },
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["url"], "https://news.example/a1");
        assert_eq!(
            json["rejectResourceTypes"],
            serde_json::json!(["image", "cspviolationreport"])
        );
        assert_eq!(json["gotoOptions"]["waitUntil"], "domcontentloaded");
        assert_eq!(json["gotoOptions"]["timeout"], 60_000);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = BrowserlessClient::new("http://localhost:3000/", None).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
    }
}
