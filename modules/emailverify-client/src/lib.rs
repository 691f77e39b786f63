pub mod error;
pub mod types;

pub use error::{EmailVerifyError, Result};
pub use types::VerifyResponse;

const BASE_URL: &str = "https://api.quickemailverification.com/v1";

/// Header carrying the account's remaining verification credits.
const REMAINING_CREDITS_HEADER: &str = "X-QEV-Remaining-Credits";

pub struct EmailVerifyClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl EmailVerifyClient {
    pub fn new(api_key: String) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder().build()?,
            api_key,
            base_url: BASE_URL.to_string(),
        })
    }

    /// Verify a single address. One call consumes one account credit.
    pub async fn verify(&self, email: &str) -> Result<VerifyResponse> {
        let url = format!("{}/verify", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[("email", email), ("apikey", self.api_key.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(EmailVerifyError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        if let Some(remaining) = resp
            .headers()
            .get(REMAINING_CREDITS_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            tracing::info!(remaining_credits = remaining, "Verification credits remaining");
        }

        let body = resp.text().await?;
        let parsed: VerifyResponse = serde_json::from_str(&body)?;

        if !parsed.succeeded() {
            return Err(EmailVerifyError::Rejected(
                parsed.message.unwrap_or_else(|| "unknown failure".to_string()),
            ));
        }

        tracing::debug!(email, result = %parsed.result, "Verification response");
        Ok(parsed)
    }
}
