use thiserror::Error;

pub type Result<T> = std::result::Result<T, EmailVerifyError>;

#[derive(Debug, Error)]
pub enum EmailVerifyError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Verification rejected by service: {0}")]
    Rejected(String),
}

impl From<reqwest::Error> for EmailVerifyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            EmailVerifyError::Timeout(err.to_string())
        } else {
            EmailVerifyError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for EmailVerifyError {
    fn from(err: serde_json::Error) -> Self {
        EmailVerifyError::Parse(err.to_string())
    }
}
