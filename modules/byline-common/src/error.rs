use thiserror::Error;

/// Feed fetch failures. The affected outlet is skipped for the run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("feed request timed out")]
    Timeout,

    #[error("feed returned HTTP {0}")]
    Status(u16),

    #[error("feed request failed: {0}")]
    Network(String),
}

/// Page render failures. Discovery treats both as "no email found".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("render timed out: {0}")]
    Timeout(String),

    #[error("render failed: {0}")]
    Failed(String),
}

/// Transient verification failures. The record is requeued.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("verification timed out")]
    Timeout,

    #[error("verification API error: {0}")]
    Api(String),
}

/// Spreadsheet sync failures. Logged, never fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    #[error("destination not found: {0}")]
    NotFound(String),

    #[error("spreadsheet API error: {0}")]
    Api(String),
}

/// Global setup failures. These abort the run before any work.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}
