use serde::Deserialize;

/// Body returned by `GET /v1/verify`.
///
/// The service encodes booleans as the strings `"true"` / `"false"`.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyResponse {
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub disposable: Option<String>,
    #[serde(default)]
    pub accept_all: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub safe_to_send: Option<String>,
    #[serde(default)]
    pub success: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl VerifyResponse {
    /// `success` is absent on older API versions; treat absence as success.
    pub fn succeeded(&self) -> bool {
        self.success.as_deref().map_or(true, |s| s == "true")
    }
}
