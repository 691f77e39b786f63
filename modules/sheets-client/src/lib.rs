pub mod error;
pub mod types;

pub use error::{Result, SheetsError};
pub use types::{AppendResponse, AppendUpdates, ServiceAccountKey};

use std::path::Path;
use std::time::Duration;

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use tokio::sync::Mutex;
use types::{Claims, DriveFileList, TokenResponse, ValueRange};

const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const SCOPES: &str =
    "https://www.googleapis.com/auth/spreadsheets https://www.googleapis.com/auth/drive.readonly";
const JWT_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Refresh the access token this many seconds before Google says it expires.
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

struct CachedToken {
    value: String,
    expires_at: i64,
}

/// Google Sheets client bound to one spreadsheet, opened by its title.
pub struct SheetsClient {
    client: reqwest::Client,
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    spreadsheet_name: String,
    token: Mutex<Option<CachedToken>>,
    spreadsheet_id: Mutex<Option<String>>,
}

impl SheetsClient {
    pub fn new(key: ServiceAccountKey, spreadsheet_name: &str) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            key,
            encoding_key,
            spreadsheet_name: spreadsheet_name.to_string(),
            token: Mutex::new(None),
            spreadsheet_id: Mutex::new(None),
        })
    }

    /// Load a service-account `credentials.json` and bind to the named spreadsheet.
    pub fn from_credentials_file(path: &Path, spreadsheet_name: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SheetsError::Credentials(format!("cannot read {}: {e}", path.display()))
        })?;
        let key: ServiceAccountKey = serde_json::from_str(&raw)?;
        tracing::info!(
            client_email = %key.client_email,
            spreadsheet = spreadsheet_name,
            "Loaded Google service account"
        );
        Self::new(key, spreadsheet_name)
    }

    pub fn spreadsheet_name(&self) -> &str {
        &self.spreadsheet_name
    }

    /// Exchange a signed JWT for an OAuth access token, reusing a cached one while valid.
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        let now = chrono::Utc::now().timestamp();

        if let Some(ref token) = *cached {
            if token.expires_at - TOKEN_EXPIRY_MARGIN_SECS > now {
                return Ok(token.value.clone());
            }
        }

        let claims = Claims {
            iss: &self.key.client_email,
            scope: SCOPES,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + 3600,
        };
        let assertion =
            jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)?;

        let resp = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SheetsError::Auth(format!("status {status}: {body}")));
        }

        let token: TokenResponse = resp.json().await?;
        tracing::debug!(expires_in = token.expires_in, "Obtained Google access token");

        let value = token.access_token.clone();
        *cached = Some(CachedToken {
            value: token.access_token,
            expires_at: now + token.expires_in,
        });
        Ok(value)
    }

    /// Resolve the spreadsheet title to its file ID via the Drive API.
    async fn spreadsheet_id(&self, token: &str) -> Result<String> {
        let mut cached = self.spreadsheet_id.lock().await;
        if let Some(ref id) = *cached {
            return Ok(id.clone());
        }

        let query = drive_query(&self.spreadsheet_name);
        let resp = self
            .client
            .get(DRIVE_FILES_URL)
            .bearer_auth(token)
            .query(&[("q", query.as_str()), ("fields", "files(id,name)")])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SheetsError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let list: DriveFileList = resp.json().await?;
        let file = list.files.into_iter().next().ok_or_else(|| {
            SheetsError::NotFound(format!("spreadsheet '{}'", self.spreadsheet_name))
        })?;

        tracing::info!(spreadsheet = %file.name, id = %file.id, "Opened spreadsheet");
        *cached = Some(file.id.clone());
        Ok(file.id)
    }

    /// Append rows after the last non-empty row of `worksheet`.
    ///
    /// Values are interpreted as if typed by a user (`USER_ENTERED`).
    pub async fn append_rows(&self, worksheet: &str, rows: &[Vec<String>]) -> Result<AppendResponse> {
        let token = self.access_token().await?;
        let spreadsheet_id = self.spreadsheet_id(&token).await?;
        let url = append_url(&spreadsheet_id, worksheet)?;

        let resp = self
            .client
            .post(url)
            .bearer_auth(&token)
            .query(&[
                ("valueInputOption", "USER_ENTERED"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&ValueRange { values: rows })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_append_error(status.as_u16(), body, worksheet));
        }

        let appended: AppendResponse = resp.json().await?;
        tracing::info!(
            worksheet,
            rows = appended.updated_rows(),
            "Appended rows to worksheet"
        );
        Ok(appended)
    }
}

fn drive_query(spreadsheet_name: &str) -> String {
    let escaped = spreadsheet_name.replace('\\', "\\\\").replace('\'', "\\'");
    format!(
        "name = '{escaped}' and mimeType = 'application/vnd.google-apps.spreadsheet' and trashed = false"
    )
}

fn append_url(spreadsheet_id: &str, worksheet: &str) -> Result<url::Url> {
    let mut url =
        url::Url::parse(SHEETS_BASE_URL).map_err(|e| SheetsError::Parse(e.to_string()))?;
    let range = format!("'{}'!A1:append", worksheet.replace('\'', "''"));
    url.path_segments_mut()
        .map_err(|_| SheetsError::Parse("sheets base URL cannot be a base".to_string()))?
        .push(spreadsheet_id)
        .push("values")
        .push(&range);
    Ok(url)
}

/// A missing worksheet comes back as 400 "Unable to parse range".
fn classify_append_error(status: u16, body: String, worksheet: &str) -> SheetsError {
    match status {
        404 => SheetsError::NotFound(format!("spreadsheet for worksheet '{worksheet}'")),
        400 if body.contains("Unable to parse range") => {
            SheetsError::NotFound(format!("worksheet '{worksheet}'"))
        }
        401 | 403 => SheetsError::Auth(body),
        _ => SheetsError::Api {
            status,
            message: body,
        },
    }
}
