use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::types::Edition;

const DEFAULT_VERIFY_CREDITS: usize = 100;

/// Timeouts and pacing for one batch run.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub fetch_timeout: Duration,
    pub render_timeout: Duration,
    pub verify_timeout: Duration,
    /// Sleep after each definitive verification call (service rate limit).
    pub pacing_delay: Duration,
    /// Sleep after each resolved lead (politeness toward outlets).
    pub lead_delay: Duration,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(15),
            render_timeout: Duration::from_secs(60),
            verify_timeout: Duration::from_secs(15),
            pacing_delay: Duration::from_secs(1),
            lead_delay: Duration::from_secs(1),
        }
    }
}

impl RunSettings {
    /// No pacing and short timeouts, for tests.
    pub fn immediate() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(1),
            render_timeout: Duration::from_secs(1),
            verify_timeout: Duration::from_millis(200),
            pacing_delay: Duration::ZERO,
            lead_delay: Duration::ZERO,
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub edition: Edition,
    pub data_dir: PathBuf,

    // Rendering
    pub browserless_url: Option<String>,
    pub browserless_token: Option<String>,
    pub chrome_bin: String,

    // Spreadsheet sync
    pub sheet_name: Option<String>,
    pub google_credentials_file: PathBuf,

    // Verification
    pub email_verify_key: Option<String>,
    pub verify_credits: usize,

    pub settings: RunSettings,
}

impl Config {
    /// Config for the lead monitor. No credential is required.
    pub fn monitor_from_env(edition: Edition) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(edition, |key| std::env::var(key).ok())
    }

    /// Config for the verification worker. `EMAIL_VERIFY_KEY` is required.
    pub fn validator_from_env(edition: Edition) -> Result<Self, ConfigError> {
        let config = Self::monitor_from_env(edition)?;
        config.require_verify_key()?;
        Ok(config)
    }

    /// Build a config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup(
        edition: Edition,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let verify_credits = match get("VERIFY_CREDITS") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "VERIFY_CREDITS",
                value: raw,
            })?,
            None => DEFAULT_VERIFY_CREDITS,
        };

        Ok(Self {
            edition,
            data_dir: PathBuf::from(get("DATA_DIR").unwrap_or_else(|| "data".to_string())),
            browserless_url: get("BROWSERLESS_URL"),
            browserless_token: get("BROWSERLESS_TOKEN"),
            chrome_bin: get("CHROME_BIN").unwrap_or_else(|| "chromium".to_string()),
            sheet_name: get("JOURNALIST_SHEET_NAME"),
            google_credentials_file: PathBuf::from(
                get("GOOGLE_CREDENTIALS_FILE").unwrap_or_else(|| "credentials.json".to_string()),
            ),
            email_verify_key: get("EMAIL_VERIFY_KEY"),
            verify_credits,
            settings: RunSettings::default(),
        })
    }

    pub fn require_verify_key(&self) -> Result<&str, ConfigError> {
        self.email_verify_key
            .as_deref()
            .ok_or(ConfigError::Missing("EMAIL_VERIFY_KEY"))
    }

    /// Log the effective config with secrets shortened to a preview.
    pub fn log_redacted(&self) {
        fn preview(val: &str) -> String {
            let n = val.chars().take(5).map(char::len_utf8).sum::<usize>();
            format!("{}...({} chars)", &val[..n], val.chars().count())
        }
        fn preview_opt(val: &Option<String>) -> String {
            match val {
                Some(v) => preview(v),
                None => "<not set>".to_string(),
            }
        }

        tracing::info!("Config loaded:");
        tracing::info!("  EDITION: {}", self.edition);
        tracing::info!("  DATA_DIR: {}", self.data_dir.display());
        tracing::info!(
            "  BROWSERLESS_URL: {}",
            self.browserless_url.as_deref().unwrap_or("<not set>")
        );
        tracing::info!("  BROWSERLESS_TOKEN: {}", preview_opt(&self.browserless_token));
        tracing::info!("  CHROME_BIN: {}", self.chrome_bin);
        tracing::info!(
            "  JOURNALIST_SHEET_NAME: {}",
            self.sheet_name.as_deref().unwrap_or("<not set>")
        );
        tracing::info!(
            "  GOOGLE_CREDENTIALS_FILE: {}",
            self.google_credentials_file.display()
        );
        tracing::info!("  EMAIL_VERIFY_KEY: {}", preview_opt(&self.email_verify_key));
        tracing::info!("  VERIFY_CREDITS: {}", self.verify_credits);
    }
}
