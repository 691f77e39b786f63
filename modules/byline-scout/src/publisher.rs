use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use byline_common::{JournalistRecord, PublishError};

use crate::traits::SheetSink;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Published(usize),
    /// Nothing new to mirror.
    Skipped,
    /// No spreadsheet configured for this run.
    Disabled,
    Failed(PublishError),
}

impl fmt::Display for PublishOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishOutcome::Published(n) => write!(f, "published {n} rows"),
            PublishOutcome::Skipped => f.write_str("nothing to publish"),
            PublishOutcome::Disabled => f.write_str("publishing disabled"),
            PublishOutcome::Failed(e) => write!(f, "publish failed: {e}"),
        }
    }
}

/// Mirrors newly verified rows into a worksheet. Local files stay the
/// source of truth; a failed publish is logged and never retried in-run.
pub struct SyncPublisher {
    sink: Option<Arc<dyn SheetSink>>,
    worksheet: String,
}

impl SyncPublisher {
    pub fn new(sink: Arc<dyn SheetSink>, worksheet: &str) -> Self {
        Self {
            sink: Some(sink),
            worksheet: worksheet.to_string(),
        }
    }

    pub fn disabled(worksheet: &str) -> Self {
        Self {
            sink: None,
            worksheet: worksheet.to_string(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn worksheet(&self) -> &str {
        &self.worksheet
    }

    pub async fn publish(&self, records: &[JournalistRecord]) -> PublishOutcome {
        if records.is_empty() {
            return PublishOutcome::Skipped;
        }
        let Some(sink) = &self.sink else {
            info!(count = records.len(), "Spreadsheet sync disabled, rows kept locally");
            return PublishOutcome::Disabled;
        };

        let rows: Vec<Vec<String>> = records.iter().map(JournalistRecord::to_row).collect();
        match sink.append_rows(&self.worksheet, &rows).await {
            Ok(()) => {
                info!(worksheet = %self.worksheet, count = rows.len(), "Synced rows to spreadsheet");
                PublishOutcome::Published(rows.len())
            }
            Err(e) => {
                warn!(worksheet = %self.worksheet, error = %e, "Spreadsheet sync failed");
                PublishOutcome::Failed(e)
            }
        }
    }
}
