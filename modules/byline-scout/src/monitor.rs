//! Lead monitor: one sequential pass over the outlet catalogue.
//!
//! Outlets in catalogue order, leads in feed order. Per-outlet and per-lead
//! failures are logged and contained; only ledger load/append failures
//! abort the run.

use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use byline_common::{
    Edition, FetchError, JournalistRecord, Lead, LocationColumn, Outlet, RunSettings,
};

use crate::discoverer::EmailDiscoverer;
use crate::extractor::extract_leads;
use crate::ledger::{Destination, Ledger, LedgerSnapshot};
use crate::publisher::{PublishOutcome, SyncPublisher};
use crate::resolver::{resolve, Identity, Resolution, SkipReason};
use crate::traits::FeedFetcher;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorStats {
    pub outlets_checked: usize,
    pub outlets_failed: usize,
    pub leads_seen: usize,
    pub duplicates: usize,
    pub blacklisted: usize,
    /// Leads whose email was found on the web and stored as verified.
    pub discovered: usize,
    /// Leads stored with a guessed email awaiting verification.
    pub pending: usize,
    pub publish: PublishOutcome,
}

impl Default for MonitorStats {
    fn default() -> Self {
        Self {
            outlets_checked: 0,
            outlets_failed: 0,
            leads_seen: 0,
            duplicates: 0,
            blacklisted: 0,
            discovered: 0,
            pending: 0,
            publish: PublishOutcome::Skipped,
        }
    }
}

impl fmt::Display for MonitorStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Monitor run:")?;
        writeln!(
            f,
            "  outlets: {} checked, {} failed",
            self.outlets_checked, self.outlets_failed
        )?;
        writeln!(f, "  leads seen: {}", self.leads_seen)?;
        writeln!(f, "  duplicates: {}", self.duplicates)?;
        writeln!(f, "  blacklisted guesses: {}", self.blacklisted)?;
        writeln!(f, "  emails discovered: {}", self.discovered)?;
        writeln!(f, "  queued for verification: {}", self.pending)?;
        write!(f, "  sync: {}", self.publish)
    }
}

pub struct Monitor {
    edition: Edition,
    outlets: Vec<Outlet>,
    ledger: Ledger,
    fetcher: Arc<dyn FeedFetcher>,
    discoverer: EmailDiscoverer,
    publisher: SyncPublisher,
    settings: RunSettings,
}

impl Monitor {
    pub fn new(
        edition: Edition,
        outlets: Vec<Outlet>,
        ledger: Ledger,
        fetcher: Arc<dyn FeedFetcher>,
        discoverer: EmailDiscoverer,
        publisher: SyncPublisher,
        settings: RunSettings,
    ) -> Self {
        Self {
            edition,
            outlets,
            ledger,
            fetcher,
            discoverer,
            publisher,
            settings,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub async fn run(&self) -> Result<MonitorStats> {
        let mut snapshot = self.ledger.snapshot().context("Failed to load ledger")?;
        let mut stats = MonitorStats::default();
        let mut verified = Vec::new();
        let mut pending = Vec::new();

        info!(
            edition = %self.edition,
            outlets = self.outlets.len(),
            "Starting monitor run"
        );

        for outlet in &self.outlets {
            stats.outlets_checked += 1;

            let leads: Vec<Lead> = match self.leads_for(outlet).await {
                Some(leads) => leads,
                None => {
                    stats.outlets_failed += 1;
                    continue;
                }
            };
            debug!(outlet = %outlet.name, leads = leads.len(), "Feed parsed");

            for lead in leads {
                stats.leads_seen += 1;
                let identity = match resolve(&lead, outlet, &mut snapshot) {
                    Resolution::Skip(SkipReason::Duplicate) => {
                        stats.duplicates += 1;
                        continue;
                    }
                    Resolution::Skip(SkipReason::Blacklisted) => {
                        debug!(author = %lead.author_name, "Guessed email is blacklisted, skipping");
                        stats.blacklisted += 1;
                        continue;
                    }
                    Resolution::Proceed(identity) => identity,
                };

                info!(author = %lead.author_name, outlet = %outlet.name, "New journalist");
                match self.discover(&lead, &snapshot).await {
                    Some(email) => {
                        stats.discovered += 1;
                        verified.push(self.record(&identity, email, outlet, &lead));
                    }
                    None => {
                        stats.pending += 1;
                        let guess = identity.guessed_email.clone();
                        pending.push(self.record(&identity, guess, outlet, &lead));
                    }
                }

                if !self.settings.lead_delay.is_zero() {
                    tokio::time::sleep(self.settings.lead_delay).await;
                }
            }
        }

        self.ledger
            .append(&verified, Destination::Verified)
            .context("Failed to append verified records")?;
        self.ledger
            .append(&pending, Destination::Pending)
            .context("Failed to append pending records")?;

        stats.publish = self.publisher.publish(&verified).await;
        info!(
            discovered = stats.discovered,
            pending = stats.pending,
            "Monitor run complete"
        );
        Ok(stats)
    }

    /// Fetch and parse one outlet's feed. `None` means the outlet is skipped.
    async fn leads_for(&self, outlet: &Outlet) -> Option<Vec<Lead>> {
        let fetch = tokio::time::timeout(
            self.settings.fetch_timeout,
            self.fetcher.fetch(&outlet.feed_url),
        );
        let payload = match fetch.await.unwrap_or(Err(FetchError::Timeout)) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(
                    outlet = %outlet.name,
                    url = %outlet.feed_url,
                    error = %e,
                    "Feed fetch failed, skipping outlet"
                );
                return None;
            }
        };

        match extract_leads(&payload) {
            Ok(leads) => Some(leads.collect()),
            Err(e) => {
                warn!(
                    outlet = %outlet.name,
                    url = %outlet.feed_url,
                    error = %e,
                    "Feed parse failed, skipping outlet"
                );
                None
            }
        }
    }

    /// Discovered address, unless it is one the blacklist already rejected.
    async fn discover(&self, lead: &Lead, snapshot: &LedgerSnapshot) -> Option<String> {
        let email = self
            .discoverer
            .discover(&lead.article_url, &lead.author_name)
            .await?;
        if snapshot.is_blacklisted(&email) {
            info!(email = %email, "Discovered email is blacklisted, using guess");
            return None;
        }
        Some(email)
    }

    fn record(
        &self,
        identity: &Identity,
        email: String,
        outlet: &Outlet,
        lead: &Lead,
    ) -> JournalistRecord {
        let (city, region) = match self.edition.location_column() {
            LocationColumn::City => (outlet.region.clone(), String::new()),
            LocationColumn::Region => (String::new(), outlet.region.clone()),
        };
        JournalistRecord {
            first_name: identity.first_name.clone(),
            last_name: identity.last_name.clone(),
            email,
            city,
            region,
            country: self.edition.country().to_string(),
            outlet_name: outlet.name.clone(),
            title: lead.article_title.clone(),
            source_url: lead.article_url.clone(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::testing::{outlet, rss_item, rss_feed, MockFeedFetcher, MockRenderer};

    fn monitor(
        dir: &std::path::Path,
        edition: Edition,
        outlets: Vec<Outlet>,
        fetcher: MockFeedFetcher,
        renderer: MockRenderer,
    ) -> Monitor {
        Monitor::new(
            edition,
            outlets,
            Ledger::new(dir, edition),
            Arc::new(fetcher),
            EmailDiscoverer::new(Arc::new(renderer), Duration::from_secs(1)),
            SyncPublisher::disabled(edition.worksheet()),
            RunSettings::immediate(),
        )
    }

    #[tokio::test]
    async fn uk_edition_puts_region_in_city_column() {
        let dir = tempfile::tempdir().unwrap();
        let feed = rss_feed(&[rss_item("Story", "https://news.example/a1", "Jane Doe")]);
        let fetcher = MockFeedFetcher::new().with_feed("https://news.example/feed", feed);
        let uk_outlet = Outlet::new(
            "News",
            "https://news.example/",
            "London",
            "https://news.example/feed",
        );
        let monitor = monitor(
            dir.path(),
            Edition::UnitedKingdom,
            vec![uk_outlet],
            fetcher,
            MockRenderer::new(),
        );

        monitor.run().await.unwrap();
        let pending = monitor.ledger().load_pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].city, "London");
        assert_eq!(pending[0].region, "");
        assert_eq!(pending[0].country, "UK");
    }

    #[tokio::test]
    async fn canada_edition_puts_region_in_region_column() {
        let dir = tempfile::tempdir().unwrap();
        let feed = rss_feed(&[rss_item("Story", "https://news.example/a1", "Jane Doe")]);
        let fetcher = MockFeedFetcher::new().with_feed("https://news.example/feed", feed);
        let monitor = monitor(
            dir.path(),
            Edition::Canada,
            vec![outlet("News", "https://news.example/", "https://news.example/feed")],
            fetcher,
            MockRenderer::new(),
        );

        monitor.run().await.unwrap();
        let pending = monitor.ledger().load_pending().unwrap();
        assert_eq!(pending[0].region, "Ontario");
        assert_eq!(pending[0].city, "");
        assert_eq!(pending[0].country, "Canada");
        assert_eq!(pending[0].title, "Story");
        assert_eq!(pending[0].source_url, "https://news.example/a1");
    }

    #[test]
    fn stats_display_mentions_queue() {
        let stats = MonitorStats {
            pending: 2,
            ..Default::default()
        };
        assert!(stats.to_string().contains("queued for verification: 2"));
    }
}
