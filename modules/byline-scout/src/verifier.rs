//! Verification queue worker.
//!
//! Drains the first `budget` pending records through the verification
//! service. Valid addresses are promoted, definitive rejections are
//! blacklisted and dropped, and transient failures are requeued at the front
//! of the pending store for the next run. Rows without an email are never
//! sent and are written back after the queue.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use byline_common::{JournalistRecord, RunSettings};

use crate::ledger::{Destination, Ledger, PendingRow};
use crate::publisher::{PublishOutcome, SyncPublisher};
use crate::traits::EmailVerifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Processing(usize),
    Finalizing,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    pub budget: usize,
    /// Records taken from the front of the pending store this run.
    pub processed: usize,
    /// Definitive answers received. Never exceeds `budget`.
    pub credits_used: usize,
    pub verified: usize,
    pub blacklisted: usize,
    /// Dropped without a call because the address was already blacklisted.
    pub already_blacklisted: usize,
    pub requeued: usize,
    /// Size of the rewritten pending store.
    pub remaining: usize,
    pub publish: PublishOutcome,
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Verification run:")?;
        writeln!(f, "  processed: {} (budget {})", self.processed, self.budget)?;
        writeln!(f, "  credits used: {}", self.credits_used)?;
        writeln!(f, "  verified: {}", self.verified)?;
        writeln!(
            f,
            "  blacklisted: {} (+{} already blacklisted)",
            self.blacklisted, self.already_blacklisted
        )?;
        writeln!(f, "  requeued: {}", self.requeued)?;
        writeln!(f, "  pending remaining: {}", self.remaining)?;
        write!(f, "  sync: {}", self.publish)
    }
}

/// Outcome of one record's verification attempt.
enum Step {
    Verified,
    Blacklisted,
    Requeue,
}

pub struct VerificationWorker {
    ledger: Ledger,
    verifier: Arc<dyn EmailVerifier>,
    publisher: SyncPublisher,
    budget: usize,
    settings: RunSettings,
    phase: Phase,
}

impl VerificationWorker {
    pub fn new(
        ledger: Ledger,
        verifier: Arc<dyn EmailVerifier>,
        publisher: SyncPublisher,
        budget: usize,
        settings: RunSettings,
    ) -> Self {
        Self {
            ledger,
            verifier,
            publisher,
            budget,
            settings,
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub async fn run(&mut self) -> Result<VerificationReport> {
        self.phase = Phase::Loading;
        let rows = self
            .ledger
            .load_pending_rows()
            .context("Failed to load pending store")?;
        let mut blacklist = self
            .ledger
            .load_blacklist()
            .context("Failed to load blacklist")?;

        let mut batch = Vec::new();
        let mut passthrough = Vec::new();
        for row in rows {
            match row {
                PendingRow::Record(record) => batch.push(record),
                row @ PendingRow::Passthrough(_) => passthrough.push(row),
            }
        }
        if !passthrough.is_empty() {
            warn!(rows = passthrough.len(), "Pending rows without email kept as-is");
        }

        let untouched = batch.split_off(batch.len().min(self.budget));
        info!(
            pending = batch.len() + untouched.len() + passthrough.len(),
            batch = batch.len(),
            budget = self.budget,
            "Starting verification run"
        );

        let mut verified = Vec::new();
        let mut requeue = Vec::new();
        let mut credits_used = 0;
        let mut blacklisted = 0;
        let mut already_blacklisted = 0;
        let processed = batch.len();

        for (i, record) in batch.into_iter().enumerate() {
            self.phase = Phase::Processing(i);

            let email = record.email.trim().to_lowercase();
            if blacklist.contains(&email) {
                info!(email = %record.email, "Already blacklisted, dropping");
                already_blacklisted += 1;
                continue;
            }

            let (step, definitive) = self.check(&record, &mut blacklist).await;
            if definitive {
                credits_used += 1;
            }
            match step {
                Step::Verified => verified.push(record),
                Step::Blacklisted => blacklisted += 1,
                Step::Requeue => requeue.push(record),
            }

            if definitive && !self.settings.pacing_delay.is_zero() {
                tokio::time::sleep(self.settings.pacing_delay).await;
            }
        }

        self.phase = Phase::Finalizing;
        self.ledger
            .append(&verified, Destination::Verified)
            .context("Failed to append verified records")?;

        let requeued = requeue.len();
        let next_pending: Vec<PendingRow> = requeue
            .into_iter()
            .chain(untouched)
            .map(PendingRow::from)
            .chain(passthrough)
            .collect();
        self.ledger
            .replace_pending(&next_pending)
            .context("Failed to rewrite pending store")?;

        let publish = self.publisher.publish(&verified).await;

        self.phase = Phase::Done;
        let report = VerificationReport {
            budget: self.budget,
            processed,
            credits_used,
            verified: verified.len(),
            blacklisted,
            already_blacklisted,
            requeued,
            remaining: next_pending.len(),
            publish,
        };
        info!(
            verified = report.verified,
            blacklisted = report.blacklisted,
            requeued = report.requeued,
            remaining = report.remaining,
            "Verification run complete"
        );
        Ok(report)
    }

    /// Verify one record. Returns the step and whether a definitive answer
    /// (a spent credit) came back.
    async fn check(
        &self,
        record: &JournalistRecord,
        blacklist: &mut HashSet<String>,
    ) -> (Step, bool) {
        let email = record.email.as_str();
        let call = tokio::time::timeout(self.settings.verify_timeout, self.verifier.verify(email));

        let verdict = match call.await {
            Err(_) => {
                warn!(
                    email,
                    timeout_ms = self.settings.verify_timeout.as_millis() as u64,
                    "Verification timed out, requeueing"
                );
                return (Step::Requeue, false);
            }
            Ok(Err(e)) => {
                warn!(email, error = %e, "Verification failed, requeueing");
                return (Step::Requeue, false);
            }
            Ok(Ok(verdict)) => verdict,
        };

        if verdict.is_valid() {
            info!(email, "Verified");
            return (Step::Verified, true);
        }

        match self.ledger.append_blacklist(email) {
            Ok(()) => {
                info!(email, %verdict, "Rejected, blacklisted");
                blacklist.insert(email.trim().to_lowercase());
                (Step::Blacklisted, true)
            }
            Err(e) => {
                warn!(email, error = %e, "Could not record rejection, requeueing");
                (Step::Requeue, true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{record, MockVerifier, VerifyScript};
    use byline_common::{Edition, Verdict, VerifyError};

    fn worker(dir: &std::path::Path, verifier: MockVerifier, budget: usize) -> VerificationWorker {
        VerificationWorker::new(
            Ledger::new(dir, Edition::Canada),
            Arc::new(verifier),
            SyncPublisher::disabled("master_list"),
            budget,
            RunSettings::immediate(),
        )
    }

    #[tokio::test]
    async fn empty_pending_store_is_a_no_op_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut worker = worker(dir.path(), MockVerifier::new(), 10);
        assert_eq!(worker.phase(), Phase::Idle);

        let report = worker.run().await.unwrap();
        assert_eq!(report.processed, 0);
        assert_eq!(report.publish, PublishOutcome::Skipped);
        assert_eq!(worker.phase(), Phase::Done);
    }

    #[tokio::test]
    async fn definitive_answers_count_as_credits_transient_ones_do_not() {
        let dir = tempfile::tempdir().unwrap();
        let verifier = MockVerifier::new()
            .script("a@x.com", VerifyScript::Verdict(Verdict::Valid))
            .script("b@x.com", VerifyScript::Error(VerifyError::Api("503".into())))
            .script("c@x.com", VerifyScript::Verdict(Verdict::Unknown));
        let mut worker = worker(dir.path(), verifier, 10);
        worker
            .ledger()
            .append(
                &[
                    record("Ann", "A", "a@x.com"),
                    record("Bob", "B", "b@x.com"),
                    record("Cat", "C", "c@x.com"),
                ],
                Destination::Pending,
            )
            .unwrap();

        let report = worker.run().await.unwrap();
        assert_eq!(report.credits_used, 2);
        assert_eq!(report.verified, 1);
        assert_eq!(report.blacklisted, 1);
        assert_eq!(report.requeued, 1);
        assert_eq!(report.publish, PublishOutcome::Disabled);
    }

    #[test]
    fn display_lists_every_counter() {
        let report = VerificationReport {
            budget: 5,
            processed: 3,
            credits_used: 2,
            verified: 1,
            blacklisted: 1,
            already_blacklisted: 0,
            requeued: 1,
            remaining: 4,
            publish: PublishOutcome::Skipped,
        };
        let text = report.to_string();
        assert!(text.contains("processed: 3 (budget 5)"));
        assert!(text.contains("pending remaining: 4"));
        assert!(text.contains("nothing to publish"));
    }
}
