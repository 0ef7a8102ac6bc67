//! Scan driver: list candidates, fetch in concurrent batches, attribute.
//!
//! A scan always starts by clearing the inventory. Attribution is tagged with
//! the scan's [`ScanGeneration`], so if another scan (or a sign-out) resets
//! the inventory while this one is in flight, its late results are dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::classifier::{CandidateQuery, classify};
use crate::gateway::{MailGateway, MessageId};
use crate::inventory::ScanGeneration;
use crate::session::Session;
use crate::Result;

/// Default number of message fetches in flight at once.
pub const DEFAULT_BATCH_SIZE: usize = 60;

/// Default pause between batches.
pub const DEFAULT_BATCH_PAUSE: Duration = Duration::from_millis(150);

/// Scan tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPolicy {
    /// Mailbox search for candidates.
    pub query: CandidateQuery,
    /// Concurrent fetches per batch.
    pub batch_size: usize,
    /// Pause between batches.
    pub batch_pause: Duration,
}

impl Default for ScanPolicy {
    fn default() -> Self {
        Self {
            query: CandidateQuery::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            batch_pause: DEFAULT_BATCH_PAUSE,
        }
    }
}

/// Progress after a completed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanProgress {
    /// Candidates handled so far, including failures.
    pub processed: usize,
    /// Candidates listed for this scan.
    pub total: usize,
    /// Distinct domains so far.
    pub domains: usize,
    /// Attributed messages so far.
    pub messages: u64,
}

/// Outcome of a scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Candidates listed.
    pub listed: usize,
    /// Messages attributed.
    pub attributed: usize,
    /// Messages skipped because the fetch failed.
    pub failed: usize,
    /// Distinct domains at the end of the scan.
    pub domains: usize,
    /// True when a later reset superseded this scan.
    pub superseded: bool,
}

/// Runs a full scan against `session`.
///
/// `on_batch` is called after every batch with the running totals, outside
/// the session lock.
///
/// # Errors
///
/// Returns [`crate::Error::NotSignedIn`] in guest mode, or
/// [`crate::Error::Gateway`] if the candidate listing fails. Individual
/// fetch failures are counted in the report instead.
pub async fn run<G, F>(
    gateway: &Arc<G>,
    session: &Mutex<Session>,
    policy: &ScanPolicy,
    mut on_batch: F,
) -> Result<ScanReport>
where
    G: MailGateway + 'static,
    F: FnMut(&ScanProgress),
{
    let generation = {
        let mut session = session.lock().await;
        session.require_identity()?;
        session.begin_scan()
    };
    info!(
        generation = generation.get(),
        query = %policy.query.to_search_string(),
        "Starting scan"
    );

    let mut ids = gateway.list_candidate_messages(&policy.query).await?;
    let cap = usize::try_from(policy.query.max_results).unwrap_or(usize::MAX);
    ids.truncate(cap);

    let mut report = ScanReport {
        listed: ids.len(),
        ..ScanReport::default()
    };
    if ids.is_empty() {
        info!("No candidate messages");
        return Ok(report);
    }

    let batch_size = policy.batch_size.max(1);
    let mut processed = 0;
    for (position, batch) in ids.chunks(batch_size).enumerate() {
        if position > 0 {
            tokio::time::sleep(policy.batch_pause).await;
        }

        if session.lock().await.aggregator().generation() != generation {
            report.superseded = true;
            break;
        }

        let (attributed, failed) = fetch_batch(gateway, session, generation, batch).await;
        processed += batch.len();
        report.attributed += attributed;
        report.failed += failed;

        let progress = {
            let session = session.lock().await;
            if session.aggregator().generation() != generation {
                report.superseded = true;
            }
            ScanProgress {
                processed,
                total: ids.len(),
                domains: session.aggregator().record_count(),
                messages: session.aggregator().total_message_count(),
            }
        };
        if report.superseded {
            break;
        }

        debug!(
            batch = position + 1,
            processed,
            total = ids.len(),
            domains = progress.domains,
            "Batch complete"
        );
        on_batch(&progress);
    }

    if report.superseded {
        warn!(generation = generation.get(), "Scan superseded by a newer reset");
    } else {
        report.domains = session.lock().await.aggregator().record_count();
        info!(
            listed = report.listed,
            attributed = report.attributed,
            failed = report.failed,
            domains = report.domains,
            "Scan complete"
        );
    }

    Ok(report)
}

/// Fetches one batch concurrently and attributes each message as it
/// arrives. Returns `(attributed, failed)`.
async fn fetch_batch<G>(
    gateway: &Arc<G>,
    session: &Mutex<Session>,
    generation: ScanGeneration,
    batch: &[MessageId],
) -> (usize, usize)
where
    G: MailGateway + 'static,
{
    let mut tasks = JoinSet::new();
    for id in batch {
        let gateway = Arc::clone(gateway);
        let id = id.clone();
        tasks.spawn(async move {
            let result = gateway.fetch_message(&id).await;
            (id, result)
        });
    }

    let mut attributed = 0;
    let mut failed = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((_, Ok(raw))) => {
                let message = classify(&raw);
                if session.lock().await.attribute(generation, &message) {
                    attributed += 1;
                }
            }
            Ok((id, Err(e))) => {
                warn!(id = %id, error = %e, "Skipping message that failed to fetch");
                failed += 1;
            }
            Err(e) => {
                warn!(error = %e, "Fetch task did not complete");
                failed += 1;
            }
        }
    }

    (attributed, failed)
}
