//! Checks catalog entries for new versions and records the results

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, trace, warn};

use crate::catalog::{CatalogEntry, CatalogSource};
use crate::fetcher::{FetchError, FetcherRegistry};
use crate::scheduler::jitter::Schedule;
use crate::store::{CatalogMeta, LogEntry, MetaStore, StoreError};
use crate::version::constraint::Constraint;
use crate::version::normalize::{NormalizedVersion, normalize, truncate_to_seconds};

/// Result of checking one entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Not yet due; nothing was fetched or written
    NotDue { next: DateTime<Utc> },
    /// A new version was accepted and logged
    Updated { from: String, to: String },
    /// The fetched version equals the stored one
    Unchanged,
    /// The fetched version differs but the constraint refused it
    Rejected { current: String, fetched: String },
    FetchFailed(String),
    CompareFailed(String),
}

/// Outcome counts of one pass over the catalog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    pub not_due: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub rejected: usize,
    pub fetch_failed: usize,
    pub compare_failed: usize,
    /// Entries aborted by a store read or write failure
    pub store_failed: usize,
}

impl PassReport {
    fn record(&mut self, outcome: &CheckOutcome) {
        let counter = match outcome {
            CheckOutcome::NotDue { .. } => &mut self.not_due,
            CheckOutcome::Updated { .. } => &mut self.updated,
            CheckOutcome::Unchanged => &mut self.unchanged,
            CheckOutcome::Rejected { .. } => &mut self.rejected,
            CheckOutcome::FetchFailed(_) => &mut self.fetch_failed,
            CheckOutcome::CompareFailed(_) => &mut self.compare_failed,
        };
        *counter += 1;
    }

    /// Entries whose fetcher ran during the pass
    pub fn checked(&self) -> usize {
        self.updated + self.unchanged + self.rejected + self.fetch_failed + self.compare_failed
    }
}

/// Holds the single-flight latch for the duration of a pass
struct PassGuard<'a>(&'a AtomicBool);

impl<'a> PassGuard<'a> {
    fn acquire(latch: &'a AtomicBool) -> Option<Self> {
        latch
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(latch))
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives passes over the catalog
///
/// At most one pass runs at a time per orchestrator. Entries inside a pass
/// are checked one after another; a failure on one entry never stops the
/// pass.
pub struct Orchestrator<S: MetaStore> {
    store: Arc<S>,
    registry: Arc<FetcherRegistry>,
    schedule: Schedule,
    running: AtomicBool,
}

impl<S: MetaStore> Orchestrator<S> {
    pub fn new(store: Arc<S>, registry: Arc<FetcherRegistry>, schedule: Schedule) -> Self {
        Self {
            store,
            registry,
            schedule,
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Runs one pass over a fresh catalog snapshot
    ///
    /// Returns `None` without touching anything when another pass is still
    /// in progress.
    pub async fn run_pass(&self, catalog: &dyn CatalogSource) -> Option<PassReport> {
        let Some(_guard) = PassGuard::acquire(&self.running) else {
            debug!("Previous pass still running, dropping trigger");
            return None;
        };

        let mut report = PassReport::default();
        for entry in catalog.snapshot() {
            match self.check_entry(&entry, Utc::now()).await {
                Ok(outcome) => report.record(&outcome),
                Err(e) => {
                    error!(entry = %entry.key(), error = %e, "Unable to update entry");
                    report.store_failed += 1;
                }
            }
        }

        Some(report)
    }

    /// Checks a single entry if it is due at `now`
    ///
    /// Fetch and compare failures end up in the entry's meta. Only store
    /// failures are returned as errors; in that case neither the meta nor
    /// the log row has been written.
    pub async fn check_entry(
        &self,
        entry: &CatalogEntry,
        now: DateTime<Utc>,
    ) -> Result<CheckOutcome, StoreError> {
        let key = entry.key();
        let mut meta = self.store.get_meta(&entry.name, &entry.tag)?;

        let next = self.schedule.next_check(&key, meta.last_checked, now);
        trace!(entry = %key, last = ?meta.last_checked, next = %next, "Next check time found");
        if next > now {
            return Ok(CheckOutcome::NotDue { next });
        }

        debug!(entry = %key, "Checking for updates");

        let (outcome, change) = match self.fetch(entry).await {
            Ok(fetched) => self.apply(entry, &mut meta, fetched, now),
            Err(e) => {
                error!(entry = %key, error = %e, "Fetcher caused error, error is stored in entry");
                meta.error = e.to_string();
                (CheckOutcome::FetchFailed(meta.error.clone()), None)
            }
        };

        meta.last_checked = Some(truncate_to_seconds(now));
        match change {
            Some(log) => self.store.record_change(&meta, &log)?,
            None => self.store.put_meta(&meta)?,
        }

        Ok(outcome)
    }

    async fn fetch(&self, entry: &CatalogEntry) -> Result<NormalizedVersion, FetchError> {
        let fetcher = self
            .registry
            .get(&entry.fetcher)
            .ok_or_else(|| FetchError::UnknownFetcher(entry.fetcher.clone()))?;

        let fetched = fetcher.fetch_version(&entry.fetcher_config).await?;
        normalize(fetched).ok_or(FetchError::NoVersionFound)
    }

    /// Runs the constraint against the stored version and updates `meta`.
    /// An accepted change also yields the log row to write with the meta.
    fn apply(
        &self,
        entry: &CatalogEntry,
        meta: &mut CatalogMeta,
        fetched: NormalizedVersion,
        now: DateTime<Utc>,
    ) -> (CheckOutcome, Option<LogEntry>) {
        let key = entry.key();

        if fetched.version == meta.current_version {
            meta.error.clear();
            return (CheckOutcome::Unchanged, None);
        }

        let constraint = Constraint::resolve(entry.version_constraint.as_ref());
        match constraint.should_apply(&meta.current_version, &fetched.version) {
            Err(e) => {
                warn!(entry = %key, error = %e, "Unable to compare versions, error is stored in entry");
                meta.error = e.to_string();
                (CheckOutcome::CompareFailed(meta.error.clone()), None)
            }
            Ok(false) => {
                debug!(
                    entry = %key,
                    current = %meta.current_version,
                    fetched = %fetched.version,
                    "Version rejected by constraint"
                );
                meta.error.clear();
                let outcome = CheckOutcome::Rejected {
                    current: meta.current_version.clone(),
                    fetched: fetched.version,
                };
                (outcome, None)
            }
            Ok(true) => {
                info!(
                    entry = %key,
                    from = %meta.current_version,
                    to = %fetched.version,
                    "Entry had version update"
                );

                let log = LogEntry {
                    catalog_name: entry.name.clone(),
                    catalog_tag: entry.tag.clone(),
                    timestamp: truncate_to_seconds(now),
                    version_from: meta.current_version.clone(),
                    version_to: fetched.version.clone(),
                };

                let from = std::mem::replace(&mut meta.current_version, fetched.version.clone());
                meta.version_time = fetched.observed_at;
                meta.error.clear();
                let outcome = CheckOutcome::Updated {
                    from,
                    to: fetched.version,
                };
                (outcome, Some(log))
            }
        }
    }

    /// Starts a pass on every tick until `shutdown` completes
    ///
    /// Passes run in their own task, so a slow pass does not delay the
    /// ticker; ticks arriving while it runs are dropped by the latch.
    pub async fn run<C, F>(self: Arc<Self>, catalog: Arc<C>, shutdown: F)
    where
        C: CatalogSource + 'static,
        F: Future<Output = ()>,
    {
        let mut interval = tokio::time::interval(self.schedule.tick());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!(
            tick = ?self.schedule.tick(),
            distribution = ?self.schedule.window(),
            "Scheduler started"
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Scheduler stopping");
                    break;
                }
                _ = interval.tick() => {
                    let orchestrator = Arc::clone(&self);
                    let catalog = Arc::clone(&catalog);
                    tokio::spawn(async move {
                        if let Some(report) = orchestrator.run_pass(catalog.as_ref()).await {
                            debug!(checked = report.checked(), updated = report.updated, "Pass finished");
                        }
                    });
                }
            }
        }
    }
}
