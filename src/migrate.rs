//! Migration engine: reconciles discovered files against the catalog and
//! streams them into the remote store.
//!
//! A run moves through four phases:
//!   1. Discover — walk the storage root into a [`MigrationBatch`]
//!      (see [`crate::discover`]).
//!   2. Reconcile — look each identifier up in the catalog; records that are
//!      missing or not of `upload` type are skipped.
//!   3. Upload — stream the source file to the driver under the key derived
//!      from the record's URL, then rewrite the record's upload pointer.
//!   4. Finalise — persist the failure log, if any, to a uniquely named file.
//!
//! No error inside the per-entry loop may terminate the batch: a failed
//! upload is appended to the failure log and processing continues. Only
//! catastrophic conditions abort the run — an unreadable root, or the
//! catalog becoming unreachable (any lookup error other than not-found).
//!
//! Entries are processed with bounded fan-out (`jobs` concurrent workers).
//! The default of one worker keeps the run strictly sequential; with more,
//! progress ordering becomes non-deterministic while each entry is still
//! processed independently and exactly once, with its catalog lookup and
//! upload coupled inside one task.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use futures::StreamExt;
use futures::TryStreamExt;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::contract::{ByteStream, CatalogClient, CatalogError, StorageDriver, UrlType};
use crate::discover;
pub use crate::discover::MigrationBatch;

/// Parameters of one migration run.
#[derive(Debug)]
pub struct MigrateOptions {
    /// Root of the sharded local storage tree.
    pub root: PathBuf,
    /// Restrict the run to a single derived identifier. The whole tree is
    /// still walked; the batch is filtered before reconciliation.
    pub resource_id: Option<String>,
    /// Bounded upload fan-out; `1` is the sequential baseline.
    pub jobs: usize,
}

/// Summary of a completed run, returned to the caller for reporting.
#[derive(Debug, Default)]
pub struct MigrationReport {
    pub total: usize,
    pub uploaded: usize,
    /// Entries with no catalog record. Not failures.
    pub missing: usize,
    /// Entries whose record is not of `upload` type. Not failures.
    pub skipped: usize,
    /// Identifiers whose upload failed, in append order.
    pub failed: Vec<String>,
    /// Where the failure log was persisted, when any entry failed.
    pub failure_log: Option<PathBuf>,
}

#[derive(Debug)]
pub enum MigrateError {
    /// The storage root could not be read at all.
    Discover(std::io::Error),
    /// The catalog stopped answering; the run is aborted after flushing the
    /// failure log accumulated so far.
    Catalog(CatalogError),
}

impl fmt::Display for MigrateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrateError::Discover(e) => write!(f, "cannot read storage root: {e}"),
            MigrateError::Catalog(e) => write!(f, "catalog unreachable, run aborted: {e}"),
        }
    }
}

impl std::error::Error for MigrateError {}

/// Run a full migration over `options.root`.
pub async fn migrate<C, D>(
    catalog: &C,
    driver: &D,
    options: &MigrateOptions,
) -> Result<MigrationReport, MigrateError>
where
    C: CatalogClient,
    D: StorageDriver,
{
    let run_id = Uuid::new_v4();
    info!(
        %run_id,
        root = %options.root.display(),
        driver = %driver.capabilities().driver_name,
        jobs = options.jobs,
        "starting migration run"
    );

    let mut batch = discover::discover(&options.root).map_err(MigrateError::Discover)?;
    if let Some(only) = &options.resource_id {
        batch.retain(|id, _| id == only);
        if batch.is_empty() {
            warn!(resource = %only, "no file on disk matches the requested identifier");
        }
    }

    let total = batch.len();
    info!(%run_id, total, "discovery complete, reconciling batch");

    let failures = FailureLog::default();
    let tally = Tally::default();
    let jobs = options.jobs.max(1);

    let loop_result = futures::stream::iter(batch)
        .map(Ok::<_, MigrateError>)
        .try_for_each_concurrent(jobs, |(id, path)| {
            let failures = &failures;
            let tally = &tally;
            async move {
                let index = tally.position.fetch_add(1, Ordering::SeqCst) + 1;
                info!(index, total, resource = %id, "working on resource");
                match process_entry(catalog, driver, &id, &path).await? {
                    Outcome::Uploaded => {
                        tally.uploaded.fetch_add(1, Ordering::SeqCst);
                    }
                    Outcome::Missing => {
                        info!(resource = %id, "resource not found in catalog, skipping");
                        tally.missing.fetch_add(1, Ordering::SeqCst);
                    }
                    Outcome::NotUpload => {
                        info!(resource = %id, "`url_type` is not `upload`, skipping");
                        tally.skipped.fetch_add(1, Ordering::SeqCst);
                    }
                    Outcome::Failed(reason) => {
                        error!(resource = %id, reason = %reason, "upload failed");
                        failures.append(id);
                    }
                }
                Ok(())
            }
        })
        .await;

    // Flush whatever accumulated even when the run aborts mid-batch, so no
    // failed identifier is lost.
    let failed = failures.snapshot();
    let failure_log = failures.persist(&run_id);
    if let Some(path) = &failure_log {
        info!(%run_id, path = %path.display(), "failed identifiers persisted");
    }

    loop_result?;

    let report = MigrationReport {
        total,
        uploaded: tally.uploaded.load(Ordering::SeqCst),
        missing: tally.missing.load(Ordering::SeqCst),
        skipped: tally.skipped.load(Ordering::SeqCst),
        failed,
        failure_log,
    };
    info!(
        %run_id,
        uploaded = report.uploaded,
        missing = report.missing,
        skipped = report.skipped,
        failed = report.failed.len(),
        "migration run finished"
    );
    Ok(report)
}

/// Per-entry reconciliation result. Only `Failed` reaches the failure log.
enum Outcome {
    Uploaded,
    Missing,
    NotUpload,
    Failed(String),
}

async fn process_entry<C, D>(
    catalog: &C,
    driver: &D,
    id: &str,
    path: &Path,
) -> Result<Outcome, MigrateError>
where
    C: CatalogClient,
    D: StorageDriver,
{
    let record = match catalog.lookup(id).await {
        Ok(record) => record,
        Err(CatalogError::NotFound(_)) => return Ok(Outcome::Missing),
        Err(e) => return Err(MigrateError::Catalog(e)),
    };

    if record.url_type != UrlType::Upload {
        return Ok(Outcome::NotUpload);
    }

    // The remote key is the last path segment of the record's URL.
    let key = record.url.rsplit('/').next().unwrap_or_default();
    if key.is_empty() {
        return Ok(Outcome::Failed(format!(
            "record url `{}` has no file name to derive a key from",
            record.url
        )));
    }

    let file = match tokio::fs::File::open(path).await {
        Ok(file) => file,
        Err(e) => {
            return Ok(Outcome::Failed(format!(
                "cannot open `{}`: {e}",
                path.display()
            )))
        }
    };
    let content_length = match file.metadata().await {
        Ok(metadata) => metadata.len(),
        Err(e) => {
            return Ok(Outcome::Failed(format!(
                "cannot stat `{}`: {e}",
                path.display()
            )))
        }
    };

    let stream: ByteStream = Box::new(file);
    if let Err(e) = driver.upload(key, stream, content_length).await {
        return Ok(Outcome::Failed(e.to_string()));
    }

    // Bookkeeping side effect of a successful upload. A failure here still
    // records the entry: re-running is safe, uploads overwrite and pointer
    // updates are idempotent.
    if let Err(e) = catalog.update_pointer(&record.id, key).await {
        return Ok(Outcome::Failed(format!("upload pointer not updated: {e}")));
    }

    Ok(Outcome::Uploaded)
}

/// Append-only accumulator of failed identifiers, synchronised so the upload
/// fan-out can share it.
#[derive(Default)]
struct FailureLog {
    entries: Mutex<Vec<String>>,
}

impl FailureLog {
    fn append(&self, id: String) {
        self.entries.lock().expect("failure log poisoned").push(id);
    }

    fn snapshot(&self) -> Vec<String> {
        self.entries.lock().expect("failure log poisoned").clone()
    }

    /// Write one identifier per line to a uniquely named file in the system
    /// temp directory. Best effort: a write failure is logged, not raised.
    fn persist(&self, run_id: &Uuid) -> Option<PathBuf> {
        let entries = self.snapshot();
        if entries.is_empty() {
            return None;
        }
        let result = tempfile::Builder::new()
            .prefix(&format!("cloudstore-failed-{run_id}-"))
            .suffix(".log")
            .tempfile()
            .and_then(|mut file| {
                for id in &entries {
                    writeln!(file, "{id}")?;
                }
                file.keep().map_err(|e| e.error)
            });
        match result {
            Ok((_, path)) => Some(path),
            Err(e) => {
                error!(error = ?e, "could not persist the failure log");
                None
            }
        }
    }
}

#[derive(Default)]
struct Tally {
    position: AtomicUsize,
    uploaded: AtomicUsize,
    missing: AtomicUsize,
    skipped: AtomicUsize,
}
