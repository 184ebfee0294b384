//! Sync orchestration
//!
//! This module drives the full device-to-backend flow: fetch a window of raw
//! samples, aggregate them into nights, and upsert each night through the
//! persistence sink. The external collaborators sit behind traits so the
//! engine stays free of I/O.
//!
//! Failure semantics: a fetch failure (permission denied, source unavailable)
//! aborts the run and propagates. An upload failure for one night never blocks
//! the remaining nights; the report carries exact attempted/uploaded counts so
//! partial success is visible to the caller.

use crate::aggregator::NightAggregator;
use crate::error::SleepError;
use crate::types::{NightUploadRecord, RawSample};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Device health-data source (external collaborator).
///
/// `Ok(vec![])` means the fetch succeeded with zero samples, which is a
/// legitimate outcome and must stay distinguishable from an error.
pub trait SampleSource {
    fn fetch_recent_samples(&self, window_days: u32) -> Result<Vec<RawSample>, SleepError>;
}

/// Per-night persistence sink (external collaborator).
/// Upserts are idempotent by (authenticated user, date), so retries are safe.
pub trait NightSink {
    fn upsert_night(&mut self, record: &NightUploadRecord) -> Result<(), SleepError>;
}

/// Outcome of a sync run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum SyncOutcome {
    /// Fetch succeeded but produced no qualifying nights. Not an error.
    NoData,
    /// At least one night was attempted; see the report for partial failures.
    Synced(SyncReport),
}

/// Accounting for one sync run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    /// Unique id for this run, for correlating retries
    pub batch_id: Uuid,
    pub nights_attempted: usize,
    pub nights_uploaded: usize,
    pub failures: Vec<NightUploadFailure>,
}

/// One night that failed to upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NightUploadFailure {
    pub date: String,
    pub error: String,
}

/// Fetch, aggregate, and upload one window of sleep data.
///
/// Returns [`SyncOutcome::NoData`] when the window holds no samples or the
/// confidence filter drops every date. Fetch errors propagate; upload errors
/// are collected per night.
pub fn sync_nights(
    source: &dyn SampleSource,
    sink: &mut dyn NightSink,
    window_days: u32,
) -> Result<SyncOutcome, SleepError> {
    let samples = source.fetch_recent_samples(window_days)?;
    if samples.is_empty() {
        return Ok(SyncOutcome::NoData);
    }

    let nights = NightAggregator::aggregate(&samples);
    if nights.is_empty() {
        return Ok(SyncOutcome::NoData);
    }

    let mut report = SyncReport {
        batch_id: Uuid::new_v4(),
        nights_attempted: 0,
        nights_uploaded: 0,
        failures: Vec::new(),
    };

    for night in &nights {
        let record = NightUploadRecord::from(night);
        report.nights_attempted += 1;
        match sink.upsert_night(&record) {
            Ok(()) => report.nights_uploaded += 1,
            Err(e) => report.failures.push(NightUploadFailure {
                date: record.date.clone(),
                error: e.to_string(),
            }),
        }
    }

    Ok(SyncOutcome::Synced(report))
}
