//! Somnia Core - On-device aggregation engine for wearable sleep-stage samples
//!
//! Somnia turns raw, fragmentary sleep-stage intervals from a device health
//! store into one canonical record per night, plus a derived score/rank layer:
//! payload adaptation → per-minute dedup aggregation → confidence filtering →
//! score derivation.
//!
//! ## Modules
//!
//! - **Aggregator**: Deduplicate overlapping interval samples into per-night records
//! - **Scoring**: Derive nightly score, rank tier, and display values
//! - **Pipeline**: Fetch → aggregate → upload orchestration behind trait seams

pub mod adapters;
pub mod aggregator;
pub mod error;
pub mod pipeline;
pub mod scoring;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use aggregator::{NightAggregator, MIN_NIGHT_MINUTES, NIGHT_ROLLOVER_HOUR};
pub use error::SleepError;
pub use pipeline::{sync_nights, NightSink, SampleSource, SyncOutcome, SyncReport};
pub use scoring::{score_for_minutes, validate_manual_entry, DAILY_GOAL_MINUTES};
pub use types::{
    AggregatedNight, NightDisplay, NightUploadRecord, NightlyScore, RankTier, RawSample,
    SleepStage,
};

/// Engine version embedded in CLI output
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "somnia-core";
