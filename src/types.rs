//! Core types for the Somnia aggregation engine
//!
//! This module defines the data structures that flow through the engine:
//! raw device samples, aggregated per-night records, the persistence wire
//! shape, and the derived score/rank presentation types.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// Canonical sleep stage classification (vendor-agnostic)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepStage {
    InBed,
    Awake,
    AsleepGeneric,
    Core,
    Deep,
    Rem,
}

impl SleepStage {
    /// Parse a device-reported stage value into a canonical stage.
    ///
    /// Device vocabularies have drifted over the years: the same stage arrives
    /// as `"REM"`, `"ASLEEP_REM"`, or the bare category code `"5"` depending on
    /// OS version and export path. Matching is case-insensitive. Returns `None`
    /// for values outside the known vocabulary so callers can skip them without
    /// failing the batch.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "IN_BED" | "INBED" | "0" => Some(SleepStage::InBed),
            "AWAKE" | "2" => Some(SleepStage::Awake),
            "ASLEEP" | "ASLEEP_GENERIC" | "ASLEEP_UNSPECIFIED" | "1" => {
                Some(SleepStage::AsleepGeneric)
            }
            "CORE" | "ASLEEP_CORE" | "3" => Some(SleepStage::Core),
            "DEEP" | "ASLEEP_DEEP" | "4" => Some(SleepStage::Deep),
            "REM" | "ASLEEP_REM" | "5" => Some(SleepStage::Rem),
            _ => None,
        }
    }

    /// Whether minutes in this stage count toward the asleep total.
    /// `InBed` and `Awake` are excluded from all sleep totals.
    pub fn counts_as_sleep(&self) -> bool {
        matches!(
            self,
            SleepStage::AsleepGeneric | SleepStage::Core | SleepStage::Deep | SleepStage::Rem
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SleepStage::InBed => "in_bed",
            SleepStage::Awake => "awake",
            SleepStage::AsleepGeneric => "asleep_generic",
            SleepStage::Core => "core",
            SleepStage::Deep => "deep",
            SleepStage::Rem => "rem",
        }
    }
}

/// One device-reported sleep-stage interval.
///
/// Timestamps carry the device-local UTC offset; the date-assignment rule
/// reads the local hour directly off `end`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSample {
    /// Interval start (device-local)
    pub start: DateTime<FixedOffset>,
    /// Interval end (device-local, must be after `start`)
    pub end: DateTime<FixedOffset>,
    /// Device-reported stage value, parsed via [`SleepStage::parse`]
    #[serde(rename = "stageValue")]
    pub stage_value: String,
}

/// Aggregated per-night sleep record, one per assigned calendar date.
///
/// Invariant: `rem_minutes + deep_minutes + core_minutes <= total_minutes`.
/// Generic-asleep minutes make up the remainder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedNight {
    /// Calendar date the night is attributed to
    pub date: NaiveDate,
    /// Distinct minutes asleep in any stage
    pub total_minutes: u32,
    /// Distinct minutes in REM sleep
    pub rem_minutes: u32,
    /// Distinct minutes in deep sleep
    pub deep_minutes: u32,
    /// Distinct minutes in core (light) sleep
    pub core_minutes: u32,
}

/// Wire shape for the per-night persistence upsert
/// (`POST /sleep/upload`, idempotent by authenticated user + date).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NightUploadRecord {
    /// Date string (YYYY-MM-DD)
    pub date: String,
    pub total_sleep_minutes: u32,
    pub rem_sleep_minutes: u32,
    pub deep_sleep_minutes: u32,
}

impl From<&AggregatedNight> for NightUploadRecord {
    fn from(night: &AggregatedNight) -> Self {
        Self {
            date: night.date.format("%Y-%m-%d").to_string(),
            total_sleep_minutes: night.total_minutes,
            rem_sleep_minutes: night.rem_minutes,
            deep_sleep_minutes: night.deep_minutes,
        }
    }
}

/// Rank tier, a step function of the nightly score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RankTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
}

impl RankTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RankTier::Bronze => "BRONZE",
            RankTier::Silver => "SILVER",
            RankTier::Gold => "GOLD",
            RankTier::Platinum => "PLATINUM",
            RankTier::Diamond => "DIAMOND",
        }
    }
}

/// Derived nightly score, recomputed on every read and never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NightlyScore {
    /// Integer score 0-100 against the daily goal
    pub score: u32,
    pub rank_tier: RankTier,
}

/// Presentation values for one night, handed to UI/display consumers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NightDisplay {
    pub date: String,
    pub score: u32,
    pub rank_tier: RankTier,
    /// Fraction of the daily goal reached, capped at 1.0
    pub progress_ratio: f64,
    /// Minutes asleep not attributed to REM or deep sleep
    pub light_minutes: u32,
}
