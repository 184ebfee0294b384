//! Score and rank derivation
//!
//! Pure derivation layer over aggregated nights: nightly score against the
//! daily goal, rank tier, and the presentation values UI consumers need.
//! Everything here is recomputed on read and never stored.

use crate::error::SleepError;
use crate::types::{AggregatedNight, NightDisplay, NightlyScore, RankTier};

/// Daily sleep goal in minutes (8 hours)
pub const DAILY_GOAL_MINUTES: u32 = 480;

/// Nightly score: `round(total / goal * 100)` clamped to 100.
/// Negative input is treated as zero minutes.
pub fn score_for_minutes(total_minutes: i64) -> u32 {
    if total_minutes <= 0 {
        return 0;
    }
    let total = total_minutes as u64;
    let goal = u64::from(DAILY_GOAL_MINUTES);
    // Integer rounding keeps this layer float-free and total
    let score = (total * 100 + goal / 2) / goal;
    score.min(100) as u32
}

impl RankTier {
    /// Tier for a score, by inclusive lower bounds
    pub fn for_score(score: u32) -> Self {
        match score {
            100.. => RankTier::Diamond,
            90..=99 => RankTier::Platinum,
            75..=89 => RankTier::Gold,
            50..=74 => RankTier::Silver,
            _ => RankTier::Bronze,
        }
    }
}

impl NightlyScore {
    /// Derive score and tier from a night's asleep-minutes total
    pub fn for_minutes(total_minutes: i64) -> Self {
        let score = score_for_minutes(total_minutes);
        Self {
            score,
            rank_tier: RankTier::for_score(score),
        }
    }
}

/// Fraction of the daily goal reached, capped at 1.0
pub fn progress_ratio(total_minutes: u32) -> f64 {
    (f64::from(total_minutes) / f64::from(DAILY_GOAL_MINUTES)).min(1.0)
}

/// Minutes asleep not attributed to REM or deep sleep, floored at zero
pub fn light_minutes(total_minutes: u32, rem_minutes: u32, deep_minutes: u32) -> u32 {
    total_minutes.saturating_sub(rem_minutes).saturating_sub(deep_minutes)
}

impl NightDisplay {
    /// Build the presentation values for one aggregated night
    pub fn for_night(night: &AggregatedNight) -> Self {
        let nightly = NightlyScore::for_minutes(i64::from(night.total_minutes));
        Self {
            date: night.date.format("%Y-%m-%d").to_string(),
            score: nightly.score,
            rank_tier: nightly.rank_tier,
            progress_ratio: progress_ratio(night.total_minutes),
            light_minutes: light_minutes(
                night.total_minutes,
                night.rem_minutes,
                night.deep_minutes,
            ),
        }
    }
}

/// Invariant the manual-entry form must enforce before calling persistence:
/// a positive total, with specific stages not exceeding it.
pub fn validate_manual_entry(
    total_minutes: u32,
    rem_minutes: u32,
    deep_minutes: u32,
) -> Result<(), SleepError> {
    if total_minutes == 0 {
        return Err(SleepError::InvalidManualEntry(
            "total sleep minutes must be positive".to_string(),
        ));
    }
    // Widen before adding so the check stays total on extreme inputs
    let specific = u64::from(rem_minutes) + u64::from(deep_minutes);
    if specific > u64::from(total_minutes) {
        return Err(SleepError::InvalidManualEntry(format!(
            "REM + deep ({}) exceeds total sleep minutes ({})",
            specific, total_minutes
        )));
    }
    Ok(())
}
