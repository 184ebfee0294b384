//! Interval aggregation
//!
//! This module turns raw, fragmentary sleep-stage interval samples into one
//! aggregated record per night. Samples arrive overlapping and duplicated
//! (multi-source devices, retried syncs), so minutes are deduplicated through
//! sets rather than summed durations: each wall-clock minute counts at most
//! once per night, no matter how many samples cover it.

use crate::types::{AggregatedNight, RawSample, SleepStage};
use chrono::{Duration, NaiveDate, Timelike};
use std::collections::{HashMap, HashSet};
use std::ops::Range;

/// Minimum distinct asleep-minutes for a date to count as a logged night.
/// Anything below this is sensor noise or a nap fragment.
pub const MIN_NIGHT_MINUTES: usize = 15;

/// Local hour at or after which a sample's end is attributed to the next
/// calendar day. A fragment ending at 23:30 belongs to the following morning's
/// night; one ending at 08:00 belongs to that morning.
pub const NIGHT_ROLLOVER_HOUR: u32 = 14;

/// Aggregator for building per-night records from raw interval samples
pub struct NightAggregator;

/// Per-date minute sets, keyed by epoch-minute index
#[derive(Default)]
struct NightBuckets {
    asleep: HashSet<i64>,
    rem: HashSet<i64>,
    deep: HashSet<i64>,
    core: HashSet<i64>,
}

impl NightAggregator {
    /// Aggregate a batch of raw samples into per-night records.
    ///
    /// Pure over its input: no hidden state, identical input gives identical
    /// output. Malformed samples (unknown stage, degenerate interval) are
    /// skipped, never failing the batch. Result is sorted by date descending,
    /// most recent night first.
    pub fn aggregate(samples: &[RawSample]) -> Vec<AggregatedNight> {
        let mut by_date: HashMap<NaiveDate, NightBuckets> = HashMap::new();

        for sample in samples {
            let stage = match SleepStage::parse(&sample.stage_value) {
                Some(stage) => stage,
                None => continue,
            };
            if !stage.counts_as_sleep() {
                continue;
            }
            if sample.end <= sample.start {
                continue;
            }

            let date = assigned_date(sample);
            let buckets = by_date.entry(date).or_default();

            for minute in minute_indices(sample) {
                buckets.asleep.insert(minute);
                match stage {
                    SleepStage::Rem => {
                        buckets.rem.insert(minute);
                    }
                    SleepStage::Deep => {
                        buckets.deep.insert(minute);
                    }
                    SleepStage::Core => {
                        buckets.core.insert(minute);
                    }
                    _ => {}
                }
            }
        }

        let mut nights: Vec<AggregatedNight> = by_date
            .into_iter()
            .filter(|(_, buckets)| buckets.asleep.len() >= MIN_NIGHT_MINUTES)
            .map(|(date, buckets)| AggregatedNight {
                date,
                total_minutes: buckets.asleep.len() as u32,
                rem_minutes: buckets.rem.len() as u32,
                deep_minutes: buckets.deep.len() as u32,
                core_minutes: buckets.core.len() as u32,
            })
            .collect();

        nights.sort_by(|a, b| b.date.cmp(&a.date));
        nights
    }
}

/// Calendar date a sample belongs to, decided by its `end` alone.
///
/// A session ending in the morning is that morning's night. A late-evening
/// fragment of the same session (ends at or after the rollover hour) belongs
/// to the following morning, not the calendar date it physically occurred on.
/// Applied per-sample since sessions are not pre-grouped in the input.
fn assigned_date(sample: &RawSample) -> NaiveDate {
    let end_date = sample.end.date_naive();
    if sample.end.hour() >= NIGHT_ROLLOVER_HOUR {
        end_date + Duration::days(1)
    } else {
        end_date
    }
}

/// Minute-aligned index range covered by a sample: `floor(start/60s)` up to
/// but excluding `floor(end/60s)`. Flooring means a 90-second sample yields
/// 1 or 2 distinct minutes depending on alignment, never a fraction.
fn minute_indices(sample: &RawSample) -> Range<i64> {
    sample.start.timestamp().div_euclid(60)..sample.end.timestamp().div_euclid(60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset, TimeZone};
    use pretty_assertions::assert_eq;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(y, mo, d, h, mi, 0)
            .unwrap()
    }

    fn sample(
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
        stage: &str,
    ) -> RawSample {
        RawSample {
            start,
            end,
            stage_value: stage.to_string(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_overlap_dedup() {
        // Two DEEP samples covering the same 10:00-10:05 window count once
        let samples = vec![
            sample(at(2024, 1, 10, 10, 0), at(2024, 1, 10, 10, 5), "DEEP"),
            sample(at(2024, 1, 10, 10, 0), at(2024, 1, 10, 10, 5), "DEEP"),
            sample(at(2024, 1, 10, 9, 30), at(2024, 1, 10, 10, 0), "CORE"),
        ];
        let nights = NightAggregator::aggregate(&samples);

        assert_eq!(nights.len(), 1);
        assert_eq!(nights[0].deep_minutes, 5);
        assert_eq!(nights[0].core_minutes, 30);
        assert_eq!(nights[0].total_minutes, 35);
    }

    #[test]
    fn test_date_assignment_morning_end() {
        let samples = vec![sample(
            at(2024, 1, 10, 7, 0),
            at(2024, 1, 10, 8, 0),
            "ASLEEP",
        )];
        let nights = NightAggregator::aggregate(&samples);
        assert_eq!(nights[0].date, date(2024, 1, 10));
    }

    #[test]
    fn test_date_assignment_evening_end_rolls_forward() {
        let samples = vec![sample(
            at(2024, 1, 10, 22, 30),
            at(2024, 1, 10, 23, 30),
            "ASLEEP",
        )];
        let nights = NightAggregator::aggregate(&samples);
        assert_eq!(nights[0].date, date(2024, 1, 11));
    }

    #[test]
    fn test_date_assignment_rollover_boundary_inclusive() {
        // End at exactly 14:00 shifts to the next day
        let samples = vec![sample(
            at(2024, 1, 10, 13, 30),
            at(2024, 1, 10, 14, 0),
            "ASLEEP",
        )];
        let nights = NightAggregator::aggregate(&samples);
        assert_eq!(nights[0].date, date(2024, 1, 11));

        // End at 13:59 stays on its own date
        let samples = vec![sample(
            at(2024, 1, 10, 13, 0),
            at(2024, 1, 10, 13, 59),
            "ASLEEP",
        )];
        let nights = NightAggregator::aggregate(&samples);
        assert_eq!(nights[0].date, date(2024, 1, 10));
    }

    #[test]
    fn test_midnight_crossing_sample_stays_on_one_date() {
        // 23:50 -> 00:40 is classified by end alone, no mid-sample split
        let samples = vec![sample(
            at(2024, 1, 9, 23, 50),
            at(2024, 1, 10, 0, 40),
            "ASLEEP",
        )];
        let nights = NightAggregator::aggregate(&samples);

        assert_eq!(nights.len(), 1);
        assert_eq!(nights[0].date, date(2024, 1, 10));
        assert_eq!(nights[0].total_minutes, 50);
    }

    #[test]
    fn test_confidence_floor() {
        // 14 distinct minutes: dropped
        let samples = vec![sample(
            at(2024, 1, 10, 3, 0),
            at(2024, 1, 10, 3, 14),
            "ASLEEP",
        )];
        assert!(NightAggregator::aggregate(&samples).is_empty());

        // 15 distinct minutes: kept
        let samples = vec![sample(
            at(2024, 1, 10, 3, 0),
            at(2024, 1, 10, 3, 15),
            "ASLEEP",
        )];
        let nights = NightAggregator::aggregate(&samples);
        assert_eq!(nights.len(), 1);
        assert_eq!(nights[0].total_minutes, 15);
    }

    #[test]
    fn test_in_bed_and_awake_contribute_nothing() {
        let samples = vec![
            sample(at(2024, 1, 10, 1, 0), at(2024, 1, 10, 2, 0), "IN_BED"),
            sample(at(2024, 1, 10, 2, 0), at(2024, 1, 10, 3, 0), "AWAKE"),
        ];
        assert!(NightAggregator::aggregate(&samples).is_empty());
    }

    #[test]
    fn test_unknown_stage_tolerated() {
        let samples = vec![
            sample(at(2024, 1, 10, 1, 0), at(2024, 1, 10, 2, 0), "UNKNOWN_FUTURE_CODE"),
            sample(at(2024, 1, 10, 2, 0), at(2024, 1, 10, 3, 0), "DEEP"),
        ];
        let nights = NightAggregator::aggregate(&samples);

        assert_eq!(nights.len(), 1);
        assert_eq!(nights[0].total_minutes, 60);
        assert_eq!(nights[0].deep_minutes, 60);
    }

    #[test]
    fn test_degenerate_intervals_skipped() {
        let t = at(2024, 1, 10, 2, 0);
        let samples = vec![
            sample(t, t, "DEEP"),
            sample(at(2024, 1, 10, 3, 0), at(2024, 1, 10, 2, 30), "DEEP"),
        ];
        assert!(NightAggregator::aggregate(&samples).is_empty());
    }

    #[test]
    fn test_sub_minute_alignment() {
        // 90 seconds starting mid-minute: floored indices cover 02:00 and
        // 02:01, so 2 distinct minutes
        let start = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 10, 2, 0, 30)
            .unwrap();
        let end = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 10, 2, 2, 0)
            .unwrap();
        let samples = vec![
            sample(start, end, "DEEP"),
            // Pad past the confidence floor on the same date
            sample(at(2024, 1, 10, 3, 0), at(2024, 1, 10, 3, 20), "CORE"),
        ];
        let nights = NightAggregator::aggregate(&samples);
        assert_eq!(nights[0].deep_minutes, 2);

        // 90 seconds starting on a minute boundary: the exclusive end floor
        // drops the partial second minute, so 1 distinct minute
        let start = at(2024, 1, 10, 2, 0);
        let end = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 10, 2, 1, 30)
            .unwrap();
        let samples = vec![
            sample(start, end, "DEEP"),
            sample(at(2024, 1, 10, 3, 0), at(2024, 1, 10, 3, 20), "CORE"),
        ];
        let nights = NightAggregator::aggregate(&samples);
        assert_eq!(nights[0].deep_minutes, 1);
    }

    #[test]
    fn test_generic_asleep_counts_only_toward_total() {
        let samples = vec![
            sample(at(2024, 1, 10, 1, 0), at(2024, 1, 10, 2, 0), "ASLEEP"),
            sample(at(2024, 1, 10, 2, 0), at(2024, 1, 10, 2, 30), "REM"),
        ];
        let nights = NightAggregator::aggregate(&samples);

        assert_eq!(nights[0].total_minutes, 90);
        assert_eq!(nights[0].rem_minutes, 30);
        assert_eq!(nights[0].deep_minutes, 0);
        assert_eq!(nights[0].core_minutes, 0);
        // Bucket containment invariant
        assert!(
            nights[0].rem_minutes + nights[0].deep_minutes + nights[0].core_minutes
                <= nights[0].total_minutes
        );
    }

    #[test]
    fn test_output_sorted_most_recent_first() {
        let samples = vec![
            sample(at(2024, 1, 9, 6, 0), at(2024, 1, 9, 7, 0), "ASLEEP"),
            sample(at(2024, 1, 11, 6, 0), at(2024, 1, 11, 7, 0), "ASLEEP"),
            sample(at(2024, 1, 10, 6, 0), at(2024, 1, 10, 7, 0), "ASLEEP"),
        ];
        let nights = NightAggregator::aggregate(&samples);

        let dates: Vec<NaiveDate> = nights.iter().map(|n| n.date).collect();
        assert_eq!(
            dates,
            vec![date(2024, 1, 11), date(2024, 1, 10), date(2024, 1, 9)]
        );
    }

    #[test]
    fn test_aggregation_is_deterministic() {
        let samples = vec![
            sample(at(2024, 1, 9, 23, 50), at(2024, 1, 10, 0, 10), "REM"),
            sample(at(2024, 1, 10, 6, 0), at(2024, 1, 10, 6, 30), "DEEP"),
            sample(at(2024, 1, 10, 6, 30), at(2024, 1, 10, 7, 0), "CORE"),
        ];
        assert_eq!(
            NightAggregator::aggregate(&samples),
            NightAggregator::aggregate(&samples)
        );
    }

    #[test]
    fn test_full_night_scenario() {
        // REM fragment crossing midnight plus two morning samples all land on
        // the same night: end hours 00:10 and 07:00 are both before rollover.
        let samples = vec![
            sample(at(2024, 1, 9, 23, 50), at(2024, 1, 10, 0, 10), "REM"),
            sample(at(2024, 1, 10, 6, 0), at(2024, 1, 10, 6, 30), "DEEP"),
            sample(at(2024, 1, 10, 6, 30), at(2024, 1, 10, 7, 0), "CORE"),
        ];
        let nights = NightAggregator::aggregate(&samples);

        assert_eq!(nights.len(), 1);
        let night = &nights[0];
        assert_eq!(night.date, date(2024, 1, 10));
        assert_eq!(night.rem_minutes, 20);
        assert_eq!(night.deep_minutes, 30);
        assert_eq!(night.core_minutes, 30);
        assert_eq!(night.total_minutes, 80);
    }
}
