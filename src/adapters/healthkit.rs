//! HealthKit export adapter
//!
//! Parses HealthKit-style sleep analysis exports into raw samples. The `value`
//! field varies by OS version and export path: modern exports carry string
//! names (`"ASLEEP_REM"`, `"CORE"`), older ones the bare category code
//! (`0`-`5`, as number or string). Both forms are preserved as the sample's
//! stage value; classification happens downstream in the aggregator.

use crate::error::SleepError;
use crate::types::RawSample;
use chrono::DateTime;
use serde::Deserialize;

use super::SamplePayloadAdapter;

/// HealthKit sleep-analysis payload adapter
pub struct HealthKitAdapter;

#[derive(Debug, Deserialize)]
struct HealthKitRecord {
    #[serde(rename = "startDate")]
    start_date: String,
    #[serde(rename = "endDate")]
    end_date: String,
    value: serde_json::Value,
}

impl SamplePayloadAdapter for HealthKitAdapter {
    fn parse(&self, raw_json: &str) -> Result<Vec<RawSample>, SleepError> {
        let records: Vec<HealthKitRecord> = serde_json::from_str(raw_json)?;

        let mut samples = Vec::new();
        for record in records {
            if let Some(sample) = convert_record(&record) {
                samples.push(sample);
            }
        }
        Ok(samples)
    }
}

/// Convert one export record, or `None` if its timestamps or value are unusable
fn convert_record(record: &HealthKitRecord) -> Option<RawSample> {
    let start = DateTime::parse_from_rfc3339(&record.start_date).ok()?;
    let end = DateTime::parse_from_rfc3339(&record.end_date).ok()?;

    let stage_value = match &record.value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => return None,
    };

    Some(RawSample {
        start,
        end,
        stage_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SleepStage;

    #[test]
    fn test_parse_string_values() {
        let json = r#"[
            {"startDate": "2024-01-09T23:50:00+01:00", "endDate": "2024-01-10T00:10:00+01:00", "value": "ASLEEP_REM"},
            {"startDate": "2024-01-10T06:00:00+01:00", "endDate": "2024-01-10T06:30:00+01:00", "value": "CORE"}
        ]"#;
        let samples = HealthKitAdapter.parse(json).unwrap();

        assert_eq!(samples.len(), 2);
        assert_eq!(SleepStage::parse(&samples[0].stage_value), Some(SleepStage::Rem));
        assert_eq!(SleepStage::parse(&samples[1].stage_value), Some(SleepStage::Core));
    }

    #[test]
    fn test_parse_numeric_category_codes() {
        let json = r#"[
            {"startDate": "2024-01-10T06:00:00Z", "endDate": "2024-01-10T06:30:00Z", "value": 5},
            {"startDate": "2024-01-10T06:30:00Z", "endDate": "2024-01-10T07:00:00Z", "value": "4"}
        ]"#;
        let samples = HealthKitAdapter.parse(json).unwrap();

        assert_eq!(SleepStage::parse(&samples[0].stage_value), Some(SleepStage::Rem));
        assert_eq!(SleepStage::parse(&samples[1].stage_value), Some(SleepStage::Deep));
    }

    #[test]
    fn test_bad_record_skipped_not_fatal() {
        let json = r#"[
            {"startDate": "not-a-date", "endDate": "2024-01-10T06:30:00Z", "value": "DEEP"},
            {"startDate": "2024-01-10T06:00:00Z", "endDate": "2024-01-10T06:30:00Z", "value": "DEEP"}
        ]"#;
        let samples = HealthKitAdapter.parse(json).unwrap();
        assert_eq!(samples.len(), 1);
    }

    #[test]
    fn test_invalid_payload_is_error() {
        assert!(HealthKitAdapter.parse("not json").is_err());
    }
}
