//! Sample payload adapters
//!
//! This module provides adapters that parse raw device export payloads and map
//! them to [`RawSample`]s. Individual records that fail to parse are skipped,
//! matching the malformed-sample policy: device exports routinely contain
//! stray records and must degrade gracefully.

mod health_connect;
mod healthkit;

pub use health_connect::HealthConnectAdapter;
pub use healthkit::HealthKitAdapter;

use crate::error::SleepError;
use crate::types::RawSample;

/// Trait for device payload adapters
pub trait SamplePayloadAdapter {
    /// Parse a raw payload into sleep-stage samples
    fn parse(&self, raw_json: &str) -> Result<Vec<RawSample>, SleepError>;
}

/// Parse a JSON array of native [`RawSample`]s
pub fn parse_samples_array(json: &str) -> Result<Vec<RawSample>, SleepError> {
    let samples: Vec<RawSample> = serde_json::from_str(json)?;
    Ok(samples)
}

/// Parse NDJSON (newline-delimited JSON) of native [`RawSample`]s
pub fn parse_samples_ndjson(ndjson: &str) -> Result<Vec<RawSample>, SleepError> {
    let mut samples = Vec::new();
    for (line_num, line) in ndjson.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<RawSample>(trimmed) {
            Ok(sample) => samples.push(sample),
            Err(e) => {
                return Err(SleepError::ParseError(format!(
                    "Failed to parse line {}: {}",
                    line_num + 1,
                    e
                )));
            }
        }
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_samples_ndjson() {
        let ndjson = r#"
            {"start": "2024-01-10T06:00:00+01:00", "end": "2024-01-10T06:30:00+01:00", "stageValue": "DEEP"}

            {"start": "2024-01-10T06:30:00+01:00", "end": "2024-01-10T07:00:00+01:00", "stageValue": "REM"}
        "#;
        let samples = parse_samples_ndjson(ndjson).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].stage_value, "DEEP");
    }

    #[test]
    fn test_parse_samples_ndjson_bad_line() {
        let ndjson = "{\"start\": \"2024-01-10T06:00:00Z\"}\n";
        assert!(parse_samples_ndjson(ndjson).is_err());
    }

    #[test]
    fn test_parse_samples_array() {
        let json = r#"[{"start": "2024-01-10T06:00:00Z", "end": "2024-01-10T06:30:00Z", "stageValue": "5"}]"#;
        let samples = parse_samples_array(json).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].stage_value, "5");
    }
}
