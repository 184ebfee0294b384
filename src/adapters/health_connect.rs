//! Health Connect adapter
//!
//! Parses Android Health Connect sleep-session payloads. Health Connect stage
//! constants differ from the HealthKit category codes, so this adapter maps
//! them to canonical stage names at the boundary rather than leaking a second
//! numeric vocabulary into the aggregator.

use crate::error::SleepError;
use crate::types::RawSample;
use chrono::DateTime;
use serde::Deserialize;

use super::SamplePayloadAdapter;

/// Health Connect sleep-session payload adapter
pub struct HealthConnectAdapter;

#[derive(Debug, Deserialize)]
struct HealthConnectPayload {
    #[serde(default)]
    stages: Vec<HealthConnectStage>,
}

#[derive(Debug, Deserialize)]
struct HealthConnectStage {
    #[serde(rename = "startTime")]
    start_time: String,
    #[serde(rename = "endTime")]
    end_time: String,
    stage: i64,
}

impl SamplePayloadAdapter for HealthConnectAdapter {
    fn parse(&self, raw_json: &str) -> Result<Vec<RawSample>, SleepError> {
        let payload: HealthConnectPayload = serde_json::from_str(raw_json)?;

        let mut samples = Vec::new();
        for stage in payload.stages {
            if let Some(sample) = convert_stage(&stage) {
                samples.push(sample);
            }
        }
        Ok(samples)
    }
}

/// Map a Health Connect stage constant to a canonical stage name.
/// Unknown and out-of-bed constants carry no stage information.
fn stage_name(constant: i64) -> Option<&'static str> {
    match constant {
        1 | 7 => Some("AWAKE"),      // AWAKE, AWAKE_IN_BED
        2 => Some("ASLEEP"),         // SLEEPING (unspecified)
        4 => Some("CORE"),           // LIGHT
        5 => Some("DEEP"),
        6 => Some("REM"),
        _ => None,                   // UNKNOWN (0), OUT_OF_BED (3), future codes
    }
}

fn convert_stage(stage: &HealthConnectStage) -> Option<RawSample> {
    let start = DateTime::parse_from_rfc3339(&stage.start_time).ok()?;
    let end = DateTime::parse_from_rfc3339(&stage.end_time).ok()?;
    let stage_value = stage_name(stage.stage)?;

    Some(RawSample {
        start,
        end,
        stage_value: stage_value.to_string(),
    })
}
