//! Sample input readers
//!
//! Reads the samples handed over by the data-access layer. Each record is
//! `{"metric": "steps", "timestamp": "<RFC 3339>", "value": 1234}`; `metric`
//! may be omitted when the caller supplies a default.

use crate::error::ComputeError;
use crate::types::{HealthMetric, Sample};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One raw sample as read from input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<HealthMetric>,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl SampleRecord {
    pub fn sample(&self) -> Sample {
        Sample::new(self.timestamp, self.value)
    }
}

/// Reader for sample records
pub struct SampleReader;

impl SampleReader {
    /// Parse a JSON array of records
    pub fn parse_array(json: &str) -> Result<Vec<SampleRecord>, ComputeError> {
        let records: Vec<SampleRecord> = serde_json::from_str(json)?;
        Ok(records)
    }

    /// Parse newline-delimited JSON records, skipping blank lines
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<SampleRecord>, ComputeError> {
        let mut records = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<SampleRecord>(trimmed) {
                Ok(record) => records.push(record),
                Err(e) => {
                    return Err(ComputeError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(records)
    }

    /// Parse either format: input starting with `[` is a JSON array
    pub fn parse_auto(input: &str) -> Result<Vec<SampleRecord>, ComputeError> {
        if input.trim_start().starts_with('[') {
            Self::parse_array(input)
        } else {
            Self::parse_ndjson(input)
        }
    }

    /// Split records by metric. Records without a metric go to `default`;
    /// with no default they are an error.
    pub fn group_by_metric(
        records: &[SampleRecord],
        default: Option<HealthMetric>,
    ) -> Result<BTreeMap<HealthMetric, Vec<Sample>>, ComputeError> {
        let mut grouped: BTreeMap<HealthMetric, Vec<Sample>> = BTreeMap::new();
        for (index, record) in records.iter().enumerate() {
            let metric = record.metric.or(default).ok_or_else(|| {
                ComputeError::ParseError(format!("record {index} has no metric"))
            })?;
            grouped.entry(metric).or_default().push(record.sample());
        }
        Ok(grouped)
    }
}
