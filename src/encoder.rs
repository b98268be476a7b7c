//! Report encoding
//!
//! This module wraps metric summaries and nutrition results in a JSON report
//! envelope carrying producer metadata, for hosts that consume JSON.

use crate::dashboard::{MetricSummary, NutritionReport};
use crate::error::ComputeError;
use crate::{PRODUCER_NAME, PULSEPLAN_VERSION};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

/// Producer metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Complete report payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    pub report_version: String,
    pub producer: ReportProducer,
    pub generated_at_utc: DateTime<Utc>,
    #[serde(default)]
    pub metrics: Vec<MetricSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<NutritionReport>,
}

/// Encoder for report payloads
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn encode(
        &self,
        metrics: Vec<MetricSummary>,
        nutrition: Option<NutritionReport>,
    ) -> DashboardReport {
        DashboardReport {
            report_version: REPORT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: PULSEPLAN_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            generated_at_utc: Utc::now(),
            metrics,
            nutrition,
        }
    }

    /// Encode to a compact JSON string
    pub fn encode_to_json(
        &self,
        metrics: Vec<MetricSummary>,
        nutrition: Option<NutritionReport>,
    ) -> Result<String, ComputeError> {
        let report = self.encode(metrics, nutrition);
        serde_json::to_string(&report).map_err(ComputeError::JsonError)
    }

    /// Encode to an indented JSON string
    pub fn encode_to_json_pretty(
        &self,
        metrics: Vec<MetricSummary>,
        nutrition: Option<NutritionReport>,
    ) -> Result<String, ComputeError> {
        let report = self.encode(metrics, nutrition);
        serde_json::to_string_pretty(&report).map_err(ComputeError::JsonError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::DashboardProcessor;
    use crate::nutrition::BiometricProfile;
    use crate::types::{HealthMetric, Sample};
    use chrono::Duration;

    fn summary() -> MetricSummary {
        let start = Utc::now() - Duration::days(3);
        let samples: Vec<Sample> = (0..3)
            .map(|i| Sample::new(start + Duration::days(i), 1000.0 + i as f64 * 400.0))
            .collect();
        DashboardProcessor::default().summarize(HealthMetric::Steps, &samples, None, &Utc)
    }

    #[test]
    fn test_encode_report() {
        let encoder = ReportEncoder::with_instance_id("test-instance".to_string());
        let report = encoder.encode(vec![summary()], None);

        assert_eq!(report.report_version, REPORT_VERSION);
        assert_eq!(report.producer.name, PRODUCER_NAME);
        assert_eq!(report.producer.instance_id, "test-instance");
        assert_eq!(report.metrics.len(), 1);
        assert!(report.nutrition.is_none());
    }

    #[test]
    fn test_encode_to_json() {
        let encoder = ReportEncoder::new();
        let nutrition = DashboardProcessor::default()
            .nutrition(&BiometricProfile::default())
            .unwrap();
        let json = encoder.encode_to_json(vec![summary()], Some(nutrition)).unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["producer"]["name"], "pulseplan");
        assert_eq!(value["metrics"][0]["metric"], "steps");
        assert_eq!(value["metrics"][0]["insight"]["kind"], "steps");
        assert_eq!(value["metrics"][0]["insight"]["trend"], "improving");
        assert_eq!(value["nutrition"]["plan"]["carbs_grams"], 218);
        assert!(value["metrics"][0]["series"].is_array());
    }

    #[test]
    fn test_report_round_trip() {
        let encoder = ReportEncoder::new();
        let json = encoder.encode_to_json(vec![summary()], None).unwrap();
        let report: DashboardReport = serde_json::from_str(&json).unwrap();
        assert_eq!(report.metrics[0].series.len(), 3);
        assert!(report.nutrition.is_none());
    }
}
