//! Pulseplan - On-device health analytics and nutrition planning engine
//!
//! Pulseplan turns raw health-store samples into dashboard-ready results
//! through a deterministic pipeline: daily aggregation → rolling statistics →
//! weekday grouping → proportional partitioning → trend classification.
//!
//! ## Modules
//!
//! - **Metrics Pipeline**: Steps, weight, height, heart rate and sleep summaries
//! - **Nutrition Planner**: BMR, maintenance energy, goal-adjusted calories and macros
//!
//! All computations are pure functions over immutable inputs.

pub mod aggregator;
pub mod config;
pub mod dashboard;
pub mod encoder;
pub mod error;
pub mod input;
pub mod nutrition;
pub mod partition;
pub mod suggestions;
pub mod trend;
pub mod types;
pub mod weekday;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use aggregator::{window_max, window_mean, window_min, window_stats, SeriesAggregator};
pub use config::EngineConfig;
pub use dashboard::{DashboardProcessor, MetricInsight, MetricSummary, NutritionReport};
pub use error::ComputeError;
pub use nutrition::{BiometricProfile, NutritionPlan, NutritionPlanner};
pub use partition::partition;
pub use types::{AggregationPolicy, DailyPoint, HealthMetric, Sample, Series};
pub use weekday::WeekdayGrouper;

/// Pulseplan version embedded in all reports
pub const PULSEPLAN_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "pulseplan";
