//! Pulse CLI - Command-line interface for Pulseplan
//!
//! Commands:
//! - summarize: Aggregate health samples into dashboard summaries
//! - plan: Compute a nutrition plan from biometrics
//! - doctor: Diagnose configuration and environment
//! - schema: Print input/output schema information

use clap::{Parser, Subcommand, ValueEnum};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{FixedOffset, Local, TimeZone};
use pulseplan::dashboard::DashboardProcessor;
use pulseplan::encoder::{DashboardReport, ReportEncoder};
use pulseplan::input::SampleReader;
use pulseplan::nutrition::{ActivityLevel, BiometricProfile, Goal, Sex};
use pulseplan::types::{AggregationPolicy, HealthMetric, Sample};
use pulseplan::{ComputeError, EngineConfig, MetricSummary, PRODUCER_NAME, PULSEPLAN_VERSION};

/// Pulse - On-device health analytics and nutrition planning
#[derive(Parser)]
#[command(name = "pulse")]
#[command(version = PULSEPLAN_VERSION)]
#[command(about = "Summarize health samples and plan nutrition", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate samples into per-metric dashboard summaries
    Summarize {
        /// Input file path (use - for stdin), JSON array or NDJSON
        #[arg(short, long)]
        input: PathBuf,

        /// Metric for records without one; when set, other metrics are ignored
        #[arg(short, long)]
        metric: Option<HealthMetric>,

        /// Override the metric's default per-day reduction
        #[arg(long)]
        policy: Option<PolicyArg>,

        /// Fixed UTC offset for day boundaries (e.g. "+02:00"); defaults to local time
        #[arg(long, allow_hyphen_values = true)]
        utc_offset: Option<String>,

        /// Output format
        #[arg(long, default_value = "json")]
        format: OutputFormat,

        /// Engine configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Compute BMR, calorie target, macros and suggestions
    Plan {
        #[arg(long)]
        height_cm: f64,

        #[arg(long)]
        weight_kg: f64,

        #[arg(long)]
        age: u32,

        #[arg(long)]
        sex: SexArg,

        /// Activity level name (e.g. "lightly_active") or its exact factor (e.g. 1.375)
        #[arg(long, default_value = "lightly_active")]
        activity: String,

        #[arg(long, default_value = "maintain")]
        goal: GoalArg,

        /// Kilograms to lose or gain
        #[arg(long, default_value = "0")]
        target_delta_kg: f64,

        /// Weeks to reach the target
        #[arg(long, default_value = "0")]
        weeks: u32,

        #[arg(long)]
        vegetarian: bool,

        /// Output format
        #[arg(long, default_value = "json")]
        format: OutputFormat,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Check an engine configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Sum,
    Latest,
    Mean,
}

impl From<PolicyArg> for AggregationPolicy {
    fn from(p: PolicyArg) -> Self {
        match p {
            PolicyArg::Sum => AggregationPolicy::Sum,
            PolicyArg::Latest => AggregationPolicy::Latest,
            PolicyArg::Mean => AggregationPolicy::Mean,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SexArg {
    Male,
    Female,
}

impl From<SexArg> for Sex {
    fn from(s: SexArg) -> Self {
        match s {
            SexArg::Male => Sex::Male,
            SexArg::Female => Sex::Female,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum GoalArg {
    Lose,
    Maintain,
    Gain,
}

impl From<GoalArg> for Goal {
    fn from(g: GoalArg) -> Self {
        match g {
            GoalArg::Lose => Goal::Lose,
            GoalArg::Maintain => Goal::Maintain,
            GoalArg::Gain => Goal::Gain,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input sample records
    Input,
    /// Output report envelope
    Output,
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr so stdout stays valid JSON. `PULSE_LOG` wins over `RUST_LOG`.
fn init_logging() {
    let filter = std::env::var("PULSE_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "warn".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(filter)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter)
        .init();
}

fn run(cli: Cli) -> Result<(), PulseCliError> {
    match cli.command {
        Commands::Summarize {
            input,
            metric,
            policy,
            utc_offset,
            format,
            config,
        } => cmd_summarize(
            &input,
            metric,
            policy.map(AggregationPolicy::from),
            utc_offset.as_deref(),
            format,
            config.as_deref(),
        ),

        Commands::Plan {
            height_cm,
            weight_kg,
            age,
            sex,
            activity,
            goal,
            target_delta_kg,
            weeks,
            vegetarian,
            format,
        } => {
            let profile = BiometricProfile {
                height_cm,
                weight_kg,
                age_years: age,
                sex: sex.into(),
                activity: parse_activity(&activity)?,
                goal: goal.into(),
                target_delta_kg,
                weeks_to_target: weeks,
                vegetarian,
            };
            cmd_plan(&profile, format)
        }

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),

        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),
    }
}

fn cmd_summarize(
    input: &Path,
    metric: Option<HealthMetric>,
    policy: Option<AggregationPolicy>,
    utc_offset: Option<&str>,
    format: OutputFormat,
    config: Option<&Path>,
) -> Result<(), PulseCliError> {
    let processor = match config {
        Some(path) => DashboardProcessor::new(EngineConfig::from_json(&fs::read_to_string(path)?)?)?,
        None => DashboardProcessor::default(),
    };

    let input_data = read_input(input)?;
    let records = SampleReader::parse_auto(&input_data)?;
    if records.is_empty() {
        return Err(PulseCliError::NoSamples);
    }

    let mut grouped = SampleReader::group_by_metric(&records, metric)?;
    if let Some(m) = metric {
        grouped.retain(|key, _| *key == m);
    }

    let summaries = match utc_offset {
        Some(offset) => {
            let tz: FixedOffset = offset
                .parse()
                .map_err(|_| PulseCliError::InvalidOffset(offset.to_string()))?;
            summarize_grouped(&processor, &grouped, policy, &tz)
        }
        None => summarize_grouped(&processor, &grouped, policy, &Local),
    };

    let report = ReportEncoder::new().encode(summaries, None);
    print!("{}", format_output(&report, &format)?);
    Ok(())
}

fn summarize_grouped<Tz: TimeZone>(
    processor: &DashboardProcessor,
    grouped: &BTreeMap<HealthMetric, Vec<Sample>>,
    policy: Option<AggregationPolicy>,
    tz: &Tz,
) -> Vec<MetricSummary> {
    grouped
        .iter()
        .map(|(metric, samples)| processor.summarize(*metric, samples, policy, tz))
        .collect()
}

fn cmd_plan(profile: &BiometricProfile, format: OutputFormat) -> Result<(), PulseCliError> {
    let nutrition = DashboardProcessor::default().nutrition(profile)?;
    if !nutrition.plan.goal_applied {
        tracing::warn!("goal not applied; plan uses maintenance calories");
    }
    let report = ReportEncoder::new().encode(Vec::new(), Some(nutrition));
    print!("{}", format_output(&report, &format)?);
    Ok(())
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), PulseCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "pulseplan_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Pulseplan version {}", PULSEPLAN_VERSION),
    });

    if let Some(config_path) = config {
        let check = if !config_path.exists() {
            DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Warning,
                message: "Config file does not exist".to_string(),
            }
        } else {
            match fs::read_to_string(config_path) {
                Ok(content) => match EngineConfig::from_json(&content) {
                    Ok(cfg) => DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Ok,
                        message: format!(
                            "Config valid ({}-day window, {}-day recent window)",
                            cfg.window_days, cfg.short_window_days
                        ),
                    },
                    Err(e) => DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Error,
                        message: format!("Invalid config: {}", e),
                    },
                },
                Err(e) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Cannot read config file: {}", e),
                },
            }
        };
        checks.push(check);
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (pass --input <file>)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (--input - ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: PULSEPLAN_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Pulse Doctor Report");
        println!("===================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");
        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(PulseCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), PulseCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", serde_json::to_string_pretty(&input_json_schema())?);
            } else {
                println!("Input: JSON array or NDJSON of sample records");
                println!();
                println!("- metric:    steps | weight | height | heart_rate | sleep (optional with --metric)");
                println!("- timestamp: RFC 3339 instant");
                println!("- value:     number in the metric's unit");
                println!();
                println!("Units:");
                for metric in HealthMetric::ALL {
                    println!(
                        "  {:<11} {:<7} {:<6} {} decimals, default policy: {:?}",
                        metric.as_str(),
                        metric.title(),
                        metric.unit(),
                        metric.fraction_digits(),
                        metric.default_policy()
                    );
                }
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", serde_json::to_string_pretty(&output_json_schema())?);
            } else {
                println!("Output: report envelope");
                println!();
                println!("- report_version: Schema version");
                println!("- producer: {{ name, version, instance_id }}");
                println!("- generated_at_utc");
                println!("- metrics: Array of summaries containing:");
                println!("  - metric, policy, series (date, value)");
                println!("  - stats: {{ count, mean, min, max }} over the window");
                println!("  - recent, day_changes");
                println!("  - weekday_averages, weekday_slices (start_angle, end_angle)");
                println!("  - insight: metric-specific trend or category");
                println!("- nutrition: {{ profile, plan, body, meal_plan, exercises }} (plan only)");
            }
        }
    }
    Ok(())
}

// Helper functions

fn read_input(input: &Path) -> Result<String, PulseCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn format_output(report: &DashboardReport, format: &OutputFormat) -> Result<String, PulseCliError> {
    let json = match format {
        OutputFormat::Json => serde_json::to_string(report)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(report)?,
    };
    Ok(json + "\n")
}

fn parse_activity(value: &str) -> Result<ActivityLevel, PulseCliError> {
    if let Ok(factor) = value.parse::<f64>() {
        return Ok(ActivityLevel::try_from_factor(factor)?);
    }
    let wanted = value.trim().to_ascii_lowercase().replace(['-', ' '], "_");
    ActivityLevel::ALL
        .into_iter()
        .find(|level| level.label().to_ascii_lowercase().replace(' ', "_") == wanted)
        .ok_or_else(|| PulseCliError::InvalidActivity(value.to_string()))
}

fn input_json_schema() -> serde_json::Value {
    let metrics: Vec<&str> = HealthMetric::ALL.iter().map(|m| m.as_str()).collect();
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "pulseplan.sample",
        "description": "One health-store sample",
        "type": "object",
        "required": ["timestamp", "value"],
        "properties": {
            "metric": { "type": "string", "enum": metrics },
            "timestamp": { "type": "string", "format": "date-time" },
            "value": { "type": "number" }
        }
    })
}

fn output_json_schema() -> serde_json::Value {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "pulseplan.report",
        "type": "object",
        "required": ["report_version", "producer", "generated_at_utc", "metrics"],
        "properties": {
            "report_version": { "type": "string" },
            "producer": {
                "type": "object",
                "required": ["name", "version", "instance_id"],
                "properties": {
                    "name": { "type": "string" },
                    "version": { "type": "string" },
                    "instance_id": { "type": "string" }
                }
            },
            "generated_at_utc": { "type": "string", "format": "date-time" },
            "metrics": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["metric", "policy", "series", "stats", "insight"],
                    "properties": {
                        "metric": { "type": "string" },
                        "policy": { "type": "string", "enum": ["sum", "latest", "mean"] },
                        "series": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "date": { "type": "string", "format": "date" },
                                    "value": { "type": "number" }
                                }
                            }
                        },
                        "stats": { "type": "object" },
                        "weekday_slices": { "type": "array" },
                        "insight": { "type": "object" }
                    }
                }
            },
            "nutrition": { "type": "object" }
        }
    })
}

// Error types

#[derive(Debug)]
enum PulseCliError {
    Io(io::Error),
    Compute(ComputeError),
    Json(serde_json::Error),
    NoSamples,
    InvalidOffset(String),
    InvalidActivity(String),
    DoctorFailed,
}

impl From<io::Error> for PulseCliError {
    fn from(e: io::Error) -> Self {
        PulseCliError::Io(e)
    }
}

impl From<ComputeError> for PulseCliError {
    fn from(e: ComputeError) -> Self {
        PulseCliError::Compute(e)
    }
}

impl From<serde_json::Error> for PulseCliError {
    fn from(e: serde_json::Error) -> Self {
        PulseCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<PulseCliError> for CliError {
    fn from(e: PulseCliError) -> Self {
        match e {
            PulseCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            PulseCliError::Compute(e) => {
                let hint = match &e {
                    ComputeError::InvalidProfile(_) | ComputeError::InvalidActivityFactor(_) => {
                        "Check the biometric arguments"
                    }
                    ComputeError::InvalidConfig(_) => "Run 'pulse doctor --config <file>'",
                    _ => "Run 'pulse schema input' for the expected format",
                };
                CliError {
                    code: "COMPUTE_ERROR".to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            PulseCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            PulseCliError::NoSamples => CliError {
                code: "NO_SAMPLES".to_string(),
                message: "No samples found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            PulseCliError::InvalidOffset(offset) => CliError {
                code: "INVALID_OFFSET".to_string(),
                message: format!("Invalid UTC offset: {}", offset),
                hint: Some("Use the form +HH:MM or -HH:MM".to_string()),
            },
            PulseCliError::InvalidActivity(value) => CliError {
                code: "INVALID_ACTIVITY".to_string(),
                message: format!("Unknown activity level: {}", value),
                hint: Some(
                    "Use sedentary, lightly_active, moderately_active, very_active or super_active"
                        .to_string(),
                ),
            },
            PulseCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more checks failed".to_string(),
                hint: Some("Review the failed checks above".to_string()),
            },
        }
    }
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
