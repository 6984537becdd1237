use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use dicd_spc::{
    analytics::{AnalyticsEngine, NelsonRule},
    config::{Config, ObservabilityConfig, StateBackend},
    models::TargetId,
    state::{create_store, AlertStore, MeasurementStore, TimeRange},
};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "dicd-spc")]
#[command(about = "SPC and process-capability analysis for CD measurements", version, long_about = None)]
struct Cli {
    /// Configuration file (defaults to $CONFIG_PATH, then config/local.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// JSON snapshot of measurements and specs to analyse
    #[arg(short, long)]
    snapshot: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Control limits and Nelson rule findings for a target
    Spc {
        #[arg(short, long)]
        target: TargetId,

        /// Lookback window in days
        #[arg(short, long)]
        days: Option<i64>,
    },

    /// Descriptive statistics and process capability for a target
    Stats {
        #[arg(short, long)]
        target: TargetId,

        /// Lookback window in days (ignored when --start or --end is given)
        #[arg(short, long)]
        days: Option<i64>,

        #[arg(long)]
        start: Option<DateTime<Utc>>,

        #[arg(long)]
        end: Option<DateTime<Utc>>,
    },

    /// Histogram, shape statistics and normality test for a target
    Dist {
        #[arg(short, long)]
        target: TargetId,

        #[arg(short, long)]
        days: Option<i64>,
    },

    /// Spec conformance of every measurement of a target
    SpecStatus {
        #[arg(short, long)]
        target: TargetId,

        #[arg(short, long)]
        days: Option<i64>,
    },

    /// Alerts derived from the SPC window of a target
    Alerts {
        #[arg(short, long)]
        target: TargetId,

        #[arg(short, long)]
        days: Option<i64>,

        /// Persist the candidates and print the stored alerts
        #[arg(long)]
        persist: bool,
    },

    /// List the Nelson rules
    Rules,
}

#[derive(Serialize)]
struct RuleInfo {
    id: u8,
    name: String,
    description: &'static str,
    window: usize,
}

#[derive(Serialize)]
struct MeasurementStatus {
    measurement_id: Uuid,
    label: String,
    created_at: DateTime<Utc>,
    #[serde(flatten)]
    status: dicd_spc::analytics::SpecStatus,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let mut config = loaded.unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Using default configuration");
        Config::default()
    });

    init_tracing(&config.observability);

    if let Some(path) = cli.snapshot {
        config.state.backend = StateBackend::Snapshot;
        config.state.snapshot_path = Some(path);
    }
    config.validate().context("invalid configuration")?;

    tracing::info!(
        service = %config.observability.service_name,
        version = env!("CARGO_PKG_VERSION"),
        backend = ?config.state.backend,
        "Starting"
    );

    let store = create_store(&config.state)
        .await
        .context("failed to initialize measurement store")?;
    let engine = AnalyticsEngine::new(config.analysis.clone(), store.clone(), store.clone());

    match cli.command {
        Commands::Spc { target, days } => {
            let report = engine.analyze_spc(target, days).await?;
            if report.is_empty() {
                tracing::warn!(target_id = target, "No measurements found for target");
            }
            print_json(&report)?;
        }

        Commands::Stats { target, days, start, end } => {
            let report = if start.is_some() || end.is_some() {
                engine
                    .process_statistics(target, &TimeRange::between(start, end))
                    .await?
            } else {
                engine.recent_process_statistics(target, days).await?
            };
            print_json(&report)?;
        }

        Commands::Dist { target, days } => {
            let report = engine.analyze_distribution(target, days).await?;
            if report.is_empty() {
                tracing::warn!(target_id = target, "No measurements found for target");
            }
            print_json(&report)?;
        }

        Commands::SpecStatus { target, days } => {
            let days = days.unwrap_or(engine.config().spc_lookback_days);
            let range = TimeRange::since(dicd_spc::analytics::lookback_start(Utc::now(), days)?);

            let mut statuses = Vec::new();
            for measurement in store.fetch_measurements(target, &range).await? {
                statuses.push(MeasurementStatus {
                    measurement_id: measurement.id,
                    label: measurement.label(),
                    created_at: measurement.created_at,
                    status: engine.spec_status(&measurement.id).await?,
                });
            }
            print_json(&statuses)?;
        }

        Commands::Alerts { target, days, persist } => {
            let candidates = engine.alert_candidates(target, days).await?;

            if persist {
                let mut alerts = Vec::with_capacity(candidates.len());
                for candidate in &candidates {
                    alerts.push(
                        store
                            .persist_alert(&candidate.measurement_id, candidate.rule_id, &candidate.description)
                            .await?,
                    );
                }
                print_json(&alerts)?;
            } else {
                print_json(&candidates)?;
            }
        }

        Commands::Rules => {
            let rules: Vec<RuleInfo> = NelsonRule::ALL
                .iter()
                .map(|rule| RuleInfo {
                    id: rule.id(),
                    name: rule.name(),
                    description: rule.description(),
                    window: rule.window(),
                })
                .collect();
            print_json(&rules)?;
        }
    }

    Ok(())
}

fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("dicd_spc={}", config.log_level).into());

    // Reports go to stdout, logs to stderr
    if config.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
