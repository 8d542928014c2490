use anyhow::Result;
use clap::{Parser, Subcommand};
use scanwatch::backend::{Backend, HttpBackend};
use scanwatch::config::DashConfig;
use scanwatch::model::AnalysisRequest;
use scanwatch::view;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "scanwatch",
    about = "Headless console and dashboard gateway for an anomaly-detection backend",
    version,
    long_about = None
)]
struct Cli {
    /// Path to a TOML config file (overrides SCANWATCH_CONFIG and /etc)
    #[arg(long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Backend base URL override
    #[arg(long, global = true)]
    backend_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the daemon (poll loops + dashboard API server)
    Serve {
        /// Bind address override
        #[arg(long)]
        bind: Option<String>,
    },

    /// Fetch the activity log once and print the derived summary
    Stats {
        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,

        /// Only list entries whose user id contains this substring
        #[arg(long)]
        user: Option<String>,
    },

    /// Submit one synthetic activity record and print the verdict
    Analyze {
        /// Actor the record is attributed to
        #[arg(long, default_value = "user_123")]
        user_id: String,

        /// Activity type label
        #[arg(long, default_value = "login")]
        activity: String,

        /// Hour of day, 0-24
        #[arg(long, default_value_t = 14.5)]
        hour: f64,

        /// Value metric (size/amount)
        #[arg(long, default_value_t = 500.0)]
        value: f64,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => DashConfig::load(path)?,
        None => DashConfig::load_or_default(),
    };
    if let Some(url) = &cli.backend_url {
        cfg.backend.base_url = url.clone();
    }

    // RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cfg.logging.level)),
        )
        .init();

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                cfg.server.bind = bind;
            }
            tracing::info!(bind = %cfg.server.bind, "starting scanwatch daemon");
            scanwatch::serve(cfg).await?;
        }
        Commands::Stats { json, user } => {
            let backend = HttpBackend::new(&cfg.backend.base_url);

            let logs = backend.fetch_logs().await.map_err(|e| {
                anyhow::anyhow!("failed to fetch logs: {} (is the backend running?)", e)
            })?;
            let view = view::derive_filtered(&logs, chrono::Utc::now(), user.as_deref());

            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                println!("\n=== Activity Summary ===");
                println!("Total scans : {}", view.summary.total);
                println!(
                    "Anomalies   : {} ({}%)",
                    view.summary.anomalies, view.summary.anomaly_pct
                );
                println!("Safe        : {}", view.summary.safe);

                match backend.health().await {
                    Ok(s) => println!("Backend     : {} (ai: {})", s.status, s.ai),
                    Err(e) => println!("Backend     : unreachable ({})", e),
                }

                println!("\nRecent activity:");
                if view.recent.is_empty() {
                    println!("  (no activity recorded yet)");
                } else {
                    println!("{:<8} | {:<20} | {:<10} | When", "ID", "User", "Status");
                    println!("{:-<8}-|-{:-<20}-|-{:-<10}-|-{:-<16}", "", "", "", "");
                    for e in &view.recent {
                        println!(
                            "{:<8} | {:<20} | {:<10} | {}",
                            e.id,
                            e.user,
                            e.status.to_string(),
                            e.relative_time
                        );
                    }
                }
                println!();
            }
        }
        Commands::Analyze {
            user_id,
            activity,
            hour,
            value,
            json,
        } => {
            let backend = HttpBackend::new(&cfg.backend.base_url);
            let request = AnalysisRequest {
                user_id,
                activity_type: activity,
                hour_of_day: hour,
                value_metric: value,
            }
            .sanitized();

            let timeout = Duration::from_secs(cfg.backend.submit_timeout_secs);
            let verdict = match tokio::time::timeout(timeout, backend.analyze(&request)).await {
                Ok(Ok(v)) => v,
                Ok(Err(e)) => {
                    anyhow::bail!("analysis failed: {} (is the backend running?)", e);
                }
                Err(_) => {
                    anyhow::bail!(
                        "analysis timed out after {}s (is the backend running?)",
                        timeout.as_secs()
                    );
                }
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&verdict)?);
            } else {
                println!("\n=== Analysis Verdict ===");
                println!("Risk    : {}", verdict.risk);
                println!("Anomaly : {}", verdict.is_anomaly);
                println!("Message : {}", verdict.message);
                println!();
            }
        }
    }

    Ok(())
}
