//! Paper Trader - Main Entry Point
//!
//! Runs the position monitor against Kalshi, or prints a user's strategy
//! profile and signals from a JSON file of tracked positions.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use paper_trader::common::channels::create_shutdown_channel;
use paper_trader::config::{load_config, AppConfig};
use paper_trader::{
    notify, InMemoryLedger, KalshiMarketSource, KellySizeCalculator, MarketDataSource,
    PositionLedger, PositionMonitor, ProgressTracker, StrategyEngine,
};

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error); overrides settings.log_level
    #[arg(long, global = true, env = "LOG_LEVEL")]
    log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reconcile active positions against live markets
    Monitor {
        /// JSON array of tracked positions to seed the ledger with
        #[arg(long)]
        positions: Option<String>,

        /// Run a single cycle and exit
        #[arg(long)]
        once: bool,
    },
    /// Print a user's strategy profile
    Strategy {
        #[arg(long)]
        user: String,

        #[arg(long)]
        positions: String,
    },
    /// Print ranked signals for a user
    Signals {
        #[arg(long)]
        user: String,

        #[arg(long)]
        positions: String,

        /// Maximum number of signals
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

fn init_logging(level: &str, json: bool) -> Result<()> {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    if json {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(())
}

/// Shared collaborators for every subcommand
struct Runtime {
    ledger: Arc<dyn PositionLedger>,
    market: Arc<dyn MarketDataSource>,
    progress: Arc<ProgressTracker>,
}

impl Runtime {
    fn build(config: &AppConfig, positions: Option<&str>) -> Result<Self> {
        let ledger: Arc<dyn PositionLedger> = match positions {
            Some(path) => Arc::new(
                InMemoryLedger::from_json_file(path)
                    .with_context(|| format!("failed to load positions from {}", path))?,
            ),
            None => Arc::new(InMemoryLedger::new()),
        };
        let market: Arc<dyn MarketDataSource> = Arc::new(KalshiMarketSource::from_config(&config.kalshi)?);
        let progress = Arc::new(ProgressTracker::new(
            ledger.clone(),
            config.settings.starting_paper_balance_cents,
        ));
        Ok(Self {
            ledger,
            market,
            progress,
        })
    }

    fn strategy_engine(&self, config: &AppConfig) -> StrategyEngine {
        StrategyEngine::new(
            self.ledger.clone(),
            self.market.clone(),
            self.progress.clone(),
            Arc::new(KellySizeCalculator::new()),
            config.kalshi.open_events_limit,
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let config = load_config(Some(&args.config))?;
    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.settings.log_level.clone());
    init_logging(&level, args.json_logs)?;

    info!("Starting paper trader");
    info!("Configuration file: {}", args.config);

    match args.command {
        Command::Monitor { positions, once } => {
            let runtime = Runtime::build(&config, positions.as_deref())?;
            let monitor = PositionMonitor::new(
                runtime.ledger.clone(),
                runtime.market.clone(),
                notify::from_config(&config.notifications)?,
                runtime.progress.clone(),
                &config.monitor,
                config.notifications.digest_title.clone(),
            );

            if once {
                let report = monitor.run_cycle().await?;
                info!(?report, "single cycle finished");
                return Ok(());
            }

            let (shutdown_tx, shutdown_rx) = create_shutdown_channel();
            tokio::spawn(async move {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!(error = %e, "failed to listen for Ctrl-C");
                    return;
                }
                info!("Received shutdown signal, finishing current cycle...");
                let _ = shutdown_tx.send(()).await;
            });

            monitor.run(shutdown_rx).await;
        }
        Command::Strategy { user, positions } => {
            let runtime = Runtime::build(&config, Some(&positions))?;
            runtime.progress.refresh(&user).await?;
            let profile = runtime.strategy_engine(&config).derive_strategy(&user).await?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
        Command::Signals {
            user,
            positions,
            limit,
        } => {
            let runtime = Runtime::build(&config, Some(&positions))?;
            runtime.progress.refresh(&user).await?;
            let signals = runtime
                .strategy_engine(&config)
                .generate_signals(&user, limit)
                .await?;
            println!("{}", serde_json::to_string_pretty(&signals)?);
        }
    }

    info!("Shutdown complete");
    Ok(())
}
