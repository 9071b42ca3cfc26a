mod live;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use backtest::{compute_metrics, load_bars_csv, run_backtest, BacktestParams};
use common::AppConfig;

#[derive(Parser)]
#[command(name = "pipbot", about = "ATR-breakout FX trading bot", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the live decision loop in paper mode over a recorded bar history.
    Live {
        #[arg(long, default_value = "config/pipbot.toml")]
        config: String,
        /// CSV bar history that drives the paper session.
        #[arg(long)]
        data: String,
        /// Log fully built orders instead of submitting them.
        #[arg(long)]
        dry_run: bool,
    },
    /// Replay the strategy over stored history and print summary statistics.
    Backtest {
        #[arg(long, default_value = "config/pipbot.toml")]
        config: String,
        #[arg(long)]
        data: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    match cli.command {
        Command::Live {
            config,
            data,
            dry_run,
        } => live::run(&config, &data, dry_run).await?,
        Command::Backtest { config, data } => run_backtest_command(&config, &data)?,
    }
    Ok(())
}

fn run_backtest_command(config_path: &str, data_path: &str) -> anyhow::Result<()> {
    let cfg = AppConfig::load(config_path)?;
    let bars = load_bars_csv(data_path)?;
    info!(bars = bars.len(), symbols = ?cfg.symbols, "Backtest starting");

    let params = BacktestParams {
        strategy: cfg.strategy,
        risk: cfg.risk,
        backtest: cfg.backtest,
    };
    let report = run_backtest(&bars, &params);
    let metrics = compute_metrics(&report.equity_curve, &report.trades);

    println!(
        "balance:       {:.2} -> {:.2}",
        report.initial_balance, report.final_balance
    );
    println!("{metrics}");
    Ok(())
}
