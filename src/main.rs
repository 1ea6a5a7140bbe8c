use std::path::PathBuf;

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use intermarket_rs::analytics::DegeneratePolicy;
use intermarket_rs::market::PriceSource;
use intermarket_rs::market::SyntheticSource;
use intermarket_rs::tables;
use intermarket_rs::visualization;
use intermarket_rs::Dashboard;
use intermarket_rs::DashboardConfig;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
  name = "intermarket",
  about = "Intermarket correlation, sector performance and risk-parity momentum weights"
)]
struct Cli {
  /// Simulate prices instead of downloading quotes.
  #[arg(long)]
  offline: bool,

  /// Seed of the simulated prices.
  #[arg(long, default_value_t = 42)]
  seed: u64,

  /// Give zero-variance sectors this annualized volatility instead of excluding them.
  #[arg(long)]
  vol_floor: Option<f64>,

  /// Use only the trailing N prices for volatility.
  #[arg(long)]
  vol_window: Option<usize>,

  /// Write HTML charts into this directory.
  #[arg(long)]
  html: Option<PathBuf>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_target(false)
    .init();

  let cli = Cli::parse();

  let config = DashboardConfig {
    volatility_window: cli.vol_window,
    degenerate_policy: cli
      .vol_floor
      .map_or(DegeneratePolicy::Exclude, DegeneratePolicy::Floor),
    ..DashboardConfig::default()
  };

  if cli.offline {
    return run(config, SyntheticSource::new(cli.seed), &cli);
  }

  run_live(config, &cli)
}

#[cfg(feature = "yahoo")]
fn run_live(config: DashboardConfig, cli: &Cli) -> Result<()> {
  run(config, intermarket_rs::market::YahooSource::new(), cli)
}

#[cfg(not(feature = "yahoo"))]
fn run_live(_config: DashboardConfig, _cli: &Cli) -> Result<()> {
  anyhow::bail!(
    "built without the `yahoo` feature; rerun with --offline or build with `--features yahoo`"
  )
}

fn run<S: PriceSource>(config: DashboardConfig, source: S, cli: &Cli) -> Result<()> {
  let dashboard = Dashboard::new(config, source)?;
  let report = dashboard.report(Local::now().date_naive())?;
  let config = dashboard.config();

  println!("\nIntermarket correlation (weekly returns, as of {})", report.as_of);
  tables::correlation_table(&report, config).printstd();

  println!("\nSector performance (%)");
  tables::performance_table(&report, config).printstd();

  println!("\nRisk-parity allocation, positive YTD only");
  if let Some(reason) = report.allocation.shortfall() {
    println!("No allocation: {reason}.");
  }
  tables::risk_table(&report, config).printstd();

  if let Some(dir) = &cli.html {
    for path in visualization::write_dashboard(&report, config, dir)? {
      println!("wrote {}", path.display());
    }
  }

  Ok(())
}
