//! # Configuration
//!
//! $$
//! \sigma^{\text{ann}} = \sigma^{\text{daily}}\sqrt{252}
//! $$
//!
//! Universes, windows and constants of the dashboard.

use std::collections::BTreeSet;
use std::time::Duration;

use crate::analytics::allocation::DegeneratePolicy;
use crate::analytics::performance::Lookbacks;
use crate::error::MarketError;
use crate::market::Universe;
use crate::market::UniverseKind;

/// Trading periods per year for daily data.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Trailing fetch window (two calendar years).
pub const LOOKBACK_DAYS: i64 = 730;

/// Time-to-live of the cached price table.
pub const CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Minimum overlapping weekly returns for a correlation to be reported.
pub const CORRELATION_MIN_OVERLAP: usize = 3;

pub const INTERMARKET: &[(&str, &str)] = &[
  ("SPY", "S&P 500"),
  ("TLT", "Treasury 20Y+"),
  ("GLD", "Gold"),
  ("UUP", "US Dollar"),
  ("USO", "Crude Oil"),
];

pub const SECTORS: &[(&str, &str)] = &[
  ("XLK", "Technology"),
  ("XLF", "Financials"),
  ("XLV", "Health Care"),
  ("XLE", "Energy"),
  ("XLI", "Industrials"),
  ("XLY", "Consumer Discretionary"),
  ("XLP", "Consumer Staples"),
  ("XLU", "Utilities"),
  ("XLB", "Materials"),
  ("XLRE", "Real Estate"),
  ("XLC", "Communication Services"),
];

/// Runtime configuration for [`crate::dashboard::Dashboard`].
#[derive(Clone, Debug)]
pub struct DashboardConfig {
  /// Asset-class proxies for the correlation matrix.
  pub intermarket: Universe,
  /// Sector proxies for performance and allocation.
  pub sectors: Universe,
  /// Calendar length of the fetch window.
  pub lookback: chrono::Duration,
  /// How long a fetched table is served from cache.
  pub cache_ttl: Duration,
  /// Annualization factor for volatility.
  pub periods_per_year: f64,
  /// Positional offsets for the 1D/1W/1M changes.
  pub lookbacks: Lookbacks,
  /// Trailing number of prices used for volatility, `None` for the whole window.
  pub volatility_window: Option<usize>,
  /// Treatment of zero-variance instruments in the allocation.
  pub degenerate_policy: DegeneratePolicy,
  pub correlation_min_overlap: usize,
}

impl Default for DashboardConfig {
  fn default() -> Self {
    Self {
      intermarket: Universe::new(UniverseKind::Intermarket, INTERMARKET),
      sectors: Universe::new(UniverseKind::Sector, SECTORS),
      lookback: chrono::Duration::days(LOOKBACK_DAYS),
      cache_ttl: CACHE_TTL,
      periods_per_year: TRADING_DAYS_PER_YEAR,
      lookbacks: Lookbacks::default(),
      volatility_window: None,
      degenerate_policy: DegeneratePolicy::default(),
      correlation_min_overlap: CORRELATION_MIN_OVERLAP,
    }
  }
}

impl DashboardConfig {
  /// Check universe and parameter invariants.
  pub fn validate(&self) -> Result<(), MarketError> {
    let invalid = |msg: String| Err(MarketError::InvalidConfig(msg));

    if self.intermarket.kind() != UniverseKind::Intermarket
      || self.sectors.kind() != UniverseKind::Sector
    {
      return invalid("universe kinds are swapped".into());
    }
    if self.intermarket.is_empty() || self.sectors.is_empty() {
      return invalid("both universes must be non-empty".into());
    }

    let mut seen = BTreeSet::new();
    for ticker in self.intermarket.tickers().chain(self.sectors.tickers()) {
      if !seen.insert(ticker) {
        return invalid(format!("ticker {ticker} listed twice"));
      }
    }

    if self.lookback <= chrono::Duration::zero() {
      return invalid("lookback must be positive".into());
    }
    if !(self.periods_per_year.is_finite() && self.periods_per_year > 0.0) {
      return invalid(format!(
        "periods per year must be positive, got {}",
        self.periods_per_year
      ));
    }
    let Lookbacks {
      daily,
      weekly,
      monthly,
    } = self.lookbacks;
    if daily == 0 || daily >= weekly || weekly >= monthly {
      return invalid(format!(
        "lookbacks must satisfy 1 <= daily < weekly < monthly, got {daily}/{weekly}/{monthly}"
      ));
    }
    if matches!(self.volatility_window, Some(w) if w < 2) {
      return invalid("volatility window needs at least 2 prices".into());
    }
    if let DegeneratePolicy::Floor(floor) = self.degenerate_policy {
      if !(floor.is_finite() && floor > 0.0 && (1.0 / floor).is_finite()) {
        return invalid(format!(
          "volatility floor must be positive with a finite reciprocal, got {floor}"
        ));
      }
    }
    if self.correlation_min_overlap < 2 {
      return invalid("correlation needs an overlap of at least 2".into());
    }

    Ok(())
  }

  /// Every ticker fetched for one request, intermarket first.
  pub fn all_tickers(&self) -> Vec<String> {
    self
      .intermarket
      .tickers()
      .chain(self.sectors.tickers())
      .map(str::to_string)
      .collect()
  }

  /// Display label across both universes.
  pub fn label<'a>(&'a self, ticker: &'a str) -> &'a str {
    self
      .intermarket
      .get(ticker)
      .or_else(|| self.sectors.get(ticker))
      .map_or(ticker, |i| i.label.as_str())
  }
}
