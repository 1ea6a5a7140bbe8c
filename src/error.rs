//! # Errors
//!
//! $$
//! \text{fetch} \to \text{table} \to \{\sigma_i, r_i^{h}\} \to \mathbf{w}
//! $$
//!
//! Failure taxonomy of the derivation chain. Fetch-level failures abort a request,
//! per-instrument failures are stored next to the values they replace.

use std::fmt::Display;

use thiserror::Error;

/// Metric whose computation failed for a single instrument.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
  Daily,
  Weekly,
  Monthly,
  YearToDate,
  Volatility,
  Correlation,
}

impl Display for Metric {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Metric::Daily => write!(f, "1D"),
      Metric::Weekly => write!(f, "1W"),
      Metric::Monthly => write!(f, "1M"),
      Metric::YearToDate => write!(f, "YTD"),
      Metric::Volatility => write!(f, "volatility"),
      Metric::Correlation => write!(f, "correlation"),
    }
  }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum MarketError {
  /// Upstream fetch failed or returned no rows for the requested window.
  #[error("price data unavailable: {reason} (check connectivity and retry)")]
  DataUnavailable { reason: String },

  /// Not enough observations for a lookback, or no observation after the YTD anchor.
  #[error("insufficient history for {ticker} ({metric}): {detail}")]
  InsufficientHistory {
    ticker: String,
    metric: Metric,
    detail: String,
  },

  /// Return series with zero variance; inverse volatility would be infinite.
  #[error("degenerate volatility for {ticker}: returns have zero variance")]
  DegenerateVolatility { ticker: String },

  #[error("invalid price series for {ticker}: {reason}")]
  InvalidSeries { ticker: String, reason: String },

  #[error("invalid configuration: {0}")]
  InvalidConfig(String),
}

impl MarketError {
  pub(crate) fn insufficient(ticker: &str, metric: Metric, detail: impl Into<String>) -> Self {
    Self::InsufficientHistory {
      ticker: ticker.to_string(),
      metric,
      detail: detail.into(),
    }
  }

  /// `true` for failures scoped to one instrument and one metric.
  pub fn is_per_instrument(&self) -> bool {
    matches!(
      self,
      Self::InsufficientHistory { .. } | Self::DegenerateVolatility { .. }
    )
  }
}

/// Outcome of one table cell.
pub type MetricResult = Result<f64, MarketError>;
