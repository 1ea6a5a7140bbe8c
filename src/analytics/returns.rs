//! # Returns and Volatility
//!
//! $$
//! r_k=\frac{p_k}{p_{k-1}}-1,\qquad \sigma^{\text{ann}}=\sqrt{252}\,\sqrt{\frac{1}{n-1}\sum_k (r_k-\bar r)^2}
//! $$
//!
//! Simple period-over-period returns and their annualized sample standard deviation.

use statrs::statistics::Statistics;
use tracing::warn;

use crate::error::MarketError;
use crate::error::Metric;
use crate::error::MetricResult;
use crate::market::PriceSeries;

/// Standard deviations below this are treated as zero variance.
pub const ZERO_VARIANCE_TOL: f64 = 1e-12;

/// Convert closes to simple returns; one element shorter than the input.
///
/// Consecutive observations are used as-is, so a calendar gap yields one return
/// spanning the gap.
pub fn simple_returns(closes: &[f64]) -> Vec<f64> {
  closes.windows(2).map(|w| w[1] / w[0] - 1.0).collect()
}

/// Sample (n-1) standard deviation. Fewer than two samples are defined as 0.
pub fn sample_std(xs: &[f64]) -> f64 {
  if xs.len() < 2 {
    return 0.0;
  }
  xs.std_dev()
}

pub fn annualized_volatility(returns: &[f64], periods_per_year: f64) -> f64 {
  sample_std(returns) * periods_per_year.sqrt()
}

/// Annualized volatility of `series`, optionally over its trailing `window` prices.
///
/// Fails with [`MarketError::InsufficientHistory`] below two prices and with
/// [`MarketError::DegenerateVolatility`] when the returns have zero variance,
/// including the single-return case.
pub fn compute_volatility(
  series: &PriceSeries,
  periods_per_year: f64,
  window: Option<usize>,
) -> MetricResult {
  let closes = series.closes();
  let closes = match window {
    Some(w) => &closes[closes.len().saturating_sub(w)..],
    None => &closes[..],
  };

  if closes.len() < 2 {
    return Err(MarketError::insufficient(
      series.ticker(),
      Metric::Volatility,
      format!("need 2 prices, have {}", closes.len()),
    ));
  }

  let vol = annualized_volatility(&simple_returns(closes), periods_per_year);
  if !vol.is_finite() || vol < ZERO_VARIANCE_TOL {
    warn!(ticker = series.ticker(), "zero-variance return series");
    return Err(MarketError::DegenerateVolatility {
      ticker: series.ticker().to_string(),
    });
  }

  Ok(vol)
}
