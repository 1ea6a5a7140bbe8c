//! # Sector Performance
//!
//! $$
//! \Delta_h = 100\left(\frac{p_{n}}{p_{n-h}}-1\right),\qquad
//! \Delta_{\text{YTD}} = 100\left(\frac{p_{n}}{p_{a}}-1\right),\ a=\min\{k: t_k\ge \text{Jan 1}\}
//! $$
//!
//! Point-to-point percentage changes over positional and calendar lookbacks.
//!
//! The 1W and 1M horizons are positional offsets (5 and 21 observations) into the
//! instrument's own series. They approximate a week and a month under a regular
//! trading calendar and are not adjusted for holidays or gaps.

use chrono::NaiveDate;

use crate::error::MarketError;
use crate::error::Metric;
use crate::error::MetricResult;
use crate::market::PriceSeries;

/// Positional offsets, in observations, for the short horizons.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lookbacks {
  pub daily: usize,
  pub weekly: usize,
  pub monthly: usize,
}

impl Default for Lookbacks {
  fn default() -> Self {
    Self {
      daily: 1,
      weekly: 5,
      monthly: 21,
    }
  }
}

/// Percentage changes of one instrument; each cell fails independently.
#[derive(Clone, Debug, PartialEq)]
pub struct PerformanceRecord {
  pub daily: MetricResult,
  pub weekly: MetricResult,
  pub monthly: MetricResult,
  pub ytd: MetricResult,
}

impl PerformanceRecord {
  /// All four cells failed for the same reason, e.g. a missing series.
  pub fn unavailable(err: MarketError) -> Self {
    Self {
      daily: Err(err.clone()),
      weekly: Err(err.clone()),
      monthly: Err(err.clone()),
      ytd: Err(err),
    }
  }

  pub fn get(&self, metric: Metric) -> Option<&MetricResult> {
    match metric {
      Metric::Daily => Some(&self.daily),
      Metric::Weekly => Some(&self.weekly),
      Metric::Monthly => Some(&self.monthly),
      Metric::YearToDate => Some(&self.ytd),
      Metric::Volatility | Metric::Correlation => None,
    }
  }
}

/// Horizons in table order.
pub const HORIZONS: [Metric; 4] = [
  Metric::Daily,
  Metric::Weekly,
  Metric::Monthly,
  Metric::YearToDate,
];

fn pct(from: f64, to: f64) -> f64 {
  (to / from - 1.0) * 100.0
}

fn check_as_of(series: &PriceSeries, as_of: usize, metric: Metric) -> Result<(), MarketError> {
  if as_of >= series.len() {
    return Err(MarketError::insufficient(
      series.ticker(),
      metric,
      format!("as-of index {as_of} outside {} observations", series.len()),
    ));
  }
  Ok(())
}

/// Percentage change from `offset` observations before `as_of` to `as_of`.
pub fn pct_change_over(
  series: &PriceSeries,
  as_of: usize,
  offset: usize,
  metric: Metric,
) -> MetricResult {
  check_as_of(series, as_of, metric)?;
  if as_of < offset {
    return Err(MarketError::insufficient(
      series.ticker(),
      metric,
      format!("need {} observations, have {}", offset + 1, as_of + 1),
    ));
  }

  let points = series.points();
  Ok(pct(points[as_of - offset].close, points[as_of].close))
}

/// Percentage change from the first observation on/after January 1 of `year`.
pub fn year_to_date(series: &PriceSeries, as_of: usize, year: i32) -> MetricResult {
  check_as_of(series, as_of, Metric::YearToDate)?;

  let anchor_date = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(|| {
    MarketError::insufficient(series.ticker(), Metric::YearToDate, format!("invalid year {year}"))
  })?;

  let anchor = series
    .first_on_or_after(anchor_date)
    .filter(|&idx| idx <= as_of)
    .ok_or_else(|| {
      MarketError::insufficient(
        series.ticker(),
        Metric::YearToDate,
        format!("no observation between {anchor_date} and the as-of date"),
      )
    })?;

  let points = series.points();
  Ok(pct(points[anchor].close, points[as_of].close))
}

/// All horizons for the observation at `as_of`, YTD anchored in `year`.
pub fn compute_performance(
  series: &PriceSeries,
  as_of: usize,
  lookbacks: &Lookbacks,
  year: i32,
) -> PerformanceRecord {
  PerformanceRecord {
    daily: pct_change_over(series, as_of, lookbacks.daily, Metric::Daily),
    weekly: pct_change_over(series, as_of, lookbacks.weekly, Metric::Weekly),
    monthly: pct_change_over(series, as_of, lookbacks.monthly, Metric::Monthly),
    ytd: year_to_date(series, as_of, year),
  }
}

/// [`compute_performance`] at the latest observation.
pub fn latest_performance(
  series: &PriceSeries,
  lookbacks: &Lookbacks,
  year: i32,
) -> PerformanceRecord {
  match series.len().checked_sub(1) {
    Some(as_of) => compute_performance(series, as_of, lookbacks, year),
    None => PerformanceRecord::unavailable(MarketError::insufficient(
      series.ticker(),
      Metric::Daily,
      "series is empty",
    )),
  }
}
