//! # Dashboard
//!
//! $$
//! T \xrightarrow{\ \text{weekly}\ } \rho,\qquad
//! T \xrightarrow{\ \text{positional/YTD}\ } \Delta,\qquad
//! (\sigma, \Delta_{\text{YTD}}) \xrightarrow{\ \text{gate}\ } \mathbf w
//! $$
//!
//! Stateless derivation pipeline over a cached price table. Every report is
//! recomputed from the table; only the raw prices are cached.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Datelike;
use chrono::NaiveDate;
use tracing::debug;
use tracing::info;

use crate::analytics::allocation::compute_weights;
use crate::analytics::allocation::Allocation;
use crate::analytics::correlation::correlation_matrix;
use crate::analytics::correlation::CorrelationMatrix;
use crate::analytics::performance::latest_performance;
use crate::analytics::performance::PerformanceRecord;
use crate::analytics::returns::compute_volatility;
use crate::config::DashboardConfig;
use crate::error::MarketError;
use crate::error::Metric;
use crate::error::MetricResult;
use crate::market::PriceSource;
use crate::market::PriceStore;
use crate::market::PriceTable;

/// Everything the presentation layer consumes for one request.
#[derive(Clone, Debug)]
pub struct DashboardReport {
  /// Latest date present in the price table.
  pub as_of: NaiveDate,
  /// Weekly-return correlation of the intermarket universe.
  pub correlation: CorrelationMatrix,
  /// Multi-horizon performance per sector ticker.
  pub performance: BTreeMap<String, PerformanceRecord>,
  /// Annualized volatility per sector ticker.
  pub volatility: BTreeMap<String, MetricResult>,
  pub allocation: Allocation,
}

/// Derive a report from `table`, anchoring YTD in the calendar year of `today`.
pub fn build_report(
  table: &PriceTable,
  config: &DashboardConfig,
  today: NaiveDate,
) -> Result<DashboardReport, MarketError> {
  let as_of = match table.latest_date() {
    Some(date) if !table.is_empty() => date,
    _ => {
      return Err(MarketError::DataUnavailable {
        reason: "price table is empty".into(),
      })
    }
  };

  let intermarket: Vec<&str> = config.intermarket.tickers().collect();
  let correlation = correlation_matrix(table, &intermarket, config.correlation_min_overlap);

  let mut performance = BTreeMap::new();
  let mut volatility = BTreeMap::new();
  let year = today.year();

  for ticker in config.sectors.tickers() {
    let (perf, vol) = match table.get(ticker) {
      Some(series) => (
        latest_performance(series, &config.lookbacks, year),
        compute_volatility(series, config.periods_per_year, config.volatility_window),
      ),
      None => {
        let missing = |metric| MarketError::insufficient(ticker, metric, "no prices returned");
        (
          PerformanceRecord::unavailable(missing(Metric::Daily)),
          Err(missing(Metric::Volatility)),
        )
      }
    };
    debug!(%ticker, ?vol, ytd = ?perf.ytd, "sector metrics");
    performance.insert(ticker.to_string(), perf);
    volatility.insert(ticker.to_string(), vol);
  }

  // Degenerate series enter the allocator as zero volatility so its policy applies;
  // other failures stay absent.
  let vol_inputs: BTreeMap<String, f64> = volatility
    .iter()
    .filter_map(|(t, v)| match v {
      Ok(vol) => Some((t.clone(), *vol)),
      Err(MarketError::DegenerateVolatility { .. }) => Some((t.clone(), 0.0)),
      Err(_) => None,
    })
    .collect();
  let ytd_inputs: BTreeMap<String, f64> = performance
    .iter()
    .filter_map(|(t, p)| p.ytd.as_ref().ok().map(|ytd| (t.clone(), *ytd)))
    .collect();

  let allocation = compute_weights(
    &config.sectors,
    &vol_inputs,
    &ytd_inputs,
    config.degenerate_policy,
  );

  Ok(DashboardReport {
    as_of,
    correlation,
    performance,
    volatility,
    allocation,
  })
}

/// Entry point coupling a [`PriceSource`] to the derivation pipeline.
#[derive(Debug)]
pub struct Dashboard<S> {
  config: DashboardConfig,
  store: PriceStore<S>,
}

impl<S: PriceSource> Dashboard<S> {
  /// Construct a dashboard after validating `config`.
  pub fn new(config: DashboardConfig, source: S) -> Result<Self, MarketError> {
    config.validate()?;
    let store = PriceStore::new(source, config.cache_ttl);
    Ok(Self { config, store })
  }

  pub fn config(&self) -> &DashboardConfig {
    &self.config
  }

  pub fn store(&self) -> &PriceStore<S> {
    &self.store
  }

  /// Cached price table for both universes.
  pub fn prices(&self, today: NaiveDate) -> Result<Arc<PriceTable>, MarketError> {
    self
      .store
      .get(&self.config.all_tickers(), self.config.lookback, today)
  }

  /// Fetch (or reuse) prices and derive a fresh report.
  pub fn report(&self, today: NaiveDate) -> Result<DashboardReport, MarketError> {
    let table = self.prices(today)?;
    let report = build_report(&table, &self.config, today)?;
    info!(
      as_of = %report.as_of,
      allocated = report.allocation.is_allocated(),
      "dashboard report ready"
    );
    Ok(report)
  }
}
