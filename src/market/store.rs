//! # Price Store
//!
//! $$
//! \text{get}(K, t) = \begin{cases} T_K & t - t_K < \tau \\ \text{fetch}(K) & \text{otherwise} \end{cases}
//! $$
//!
//! Single-key, time-to-live cache in front of a [`PriceSource`]. The cached table is
//! shared read-only through an [`Arc`]; the lock is held across a refresh so at most
//! one upstream fetch is in flight.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use chrono::NaiveDate;
use tracing::debug;
use tracing::info;

use super::series::PriceTable;
use super::source::FetchWindow;
use super::source::PriceSource;
use crate::error::MarketError;

#[derive(Clone, Debug, PartialEq, Eq)]
struct CacheKey {
  tickers: BTreeSet<String>,
  lookback_days: i64,
}

#[derive(Debug)]
struct CacheEntry {
  key: CacheKey,
  fetched_at: Instant,
  table: Arc<PriceTable>,
}

#[derive(Debug)]
pub struct PriceStore<S> {
  source: S,
  ttl: Duration,
  slot: Mutex<Option<CacheEntry>>,
}

impl<S: PriceSource> PriceStore<S> {
  pub fn new(source: S, ttl: Duration) -> Self {
    Self {
      source,
      ttl,
      slot: Mutex::new(None),
    }
  }

  pub fn source(&self) -> &S {
    &self.source
  }

  /// Prices for `tickers` over `lookback` days ending at `today`.
  pub fn get(
    &self,
    tickers: &[String],
    lookback: chrono::Duration,
    today: NaiveDate,
  ) -> Result<Arc<PriceTable>, MarketError> {
    self.get_at(tickers, lookback, today, Instant::now())
  }

  /// [`PriceStore::get`] with an explicit clock reading.
  pub fn get_at(
    &self,
    tickers: &[String],
    lookback: chrono::Duration,
    today: NaiveDate,
    now: Instant,
  ) -> Result<Arc<PriceTable>, MarketError> {
    let key = CacheKey {
      tickers: tickers.iter().cloned().collect(),
      lookback_days: lookback.num_days(),
    };

    let mut slot = self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    if let Some(entry) = slot.as_ref() {
      let age = now.saturating_duration_since(entry.fetched_at);
      if entry.key == key && age < self.ttl {
        debug!(age_secs = age.as_secs(), "price cache hit");
        return Ok(Arc::clone(&entry.table));
      }
    }

    let window = FetchWindow::trailing(today, lookback);
    let ordered: Vec<String> = key.tickers.iter().cloned().collect();
    info!(
      tickers = ordered.len(),
      start = %window.start,
      end = %window.end,
      "fetching prices"
    );

    let frame = self
      .source
      .fetch(&ordered, &window)
      .map_err(|err| MarketError::DataUnavailable {
        reason: format!("{err:#}"),
      })?;
    let table = frame.collapse()?;

    if table.is_empty() {
      return Err(MarketError::DataUnavailable {
        reason: format!(
          "no rows returned for {} tickers between {} and {}",
          ordered.len(),
          window.start,
          window.end
        ),
      });
    }

    let table = Arc::new(table);
    *slot = Some(CacheEntry {
      key,
      fetched_at: now,
      table: Arc::clone(&table),
    });

    Ok(table)
  }

  /// Drop the cached table; the next `get` refetches.
  pub fn invalidate(&self) {
    let mut slot = self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    *slot = None;
  }
}

#[cfg(test)]
mod tests {
  use std::thread;

  use anyhow::anyhow;

  use super::*;
  use crate::market::source::RawFrame;
  use crate::market::source::StaticSource;

  fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
  }

  fn tickers() -> Vec<String> {
    vec!["SPY".to_string(), "XLK".to_string()]
  }

  fn source() -> StaticSource {
    StaticSource::new(
      RawFrame::new()
        .close("SPY", vec![(d(2024, 3, 1), 500.0), (d(2024, 3, 4), 505.0)])
        .close("XLK", vec![(d(2024, 3, 1), 200.0), (d(2024, 3, 4), 198.0)]),
    )
  }

  struct FailingSource;

  impl PriceSource for FailingSource {
    fn fetch(&self, _tickers: &[String], _window: &FetchWindow) -> anyhow::Result<RawFrame> {
      Err(anyhow!("connection refused"))
    }
  }

  #[test]
  fn repeated_calls_within_ttl_do_not_refetch() {
    let store = PriceStore::new(source(), Duration::from_secs(3600));
    let lookback = chrono::Duration::days(730);
    let t0 = Instant::now();

    let first = store.get_at(&tickers(), lookback, d(2024, 3, 5), t0).unwrap();
    let second = store
      .get_at(&tickers(), lookback, d(2024, 3, 5), t0 + Duration::from_secs(1800))
      .unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(store.source().fetch_count(), 1);
  }

  #[test]
  fn expired_or_different_key_refetches() {
    let store = PriceStore::new(source(), Duration::from_secs(3600));
    let lookback = chrono::Duration::days(730);
    let t0 = Instant::now();

    store.get_at(&tickers(), lookback, d(2024, 3, 5), t0).unwrap();
    store
      .get_at(&tickers(), lookback, d(2024, 3, 5), t0 + Duration::from_secs(3600))
      .unwrap();
    assert_eq!(store.source().fetch_count(), 2);

    let other = vec!["SPY".to_string()];
    store
      .get_at(&other, lookback, d(2024, 3, 5), t0 + Duration::from_secs(3601))
      .unwrap();
    assert_eq!(store.source().fetch_count(), 3);

    store.invalidate();
    store
      .get_at(&other, lookback, d(2024, 3, 5), t0 + Duration::from_secs(3602))
      .unwrap();
    assert_eq!(store.source().fetch_count(), 4);
  }

  #[test]
  fn ticker_order_does_not_change_the_key() {
    let store = PriceStore::new(source(), Duration::from_secs(3600));
    let lookback = chrono::Duration::days(730);
    let reversed: Vec<String> = tickers().into_iter().rev().collect();

    store.get(&tickers(), lookback, d(2024, 3, 5)).unwrap();
    store.get(&reversed, lookback, d(2024, 3, 5)).unwrap();
    assert_eq!(store.source().fetch_count(), 1);
  }

  #[test]
  fn upstream_failure_is_data_unavailable() {
    let store = PriceStore::new(FailingSource, Duration::from_secs(3600));
    let err = store
      .get(&tickers(), chrono::Duration::days(730), d(2024, 3, 5))
      .unwrap_err();

    match err {
      MarketError::DataUnavailable { reason } => assert!(reason.contains("connection refused")),
      other => panic!("unexpected error: {other:?}"),
    }
  }

  #[test]
  fn empty_window_is_data_unavailable() {
    let store = PriceStore::new(source(), Duration::from_secs(3600));
    let err = store
      .get(&tickers(), chrono::Duration::days(30), d(2020, 1, 1))
      .unwrap_err();
    assert!(matches!(err, MarketError::DataUnavailable { .. }));
    assert_eq!(store.source().fetch_count(), 1);
  }

  #[test]
  fn concurrent_callers_share_one_fetch() {
    let store = PriceStore::new(source(), Duration::from_secs(3600));
    let lookback = chrono::Duration::days(730);

    thread::scope(|scope| {
      for _ in 0..8 {
        scope.spawn(|| store.get(&tickers(), lookback, d(2024, 3, 5)).unwrap());
      }
    });

    assert_eq!(store.source().fetch_count(), 1);
  }
}
