//! # Price Series
//!
//! $$
//! P_i = \{(t_k, p_k)\}_{k=0}^{n-1},\quad t_0 < t_1 < \dots,\quad p_k > 0
//! $$
//!
//! Closing-price series per instrument and the keyed table that holds them.
//! Dates missing from one series are simply absent; row-wise views expose them as `None`.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::error::MarketError;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PricePoint {
  pub date: NaiveDate,
  pub close: f64,
}

/// Validated closing prices of one instrument, strictly increasing in date.
#[derive(Clone, Debug, PartialEq)]
pub struct PriceSeries {
  ticker: String,
  points: Vec<PricePoint>,
}

impl PriceSeries {
  /// Validate and wrap `points`.
  pub fn new(ticker: &str, points: Vec<PricePoint>) -> Result<Self, MarketError> {
    let invalid = |reason: String| MarketError::InvalidSeries {
      ticker: ticker.to_string(),
      reason,
    };

    for (k, p) in points.iter().enumerate() {
      if !p.close.is_finite() || p.close <= 0.0 {
        return Err(invalid(format!("close {} on {} is not positive", p.close, p.date)));
      }
      if k > 0 && points[k - 1].date >= p.date {
        return Err(invalid(format!(
          "dates not strictly increasing at {} (after {})",
          p.date,
          points[k - 1].date
        )));
      }
    }

    Ok(Self {
      ticker: ticker.to_string(),
      points,
    })
  }

  pub fn from_pairs(ticker: &str, pairs: &[(NaiveDate, f64)]) -> Result<Self, MarketError> {
    Self::new(
      ticker,
      pairs
        .iter()
        .map(|&(date, close)| PricePoint { date, close })
        .collect(),
    )
  }

  pub fn ticker(&self) -> &str {
    &self.ticker
  }

  pub fn points(&self) -> &[PricePoint] {
    &self.points
  }

  pub fn len(&self) -> usize {
    self.points.len()
  }

  pub fn is_empty(&self) -> bool {
    self.points.is_empty()
  }

  pub fn closes(&self) -> Vec<f64> {
    self.points.iter().map(|p| p.close).collect()
  }

  pub fn last(&self) -> Option<&PricePoint> {
    self.points.last()
  }

  /// Index of the first observation dated on or after `date`.
  pub fn first_on_or_after(&self, date: NaiveDate) -> Option<usize> {
    let idx = self.points.partition_point(|p| p.date < date);
    (idx < self.points.len()).then_some(idx)
  }

  /// Close on exactly `date`, `None` if the instrument did not trade.
  pub fn close_on(&self, date: NaiveDate) -> Option<f64> {
    self
      .points
      .binary_search_by(|p| p.date.cmp(&date))
      .ok()
      .map(|idx| self.points[idx].close)
  }
}

/// Row-wise view of several series over the union of their dates.
#[derive(Clone, Debug, PartialEq)]
pub struct AlignedCloses {
  pub dates: Vec<NaiveDate>,
  /// One column per ticker, `None` where the instrument has no observation.
  pub columns: BTreeMap<String, Vec<Option<f64>>>,
}

/// Immutable ticker → series mapping produced by one fetch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PriceTable {
  series: BTreeMap<String, PriceSeries>,
}

impl PriceTable {
  pub fn new(series: impl IntoIterator<Item = PriceSeries>) -> Self {
    Self {
      series: series
        .into_iter()
        .map(|s| (s.ticker.clone(), s))
        .collect(),
    }
  }

  pub fn get(&self, ticker: &str) -> Option<&PriceSeries> {
    self.series.get(ticker)
  }

  pub fn tickers(&self) -> impl Iterator<Item = &str> {
    self.series.keys().map(String::as_str)
  }

  /// `true` when no instrument has a single observation.
  pub fn is_empty(&self) -> bool {
    self.series.values().all(PriceSeries::is_empty)
  }

  pub fn latest_date(&self) -> Option<NaiveDate> {
    self
      .series
      .values()
      .filter_map(|s| s.last().map(|p| p.date))
      .max()
  }

  /// Align `tickers` by date. Unknown tickers yield an all-`None` column.
  pub fn aligned<'a>(&self, tickers: impl IntoIterator<Item = &'a str>) -> AlignedCloses {
    let tickers: Vec<&str> = tickers.into_iter().collect();
    let dates: Vec<NaiveDate> = tickers
      .iter()
      .filter_map(|t| self.series.get(*t))
      .flat_map(|s| s.points.iter().map(|p| p.date))
      .collect::<BTreeSet<_>>()
      .into_iter()
      .collect();

    let columns = tickers
      .iter()
      .map(|&t| {
        let column = match self.series.get(t) {
          Some(s) => dates.iter().map(|&d| s.close_on(d)).collect(),
          None => vec![None; dates.len()],
        };
        (t.to_string(), column)
      })
      .collect();

    AlignedCloses { dates, columns }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
  }

  #[test]
  fn rejects_unordered_and_non_positive_points() {
    let dup = PriceSeries::from_pairs("SPY", &[(d(2024, 1, 2), 1.0), (d(2024, 1, 2), 2.0)]);
    assert!(matches!(dup, Err(MarketError::InvalidSeries { .. })));

    let neg = PriceSeries::from_pairs("SPY", &[(d(2024, 1, 2), -1.0)]);
    assert!(matches!(neg, Err(MarketError::InvalidSeries { .. })));
  }

  #[test]
  fn first_on_or_after_skips_gaps() {
    let s = PriceSeries::from_pairs(
      "XLK",
      &[
        (d(2023, 12, 29), 10.0),
        (d(2024, 1, 3), 11.0),
        (d(2024, 1, 4), 12.0),
      ],
    )
    .unwrap();

    assert_eq!(s.first_on_or_after(d(2024, 1, 1)), Some(1));
    assert_eq!(s.first_on_or_after(d(2024, 2, 1)), None);
    assert_eq!(s.close_on(d(2024, 1, 2)), None);
    assert_eq!(s.close_on(d(2024, 1, 4)), Some(12.0));
  }

  #[test]
  fn aligned_marks_missing_dates_unavailable() {
    let a = PriceSeries::from_pairs("A", &[(d(2024, 1, 2), 1.0), (d(2024, 1, 3), 2.0)]).unwrap();
    let b = PriceSeries::from_pairs("B", &[(d(2024, 1, 3), 5.0), (d(2024, 1, 4), 6.0)]).unwrap();
    let table = PriceTable::new(vec![a, b]);

    let aligned = table.aligned(["A", "B", "C"]);
    assert_eq!(aligned.dates.len(), 3);
    assert_eq!(aligned.columns["A"], vec![Some(1.0), Some(2.0), None]);
    assert_eq!(aligned.columns["B"], vec![None, Some(5.0), Some(6.0)]);
    assert_eq!(aligned.columns["C"], vec![None, None, None]);
    assert_eq!(table.latest_date(), Some(d(2024, 1, 4)));
  }

  #[test]
  fn table_of_empty_series_is_empty() {
    let table = PriceTable::new(vec![PriceSeries::new("A", Vec::new()).unwrap()]);
    assert!(table.is_empty());
    assert!(PriceTable::default().is_empty());
  }
}
