//! # Intermarket Correlation
//!
//! $$
//! \rho_{ij}=\frac{\sum_w (r_{i,w}-\bar r_i)(r_{j,w}-\bar r_j)}
//! {\sqrt{\sum_w (r_{i,w}-\bar r_i)^2\sum_w (r_{j,w}-\bar r_j)^2}}
//! $$
//!
//! Pairwise Pearson correlation of weekly returns. Daily closes are aligned by date,
//! resampled to the last available close of each ISO week, and each pair uses only
//! the weeks where both instruments have a return.

use std::collections::BTreeMap;

use chrono::Datelike;
use ndarray::Array2;

use crate::market::PriceTable;

/// ISO `(year, week)` key.
pub type WeekKey = (i32, u32);

/// Square correlation matrix indexed by ticker; unavailable cells hold `NaN`.
#[derive(Clone, Debug)]
pub struct CorrelationMatrix {
  tickers: Vec<String>,
  values: Array2<f64>,
}

impl CorrelationMatrix {
  pub fn tickers(&self) -> &[String] {
    &self.tickers
  }

  pub fn values(&self) -> &Array2<f64> {
    &self.values
  }

  /// Correlation of `a` and `b`, `None` if either is unknown or the pair is unavailable.
  pub fn get(&self, a: &str, b: &str) -> Option<f64> {
    let i = self.tickers.iter().position(|t| t == a)?;
    let j = self.tickers.iter().position(|t| t == b)?;
    let v = self.values[[i, j]];
    (!v.is_nan()).then_some(v)
  }

  /// Rows as nested vectors, for renderers that take plain tables.
  pub fn to_rows(&self) -> Vec<Vec<f64>> {
    self.values.outer_iter().map(|row| row.to_vec()).collect()
  }
}

/// Last available close of each ISO week, per ticker.
pub fn weekly_closes<'a>(
  table: &PriceTable,
  tickers: impl IntoIterator<Item = &'a str>,
) -> (Vec<WeekKey>, BTreeMap<String, Vec<Option<f64>>>) {
  let aligned = table.aligned(tickers);

  let mut week_of_row = Vec::with_capacity(aligned.dates.len());
  let mut weeks: Vec<WeekKey> = Vec::new();
  for date in &aligned.dates {
    let iso = date.iso_week();
    let key = (iso.year(), iso.week());
    if weeks.last() != Some(&key) {
      weeks.push(key);
    }
    week_of_row.push(weeks.len() - 1);
  }

  let columns = aligned
    .columns
    .into_iter()
    .map(|(ticker, column)| {
      let mut out = vec![None; weeks.len()];
      for (row, close) in column.into_iter().enumerate() {
        if close.is_some() {
          out[week_of_row[row]] = close;
        }
      }
      (ticker, out)
    })
    .collect();

  (weeks, columns)
}

/// Week-over-week simple returns; a return needs both weeks present.
pub fn weekly_returns(closes: &[Option<f64>]) -> Vec<Option<f64>> {
  closes
    .windows(2)
    .map(|w| match (w[0], w[1]) {
      (Some(prev), Some(curr)) => Some(curr / prev - 1.0),
      _ => None,
    })
    .collect()
}

/// Pearson correlation over positions where both inputs are present.
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>], min_overlap: usize) -> Option<f64> {
  let pairs: Vec<(f64, f64)> = x
    .iter()
    .zip(y.iter())
    .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
    .collect();

  let n = pairs.len();
  if n < min_overlap.max(2) {
    return None;
  }

  let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n as f64;
  let my = pairs.iter().map(|p| p.1).sum::<f64>() / n as f64;

  let mut cov = 0.0;
  let mut sx = 0.0;
  let mut sy = 0.0;
  for &(a, b) in &pairs {
    let dx = a - mx;
    let dy = b - my;
    cov += dx * dy;
    sx += dx * dx;
    sy += dy * dy;
  }

  let denom = (sx * sy).sqrt();
  if denom < 1e-15 {
    None
  } else {
    Some((cov / denom).clamp(-1.0, 1.0))
  }
}

/// Weekly-return correlation matrix of `tickers`, in the given order.
pub fn correlation_matrix(
  table: &PriceTable,
  tickers: &[&str],
  min_overlap: usize,
) -> CorrelationMatrix {
  let (_, closes) = weekly_closes(table, tickers.iter().copied());
  let returns: Vec<Vec<Option<f64>>> = tickers
    .iter()
    .map(|t| closes.get(*t).map(|c| weekly_returns(c)).unwrap_or_default())
    .collect();

  let n = tickers.len();
  let mut values = Array2::from_elem((n, n), f64::NAN);
  for i in 0..n {
    values[[i, i]] = 1.0;
    for j in (i + 1)..n {
      let r = pearson(&returns[i], &returns[j], min_overlap).unwrap_or(f64::NAN);
      values[[i, j]] = r;
      values[[j, i]] = r;
    }
  }

  CorrelationMatrix {
    tickers: tickers.iter().map(|t| t.to_string()).collect(),
    values,
  }
}
