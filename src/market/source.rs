//! # Price Sources
//!
//! $$
//! \{(t, o, h, l, c, v)\}_{\text{ticker}} \mapsto \{(t, c)\}_{\text{ticker}}
//! $$
//!
//! Upstream seam of the price store and the collapse of raw responses to closes.

use std::collections::BTreeMap;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use anyhow::Result;
use chrono::NaiveDate;
use tracing::warn;

use super::series::PricePoint;
use super::series::PriceSeries;
use super::series::PriceTable;
use crate::error::MarketError;

/// Inclusive calendar window requested from a source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchWindow {
  pub start: NaiveDate,
  pub end: NaiveDate,
}

impl FetchWindow {
  /// Window ending at `end` and reaching `lookback` back in time.
  pub fn trailing(end: NaiveDate, lookback: chrono::Duration) -> Self {
    Self {
      start: end - lookback,
      end,
    }
  }

  pub fn contains(&self, date: NaiveDate) -> bool {
    self.start <= date && date <= self.end
  }
}

/// One OHLCV row as returned by bar-oriented sources.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bar {
  pub date: NaiveDate,
  pub open: f64,
  pub high: f64,
  pub low: f64,
  pub close: f64,
  pub volume: Option<u64>,
}

/// Response shape for one ticker.
#[derive(Clone, Debug, PartialEq)]
pub enum RawColumn {
  Close(Vec<(NaiveDate, f64)>),
  Bars(Vec<Bar>),
}

/// Unprocessed upstream response for a set of tickers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawFrame {
  columns: BTreeMap<String, RawColumn>,
}

impl RawFrame {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn close(mut self, ticker: &str, rows: Vec<(NaiveDate, f64)>) -> Self {
    self.columns.insert(ticker.to_string(), RawColumn::Close(rows));
    self
  }

  pub fn bars(mut self, ticker: &str, rows: Vec<Bar>) -> Self {
    self.columns.insert(ticker.to_string(), RawColumn::Bars(rows));
    self
  }

  pub fn insert(&mut self, ticker: &str, column: RawColumn) {
    self.columns.insert(ticker.to_string(), column);
  }

  pub fn is_empty(&self) -> bool {
    self.columns.is_empty()
  }

  /// Keep one close per ticker and date, dropping rows that cannot be priced.
  ///
  /// Rows are sorted by date; for a repeated date the last row wins. Tickers left
  /// without rows are omitted from the table.
  pub fn collapse(self) -> Result<PriceTable, MarketError> {
    let mut series = Vec::with_capacity(self.columns.len());

    for (ticker, column) in self.columns {
      let rows: Vec<(NaiveDate, f64)> = match column {
        RawColumn::Close(rows) => rows,
        RawColumn::Bars(bars) => bars.into_iter().map(|b| (b.date, b.close)).collect(),
      };

      let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
      for (date, close) in rows {
        if !close.is_finite() || close <= 0.0 {
          warn!(%ticker, %date, close, "dropping unpriceable row");
          continue;
        }
        if by_date.insert(date, close).is_some() {
          warn!(%ticker, %date, "duplicate date, keeping last row");
        }
      }

      if by_date.is_empty() {
        warn!(%ticker, "no usable rows");
        continue;
      }

      let points = by_date
        .into_iter()
        .map(|(date, close)| PricePoint { date, close })
        .collect();
      series.push(PriceSeries::new(&ticker, points)?);
    }

    Ok(PriceTable::new(series))
  }
}

/// Upstream provider of daily prices.
///
/// One call covers every requested ticker; implementations may issue several
/// requests internally but must return a single frame.
pub trait PriceSource {
  fn fetch(&self, tickers: &[String], window: &FetchWindow) -> Result<RawFrame>;
}

impl<S: PriceSource + ?Sized> PriceSource for &S {
  fn fetch(&self, tickers: &[String], window: &FetchWindow) -> Result<RawFrame> {
    (**self).fetch(tickers, window)
  }
}

/// In-memory source serving a fixed frame, clipped to the requested window.
#[derive(Debug, Default)]
pub struct StaticSource {
  frame: RawFrame,
  fetches: AtomicUsize,
}

impl StaticSource {
  pub fn new(frame: RawFrame) -> Self {
    Self {
      frame,
      fetches: AtomicUsize::new(0),
    }
  }

  /// Number of `fetch` calls served so far.
  pub fn fetch_count(&self) -> usize {
    self.fetches.load(Ordering::SeqCst)
  }
}

impl PriceSource for StaticSource {
  fn fetch(&self, tickers: &[String], window: &FetchWindow) -> Result<RawFrame> {
    self.fetches.fetch_add(1, Ordering::SeqCst);

    let mut out = RawFrame::new();
    for ticker in tickers {
      let Some(column) = self.frame.columns.get(ticker) else {
        continue;
      };
      let clipped = match column {
        RawColumn::Close(rows) => RawColumn::Close(
          rows
            .iter()
            .copied()
            .filter(|(d, _)| window.contains(*d))
            .collect(),
        ),
        RawColumn::Bars(bars) => RawColumn::Bars(
          bars
            .iter()
            .copied()
            .filter(|b| window.contains(b.date))
            .collect(),
        ),
      };
      out.insert(ticker, clipped);
    }

    Ok(out)
  }
}
