//! # Synthetic Prices
//!
//! $$
//! S_{t+\Delta t}=S_t\exp\left(\left(\mu-\tfrac{\sigma^2}{2}\right)\Delta t+\sigma\sqrt{\Delta t}\,Z\right)
//! $$
//!
//! Seeded geometric Brownian motion on a weekday calendar, emitted as OHLC bars.
//! Used to run the dashboard without network access.

use anyhow::Result;
use chrono::Datelike;
use chrono::Weekday;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use rand_distr::Distribution;
use rand_distr::Normal;

use super::source::Bar;
use super::source::FetchWindow;
use super::source::PriceSource;
use super::source::RawFrame;
use crate::config::TRADING_DAYS_PER_YEAR;

#[derive(Clone, Debug)]
pub struct SyntheticSource {
  /// Base seed; each ticker derives its own stream from it.
  pub seed: u64,
  /// Annualized drift.
  pub mu: f64,
  /// Annualized volatility.
  pub sigma: f64,
  /// Initial price.
  pub x0: f64,
}

impl Default for SyntheticSource {
  fn default() -> Self {
    Self {
      seed: 42,
      mu: 0.07,
      sigma: 0.2,
      x0: 100.0,
    }
  }
}

impl SyntheticSource {
  pub fn new(seed: u64) -> Self {
    Self {
      seed,
      ..Self::default()
    }
  }

  fn ticker_seed(&self, ticker: &str) -> u64 {
    // FNV-1a, stable across runs and platforms.
    ticker.bytes().fold(0xcbf2_9ce4_8422_2325_u64 ^ self.seed, |h, b| {
      (h ^ u64::from(b)).wrapping_mul(0x0000_0100_0000_01b3)
    })
  }

  /// Simulate one ticker over the weekdays of `window`.
  pub fn sample(&self, ticker: &str, window: &FetchWindow) -> Result<Vec<Bar>> {
    let mut rng = StdRng::seed_from_u64(self.ticker_seed(ticker));
    let normal = Normal::new(0.0, 1.0)?;

    // Per-ticker dispersion so the universe is not perfectly homogeneous.
    let sigma = self.sigma * rng.gen_range(0.5..1.5);
    let mu = self.mu + rng.gen_range(-0.1..0.1);

    let dt = 1.0 / TRADING_DAYS_PER_YEAR;
    let drift = (mu - 0.5 * sigma * sigma) * dt;
    let vol = sigma * dt.sqrt();

    let mut bars = Vec::new();
    let mut prev = self.x0;
    for date in window.start.iter_days().take_while(|d| *d <= window.end) {
      if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
        continue;
      }
      let close = prev * (drift + vol * normal.sample(&mut rng)).exp();
      let spread = (close - prev).abs() * 0.5;
      bars.push(Bar {
        date,
        open: prev,
        high: prev.max(close) + spread,
        low: (prev.min(close) - spread).max(f64::MIN_POSITIVE),
        close,
        volume: Some(rng.gen_range(100_000..10_000_000)),
      });
      prev = close;
    }

    Ok(bars)
  }
}

impl PriceSource for SyntheticSource {
  fn fetch(&self, tickers: &[String], window: &FetchWindow) -> Result<RawFrame> {
    let mut frame = RawFrame::new();
    for ticker in tickers {
      frame = frame.bars(ticker, self.sample(ticker, window)?);
    }
    Ok(frame)
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  fn window() -> FetchWindow {
    FetchWindow::trailing(
      NaiveDate::from_ymd_opt(2024, 6, 28).unwrap(),
      chrono::Duration::days(730),
    )
  }

  #[test]
  fn same_seed_same_path() {
    let a = SyntheticSource::new(7).sample("XLK", &window()).unwrap();
    let b = SyntheticSource::new(7).sample("XLK", &window()).unwrap();
    let c = SyntheticSource::new(8).sample("XLK", &window()).unwrap();

    assert_eq!(a, b);
    assert_ne!(a, c);
  }

  #[test]
  fn bars_skip_weekends_and_stay_positive() {
    let bars = SyntheticSource::default().sample("SPY", &window()).unwrap();

    assert!(bars.len() > 500);
    assert!(bars
      .iter()
      .all(|b| !matches!(b.date.weekday(), Weekday::Sat | Weekday::Sun)));
    assert!(bars.iter().all(|b| b.close > 0.0 && b.low <= b.close && b.close <= b.high));
  }

  #[test]
  fn fetch_collapses_to_close_table() {
    let tickers = vec!["SPY".to_string(), "GLD".to_string()];
    let table = SyntheticSource::default()
      .fetch(&tickers, &window())
      .unwrap()
      .collapse()
      .unwrap();

    assert_eq!(table.tickers().count(), 2);
    assert_ne!(
      table.get("SPY").unwrap().closes(),
      table.get("GLD").unwrap().closes()
    );
  }
}
