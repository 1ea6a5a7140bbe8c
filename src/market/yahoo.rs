//! # Yahoo Finance Source
//!
//! $$
//! \text{GET } /v8/\text{chart}/\{\text{ticker}\}?\text{period1}=t_0\&\text{period2}=t_1
//! $$
//!
//! Daily quote history for every requested ticker, gathered inside one blocking call.

use anyhow::anyhow;
use anyhow::Context;
use anyhow::Result;
use chrono::DateTime;
use chrono::NaiveDate;
use time::OffsetDateTime;
use tracing::debug;
use tracing::warn;
use yahoo_finance_api::YahooConnector;

use super::source::Bar;
use super::source::FetchWindow;
use super::source::PriceSource;
use super::source::RawFrame;

#[derive(Debug, Default, Clone, Copy)]
pub struct YahooSource;

impl YahooSource {
  pub fn new() -> Self {
    Self
  }
}

fn to_offset(date: NaiveDate) -> Result<OffsetDateTime> {
  let ts = date
    .and_hms_opt(0, 0, 0)
    .ok_or_else(|| anyhow!("invalid midnight for {date}"))?
    .and_utc()
    .timestamp();
  OffsetDateTime::from_unix_timestamp(ts)
    .with_context(|| format!("timestamp out of range for {date}"))
}

impl PriceSource for YahooSource {
  fn fetch(&self, tickers: &[String], window: &FetchWindow) -> Result<RawFrame> {
    let start = to_offset(window.start)?;
    // Yahoo treats the end bound as exclusive.
    let end = to_offset(window.end + chrono::Duration::days(1))?;
    let provider = YahooConnector::new().context("failed to build Yahoo connector")?;

    tokio_test::block_on(async {
      let mut frame = RawFrame::new();
      let mut failures = Vec::new();

      for ticker in tickers {
        let quotes = match provider.get_quote_history(ticker, start, end).await {
          Ok(response) => response.quotes(),
          Err(err) => Err(err),
        };

        match quotes {
          Ok(quotes) => {
            let bars: Vec<Bar> = quotes
              .iter()
              .filter_map(|q| {
                let date = DateTime::from_timestamp(q.timestamp as i64, 0)?.date_naive();
                Some(Bar {
                  date,
                  open: q.open,
                  high: q.high,
                  low: q.low,
                  close: q.close,
                  volume: Some(q.volume),
                })
              })
              .collect();
            debug!(%ticker, rows = bars.len(), "quote history received");
            frame = frame.bars(ticker, bars);
          }
          Err(err) => {
            warn!(%ticker, error = %err, "quote history unavailable");
            failures.push(format!("{ticker}: {err}"));
          }
        }
      }

      if frame.is_empty() {
        return Err(anyhow!(
          "no quote history for any ticker ({})",
          failures.join("; ")
        ));
      }

      Ok(frame)
    })
  }
}
