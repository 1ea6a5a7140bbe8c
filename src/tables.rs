//! # Tables
//!
//! $$
//! \text{report} \mapsto \text{rows} \times \text{columns}
//! $$
//!
//! Text tables for the performance, risk and correlation views. Cells whose metric is
//! undefined for that instrument render as `n/a`; any other failure renders as `error`.

use prettytable::format;
use prettytable::Cell;
use prettytable::Row;
use prettytable::Table;

use crate::analytics::performance::HORIZONS;
use crate::config::DashboardConfig;
use crate::dashboard::DashboardReport;
use crate::error::MarketError;
use crate::error::MetricResult;

const UNAVAILABLE: &str = "n/a";
const FAILED: &str = "error";

fn error_cell(err: &MarketError) -> Cell {
  if err.is_per_instrument() {
    Cell::new(UNAVAILABLE)
  } else {
    Cell::new(FAILED)
  }
}

fn pct_cell(value: &MetricResult) -> Cell {
  match value {
    Ok(v) => Cell::new(&format!("{v:+.2}")),
    Err(err) => error_cell(err),
  }
}

fn value_cell(value: Option<&MetricResult>, scale: f64) -> Cell {
  match value {
    Some(Ok(v)) => Cell::new(&format!("{:.2}", v * scale)),
    Some(Err(err)) => error_cell(err),
    None => Cell::new(UNAVAILABLE),
  }
}

fn styled() -> Table {
  let mut table = Table::new();
  table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
  table
}

/// Sector percentage changes per horizon.
pub fn performance_table(report: &DashboardReport, config: &DashboardConfig) -> Table {
  let mut table = styled();

  let mut titles = vec![Cell::new("Sector")];
  titles.extend(HORIZONS.iter().map(|m| Cell::new(&format!("{m} %"))));
  table.set_titles(Row::new(titles));

  for (ticker, record) in &report.performance {
    let mut cells = vec![Cell::new(config.sectors.label(ticker))];
    for metric in HORIZONS {
      if let Some(value) = record.get(metric) {
        cells.push(pct_cell(value));
      }
    }
    table.add_row(Row::new(cells));
  }

  table
}

/// Volatility, YTD and final weight per sector, largest weight first.
pub fn risk_table(report: &DashboardReport, config: &DashboardConfig) -> Table {
  let mut table = styled();
  table.set_titles(Row::new(vec![
    Cell::new("Sector"),
    Cell::new("Volatility %"),
    Cell::new("YTD %"),
    Cell::new("Weight %"),
    Cell::new("Status"),
  ]));

  let mut rows: Vec<(&String, f64)> = report
    .allocation
    .records()
    .iter()
    .map(|(t, r)| (t, r.weight))
    .collect();
  rows.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));

  for (ticker, weight) in rows {
    let status = report.allocation.records()[ticker].eligibility;
    table.add_row(Row::new(vec![
      Cell::new(config.sectors.label(ticker)),
      value_cell(report.volatility.get(ticker), 100.0),
      value_cell(report.performance.get(ticker).map(|p| &p.ytd), 1.0),
      Cell::new(&format!("{weight:.2}")),
      Cell::new(&status.to_string()),
    ]));
  }

  table
}

/// Intermarket correlation matrix with display labels.
pub fn correlation_table(report: &DashboardReport, config: &DashboardConfig) -> Table {
  let mut table = styled();
  let tickers = report.correlation.tickers();

  let mut titles = vec![Cell::new("")];
  titles.extend(tickers.iter().map(|t| Cell::new(config.intermarket.label(t))));
  table.set_titles(Row::new(titles));

  for (i, row) in report.correlation.values().outer_iter().enumerate() {
    let mut cells = vec![Cell::new(config.intermarket.label(&tickers[i]))];
    cells.extend(row.iter().map(|v| {
      if v.is_nan() {
        Cell::new(UNAVAILABLE)
      } else {
        Cell::new(&format!("{v:.2}"))
      }
    }));
    table.add_row(Row::new(cells));
  }

  table
}
