//! # Visualization
//!
//! $$
//! (\rho,\ \Delta,\ \mathbf w) \mapsto \text{heatmap},\ \text{grouped bars},\ \text{bars}
//! $$
//!
//! Plotly charts for the dashboard. Unavailable values are omitted from bar
//! charts and serialized as gaps in the heatmap.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use plotly::layout::BarMode;
use plotly::Bar;
use plotly::HeatMap;
use plotly::Layout;
use plotly::Plot;
use tracing::info;

use crate::analytics::performance::HORIZONS;
use crate::config::DashboardConfig;
use crate::dashboard::DashboardReport;

pub fn correlation_heatmap(report: &DashboardReport, config: &DashboardConfig) -> Plot {
  let labels: Vec<String> = report
    .correlation
    .tickers()
    .iter()
    .map(|t| config.intermarket.label(t).to_string())
    .collect();

  let mut plot = Plot::new();
  plot.add_trace(HeatMap::new(
    labels.clone(),
    labels,
    report.correlation.to_rows(),
  ));
  plot.set_layout(
    Layout::new()
      .title(format!("Intermarket weekly correlation ({})", report.as_of).as_str())
      .height(600),
  );
  plot
}

/// Grouped bars of sector changes, one group per horizon.
pub fn performance_chart(report: &DashboardReport, config: &DashboardConfig) -> Plot {
  let mut plot = Plot::new();

  for metric in HORIZONS {
    let (x, y): (Vec<String>, Vec<f64>) = report
      .performance
      .iter()
      .filter_map(|(ticker, record)| {
        let value = record.get(metric)?.as_ref().ok()?;
        Some((config.sectors.label(ticker).to_string(), *value))
      })
      .unzip();
    let name = metric.to_string();
    plot.add_trace(Bar::new(x, y).name(name.as_str()));
  }

  plot.set_layout(
    Layout::new()
      .title("Sector performance (%)")
      .bar_mode(BarMode::Group),
  );
  plot
}

/// Final weights of the allocated sectors, largest first.
pub fn weights_chart(report: &DashboardReport, config: &DashboardConfig) -> Plot {
  let (x, y): (Vec<String>, Vec<f64>) = report
    .allocation
    .positions()
    .into_iter()
    .map(|(ticker, w)| (config.sectors.label(ticker).to_string(), w))
    .unzip();

  let title = match report.allocation.shortfall() {
    Some(reason) => format!("No allocation: {reason}"),
    None => "Risk-parity weights, positive YTD only (%)".to_string(),
  };

  let mut plot = Plot::new();
  plot.add_trace(Bar::new(x, y).name("weight"));
  plot.set_layout(Layout::new().title(title.as_str()));
  plot
}

/// Write all charts as standalone HTML files into `dir`.
pub fn write_dashboard(
  report: &DashboardReport,
  config: &DashboardConfig,
  dir: &Path,
) -> Result<Vec<PathBuf>> {
  fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;

  let charts = [
    ("correlation.html", correlation_heatmap(report, config)),
    ("performance.html", performance_chart(report, config)),
    ("weights.html", weights_chart(report, config)),
  ];

  let mut written = Vec::with_capacity(charts.len());
  for (name, plot) in charts {
    let path = dir.join(name);
    fs::write(&path, plot.to_html()).with_context(|| format!("cannot write {}", path.display()))?;
    info!(path = %path.display(), "chart written");
    written.push(path);
  }

  Ok(written)
}
