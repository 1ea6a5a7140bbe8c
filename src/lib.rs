//! # intermarket-rs
//!
//! $$
//! w_i \propto \frac{\mathbb 1\{r_i^{\text{YTD}}>0\}}{\sigma_i}
//! $$
//!
//! Intermarket correlations, multi-horizon sector performance and a risk-parity
//! allocation gated by year-to-date momentum, computed from one cached price fetch.

pub mod analytics;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod market;
pub mod tables;
pub mod visualization;

pub use config::DashboardConfig;
pub use dashboard::build_report;
pub use dashboard::Dashboard;
pub use dashboard::DashboardReport;
pub use error::MarketError;
pub use error::Metric;
pub use error::MetricResult;
