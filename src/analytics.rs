//! # Analytics
//!
//! $$
//! \{P_i\} \mapsto \left(\rho,\ \{\Delta_i^h\},\ \{\sigma_i\},\ \mathbf w\right)
//! $$
//!
//! Pure derivations over a [`crate::market::PriceTable`].

pub mod allocation;
pub mod correlation;
pub mod performance;
pub mod returns;

pub use allocation::compute_weights;
pub use allocation::inverse_volatility;
pub use allocation::Allocation;
pub use allocation::DegeneratePolicy;
pub use allocation::Eligibility;
pub use allocation::WeightRecord;
pub use correlation::correlation_matrix;
pub use correlation::pearson;
pub use correlation::weekly_closes;
pub use correlation::weekly_returns;
pub use correlation::CorrelationMatrix;
pub use performance::compute_performance;
pub use performance::latest_performance;
pub use performance::pct_change_over;
pub use performance::year_to_date;
pub use performance::Lookbacks;
pub use performance::PerformanceRecord;
pub use performance::HORIZONS;
pub use returns::annualized_volatility;
pub use returns::compute_volatility;
pub use returns::sample_std;
pub use returns::simple_returns;
