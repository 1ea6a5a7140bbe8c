//! # Risk-Parity Momentum Allocation
//!
//! $$
//! w_i = 100\,\frac{\mathbb 1\{r_i^{\text{YTD}}>0\}/\sigma_i}{\sum_j \mathbb 1\{r_j^{\text{YTD}}>0\}/\sigma_j}
//! $$
//!
//! Inverse-volatility weights gated by positive year-to-date momentum and
//! renormalized to 100. Only sector instruments are ever allocated.

use std::collections::BTreeMap;
use std::fmt::Display;

use tracing::info;
use tracing::warn;

use crate::market::Universe;

/// Treatment of instruments whose volatility is zero or not finite.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum DegeneratePolicy {
  /// Keep the instrument out of the allocation.
  #[default]
  Exclude,
  /// Substitute this volatility for degenerate ones and allocate normally.
  /// Usable volatilities are never changed.
  Floor(f64),
}

/// Why an instrument holds the weight it does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Eligibility {
  Qualified,
  NonPositiveMomentum,
  DegenerateVolatility,
  MissingVolatility,
  MissingMomentum,
}

impl Display for Eligibility {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Eligibility::Qualified => write!(f, "qualified"),
      Eligibility::NonPositiveMomentum => write!(f, "YTD <= 0"),
      Eligibility::DegenerateVolatility => write!(f, "zero volatility"),
      Eligibility::MissingVolatility => write!(f, "volatility unavailable"),
      Eligibility::MissingMomentum => write!(f, "YTD unavailable"),
    }
  }
}

#[derive(Clone, Debug, PartialEq)]
pub struct WeightRecord {
  /// Final weight in percent.
  pub weight: f64,
  pub eligibility: Eligibility,
}

/// Outcome of the allocator.
#[derive(Clone, Debug, PartialEq)]
pub enum Allocation {
  /// At least one instrument qualified; qualified weights sum to 100.
  Allocated(BTreeMap<String, WeightRecord>),
  /// No instrument passed the gate; every record holds weight 0.
  NoAllocation(BTreeMap<String, WeightRecord>),
}

impl Allocation {
  pub fn records(&self) -> &BTreeMap<String, WeightRecord> {
    match self {
      Allocation::Allocated(r) | Allocation::NoAllocation(r) => r,
    }
  }

  pub fn is_allocated(&self) -> bool {
    matches!(self, Allocation::Allocated(_))
  }

  /// Weight of `ticker` in percent, `None` for instruments outside the universe.
  pub fn weight(&self, ticker: &str) -> Option<f64> {
    self.records().get(ticker).map(|r| r.weight)
  }

  pub fn total(&self) -> f64 {
    self.records().values().map(|r| r.weight).sum()
  }

  /// Why nothing was allocated, `None` for an allocation.
  pub fn shortfall(&self) -> Option<&'static str> {
    let Allocation::NoAllocation(records) = self else {
      return None;
    };
    let any = |e: Eligibility| records.values().any(|r| r.eligibility == e);

    Some(if records.is_empty() {
      "the sector universe is empty"
    } else if any(Eligibility::NonPositiveMomentum) {
      "no sector has positive year-to-date performance"
    } else if any(Eligibility::DegenerateVolatility) {
      "no sector has both usable volatility and year-to-date performance"
    } else {
      "volatility or year-to-date performance is unavailable for every sector"
    })
  }

  /// Strictly positive weights, largest first.
  pub fn positions(&self) -> Vec<(&str, f64)> {
    let mut out: Vec<(&str, f64)> = self
      .records()
      .iter()
      .filter(|(_, r)| r.weight > 0.0)
      .map(|(t, r)| (t.as_str(), r.weight))
      .collect();
    out.sort_by(|a, b| b.1.total_cmp(&a.1));
    out
  }
}

/// Raw inverse-volatility weight, `None` when neither the volatility nor the policy
/// yields a finite positive reciprocal.
pub fn inverse_volatility(vol: f64, policy: DegeneratePolicy) -> Option<f64> {
  let vol = match policy {
    _ if vol.is_finite() && vol > 0.0 => vol,
    DegeneratePolicy::Exclude => return None,
    DegeneratePolicy::Floor(floor) => floor,
  };
  let inv = 1.0 / vol;
  (inv.is_finite() && inv > 0.0).then_some(inv)
}

/// Allocate the sector universe.
///
/// `volatilities` holds annualized volatility per ticker, with zero or non-finite
/// entries for degenerate series. `ytd` holds year-to-date change in percent.
/// Tickers outside `sectors` are ignored, missing keys leave the instrument at 0.
pub fn compute_weights(
  sectors: &Universe,
  volatilities: &BTreeMap<String, f64>,
  ytd: &BTreeMap<String, f64>,
  policy: DegeneratePolicy,
) -> Allocation {
  let mut raw: BTreeMap<String, (f64, Eligibility)> = BTreeMap::new();

  for ticker in sectors.tickers() {
    let entry = match (volatilities.get(ticker), ytd.get(ticker)) {
      (None, _) => (0.0, Eligibility::MissingVolatility),
      (Some(&vol), ytd) => match inverse_volatility(vol, policy) {
        None => {
          warn!(%ticker, vol, "excluding degenerate volatility from allocation");
          (0.0, Eligibility::DegenerateVolatility)
        }
        Some(inv) => match ytd.copied() {
          Some(m) if m.is_finite() && m > 0.0 => (inv, Eligibility::Qualified),
          Some(m) if m.is_finite() => (0.0, Eligibility::NonPositiveMomentum),
          _ => (0.0, Eligibility::MissingMomentum),
        },
      },
    };
    raw.insert(ticker.to_string(), entry);
  }

  let qualified = raw
    .values()
    .filter(|(_, e)| *e == Eligibility::Qualified)
    .count();

  if qualified == 0 {
    let allocation = Allocation::NoAllocation(
      raw
        .into_iter()
        .map(|(t, (_, eligibility))| {
          (
            t,
            WeightRecord {
              weight: 0.0,
              eligibility,
            },
          )
        })
        .collect(),
    );
    info!(
      reason = allocation.shortfall().unwrap_or_default(),
      "no sector allocation"
    );
    return allocation;
  }

  // Scale by the largest raw weight so the sum stays finite.
  let largest = raw.values().map(|(w, _)| *w).fold(0.0, f64::max);
  let total: f64 = raw.values().map(|(w, _)| w / largest).sum();

  info!(qualified, instruments = raw.len(), "sector allocation computed");
  let records = raw
    .into_iter()
    .map(|(t, (w, eligibility))| {
      (
        t,
        WeightRecord {
          weight: 100.0 * (w / largest) / total,
          eligibility,
        },
      )
    })
    .collect();

  Allocation::Allocated(records)
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use approx::assert_relative_eq;

  use super::*;
  use crate::market::UniverseKind;

  fn universe(tickers: &[&str]) -> Universe {
    let members: Vec<(&str, &str)> = tickers.iter().map(|t| (*t, *t)).collect();
    Universe::new(UniverseKind::Sector, &members)
  }

  fn map(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
    entries.iter().map(|(t, v)| (t.to_string(), *v)).collect()
  }

  #[test]
  fn both_qualify_split_by_inverse_volatility() {
    let alloc = compute_weights(
      &universe(&["A", "B"]),
      &map(&[("A", 0.10), ("B", 0.20)]),
      &map(&[("A", 5.0), ("B", 5.0)]),
      DegeneratePolicy::Exclude,
    );

    assert!(alloc.is_allocated());
    assert_abs_diff_eq!(alloc.weight("A").unwrap(), 200.0 / 3.0, epsilon = 1e-9);
    assert_abs_diff_eq!(alloc.weight("B").unwrap(), 100.0 / 3.0, epsilon = 1e-9);
    assert_eq!(alloc.positions()[0].0, "A");
  }

  #[test]
  fn negative_momentum_is_gated_out() {
    let alloc = compute_weights(
      &universe(&["A", "B"]),
      &map(&[("A", 0.10), ("B", 0.20)]),
      &map(&[("A", 5.0), ("B", -1.0)]),
      DegeneratePolicy::Exclude,
    );

    assert_abs_diff_eq!(alloc.weight("A").unwrap(), 100.0, epsilon = 1e-9);
    assert_eq!(alloc.weight("B"), Some(0.0));
    assert_eq!(
      alloc.records()["B"].eligibility,
      Eligibility::NonPositiveMomentum
    );
  }

  #[test]
  fn nobody_qualifies_yields_no_allocation() {
    let alloc = compute_weights(
      &universe(&["A", "B"]),
      &map(&[("A", 0.10), ("B", 0.20)]),
      &map(&[("A", -1.0), ("B", -1.0)]),
      DegeneratePolicy::Exclude,
    );

    assert!(!alloc.is_allocated());
    assert!(alloc.records().values().all(|r| r.weight == 0.0));
    assert!(!alloc.total().is_nan());
  }

  #[test]
  fn zero_ytd_is_not_positive() {
    let alloc = compute_weights(
      &universe(&["A"]),
      &map(&[("A", 0.10)]),
      &map(&[("A", 0.0)]),
      DegeneratePolicy::Exclude,
    );
    assert!(matches!(alloc, Allocation::NoAllocation(_)));
  }

  #[test]
  fn inverse_volatility_decreases_with_volatility() {
    let vols = [0.01, 0.05, 0.1, 0.2, 0.5, 1.0, 3.0];
    for pair in vols.windows(2) {
      let lo = inverse_volatility(pair[0], DegeneratePolicy::Exclude).unwrap();
      let hi = inverse_volatility(pair[1], DegeneratePolicy::Exclude).unwrap();
      assert!(lo > hi);
    }

    // Holding B fixed, raising A's volatility lowers A's final weight.
    let mut prev = f64::INFINITY;
    for vol_a in vols {
      let alloc = compute_weights(
        &universe(&["A", "B"]),
        &map(&[("A", vol_a), ("B", 0.2)]),
        &map(&[("A", 1.0), ("B", 1.0)]),
        DegeneratePolicy::Exclude,
      );
      let w = alloc.weight("A").unwrap();
      assert!(w < prev);
      prev = w;
    }
  }

  #[test]
  fn qualified_weights_sum_to_hundred() {
    let tickers = ["A", "B", "C", "D", "E", "F"];
    let vols = [0.12, 0.33, 0.07, 0.25, 0.18, 0.41];
    let ytds = [3.0, -2.0, 0.5, 12.0, -0.1, 7.5];

    let alloc = compute_weights(
      &universe(&tickers),
      &tickers.iter().copied().zip(vols).map(|(t, v)| (t.to_string(), v)).collect(),
      &tickers.iter().copied().zip(ytds).map(|(t, v)| (t.to_string(), v)).collect(),
      DegeneratePolicy::Exclude,
    );

    assert_relative_eq!(alloc.total(), 100.0, max_relative = 1e-6);
    for (t, ytd) in tickers.iter().zip(ytds) {
      let w = alloc.weight(t).unwrap();
      if ytd <= 0.0 {
        assert_eq!(w, 0.0);
      } else {
        assert!(w > 0.0);
      }
    }
  }

  #[test]
  fn degenerate_volatility_is_excluded_by_default() {
    let alloc = compute_weights(
      &universe(&["A", "B"]),
      &map(&[("A", 0.0), ("B", 0.2)]),
      &map(&[("A", 5.0), ("B", 5.0)]),
      DegeneratePolicy::Exclude,
    );

    assert_eq!(alloc.weight("A"), Some(0.0));
    assert_eq!(
      alloc.records()["A"].eligibility,
      Eligibility::DegenerateVolatility
    );
    assert_abs_diff_eq!(alloc.weight("B").unwrap(), 100.0, epsilon = 1e-9);
    assert!(alloc.records().values().all(|r| r.weight.is_finite()));
  }

  #[test]
  fn degenerate_volatility_floor_keeps_weights_finite() {
    let alloc = compute_weights(
      &universe(&["A", "B"]),
      &map(&[("A", 0.0), ("B", 0.2)]),
      &map(&[("A", 5.0), ("B", 5.0)]),
      DegeneratePolicy::Floor(0.05),
    );

    assert_abs_diff_eq!(alloc.weight("A").unwrap(), 80.0, epsilon = 1e-9);
    assert_abs_diff_eq!(alloc.weight("B").unwrap(), 20.0, epsilon = 1e-9);
  }

  #[test]
  fn floor_leaves_usable_volatility_untouched() {
    assert_eq!(inverse_volatility(0.10, DegeneratePolicy::Floor(0.25)), Some(10.0));
    assert_eq!(inverse_volatility(0.0, DegeneratePolicy::Floor(0.25)), Some(4.0));

    let alloc = compute_weights(
      &universe(&["A", "B"]),
      &map(&[("A", 0.10), ("B", 0.20)]),
      &map(&[("A", 5.0), ("B", 5.0)]),
      DegeneratePolicy::Floor(0.25),
    );

    assert_abs_diff_eq!(alloc.weight("A").unwrap(), 200.0 / 3.0, epsilon = 1e-9);
    assert_abs_diff_eq!(alloc.weight("B").unwrap(), 100.0 / 3.0, epsilon = 1e-9);
  }

  #[test]
  fn subnormal_floor_cannot_qualify_with_zero_weight() {
    assert_eq!(inverse_volatility(0.0, DegeneratePolicy::Floor(1e-310)), None);
    assert_eq!(inverse_volatility(1e-310, DegeneratePolicy::Exclude), None);

    let alloc = compute_weights(
      &universe(&["A", "B"]),
      &map(&[("A", 0.0), ("B", 0.20)]),
      &map(&[("A", 5.0), ("B", 5.0)]),
      DegeneratePolicy::Floor(1e-310),
    );

    assert!(alloc.is_allocated());
    assert_eq!(
      alloc.records()["A"].eligibility,
      Eligibility::DegenerateVolatility
    );
    assert_abs_diff_eq!(alloc.weight("B").unwrap(), 100.0, epsilon = 1e-9);
    for record in alloc.records().values() {
      if record.eligibility == Eligibility::Qualified {
        assert!(record.weight > 0.0);
      }
    }
  }

  #[test]
  fn tiny_volatilities_still_sum_to_hundred() {
    let alloc = compute_weights(
      &universe(&["A", "B"]),
      &map(&[("A", 1e-308), ("B", 1e-308)]),
      &map(&[("A", 1.0), ("B", 1.0)]),
      DegeneratePolicy::Exclude,
    );

    assert!(alloc.is_allocated());
    assert_abs_diff_eq!(alloc.weight("A").unwrap(), 50.0, epsilon = 1e-9);
    assert_relative_eq!(alloc.total(), 100.0, max_relative = 1e-12);
  }

  #[test]
  fn shortfall_names_the_actual_cause() {
    let gated = compute_weights(
      &universe(&["A"]),
      &map(&[("A", 0.1)]),
      &map(&[("A", -1.0)]),
      DegeneratePolicy::Exclude,
    );
    assert!(gated.shortfall().unwrap().contains("positive year-to-date"));

    let missing = compute_weights(
      &universe(&["A", "B"]),
      &map(&[("A", 0.1)]),
      &map(&[("B", 3.0)]),
      DegeneratePolicy::Exclude,
    );
    let reason = missing.shortfall().unwrap();
    assert!(reason.contains("unavailable"));
    assert!(!reason.contains("positive"));

    let flat = compute_weights(
      &universe(&["A"]),
      &map(&[("A", 0.0)]),
      &map(&[("A", 2.0)]),
      DegeneratePolicy::Exclude,
    );
    assert!(flat.shortfall().unwrap().contains("usable volatility"));

    let allocated = compute_weights(
      &universe(&["A"]),
      &map(&[("A", 0.1)]),
      &map(&[("A", 2.0)]),
      DegeneratePolicy::Exclude,
    );
    assert_eq!(allocated.shortfall(), None);
  }

  #[test]
  fn only_sector_universe_is_allocated() {
    let alloc = compute_weights(
      &universe(&["A"]),
      &map(&[("A", 0.1), ("SPY", 0.05)]),
      &map(&[("A", 1.0), ("SPY", 9.0)]),
      DegeneratePolicy::Exclude,
    );

    assert_eq!(alloc.weight("SPY"), None);
    assert_abs_diff_eq!(alloc.weight("A").unwrap(), 100.0, epsilon = 1e-9);
  }

  #[test]
  fn missing_inputs_leave_instrument_at_zero() {
    let alloc = compute_weights(
      &universe(&["A", "B", "C"]),
      &map(&[("A", 0.1), ("B", 0.1)]),
      &map(&[("A", 1.0), ("C", 1.0)]),
      DegeneratePolicy::Exclude,
    );

    assert_eq!(alloc.records()["B"].eligibility, Eligibility::MissingMomentum);
    assert_eq!(alloc.records()["C"].eligibility, Eligibility::MissingVolatility);
    assert_abs_diff_eq!(alloc.weight("A").unwrap(), 100.0, epsilon = 1e-9);
  }
}
