//! # Instruments
//!
//! $$
//! \mathcal U_{\text{inter}} \cap \mathcal U_{\text{sector}} = \varnothing
//! $$
//!
//! Ticker universes and their display labels.

use std::fmt::Display;

/// Universe an instrument belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UniverseKind {
  /// Broad asset-class proxies used for the correlation matrix.
  Intermarket,
  /// Equity sector proxies; the only instruments that receive weights.
  Sector,
}

impl Display for UniverseKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      UniverseKind::Intermarket => write!(f, "intermarket"),
      UniverseKind::Sector => write!(f, "sector"),
    }
  }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Instrument {
  /// Upstream ticker symbol, the key of every derived mapping.
  pub ticker: String,
  /// Human-readable label, only used when rendering.
  pub label: String,
  pub kind: UniverseKind,
}

impl Instrument {
  pub fn new(ticker: &str, label: &str, kind: UniverseKind) -> Self {
    Self {
      ticker: ticker.to_string(),
      label: label.to_string(),
      kind,
    }
  }
}

/// Fixed, ordered set of instruments of one kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Universe {
  kind: UniverseKind,
  instruments: Vec<Instrument>,
}

impl Universe {
  /// Build a universe from `(ticker, label)` pairs.
  pub fn new(kind: UniverseKind, members: &[(&str, &str)]) -> Self {
    Self {
      kind,
      instruments: members
        .iter()
        .map(|(ticker, label)| Instrument::new(ticker, label, kind))
        .collect(),
    }
  }

  pub fn kind(&self) -> UniverseKind {
    self.kind
  }

  pub fn instruments(&self) -> &[Instrument] {
    &self.instruments
  }

  pub fn tickers(&self) -> impl Iterator<Item = &str> {
    self.instruments.iter().map(|i| i.ticker.as_str())
  }

  pub fn get(&self, ticker: &str) -> Option<&Instrument> {
    self.instruments.iter().find(|i| i.ticker == ticker)
  }

  /// Display label for `ticker`, falling back to the ticker itself.
  pub fn label<'a>(&'a self, ticker: &'a str) -> &'a str {
    self.get(ticker).map_or(ticker, |i| i.label.as_str())
  }

  pub fn len(&self) -> usize {
    self.instruments.len()
  }

  pub fn is_empty(&self) -> bool {
    self.instruments.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn label_falls_back_to_ticker() {
    let universe = Universe::new(UniverseKind::Sector, &[("XLK", "Technology")]);
    assert_eq!(universe.label("XLK"), "Technology");
    assert_eq!(universe.label("XLZ"), "XLZ");
    assert_eq!(universe.get("XLK").map(|i| i.kind), Some(UniverseKind::Sector));
  }
}
