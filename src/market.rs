//! # Market Data
//!
//! $$
//! \{\text{ticker}\} \times [t_0, t_1] \mapsto \{(t_k, p_k)\}_{\text{ticker}}
//! $$
//!
//! Instruments, price tables, upstream sources and the time-to-live price store.

pub mod instrument;
pub mod series;
pub mod source;
pub mod store;
pub mod synthetic;
#[cfg(feature = "yahoo")]
pub mod yahoo;

pub use instrument::Instrument;
pub use instrument::Universe;
pub use instrument::UniverseKind;
pub use series::AlignedCloses;
pub use series::PricePoint;
pub use series::PriceSeries;
pub use series::PriceTable;
pub use source::Bar;
pub use source::FetchWindow;
pub use source::PriceSource;
pub use source::RawColumn;
pub use source::RawFrame;
pub use source::StaticSource;
pub use store::PriceStore;
pub use synthetic::SyntheticSource;
#[cfg(feature = "yahoo")]
pub use yahoo::YahooSource;
