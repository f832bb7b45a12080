//! Height-consensus check: fan-out over the height sources and the
//! resulting sync verdict.

pub mod aggregator;
pub mod checker;
pub mod verdict;

pub use aggregator::{FanOutAggregator, HeightReading, HeightSet};
pub use checker::{SyncChecker, SyncReport};
pub use verdict::Verdict;
