//! 캐시 폴백 레이어.

pub mod market;

pub use market::{CachedMarketDataService, DataOrigin, DataPointValue, SnapshotStore};
