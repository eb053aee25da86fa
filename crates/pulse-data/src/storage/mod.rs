//! PostgreSQL 스토리지 구현.

pub mod analysis;
pub mod lock;
pub mod market_cache;
pub mod postgres;

pub use analysis::{AnalysisRepository, AnalysisRow, HistoryRow, RecordState, UpsertOutcome};
pub use lock::{AcquireOutcome, LockRecord, LockRepository};
pub use market_cache::{CacheRow, MarketCacheRepository};
pub use postgres::{Database, DatabaseConfig};
