//! 데이터 관리 및 저장.
//!
//! 이 crate는 다음을 제공합니다:
//! - 분석 레코드/잠금/시장 데이터 캐시를 위한 PostgreSQL 저장소
//! - 뉴스 피드 클라이언트
//! - 자산군별 시장 데이터 제공자 (Binance, Yahoo, CFTC)
//! - 레이트 리밋 폴백이 내장된 캐시 서비스

pub mod cache;
pub mod error;
pub mod provider;
pub mod storage;

pub use error::{DataError, Result};

// 저장소 타입 재내보내기
pub use storage::{
    AcquireOutcome, AnalysisRepository, AnalysisRow, CacheRow, Database, DatabaseConfig,
    HistoryRow, LockRecord, LockRepository, MarketCacheRepository, RecordState, UpsertOutcome,
};

// 제공자 재내보내기
pub use provider::{
    BinanceClient, BinanceConfig, CftcClient, CftcConfig, FeedClient, FeedConfig,
    FundamentalsClient, FundamentalsConfig, LiveMarketSource, MacroMarketProvider, ProviderRouter,
};

// 캐시 서비스 재내보내기
pub use cache::{CachedMarketDataService, DataOrigin, DataPointValue, SnapshotStore};
