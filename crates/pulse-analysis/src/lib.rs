//! 뉴스 분석 단계 및 오케스트레이션.
//!
//! 이 crate는 다음을 제공합니다:
//! - 구조화 출력용 chat completions 클라이언트
//! - Stage A: 분류 (분석 계획 생성)
//! - Stage B: 시장 데이터 보강 (캐시 폴백)
//! - Stage C: 결정 (감성/중요도/포지션 제안)
//! - 포지션 메모리 집계기 (읽기 쪽 프로젝션)
//! - 3단계를 합치는 오케스트레이터

pub mod classifier;
pub mod client;
pub mod decision;
pub mod enrichment;
pub mod error;
pub mod orchestrator;
pub mod position_memory;

pub use classifier::{AnalysisPlan, Classifier};
pub use client::{ChatClient, ChatConfig};
pub use decision::{Decision, DecisionEngine};
pub use enrichment::{enrich, EnrichedData};
pub use error::{AnalysisError, Result};
pub use orchestrator::{AnalysisOrchestrator, ItemAnalysis};
pub use position_memory::{memory_from_history, PositionMemoryAggregator, DEFAULT_LOOKBACK_DAYS};
