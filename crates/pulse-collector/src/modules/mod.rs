//! 수집/분석 모듈.

pub mod analyze;
pub mod fetch;
pub mod select;

pub use analyze::{build_notifications, run_analysis_tick, run_batch, JobContext};
pub use fetch::{dedupe_by_external_id, fetch_news};
pub use select::{classify_items, select_candidates, Candidate, CandidateState};
