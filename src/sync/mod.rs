//! 체결 동기화 모듈
//!
//! 정책, 체결 → 원장 행 변환, 실행 결과 요약, 오케스트레이터를 제공합니다.

pub mod orchestrator;
pub mod policy;
pub mod report;
pub mod transform;

pub use orchestrator::SyncOrchestrator;
pub use policy::{ExcludeSet, SyncMode, SyncPolicy};
pub use report::{FetchFailure, SymbolReport, SyncReport};
