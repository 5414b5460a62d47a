//! 원장 (행 기반 저장소) 모듈
//!
//! 원장은 스프레드시트처럼 1부터 시작하는 행/열 좌표를 가진 격자입니다.
//! 표 범위는 A열(첫 번째 열) 기준으로 판단하므로, 표 바깥 열에 둔 커서 셀은
//! 행 추가 위치에 영향을 주지 않습니다.

pub mod adapter;
pub mod cursor;
pub mod memory;

use crate::error::Result;

pub use adapter::{LedgerAdapter, CURSOR_CELL, HEADER};
pub use cursor::CursorMap;
pub use memory::MemorySheet;

/// 원장 한 행 (셀 문자열 목록)
pub type Row = Vec<String>;

/// 행 기반 원장 저장소 트레이트
pub trait LedgerStore {
    /// 모든 행과 셀 삭제
    async fn clear(&self) -> Result<()>;

    /// A열에 값이 있는 마지막 행 번호 (비어 있으면 0)
    async fn row_count(&self) -> Result<usize>;

    /// 1행부터 `row_count` 행까지, 1열부터 `width` 열까지 읽기
    async fn read_rows(&self, width: usize) -> Result<Vec<Row>>;

    /// 표 끝에 행들을 추가. 배치 전체가 함께 기록되거나 전혀 기록되지 않아야 합니다.
    async fn append_rows(&self, rows: &[Row]) -> Result<()>;

    async fn read_cell(&self, row: usize, col: usize) -> Result<Option<String>>;

    async fn write_cell(&self, row: usize, col: usize, value: &str) -> Result<()>;
}
