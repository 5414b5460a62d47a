//! 메모리 원장
//!
//! 테스트용 격자 구현입니다. 행 추가 실패를 주입할 수 있습니다.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Mutex;

use crate::error::{Result, SyncError};
use crate::ledger::{LedgerStore, Row};

/// 메모리 원장
pub struct MemorySheet {
    cells: Mutex<BTreeMap<(usize, usize), String>>,
    /// 성공한 추가 호출 수가 이 값에 도달하면 이후 추가는 실패
    fail_from: AtomicUsize,
    append_calls: AtomicUsize,
    cell_writes: AtomicUsize,
}

impl Default for MemorySheet {
    fn default() -> Self {
        Self {
            cells: Mutex::new(BTreeMap::new()),
            fail_from: AtomicUsize::new(usize::MAX),
            append_calls: AtomicUsize::new(0),
            cell_writes: AtomicUsize::new(0),
        }
    }
}

impl MemorySheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 이후 모든 행 추가를 실패시키거나 다시 허용
    pub fn fail_appends(&self, fail: bool) {
        let fail_from = if fail { 0 } else { usize::MAX };
        self.fail_from.store(fail_from, Ordering::SeqCst);
    }

    /// 앞으로 `successes` 번의 추가만 성공시킴
    pub fn fail_appends_after(&self, successes: usize) {
        let fail_from = self.append_calls().saturating_add(successes);
        self.fail_from.store(fail_from, Ordering::SeqCst);
    }

    /// 성공한 행 추가 호출 수
    pub fn append_calls(&self) -> usize {
        self.append_calls.load(Ordering::SeqCst)
    }

    /// 셀 쓰기 호출 수
    pub fn cell_writes(&self) -> usize {
        self.cell_writes.load(Ordering::SeqCst)
    }

    fn last_row(cells: &BTreeMap<(usize, usize), String>) -> usize {
        cells
            .iter()
            .filter(|((_, col), value)| *col == 1 && !value.is_empty())
            .map(|((row, _), _)| *row)
            .max()
            .unwrap_or(0)
    }
}

impl LedgerStore for MemorySheet {
    async fn clear(&self) -> Result<()> {
        self.cells.lock().await.clear();
        Ok(())
    }

    async fn row_count(&self) -> Result<usize> {
        Ok(Self::last_row(&*self.cells.lock().await))
    }

    async fn read_rows(&self, width: usize) -> Result<Vec<Row>> {
        let cells = self.cells.lock().await;
        let rows = (1..=Self::last_row(&cells))
            .map(|row| {
                (1..=width)
                    .map(|col| cells.get(&(row, col)).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();
        Ok(rows)
    }

    async fn append_rows(&self, rows: &[Row]) -> Result<()> {
        if self.append_calls() >= self.fail_from.load(Ordering::SeqCst) {
            return Err(SyncError::Ledger("주입된 행 추가 실패".to_string()));
        }
        let mut cells = self.cells.lock().await;
        let start = Self::last_row(&cells);
        for (offset, row) in rows.iter().enumerate() {
            for (col, value) in row.iter().enumerate() {
                cells.insert((start + offset + 1, col + 1), value.clone());
            }
        }
        self.append_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn read_cell(&self, row: usize, col: usize) -> Result<Option<String>> {
        Ok(self.cells.lock().await.get(&(row, col)).cloned())
    }

    async fn write_cell(&self, row: usize, col: usize, value: &str) -> Result<()> {
        self.cells.lock().await.insert((row, col), value.to_string());
        self.cell_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[&str]) -> Row {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_append_ignores_cells_outside_column_a() {
        let sheet = MemorySheet::new();
        sheet.write_cell(1, 10, "cursor").await.unwrap();
        assert_eq!(sheet.row_count().await.unwrap(), 0);

        sheet.append_rows(&[row(&["symbol", "id"])]).await.unwrap();
        sheet.append_rows(&[row(&["BTCUSDT", "1"]), row(&["BTCUSDT", "2"])]).await.unwrap();

        assert_eq!(sheet.row_count().await.unwrap(), 3);
        let rows = sheet.read_rows(2).await.unwrap();
        assert_eq!(rows[0], row(&["symbol", "id"]));
        assert_eq!(rows[2], row(&["BTCUSDT", "2"]));
        assert_eq!(sheet.read_cell(1, 10).await.unwrap().as_deref(), Some("cursor"));
    }

    #[tokio::test]
    async fn test_injected_failure_writes_nothing() {
        let sheet = MemorySheet::new();
        sheet.fail_appends(true);
        assert!(sheet.append_rows(&[row(&["BTCUSDT", "1"])]).await.is_err());
        assert_eq!(sheet.row_count().await.unwrap(), 0);
        assert_eq!(sheet.append_calls(), 0);

        sheet.fail_appends(false);
        sheet.fail_appends_after(1);
        assert!(sheet.append_rows(&[row(&["BTCUSDT", "1"])]).await.is_ok());
        assert!(sheet.append_rows(&[row(&["BTCUSDT", "2"])]).await.is_err());
        assert_eq!(sheet.row_count().await.unwrap(), 1);
    }
}
