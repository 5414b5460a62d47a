//! 원장 어댑터
//!
//! 저장소 격자 위에서 체결 행, 헤더, 커서 셀을 다룹니다.

use std::collections::HashSet;

use log::{debug, info, warn};

use crate::error::Result;
use crate::external::model::TradeKey;
use crate::ledger::cursor::CursorMap;
use crate::ledger::{LedgerStore, Row};

/// 원장 헤더 행
pub const HEADER: [&str; 7] = ["symbol", "id", "price", "qty", "quoteQty", "time", "isBuyer"];

/// 커서 맵을 담는 표 바깥 셀 (1행 J열)
pub const CURSOR_CELL: (usize, usize) = (1, 10);

/// 원장 어댑터
pub struct LedgerAdapter<S: LedgerStore> {
    store: S,
}

impl<S: LedgerStore> LedgerAdapter<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// 원장이 완전히 비어 있을 때만 헤더를 기록. 기록했으면 true
    pub async fn ensure_header(&self) -> Result<bool> {
        if self.store.row_count().await? > 0 {
            return Ok(false);
        }
        let header: Row = HEADER.iter().map(|h| h.to_string()).collect();
        self.store.append_rows(&[header]).await?;
        info!("📋 원장 헤더 기록");
        Ok(true)
    }

    /// 원장에 기록된 모든 (심볼, 체결 ID)
    pub async fn read_existing_ids(&self) -> Result<HashSet<TradeKey>> {
        let rows = self.store.read_rows(HEADER.len()).await?;
        let mut keys = HashSet::new();

        let Some((header, records)) = rows.split_first() else {
            return Ok(keys);
        };
        let symbol_col = column_index(header, "symbol").unwrap_or(0);
        let id_col = column_index(header, "id").unwrap_or(1);

        for (index, record) in records.iter().enumerate() {
            let symbol = record.get(symbol_col).map(|s| s.trim()).unwrap_or_default();
            let id = record.get(id_col).map(|s| s.trim()).unwrap_or_default();
            match id.parse::<u64>() {
                Ok(id) if !symbol.is_empty() => {
                    keys.insert(TradeKey::new(symbol, id));
                }
                _ => warn!("원장 {}행을 건너뜀: symbol={:?}, id={:?}", index + 2, symbol, id),
            }
        }

        debug!("원장 기존 체결 {}건 로드", keys.len());
        Ok(keys)
    }

    pub async fn read_cursors(&self) -> Result<CursorMap> {
        let (row, col) = CURSOR_CELL;
        match self.store.read_cell(row, col).await? {
            Some(raw) => CursorMap::decode(&raw),
            None => Ok(CursorMap::new()),
        }
    }

    pub async fn read_cursor(&self, symbol: &str) -> Result<Option<u64>> {
        Ok(self.read_cursors().await?.get(symbol))
    }

    /// 커서 맵 전체를 덮어씀 (병합하지 않음)
    pub async fn write_cursor(&self, cursors: &CursorMap) -> Result<()> {
        let (row, col) = CURSOR_CELL;
        self.store.write_cell(row, col, &cursors.encode()?).await
    }

    /// 행 배치 추가
    pub async fn append(&self, rows: &[Row]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        self.store.append_rows(rows).await
    }

    /// 원장과 커서 셀 초기화 (전체 재동기화 전용)
    pub async fn reset(&self) -> Result<()> {
        warn!("원장 전체 초기화");
        self.store.clear().await
    }
}

fn column_index(header: &[String], name: &str) -> Option<usize> {
    header.iter().position(|h| h.trim() == name)
}
