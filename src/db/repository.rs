use super::models::CellRecord;
use sqlx::sqlite::SqlitePool;
use sqlx::Error as SqlxError;
use log::debug;

use crate::error::Result;
use crate::ledger::{LedgerStore, Row};

/// 시트(원장) 저장소
///
/// 하나의 데이터베이스에 여러 시트를 이름으로 구분해 담습니다.
pub struct SheetRepository {
    pool: SqlitePool,
    sheet: String,
}

impl SheetRepository {
    pub fn new(pool: SqlitePool, sheet: &str) -> Self {
        Self {
            pool,
            sheet: sheet.to_string(),
        }
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    async fn last_row<'e, E>(&self, executor: E) -> std::result::Result<usize, SqlxError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let last: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(row_idx), 0) FROM sheet_cells
             WHERE sheet = ? AND col_idx = 1 AND value <> ''"
        )
        .bind(&self.sheet)
        .fetch_one(executor)
        .await?;

        Ok(last.max(0) as usize)
    }
}

impl LedgerStore for SheetRepository {
    async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM sheet_cells WHERE sheet = ?")
            .bind(&self.sheet)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn row_count(&self) -> Result<usize> {
        Ok(self.last_row(&self.pool).await?)
    }

    async fn read_rows(&self, width: usize) -> Result<Vec<Row>> {
        let last_row = self.last_row(&self.pool).await?;
        let mut rows = vec![vec![String::new(); width]; last_row];
        if last_row == 0 || width == 0 {
            return Ok(rows);
        }

        let cells = sqlx::query_as::<_, CellRecord>(
            "SELECT row_idx, col_idx, value
             FROM sheet_cells
             WHERE sheet = ? AND row_idx <= ? AND col_idx <= ?
             ORDER BY row_idx ASC, col_idx ASC"
        )
        .bind(&self.sheet)
        .bind(last_row as i64)
        .bind(width as i64)
        .fetch_all(&self.pool)
        .await?;

        for cell in cells {
            if cell.row_idx < 1 || cell.col_idx < 1 {
                continue;
            }
            rows[cell.row_idx as usize - 1][cell.col_idx as usize - 1] = cell.value;
        }

        Ok(rows)
    }

    /// 단일 트랜잭션으로 배치 전체 추가
    async fn append_rows(&self, rows: &[Row]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let start = self.last_row(&mut *tx).await?;

        for (offset, row) in rows.iter().enumerate() {
            let row_idx = (start + offset + 1) as i64;
            for (col, value) in row.iter().enumerate() {
                sqlx::query(
                    "INSERT OR REPLACE INTO sheet_cells (sheet, row_idx, col_idx, value)
                     VALUES (?, ?, ?, ?)"
                )
                .bind(&self.sheet)
                .bind(row_idx)
                .bind((col + 1) as i64)
                .bind(value)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        debug!("시트 {}: {}행 추가 (시작 행 {})", self.sheet, rows.len(), start + 1);

        Ok(())
    }

    async fn read_cell(&self, row: usize, col: usize) -> Result<Option<String>> {
        let value = sqlx::query_scalar::<_, String>(
            "SELECT value FROM sheet_cells WHERE sheet = ? AND row_idx = ? AND col_idx = ?"
        )
        .bind(&self.sheet)
        .bind(row as i64)
        .bind(col as i64)
        .fetch_optional(&self.pool)
        .await?;

        Ok(value)
    }

    /// 셀 쓰기 (없으면 생성)
    async fn write_cell(&self, row: usize, col: usize, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO sheet_cells (sheet, row_idx, col_idx, value)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(sheet, row_idx, col_idx) DO UPDATE SET
                value = excluded.value,
                updated_at = CURRENT_TIMESTAMP"
        )
        .bind(&self.sheet)
        .bind(row as i64)
        .bind(col as i64)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
