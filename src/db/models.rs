use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 시트 셀 DB 모델
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CellRecord {
    pub row_idx: i64,
    pub col_idx: i64,
    pub value: String,
}
