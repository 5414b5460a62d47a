pub mod models;
pub mod repository;

use log::info;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Error as SqlxError;

pub use repository::SheetRepository;

/// SQLite 데이터베이스 초기화 및 연결
pub async fn init_database(database_url: &str) -> Result<SqlitePool, SqlxError> {
    info!("🗄️  원장 데이터베이스 초기화 중...");

    // 메모리 DB는 연결마다 별도 DB가 되므로 연결 하나만 사용
    let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

    // 연결 풀 생성
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    // 테이블 생성
    create_tables(&pool).await?;

    info!("✅ 원장 데이터베이스 초기화 완료");

    Ok(pool)
}

/// 필요한 테이블 생성
async fn create_tables(pool: &SqlitePool) -> Result<(), SqlxError> {
    // 시트 셀 테이블 (시트 이름 + 1부터 시작하는 행/열 좌표)
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS sheet_cells (
            sheet TEXT NOT NULL,
            row_idx INTEGER NOT NULL,
            col_idx INTEGER NOT NULL,
            value TEXT NOT NULL,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (sheet, row_idx, col_idx)
        )"
    )
    .execute(pool)
    .await?;

    // 인덱스 생성
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_sheet_cells_col ON sheet_cells(sheet, col_idx, row_idx)")
        .execute(pool)
        .await?;

    Ok(())
}
