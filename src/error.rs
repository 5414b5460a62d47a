//! 동기화 에러 타입

/// 동기화 에러
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("설정 오류: {0}")]
    Config(String),
    #[error("저장소 오류: {0}")]
    Storage(#[from] sqlx::Error),
    #[error("원장 오류: {0}")]
    Ledger(String),
    #[error("HTTP 오류: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON 오류: {0}")]
    Json(#[from] serde_json::Error),
    #[error("커서 형식 오류: {0}")]
    CursorFormat(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;
