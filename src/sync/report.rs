//! 동기화 실행 결과 요약

use std::fmt;

use crate::external::trade_fetcher::FetchOutcome;

/// 심볼별 조회 실패 사유
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    Remote { code: i64, msg: String },
    Transport(String),
    Unrecognized,
}

impl FetchFailure {
    pub fn from_outcome(outcome: &FetchOutcome) -> Option<Self> {
        match outcome {
            FetchOutcome::Trades(_) => None,
            FetchOutcome::RemoteError { code, msg } => Some(FetchFailure::Remote {
                code: *code,
                msg: msg.clone(),
            }),
            FetchOutcome::TransportError(msg) => Some(FetchFailure::Transport(msg.clone())),
            FetchOutcome::Unrecognized => Some(FetchFailure::Unrecognized),
        }
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailure::Remote { code, msg } => write!(f, "거래소 에러 {} ({})", code, msg),
            FetchFailure::Transport(msg) => write!(f, "전송 실패 ({})", msg),
            FetchFailure::Unrecognized => write!(f, "알 수 없는 응답"),
        }
    }
}

/// 심볼 하나의 동기화 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolReport {
    pub symbol: String,
    pub new_rows: usize,
    pub pages: usize,
    pub skipped_known: usize,
    pub skipped_excluded: usize,
    pub skipped_foreign: usize,
    pub cursor_before: Option<u64>,
    pub cursor_after: Option<u64>,
    pub failure: Option<FetchFailure>,
}

impl SymbolReport {
    pub fn new(symbol: &str, cursor_before: Option<u64>) -> Self {
        Self {
            symbol: symbol.to_string(),
            new_rows: 0,
            pages: 0,
            skipped_known: 0,
            skipped_excluded: 0,
            skipped_foreign: 0,
            cursor_before,
            cursor_after: cursor_before,
            failure: None,
        }
    }

    pub fn has_new_trades(&self) -> bool {
        self.new_rows > 0
    }
}

impl fmt::Display for SymbolReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_new_trades() {
            write!(f, "{}: 새 체결 {}건", self.symbol, self.new_rows)?;
        } else {
            write!(f, "{}: 새 체결 없음", self.symbol)?;
        }
        write!(
            f,
            " (페이지 {}, 기존 {}, 제외 {}, 커서 {:?} → {:?})",
            self.pages, self.skipped_known, self.skipped_excluded, self.cursor_before, self.cursor_after
        )?;
        if let Some(failure) = &self.failure {
            write!(f, " [{}]", failure)?;
        }
        Ok(())
    }
}

/// 실행 전체 결과
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub symbols: Vec<SymbolReport>,
    pub header_written: bool,
    pub cursors_written: bool,
}

impl SyncReport {
    pub fn total_new_rows(&self) -> usize {
        self.symbols.iter().map(|s| s.new_rows).sum()
    }

    pub fn failed_symbols(&self) -> usize {
        self.symbols.iter().filter(|s| s.failure.is_some()).count()
    }

    pub fn symbol(&self, symbol: &str) -> Option<&SymbolReport> {
        self.symbols.iter().find(|s| s.symbol == symbol)
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SyncReport {{ 심볼: {}, 새 체결: {}, 조회 실패: {}, 커서 저장: {} }}",
            self.symbols.len(),
            self.total_new_rows(),
            self.failed_symbols(),
            self.cursors_written
        )
    }
}
