//! 동기화 정책 (심볼 목록, 제외 목록, 시작 ID, 모드)

use std::collections::{BTreeMap, HashSet};

use chrono::{FixedOffset, Offset, Utc};

use crate::error::{Result, SyncError};
use crate::external::model::TradeKey;

/// 동기화 모드
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// 커서 이후의 새 체결만 추가
    Incremental,
    /// 원장과 커서를 비우고 시작 ID부터 다시 채움
    FullResync,
}

impl std::str::FromStr for SyncMode {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "incremental" | "" => Ok(SyncMode::Incremental),
            "full" | "full_resync" | "resync" => Ok(SyncMode::FullResync),
            other => Err(SyncError::Config(format!("알 수 없는 동기화 모드: {}", other))),
        }
    }
}

/// 운영자가 지정한 제외 체결 목록
///
/// `55` 처럼 ID만 쓰면 모든 심볼에 적용되고, `BTCUSDT:55` 는 해당 심볼에만 적용됩니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExcludeSet {
    any_symbol: HashSet<u64>,
    scoped: HashSet<TradeKey>,
}

impl ExcludeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ids(ids: impl IntoIterator<Item = u64>) -> Self {
        Self {
            any_symbol: ids.into_iter().collect(),
            scoped: HashSet::new(),
        }
    }

    pub fn insert_scoped(&mut self, symbol: &str, id: u64) {
        self.scoped.insert(TradeKey::new(symbol, id));
    }

    pub fn contains(&self, key: &TradeKey) -> bool {
        self.any_symbol.contains(&key.id) || self.scoped.contains(key)
    }

    pub fn len(&self) -> usize {
        self.any_symbol.len() + self.scoped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `55, BTCUSDT:56` 형식 파싱
    pub fn parse(raw: &str) -> Result<Self> {
        let mut set = Self::new();
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            match entry.rsplit_once(':') {
                Some((symbol, id)) => set.insert_scoped(symbol.trim(), parse_id(entry, id)?),
                None => {
                    set.any_symbol.insert(parse_id(entry, entry)?);
                }
            }
        }
        Ok(set)
    }
}

/// `BTCUSDT:0, ETHUSDT:1200` 형식의 심볼별 시작 ID 파싱
pub fn parse_genesis_ids(raw: &str) -> Result<BTreeMap<String, u64>> {
    let mut genesis = BTreeMap::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (symbol, id) = entry
            .rsplit_once(':')
            .ok_or_else(|| SyncError::Config(format!("시작 ID 형식 오류: {}", entry)))?;
        genesis.insert(symbol.trim().to_string(), parse_id(entry, id)?);
    }
    Ok(genesis)
}

fn parse_id(entry: &str, id: &str) -> Result<u64> {
    id.trim()
        .parse::<u64>()
        .map_err(|_| SyncError::Config(format!("체결 ID 형식 오류: {}", entry)))
}

/// 원장 표시 시각 기본 오프셋 (UTC+8)
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 8;

/// 시간 단위 UTC 오프셋 (-12 ~ +14)
pub fn offset_from_hours(hours: i32) -> Result<FixedOffset> {
    if !(-12..=14).contains(&hours) {
        return Err(SyncError::Config(format!("UTC 오프셋 범위 초과: {}", hours)));
    }
    FixedOffset::east_opt(hours * 3600)
        .ok_or_else(|| SyncError::Config(format!("잘못된 UTC 오프셋: {}", hours)))
}

/// 오케스트레이터 실행 정책
#[derive(Debug, Clone)]
pub struct SyncPolicy {
    pub symbols: Vec<String>,
    pub exclude: ExcludeSet,
    /// 커서가 없을 때 처음 요청할 체결 ID (포함)
    pub genesis_ids: BTreeMap<String, u64>,
    pub mode: SyncMode,
    /// 빈 페이지가 나올 때까지 다음 페이지를 이어서 조회
    pub drain_pages: bool,
    /// 심볼당 최대 페이지 수
    pub max_pages: usize,
    /// 원장 표시 시각의 UTC 오프셋
    pub display_offset: FixedOffset,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            symbols: vec![
                "BTCUSDT".to_string(),
                "ETHUSDT".to_string(),
                "BNBUSDT".to_string(),
            ],
            exclude: ExcludeSet::new(),
            genesis_ids: BTreeMap::new(),
            mode: SyncMode::Incremental,
            drain_pages: true,
            max_pages: 50,
            display_offset: offset_from_hours(DEFAULT_UTC_OFFSET_HOURS).unwrap_or_else(|_| Utc.fix()),
        }
    }
}
