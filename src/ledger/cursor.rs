//! 심볼별 동기화 커서
//!
//! 원장의 별도 셀 하나에 버전이 붙은 JSON 으로 저장됩니다.
//! `{"version":1,"cursors":{"BTCUSDT":101,"ETHUSDT":null}}`
//!
//! 예전 `SYMBOL:id,SYMBOL:id` 형식도 읽을 수 있으며, 다음 쓰기 때 JSON 으로 바뀝니다.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

/// 현재 커서 인코딩 버전
pub const CURSOR_FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct CursorDocument {
    version: u32,
    cursors: BTreeMap<String, Option<u64>>,
}

/// 심볼 → 마지막으로 처리한 체결 ID
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CursorMap {
    cursors: BTreeMap<String, Option<u64>>,
}

impl CursorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, symbol: &str) -> Option<u64> {
        self.cursors.get(symbol).copied().flatten()
    }

    /// 커서가 없는 심볼도 맵에 남겨 둡니다 (명시적 `null`)
    pub fn track(&mut self, symbol: &str) {
        self.cursors.entry(symbol.to_string()).or_insert(None);
    }

    /// 커서를 앞으로만 이동. 실제로 이동했으면 true
    pub fn advance(&mut self, symbol: &str, id: u64) -> bool {
        let slot = self.cursors.entry(symbol.to_string()).or_insert(None);
        match *slot {
            Some(current) if current >= id => false,
            _ => {
                *slot = Some(id);
                true
            }
        }
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.cursors.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }

    pub fn encode(&self) -> Result<String> {
        let document = CursorDocument {
            version: CURSOR_FORMAT_VERSION,
            cursors: self.cursors.clone(),
        };
        Ok(serde_json::to_string(&document)?)
    }

    /// 셀 값에서 커서 맵 복원. 빈 셀은 빈 맵입니다.
    pub fn decode(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Self::new());
        }
        if raw.starts_with('{') {
            let document: CursorDocument = serde_json::from_str(raw)?;
            if document.version != CURSOR_FORMAT_VERSION {
                return Err(SyncError::CursorFormat(format!(
                    "지원하지 않는 커서 버전: {}",
                    document.version
                )));
            }
            return Ok(Self {
                cursors: document.cursors,
            });
        }
        Self::decode_legacy(raw)
    }

    fn decode_legacy(raw: &str) -> Result<Self> {
        let mut cursors = BTreeMap::new();
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (symbol, value) = entry
                .rsplit_once(':')
                .ok_or_else(|| SyncError::CursorFormat(format!("잘못된 커서 항목: {}", entry)))?;
            let value = value.trim();
            let id = if value.is_empty() || value.eq_ignore_ascii_case("none") {
                None
            } else {
                Some(value.parse::<u64>().map_err(|_| {
                    SyncError::CursorFormat(format!("잘못된 커서 값: {}", entry))
                })?)
            };
            cursors.insert(symbol.trim().to_string(), id);
        }
        Ok(Self { cursors })
    }
}
