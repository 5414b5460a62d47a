use serde::{Deserialize, Serialize};
use std::fmt;

/// 거래소 체결 내역 (myTrades 응답 한 건)
///
/// 가격/수량은 부동소수점 반올림을 피하기 위해 거래소가 보낸 문자열 그대로 보존합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub symbol: String,
    pub id: u64,
    pub price: String,
    pub qty: String,
    pub quote_qty: String,
    /// 체결 시각 (epoch 밀리초)
    pub time: i64,
    pub is_buyer: bool,
}

impl Trade {
    pub fn key(&self) -> TradeKey {
        TradeKey::new(&self.symbol, self.id)
    }
}

/// 중복 제거 키 (심볼, 체결 ID)
///
/// 체결 ID는 심볼 안에서만 유일하므로 항상 심볼과 함께 비교합니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TradeKey {
    pub symbol: String,
    pub id: u64,
}

impl TradeKey {
    pub fn new(symbol: &str, id: u64) -> Self {
        Self {
            symbol: symbol.to_string(),
            id,
        }
    }
}

impl fmt::Display for TradeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.symbol, self.id)
    }
}
