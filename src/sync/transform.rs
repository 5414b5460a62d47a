//! 체결 → 원장 행 변환

use chrono::{DateTime, FixedOffset};

use crate::external::model::Trade;
use crate::ledger::Row;

/// 원장 표시 시각 형식
pub const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// epoch 밀리초를 고정 오프셋 기준 표시 문자열로 변환
///
/// 표현 범위를 벗어난 값은 밀리초 숫자 그대로 기록합니다.
pub fn format_trade_time(time_ms: i64, offset: &FixedOffset) -> String {
    match DateTime::from_timestamp_millis(time_ms) {
        Some(utc) => utc.with_timezone(offset).format(DISPLAY_TIME_FORMAT).to_string(),
        None => time_ms.to_string(),
    }
}

/// 헤더 순서(symbol, id, price, qty, quoteQty, time, isBuyer)의 원장 행
pub fn to_ledger_row(trade: &Trade, offset: &FixedOffset) -> Row {
    vec![
        trade.symbol.clone(),
        trade.id.to_string(),
        trade.price.clone(),
        trade.qty.clone(),
        trade.quote_qty.clone(),
        format_trade_time(trade.time, offset),
        if trade.is_buyer { "TRUE" } else { "FALSE" }.to_string(),
    ]
}
