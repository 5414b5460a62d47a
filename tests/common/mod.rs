//! 통합 테스트 공용 도구
//!
//! 서명을 검증하고 fromId/limit 페이지를 흉내 내는 가짜 거래소를 제공합니다.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use chrono::FixedOffset;
use serde_json::{json, Value};

use trade_ledger_sync::error::Result;
use trade_ledger_sync::external::{RequestSigner, SignedQuery, TradeFetcher, TradeTransport};
use trade_ledger_sync::ledger::{LedgerAdapter, LedgerStore, Row, HEADER};
use trade_ledger_sync::sync::{SyncOrchestrator, SyncPolicy};

pub const SECRET: &str = "test-secret";

/// 커서 없이 요청했을 때 거래소가 돌려주는 최근 체결 수
pub const DEFAULT_RECENT_LIMIT: usize = 500;

#[derive(Default)]
struct ExchangeState {
    trades: BTreeMap<String, Vec<Value>>,
    errors: HashMap<String, Value>,
    requests: Vec<HashMap<String, String>>,
}

/// 가짜 거래소 (복제본끼리 상태 공유)
#[derive(Clone, Default)]
pub struct FakeExchange {
    state: Rc<RefCell<ExchangeState>>,
}

impl FakeExchange {
    pub fn new() -> Self {
        Self::default()
    }

    /// 체결 추가 (id 오름차순 유지)
    pub fn add_trades(&self, symbol: &str, ids: impl IntoIterator<Item = u64>) {
        let mut state = self.state.borrow_mut();
        let list = state.trades.entry(symbol.to_string()).or_default();
        for id in ids {
            list.push(trade_json(symbol, id));
        }
        list.sort_by_key(|t| t["id"].as_u64().unwrap_or_default());
    }

    /// 원시 JSON 체결 추가 (파싱 실패 항목 테스트용)
    pub fn add_raw(&self, symbol: &str, raw: Value) {
        self.state
            .borrow_mut()
            .trades
            .entry(symbol.to_string())
            .or_default()
            .push(raw);
    }

    /// 해당 심볼 요청에 에러 객체로 응답
    pub fn fail_symbol(&self, symbol: &str, code: i64, msg: &str) {
        self.state
            .borrow_mut()
            .errors
            .insert(symbol.to_string(), json!({"code": code, "msg": msg}));
    }

    pub fn clear_failure(&self, symbol: &str) {
        self.state.borrow_mut().errors.remove(symbol);
    }

    pub fn requests(&self) -> Vec<HashMap<String, String>> {
        self.state.borrow().requests.clone()
    }

    pub fn requests_for(&self, symbol: &str) -> Vec<HashMap<String, String>> {
        self.requests()
            .into_iter()
            .filter(|r| r.get("symbol").map(String::as_str) == Some(symbol))
            .collect()
    }
}

impl TradeTransport for FakeExchange {
    async fn get_signed(&self, path: &str, signed: &SignedQuery) -> Result<Value> {
        assert_eq!(path, "/api/v3/myTrades");

        let verifier = RequestSigner::new(SECRET)?;
        if verifier.signature_for(&signed.query)? != signed.signature {
            return Ok(json!({"code": -1022, "msg": "Signature for this request is not valid."}));
        }

        let params: HashMap<String, String> = signed
            .query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert!(params.contains_key("timestamp"), "timestamp 누락");

        let mut state = self.state.borrow_mut();
        state.requests.push(params.clone());

        let symbol = params.get("symbol").cloned().unwrap_or_default();
        if let Some(error) = state.errors.get(&symbol) {
            return Ok(error.clone());
        }

        let all = state.trades.get(&symbol).cloned().unwrap_or_default();
        let limit = params
            .get("limit")
            .and_then(|l| l.parse::<usize>().ok())
            .unwrap_or(DEFAULT_RECENT_LIMIT);

        let page: Vec<Value> = match params.get("fromId").and_then(|f| f.parse::<u64>().ok()) {
            Some(from_id) => all
                .into_iter()
                .filter(|t| t["id"].as_u64().map_or(true, |id| id >= from_id))
                .take(limit)
                .collect(),
            None => {
                let skip = all.len().saturating_sub(limit);
                all.into_iter().skip(skip).collect()
            }
        };
        Ok(Value::Array(page))
    }
}

pub fn trade_json(symbol: &str, id: u64) -> Value {
    json!({
        "symbol": symbol,
        "id": id,
        "orderId": id * 10,
        "price": format!("{}.50000000", 100 + id),
        "qty": "0.01000000",
        "quoteQty": format!("{}.005", 1 + id / 100),
        "commission": "0.00001000",
        "commissionAsset": "BNB",
        "time": 1_700_000_000_000i64 + id as i64 * 1000,
        "isBuyer": id % 2 == 0,
        "isMaker": false,
        "isBestMatch": true
    })
}

pub fn policy(symbols: &[&str]) -> SyncPolicy {
    SyncPolicy {
        symbols: symbols.iter().map(|s| s.to_string()).collect(),
        display_offset: FixedOffset::east_opt(0).unwrap(),
        ..SyncPolicy::default()
    }
}

pub fn orchestrator<S: LedgerStore>(
    exchange: &FakeExchange,
    store: S,
    policy: SyncPolicy,
    page_limit: Option<u32>,
) -> SyncOrchestrator<FakeExchange, S> {
    let signer = RequestSigner::new(SECRET).unwrap();
    let fetcher = TradeFetcher::new(exchange.clone(), signer).with_page_limit(page_limit);
    SyncOrchestrator::new(fetcher, LedgerAdapter::new(store), policy)
}

/// 헤더를 제외한 데이터 행
pub async fn data_rows<S: LedgerStore>(store: &S) -> Vec<Row> {
    let mut rows = store.read_rows(HEADER.len()).await.unwrap();
    if !rows.is_empty() {
        assert_eq!(rows[0], HEADER.iter().map(|h| h.to_string()).collect::<Vec<_>>());
        rows.remove(0);
    }
    rows
}

/// 데이터 행의 (심볼, ID)
pub async fn ledger_ids<S: LedgerStore>(store: &S) -> Vec<(String, u64)> {
    data_rows(store)
        .await
        .into_iter()
        .map(|row| (row[0].clone(), row[1].parse::<u64>().unwrap()))
        .collect()
}
