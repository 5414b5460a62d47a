//! 체결 내역 조회기
//!
//! 호출 한 번에 myTrades 한 페이지만 가져옵니다. 여러 페이지를 이어서 가져오는 것은
//! 오케스트레이터의 몫입니다.

use log::{debug, warn};
use serde_json::Value;

use crate::error::{Result, SyncError};
use crate::external::model::Trade;
use crate::external::signer::RequestSigner;
use crate::external::transport::TradeTransport;

/// 체결 내역 엔드포인트
pub const MY_TRADES_PATH: &str = "/api/v3/myTrades";

/// 거래소가 허용하는 페이지당 최대 건수
pub const MAX_PAGE_LIMIT: u32 = 1000;

/// 한 페이지 조회 결과
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// 정상 응답 (비어 있을 수 있음)
    Trades(Vec<Trade>),
    /// 거래소가 `{code, msg}` 에러 객체를 반환
    RemoteError { code: i64, msg: String },
    /// 네트워크 실패 또는 JSON 이 아닌 본문
    TransportError(String),
    /// 배열도 에러 객체도 아닌 응답
    Unrecognized,
}

impl FetchOutcome {
    /// 실패 여부와 관계없이 이번 실행에서 사용할 체결 목록 (실패면 빈 목록)
    pub fn trades(&self) -> &[Trade] {
        match self {
            FetchOutcome::Trades(trades) => trades,
            _ => &[],
        }
    }
}

/// 응답 본문을 체결 목록으로 변환
///
/// 필드가 빠지거나 타입이 맞지 않는 원소는 해당 원소만 건너뜁니다.
pub fn parse_trades_response(body: Value) -> FetchOutcome {
    match body {
        Value::Array(items) => {
            let mut trades = Vec::with_capacity(items.len());
            for item in items {
                match serde_json::from_value::<Trade>(item.clone()) {
                    Ok(trade) => trades.push(trade),
                    Err(e) => warn!("체결 항목 파싱 실패, 건너뜀: {} ({})", e, item),
                }
            }
            FetchOutcome::Trades(trades)
        }
        Value::Object(map) if map.contains_key("code") => {
            let code = map.get("code").and_then(Value::as_i64).unwrap_or_default();
            let msg = map
                .get("msg")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            FetchOutcome::RemoteError { code, msg }
        }
        _ => FetchOutcome::Unrecognized,
    }
}

/// 체결 내역 조회기
pub struct TradeFetcher<T: TradeTransport> {
    transport: T,
    signer: RequestSigner,
    page_limit: Option<u32>,
}

impl<T: TradeTransport> TradeFetcher<T> {
    pub fn new(transport: T, signer: RequestSigner) -> Self {
        Self {
            transport,
            signer,
            page_limit: None,
        }
    }

    /// 페이지 크기 지정 (거래소 상한 1000으로 제한)
    pub fn with_page_limit(mut self, page_limit: Option<u32>) -> Self {
        self.page_limit = page_limit.map(|limit| limit.clamp(1, MAX_PAGE_LIMIT));
        self
    }

    /// 서명 전 요청 파라미터 (순서가 곧 서명 대상 문자열의 순서)
    pub fn build_params(&self, symbol: &str, from_id: Option<u64>) -> Vec<(&'static str, String)> {
        let mut params = vec![("symbol", symbol.to_string())];
        if let Some(from_id) = from_id {
            params.push(("fromId", from_id.to_string()));
        }
        if let Some(limit) = self.page_limit {
            params.push(("limit", limit.to_string()));
        }
        params
    }

    /// 한 페이지 조회
    ///
    /// 원격 에러와 전송 실패는 심볼 단위로 복구 가능한 결과로 돌려줍니다.
    /// 서명 설정 오류만 `Err` 로 전파됩니다.
    pub async fn fetch(&self, symbol: &str, from_id: Option<u64>) -> Result<FetchOutcome> {
        let params = self.build_params(symbol, from_id);
        let signed = self.signer.sign(&params)?;

        let body = match self.transport.get_signed(MY_TRADES_PATH, &signed).await {
            Ok(body) => body,
            Err(e @ SyncError::Config(_)) => return Err(e),
            Err(e) => {
                warn!("{} 체결 조회 실패: {}", symbol, e);
                return Ok(FetchOutcome::TransportError(e.to_string()));
            }
        };

        let outcome = parse_trades_response(body);
        match &outcome {
            FetchOutcome::Trades(trades) => {
                debug!("{} 체결 {}건 수신 (fromId={:?})", symbol, trades.len(), from_id);
            }
            FetchOutcome::RemoteError { code, msg } => {
                warn!("{} 거래소 에러 응답: code={}, msg={}", symbol, code, msg);
            }
            FetchOutcome::Unrecognized => {
                warn!("{} 알 수 없는 응답 형식, 빈 결과로 처리", symbol);
            }
            FetchOutcome::TransportError(_) => {}
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::signer::SignedQuery;
    use serde_json::json;
    use std::cell::RefCell;

    struct RecordingTransport {
        response: Result<Value>,
        seen: RefCell<Vec<(String, SignedQuery)>>,
    }

    impl RecordingTransport {
        fn returning(response: Result<Value>) -> Self {
            Self {
                response,
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl TradeTransport for RecordingTransport {
        async fn get_signed(&self, path: &str, signed: &SignedQuery) -> Result<Value> {
            self.seen.borrow_mut().push((path.to_string(), signed.clone()));
            match &self.response {
                Ok(value) => Ok(value.clone()),
                Err(e) => Err(SyncError::Ledger(e.to_string())),
            }
        }
    }

    fn trade_json(id: u64) -> Value {
        json!({
            "symbol": "BTCUSDT", "id": id, "price": "65000.10", "qty": "0.001",
            "quoteQty": "65.0001", "time": 1_700_000_000_000i64, "isBuyer": true
        })
    }

    #[test]
    fn test_parse_array_keeps_order_and_skips_bad_items() {
        let body = json!([trade_json(100), {"symbol": "BTCUSDT", "id": 101}, trade_json(102)]);
        let outcome = parse_trades_response(body);
        let ids: Vec<u64> = outcome.trades().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![100, 102]);
        assert!(matches!(outcome, FetchOutcome::Trades(_)));
    }

    #[test]
    fn test_parse_error_object() {
        let outcome = parse_trades_response(json!({"code": -1021, "msg": "Timestamp outside of recvWindow."}));
        assert_eq!(
            outcome,
            FetchOutcome::RemoteError {
                code: -1021,
                msg: "Timestamp outside of recvWindow.".to_string()
            }
        );
        assert!(outcome.trades().is_empty());
    }

    #[test]
    fn test_parse_other_shapes_are_empty() {
        assert_eq!(parse_trades_response(json!({"foo": 1})), FetchOutcome::Unrecognized);
        assert_eq!(parse_trades_response(json!("text")), FetchOutcome::Unrecognized);
        assert_eq!(parse_trades_response(json!([])), FetchOutcome::Trades(vec![]));
    }

    #[test]
    fn test_build_params_order() {
        let fetcher = TradeFetcher::new(
            RecordingTransport::returning(Ok(json!([]))),
            RequestSigner::new("secret").unwrap(),
        )
        .with_page_limit(Some(5000));

        let params = fetcher.build_params("ETHUSDT", Some(7));
        assert_eq!(
            params,
            vec![
                ("symbol", "ETHUSDT".to_string()),
                ("fromId", "7".to_string()),
                ("limit", "1000".to_string()),
            ]
        );
        assert_eq!(fetcher.build_params("ETHUSDT", None).len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_signs_request_for_my_trades() {
        let signer = RequestSigner::new("secret").unwrap();
        let fetcher = TradeFetcher::new(
            RecordingTransport::returning(Ok(json!([trade_json(100)]))),
            signer.clone(),
        );

        let outcome = fetcher.fetch("BTCUSDT", Some(100)).await.unwrap();
        assert_eq!(outcome.trades().len(), 1);

        let seen = fetcher.transport.seen.borrow();
        let (path, signed) = &seen[0];
        assert_eq!(path, MY_TRADES_PATH);
        assert!(signed.query.starts_with("symbol=BTCUSDT&fromId=100&timestamp="));
        assert_eq!(signed.signature, signer.signature_for(&signed.query).unwrap());
    }

    #[tokio::test]
    async fn test_fetch_transport_failure_is_recoverable() {
        let fetcher = TradeFetcher::new(
            RecordingTransport::returning(Err(SyncError::Ledger("connection reset".to_string()))),
            RequestSigner::new("secret").unwrap(),
        );

        let outcome = fetcher.fetch("BTCUSDT", None).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::TransportError(_)));
        assert!(outcome.trades().is_empty());
    }
}
