//! 거래소 요청 서명
//!
//! 파라미터를 호출자가 넘긴 순서 그대로 `key=value&...` 형태로 이어 붙이고,
//! 그 문자열 전체에 대해 HMAC-SHA256 서명을 계산합니다.

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{Result, SyncError};

type HmacSha256 = Hmac<Sha256>;

/// 서명된 쿼리
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedQuery {
    /// 서명 대상이 된 정규화 쿼리 문자열
    pub query: String,
    /// 소문자 hex 서명
    pub signature: String,
}

impl SignedQuery {
    /// `query&signature=...` 형태의 최종 쿼리 문자열
    pub fn to_query_string(&self) -> String {
        format!("{}&signature={}", self.query, self.signature)
    }
}

/// 요청 서명기
#[derive(Clone)]
pub struct RequestSigner {
    secret: String,
    recv_window: Option<u64>,
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("secret", &"***")
            .field("recv_window", &self.recv_window)
            .finish()
    }
}

impl RequestSigner {
    /// 새 서명기 생성. 비어 있는 시크릿으로는 생성할 수 없습니다.
    pub fn new(secret: &str) -> Result<Self> {
        if secret.trim().is_empty() {
            return Err(SyncError::Config("API 시크릿이 비어 있습니다".to_string()));
        }
        Ok(Self {
            secret: secret.to_string(),
            recv_window: None,
        })
    }

    pub fn with_recv_window(mut self, recv_window: Option<u64>) -> Self {
        self.recv_window = recv_window;
        self
    }

    /// 현재 시각 timestamp를 주입하여 서명
    pub fn sign(&self, params: &[(&str, String)]) -> Result<SignedQuery> {
        self.sign_at(params, Utc::now().timestamp_millis())
    }

    /// 지정한 timestamp로 서명 (테스트 및 재현용)
    pub fn sign_at(&self, params: &[(&str, String)], timestamp_ms: i64) -> Result<SignedQuery> {
        let mut pairs: Vec<String> = params
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        pairs.push(format!("timestamp={}", timestamp_ms));
        if let Some(recv_window) = self.recv_window {
            pairs.push(format!("recvWindow={}", recv_window));
        }

        let query = pairs.join("&");
        let signature = self.signature_for(&query)?;
        Ok(SignedQuery { query, signature })
    }

    /// 임의 문자열에 대한 서명
    pub fn signature_for(&self, payload: &str) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| SyncError::Config(format!("HMAC 키 초기화 실패: {}", e)))?;
        mac.update(payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC_SECRET: &str = "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j";

    #[test]
    fn test_signature_matches_exchange_reference() {
        let signer = RequestSigner::new(DOC_SECRET).unwrap();
        let query = "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559";
        assert_eq!(
            signer.signature_for(query).unwrap(),
            "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
        );
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(RequestSigner::new(""), Err(SyncError::Config(_))));
        assert!(matches!(RequestSigner::new("   "), Err(SyncError::Config(_))));
    }

    #[test]
    fn test_query_keeps_caller_order_and_appends_timestamp() {
        let signer = RequestSigner::new("secret").unwrap();
        let signed = signer
            .sign_at(
                &[("symbol", "BTCUSDT".to_string()), ("fromId", "101".to_string())],
                1_700_000_000_000,
            )
            .unwrap();

        assert_eq!(signed.query, "symbol=BTCUSDT&fromId=101&timestamp=1700000000000");
        assert_eq!(signed.signature, signer.signature_for(&signed.query).unwrap());
        assert_eq!(signed.signature.len(), 64);
        assert!(signed.signature.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        assert!(signed.to_query_string().ends_with(&format!("&signature={}", signed.signature)));
    }

    #[test]
    fn test_recv_window_follows_timestamp() {
        let signer = RequestSigner::new("secret").unwrap().with_recv_window(Some(5000));
        let signed = signer.sign_at(&[("symbol", "ETHUSDT".to_string())], 42).unwrap();
        assert_eq!(signed.query, "symbol=ETHUSDT&timestamp=42&recvWindow=5000");
    }

    fn timestamp_of(signed: &SignedQuery) -> i64 {
        signed
            .query
            .split('&')
            .find_map(|pair| pair.strip_prefix("timestamp="))
            .and_then(|ts| ts.parse().ok())
            .unwrap()
    }

    #[test]
    fn test_sign_uses_fresh_timestamp_per_request() {
        let signer = RequestSigner::new("secret").unwrap();
        let params = [("symbol", "BTCUSDT".to_string())];

        let before = Utc::now().timestamp_millis();
        let first = signer.sign(&params).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = signer.sign(&params).unwrap();
        let after = Utc::now().timestamp_millis();

        let (t1, t2) = (timestamp_of(&first), timestamp_of(&second));
        assert!(before <= t1 && t1 < t2 && t2 <= after, "{} {} {} {}", before, t1, t2, after);
        assert_ne!(first.signature, second.signature);
        assert_eq!(second.signature, signer.signature_for(&second.query).unwrap());
    }

    #[test]
    fn test_debug_hides_secret() {
        let signer = RequestSigner::new("top-secret").unwrap();
        assert!(!format!("{:?}", signer).contains("top-secret"));
    }
}
