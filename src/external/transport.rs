//! 거래소 REST 전송 계층

use std::time::Duration;

use log::debug;
use reqwest::Client;
use url::Url;

use crate::error::{Result, SyncError};
use crate::external::signer::SignedQuery;

/// API 키 헤더
pub const API_KEY_HEADER: &str = "X-MBX-APIKEY";

/// 서명된 GET 요청을 수행하는 전송 계층 트레이트
pub trait TradeTransport {
    async fn get_signed(&self, path: &str, signed: &SignedQuery) -> Result<serde_json::Value>;
}

/// reqwest 기반 HTTP 전송 계층
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl HttpTransport {
    pub fn new(base_url: Url, api_key: &str, timeout: Duration) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(SyncError::Config("API 키가 비어 있습니다".to_string()));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_string(),
        })
    }

    /// 기본 URL 경로 아래에 API 경로를 붙임 (프록시 경로 접두사 유지)
    fn endpoint(&self, path: &str, signed: &SignedQuery) -> Result<String> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let prefixed = format!("{}/", base.path());
            base.set_path(&prefixed);
        }
        let url = base
            .join(path.trim_start_matches('/'))
            .map_err(|e| SyncError::Config(format!("잘못된 API 경로 {}: {}", path, e)))?;
        Ok(format!("{}?{}", url, signed.to_query_string()))
    }
}

impl TradeTransport for HttpTransport {
    async fn get_signed(&self, path: &str, signed: &SignedQuery) -> Result<serde_json::Value> {
        let endpoint = self.endpoint(path, signed)?;
        debug!("GET {}?{}", path, signed.query);

        // 에러 응답도 {code, msg} 본문을 담고 오므로 상태 코드와 무관하게 본문을 파싱합니다
        let response = self
            .client
            .get(&endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        debug!("응답 상태: {} ({} bytes)", status, body.len());

        Ok(serde_json::from_str(&body)?)
    }
}
