//! 실행 설정
//!
//! `.env` 및 환경 변수에서 읽습니다. 필수 값이 없거나 형식이 잘못되면
//! 네트워크/저장소 접근 전에 설정 오류로 실패합니다.

use std::time::Duration;

use url::Url;

use crate::error::{Result, SyncError};
use crate::external::trade_fetcher::MAX_PAGE_LIMIT;
use crate::sync::policy::{
    offset_from_hours, parse_genesis_ids, ExcludeSet, SyncMode, SyncPolicy,
    DEFAULT_UTC_OFFSET_HOURS,
};

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://trade_ledger.db?mode=rwc";
pub const DEFAULT_SHEET: &str = "trades";

/// 동기화 실행 설정
#[derive(Clone)]
pub struct SyncConfig {
    pub api_key: String,
    pub api_secret: String,
    pub base_url: Url,
    pub recv_window: Option<u64>,
    pub request_timeout: Duration,
    pub database_url: String,
    pub sheet: String,
    pub page_limit: Option<u32>,
    pub policy: SyncPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_secret: String::new(),
            base_url: Url::parse(DEFAULT_BASE_URL).expect("기본 API URL"),
            recv_window: None,
            request_timeout: Duration::from_secs(10),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            sheet: DEFAULT_SHEET.to_string(),
            page_limit: Some(MAX_PAGE_LIMIT),
            policy: SyncPolicy::default(),
        }
    }
}

impl std::fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncConfig")
            .field("api_key", &"***")
            .field("api_secret", &"***")
            .field("base_url", &self.base_url.as_str())
            .field("recv_window", &self.recv_window)
            .field("request_timeout", &self.request_timeout)
            .field("database_url", &self.database_url)
            .field("sheet", &self.sheet)
            .field("page_limit", &self.page_limit)
            .field("policy", &self.policy)
            .finish()
    }
}

impl SyncConfig {
    /// 프로세스 환경 변수에서 로드
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 키 조회 함수로부터 로드
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        config.api_key = get("BINANCE_API_KEY")
            .ok_or_else(|| SyncError::Config("BINANCE_API_KEY 가 설정되지 않았습니다".to_string()))?;
        config.api_secret = get("BINANCE_API_SECRET")
            .ok_or_else(|| SyncError::Config("BINANCE_API_SECRET 가 설정되지 않았습니다".to_string()))?;

        if let Some(base_url) = get("BINANCE_BASE_URL") {
            config.base_url = Url::parse(&base_url)
                .map_err(|e| SyncError::Config(format!("BINANCE_BASE_URL 형식 오류: {}", e)))?;
        }
        config.recv_window = get("BINANCE_RECV_WINDOW")
            .map(|v| parse_number::<u64>("BINANCE_RECV_WINDOW", &v))
            .transpose()?;
        if let Some(secs) = get("BINANCE_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(parse_number("BINANCE_TIMEOUT_SECS", &secs)?);
        }

        if let Some(database_url) = get("LEDGER_DATABASE_URL") {
            config.database_url = database_url;
        }
        if let Some(sheet) = get("LEDGER_SHEET") {
            config.sheet = sheet;
        }

        if let Some(limit) = get("SYNC_PAGE_LIMIT") {
            let limit: u32 = parse_number("SYNC_PAGE_LIMIT", &limit)?;
            if limit == 0 || limit > MAX_PAGE_LIMIT {
                return Err(SyncError::Config(format!(
                    "SYNC_PAGE_LIMIT 는 1~{} 사이여야 합니다: {}",
                    MAX_PAGE_LIMIT, limit
                )));
            }
            config.page_limit = Some(limit);
        }

        let policy = &mut config.policy;
        if let Some(symbols) = get("SYNC_SYMBOLS") {
            policy.symbols = symbols
                .split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(exclude) = get("SYNC_EXCLUDE_IDS") {
            policy.exclude = ExcludeSet::parse(&exclude)?;
        }
        if let Some(genesis) = get("SYNC_GENESIS_IDS") {
            policy.genesis_ids = parse_genesis_ids(&genesis)?;
        }
        if let Some(mode) = get("SYNC_MODE") {
            policy.mode = mode.parse::<SyncMode>()?;
        }
        if let Some(drain) = get("SYNC_DRAIN") {
            policy.drain_pages = parse_bool("SYNC_DRAIN", &drain)?;
        }
        if let Some(max_pages) = get("SYNC_MAX_PAGES") {
            policy.max_pages = parse_number("SYNC_MAX_PAGES", &max_pages)?;
        }
        let offset_hours = match get("SYNC_UTC_OFFSET_HOURS") {
            Some(hours) => parse_number("SYNC_UTC_OFFSET_HOURS", &hours)?,
            None => DEFAULT_UTC_OFFSET_HOURS,
        };
        policy.display_offset = offset_from_hours(offset_hours)?;

        config.validate()?;
        Ok(config)
    }

    /// 필수 값 검증
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(SyncError::Config("API 키가 비어 있습니다".to_string()));
        }
        if self.api_secret.trim().is_empty() {
            return Err(SyncError::Config("API 시크릿이 비어 있습니다".to_string()));
        }
        if self.policy.symbols.is_empty() {
            return Err(SyncError::Config("동기화할 심볼이 없습니다".to_string()));
        }
        if self.policy.max_pages == 0 {
            return Err(SyncError::Config("SYNC_MAX_PAGES 는 1 이상이어야 합니다".to_string()));
        }
        Ok(())
    }
}

fn parse_number<N: std::str::FromStr>(key: &str, value: &str) -> Result<N> {
    value
        .parse::<N>()
        .map_err(|_| SyncError::Config(format!("{} 숫자 형식 오류: {}", key, value)))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(SyncError::Config(format!("{} 불리언 형식 오류: {}", key, value))),
    }
}
