//! 거래소 체결 내역 증분 동기화
//!
//! 거래소 REST API의 체결 내역(myTrades)을 원장에 중복 없이 이어 붙입니다.
//! 설정, 전송 계층, 원장 저장소는 실행마다 새로 만들어 오케스트레이터에 넘깁니다.

pub mod config;
pub mod db;
pub mod error;
pub mod external;
pub mod ledger;
pub mod sync;

use log::info;

pub use config::SyncConfig;
pub use error::{Result, SyncError};
pub use sync::{SyncOrchestrator, SyncReport};

use crate::db::{init_database, SheetRepository};
use crate::external::{HttpTransport, RequestSigner, TradeFetcher};
use crate::ledger::LedgerAdapter;

/// 설정으로부터 구성 요소를 만들고 한 번 동기화
///
/// 서명기와 전송 계층을 먼저 만들어 자격 증명 오류가 저장소 접근 전에 드러나게 합니다.
pub async fn run_once(config: &SyncConfig) -> Result<SyncReport> {
    config.validate()?;

    let signer = RequestSigner::new(&config.api_secret)?.with_recv_window(config.recv_window);
    let transport = HttpTransport::new(config.base_url.clone(), &config.api_key, config.request_timeout)?;
    let fetcher = TradeFetcher::new(transport, signer).with_page_limit(config.page_limit);

    let pool = init_database(&config.database_url).await?;
    let ledger = LedgerAdapter::new(SheetRepository::new(pool.clone(), &config.sheet));
    info!("원장: {} (시트 {})", config.database_url, config.sheet);

    let orchestrator = SyncOrchestrator::new(fetcher, ledger, config.policy.clone());
    let report = orchestrator.run().await;

    pool.close().await;
    report
}
