use anyhow::Context;
use log::{info, warn};

use trade_ledger_sync::{run_once, SyncConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 환경 변수 로드 (.env 는 선택)
    dotenv::dotenv().ok();

    // 로깅 초기화
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("체결 원장 동기화 시작");

    // 설정 로드 (자격 증명 오류는 여기서 종료)
    let config = SyncConfig::from_env().context("설정 로드 실패")?;
    info!("설정: {:?}", config);

    let report = run_once(&config).await.context("동기화 실패")?;

    for symbol in &report.symbols {
        if symbol.has_new_trades() {
            info!("  ✅ {}", symbol);
        } else if symbol.failure.is_some() {
            warn!("  ⚠️ {}", symbol);
        } else {
            info!("  ➖ {}", symbol);
        }
    }
    info!("✅ 원장 업데이트 완료: 새 체결 {}건", report.total_new_rows());

    Ok(())
}
