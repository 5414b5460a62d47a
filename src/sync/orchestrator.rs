//! 동기화 오케스트레이터
//!
//! 심볼을 하나씩 순서대로 처리합니다.
//! - 적재: 원장의 기존 (심볼, ID) 목록과 커서
//! - 조회: 커서 다음 ID부터 한 페이지씩
//! - 필터: 이미 기록됐거나 제외 목록에 있는 체결 제거
//! - 기록: 새 행을 한 배치로 추가한 뒤에만 커서 이동
//! - 마무리: 실행 끝에 커서 맵 전체를 한 번 저장

use std::collections::HashSet;

use log::{debug, error, info, warn};

use crate::error::Result;
use crate::external::model::TradeKey;
use crate::external::trade_fetcher::{FetchOutcome, TradeFetcher};
use crate::external::transport::TradeTransport;
use crate::ledger::{CursorMap, LedgerAdapter, LedgerStore, Row};
use crate::sync::policy::{SyncMode, SyncPolicy};
use crate::sync::report::{FetchFailure, SymbolReport, SyncReport};
use crate::sync::transform::to_ledger_row;

/// 동기화 오케스트레이터
pub struct SyncOrchestrator<T: TradeTransport, S: LedgerStore> {
    fetcher: TradeFetcher<T>,
    ledger: LedgerAdapter<S>,
    policy: SyncPolicy,
}

impl<T: TradeTransport, S: LedgerStore> SyncOrchestrator<T, S> {
    pub fn new(fetcher: TradeFetcher<T>, ledger: LedgerAdapter<S>, policy: SyncPolicy) -> Self {
        Self {
            fetcher,
            ledger,
            policy,
        }
    }

    pub fn ledger(&self) -> &LedgerAdapter<S> {
        &self.ledger
    }

    /// 한 번 실행
    ///
    /// 심볼별 조회 실패는 보고서에 남기고 다음 심볼로 넘어갑니다.
    /// 저장소 오류는 실행을 중단시키며, 그 전까지 기록이 끝난 심볼의 커서만 저장합니다.
    pub async fn run(&self) -> Result<SyncReport> {
        info!("🔄 체결 동기화 시작 (심볼 {}개, 모드 {:?})", self.policy.symbols.len(), self.policy.mode);

        if self.policy.mode == SyncMode::FullResync {
            self.ledger.reset().await?;
        }

        let mut report = SyncReport {
            header_written: self.ledger.ensure_header().await?,
            ..SyncReport::default()
        };

        let mut known = self.ledger.read_existing_ids().await?;
        let persisted = self.ledger.read_cursors().await?;
        let mut cursors = persisted.clone();
        for symbol in &self.policy.symbols {
            cursors.track(symbol);
        }

        for symbol in &self.policy.symbols {
            match self.sync_symbol(symbol, &mut known, &mut cursors).await {
                Ok(symbol_report) => {
                    debug!("{}", symbol_report);
                    report.symbols.push(symbol_report);
                }
                Err(e) => {
                    error!("{} 동기화 중단: {}", symbol, e);
                    if cursors != persisted {
                        if let Err(write_err) = self.ledger.write_cursor(&cursors).await {
                            error!("커서 저장 실패: {}", write_err);
                        }
                    }
                    return Err(e);
                }
            }
        }

        if cursors != persisted {
            self.ledger.write_cursor(&cursors).await?;
            report.cursors_written = true;
        }

        info!("✅ 체결 동기화 완료: {}", report);
        Ok(report)
    }

    /// 심볼 하나 동기화
    ///
    /// 추가가 성공한 페이지만큼만 `cursors` 가 앞으로 이동합니다.
    async fn sync_symbol(
        &self,
        symbol: &str,
        known: &mut HashSet<TradeKey>,
        cursors: &mut CursorMap,
    ) -> Result<SymbolReport> {
        let mut report = SymbolReport::new(symbol, cursors.get(symbol));
        let mut from_id = self.start_id(symbol, cursors.get(symbol));

        loop {
            if report.pages >= self.policy.max_pages {
                warn!("{} 최대 페이지 수({}) 도달, 다음 실행에서 이어감", symbol, self.policy.max_pages);
                break;
            }

            let outcome = self.fetcher.fetch(symbol, Some(from_id)).await?;
            report.pages += 1;

            let trades = match outcome {
                FetchOutcome::Trades(trades) => trades,
                other => {
                    report.failure = FetchFailure::from_outcome(&other);
                    break;
                }
            };
            if trades.is_empty() {
                break;
            }

            let mut rows: Vec<Row> = Vec::new();
            let mut page_max: Option<u64> = None;
            for trade in &trades {
                if trade.symbol != symbol {
                    warn!("{} 요청에 다른 심볼 체결 {} 수신, 건너뜀", symbol, trade.key());
                    report.skipped_foreign += 1;
                    continue;
                }
                page_max = page_max.max(Some(trade.id));

                let key = trade.key();
                if self.policy.exclude.contains(&key) {
                    report.skipped_excluded += 1;
                    continue;
                }
                if !known.insert(key) {
                    report.skipped_known += 1;
                    continue;
                }
                rows.push(to_ledger_row(trade, &self.policy.display_offset));
            }

            // 추가가 실패하면 커서는 움직이지 않습니다
            self.ledger.append(&rows).await?;
            report.new_rows += rows.len();

            // 기존/제외 체결도 처리된 ID로 보고 커서를 넘깁니다. 새 행이 없는 페이지도 진행으로 칩니다
            let advanced = match page_max {
                Some(max_id) => cursors.advance(symbol, max_id),
                None => false,
            };
            report.cursor_after = cursors.get(symbol);

            if !advanced || !self.policy.drain_pages {
                break;
            }
            if let Some(cursor) = report.cursor_after {
                from_id = cursor + 1;
            }
        }

        Ok(report)
    }

    /// 첫 페이지 요청 ID
    ///
    /// 커서가 있으면 그 다음 ID, 없으면 설정된 시작 ID, 둘 다 없으면 0.
    /// `fromId` 를 빼면 거래소는 최근 페이지만 주므로 항상 지정합니다.
    fn start_id(&self, symbol: &str, cursor: Option<u64>) -> u64 {
        match cursor {
            Some(cursor) => cursor + 1,
            None => self.policy.genesis_ids.get(symbol).copied().unwrap_or(0),
        }
    }
}
