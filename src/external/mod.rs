//! 외부 거래소 연동 모듈
//!
//! 요청 서명, REST 전송 계층, 체결 내역 조회기를 제공합니다.

pub mod model;
pub mod signer;
pub mod trade_fetcher;
pub mod transport;

pub use model::{Trade, TradeKey};
pub use signer::{RequestSigner, SignedQuery};
pub use trade_fetcher::{parse_trades_response, FetchOutcome, TradeFetcher};
pub use transport::{HttpTransport, TradeTransport};
