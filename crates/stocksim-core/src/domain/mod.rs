//! 시뮬레이터 도메인 모델.
//!
//! 공유 상태(가격표, 원장, 세션 레지스트리)와 세션 전용 상태(포트폴리오),
//! 그리고 이들 사이의 순수 로직(거래 검증, 틱 담당 선출)을 정의합니다.

pub mod ledger;
pub mod portfolio;
pub mod price_book;
pub mod registry;
pub mod request;
pub mod snapshot;
pub mod tick;
pub mod validator;

pub use ledger::{HoldingTable, Ledger, LedgerSnapshot};
pub use portfolio::{Portfolio, Settlement, SharedPortfolio};
pub use price_book::{random_walk, PriceBook, PriceSnapshot, PriceTable};
pub use registry::SessionRegistry;
pub use request::{parse_quantity, TradeRequest};
pub use snapshot::{MemorySnapshotStore, SnapshotStore};
pub use tick::TickCoordinator;
pub use validator::{validate_trade, RejectReason, TradeDecision};
