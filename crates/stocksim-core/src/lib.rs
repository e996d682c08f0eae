//! # Stocksim Core
//!
//! 실시간 모의 주식 거래 시뮬레이터의 핵심 도메인을 제공합니다.
//!
//! 이 크레이트는 여러 세션이 동시에 접근하는 공유 상태와
//! 세션별 프로토콜 상태 머신을 담당합니다:
//! - 가격표 (`PriceBook`) 및 랜덤 워크 틱
//! - 전역 보유 수량 원장 (`Ledger`)
//! - 세션별 포트폴리오 (`Portfolio`) 와 거래 검증 (`validate_trade`)
//! - 세션 레지스트리 및 틱 담당 세션 선출 (`TickCoordinator`)
//! - 세션 엔진 (`Session`) 과 공유 서비스 묶음 (`Market`)
//! - 스냅샷 저장소 인터페이스, 설정, 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod market;
pub mod session;
pub mod types;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use market::{Market, SnapshotWriter};
pub use session::{
    BalanceReply, HoldingView, PortfolioView, Session, SessionReply, SessionRequest, SessionState,
};
pub use types::*;
