//! WebSocket 거래 서버 및 REST API.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 세션별 거래 프로토콜을 처리하는 WebSocket 서버
//! - 현재 가격표/원장 스냅샷 REST 엔드포인트
//! - 헬스 체크 엔드포인트
//! - Prometheus 메트릭
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST 엔드포인트 및 전체 라우터
//! - [`websocket`]: 세션 WebSocket 서버
//! - [`metrics`]: Prometheus 메트릭 수집

pub mod metrics;
pub mod routes;
pub mod state;
pub mod websocket;

pub use metrics::setup_metrics_recorder;
pub use routes::create_router;
pub use state::AppState;
