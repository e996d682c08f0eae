//! API 라우트.
//!
//! 모든 REST 엔드포인트를 정의하고 전체 라우터를 구성합니다.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - 상세 헬스 체크 (readiness)
//! - `/stock-data/stocksJson` - 현재 가격표
//! - `/stock-data/globalJson` - 현재 원장
//! - `/metrics` - Prometheus 메트릭
//! - `/ws/stocks` - 거래 세션 WebSocket

pub mod health;
pub mod stock_data;

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use tower_http::trace::TraceLayer;

pub use health::{health_router, ComponentHealth, ComponentStatus, HealthResponse, MarketStats};
pub use stock_data::stock_data_router;

use crate::state::AppState;
use crate::websocket::websocket_router;

/// /metrics 엔드포인트 핸들러.
async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::NOT_FOUND,
            "metrics recorder not installed".to_string(),
        ),
    }
}

/// 전체 라우터 생성.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/health", health_router())
        .nest("/stock-data", stock_data_router())
        .nest("/ws", websocket_router())
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
