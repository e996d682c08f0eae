//! 헬스 체크 endpoint.
//!
//! 서버 상태 확인을 위한 헬스 체크 엔드포인트를 제공합니다.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::state::AppState;

/// 헬스 체크 응답 구조체.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// 전체 서비스 상태 ("healthy" | "degraded")
    pub status: String,

    /// API 버전
    pub version: String,

    /// 서버 업타임(초)
    pub uptime_secs: i64,

    /// 현재 시간 (ISO 8601)
    pub timestamp: String,

    /// 개별 컴포넌트 상태
    pub components: ComponentHealth,

    /// 시장 상태 요약
    pub market: MarketStats,
}

/// 개별 컴포넌트 상태.
#[derive(Debug, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// 가격표 상태
    pub price_book: ComponentStatus,

    /// 스냅샷 저장소 상태
    pub snapshot_store: ComponentStatus,
}

/// 컴포넌트 상태.
#[derive(Debug, Serialize, Deserialize)]
pub struct ComponentStatus {
    /// 상태 ("up" | "down")
    pub status: String,

    /// 추가 정보 (선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentStatus {
    /// 비정상 상태.
    pub fn down(message: impl Into<String>) -> Self {
        Self {
            status: "down".to_string(),
            message: Some(message.into()),
        }
    }

    /// 정보 포함 정상 상태.
    pub fn up_with_info(message: impl Into<String>) -> Self {
        Self {
            status: "up".to_string(),
            message: Some(message.into()),
        }
    }
}

/// 시장 상태 요약.
#[derive(Debug, Serialize, Deserialize)]
pub struct MarketStats {
    /// 열린 세션 수
    pub sessions: usize,
    /// 틱 담당 세션
    pub tick_driver: Option<u64>,
    /// 심볼 수
    pub symbols: usize,
    /// 가격 라운드
    pub price_round: u64,
    /// 원장 버전
    pub ledger_version: u64,
}

/// 간단한 헬스 체크 (liveness probe용).
///
/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// 상세 헬스 체크 (readiness probe용).
///
/// GET /health/ready
pub async fn health_ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let market = &state.market;
    let prices = market.prices().get().await;
    let ledger = market.ledger().get().await;

    // 시장은 빈 가격표로 시작할 수 없으므로 가격표는 항상 사용 가능
    let price_book = ComponentStatus::up_with_info(format!(
        "{} symbols, round {}",
        prices.prices.len(),
        prices.round
    ));

    // 저장 실패는 degraded로 처리 (메모리 상태로 계속 서비스)
    let (status, snapshot_store) = match market.snapshots().last_failure().await {
        None => ("healthy", ComponentStatus::up_with_info(market.store_name())),
        Some(error) => (
            "degraded",
            ComponentStatus::down(format!("{}: {}", market.store_name(), error)),
        ),
    };

    let response = HealthResponse {
        status: status.to_string(),
        version: state.version.clone(),
        uptime_secs: state.uptime_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        components: ComponentHealth {
            price_book,
            snapshot_store,
        },
        market: MarketStats {
            sessions: market.registry().len().await,
            tick_driver: market.registry().leader().await.map(|id| id.value()),
            symbols: prices.prices.len(),
            price_round: prices.round,
            ledger_version: ledger.version,
        },
    };

    (StatusCode::OK, Json(response))
}

/// 헬스 체크 라우터 생성.
pub fn health_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(health_check))
        .route("/ready", get(health_ready))
}
