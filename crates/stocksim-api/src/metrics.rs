//! Prometheus 메트릭 설정 및 유틸리티.
//!
//! 거래/틱/연결 메트릭을 수집하고 `/metrics` 엔드포인트로 노출합니다.
//! 레코더가 설치되지 않은 상태(테스트 등)에서는 모든 기록이 무시됩니다.

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use stocksim_core::TradeDecision;

/// Prometheus 메트릭 레코더를 설치하고 핸들을 반환합니다.
///
/// 레코더가 이미 설치되어 있으면 에러입니다.
pub fn setup_metrics_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// 거래 결과 카운터 증가.
pub fn record_trade(decision: &TradeDecision) {
    let outcome = if decision.is_accepted() {
        "accepted"
    } else {
        "rejected"
    };
    counter!("stocksim_trades_total", "outcome" => outcome).increment(1);
}

/// 가격 틱 카운터 증가.
pub fn record_tick() {
    counter!("stocksim_price_ticks_total").increment(1);
}

/// 클라이언트 요청 에러 카운터 증가.
pub fn record_request_error(code: &str) {
    counter!("stocksim_request_errors_total", "code" => code.to_string()).increment(1);
}

/// WebSocket 연결 수 증가.
pub fn increment_websocket_connections() {
    gauge!("websocket_connections_active").increment(1.0);
}

/// WebSocket 연결 수 감소.
pub fn decrement_websocket_connections() {
    gauge!("websocket_connections_active").decrement(1.0);
}
