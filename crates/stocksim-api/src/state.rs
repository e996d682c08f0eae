//! 애플리케이션 상태.
//!
//! 모든 핸들러가 공유하는 상태입니다. 시장 상태 자체는 [`Market`] 이
//! 소유하며, 여기서는 핸들과 서버 메타데이터만 보관합니다.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use stocksim_core::{AppConfig, Market};

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 공유 시장 상태
    pub market: Arc<Market>,
    /// 전체 설정
    pub config: AppConfig,
    /// Prometheus 핸들 (레코더 설치 시)
    pub metrics: Option<PrometheusHandle>,
    /// 서버 시작 시간
    pub started_at: chrono::DateTime<chrono::Utc>,
    /// API 버전
    pub version: String,
}

impl AppState {
    /// 새 상태를 생성합니다.
    pub fn new(market: Arc<Market>, config: AppConfig) -> Self {
        Self {
            market,
            config,
            metrics: None,
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Prometheus 핸들을 설정합니다.
    pub fn with_metrics(mut self, handle: Option<PrometheusHandle>) -> Self {
        self.metrics = handle;
        self
    }

    /// 거절된 거래를 클라이언트에게 알릴지 여부.
    pub fn notify_rejected_trades(&self) -> bool {
        self.market.config().notify_rejected_trades
    }

    /// 서버 업타임(초).
    pub fn uptime_secs(&self) -> i64 {
        chrono::Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds()
    }
}

#[cfg(test)]
pub(crate) async fn create_test_state() -> Arc<AppState> {
    create_test_state_with_store().await.0
}

#[cfg(test)]
pub(crate) async fn create_test_state_with_store(
) -> (Arc<AppState>, Arc<stocksim_core::MemorySnapshotStore>) {
    use rust_decimal_macros::dec;
    use stocksim_core::{HoldingTable, MemorySnapshotStore, PriceTable, Symbol};

    let mut prices = PriceTable::new();
    prices.insert(Symbol::new("AAPL"), dec!(100));
    prices.insert(Symbol::new("MSFT"), dec!(50));
    let store = Arc::new(MemorySnapshotStore::new(prices, HoldingTable::new()));

    let config = AppConfig::default();
    let market = Market::bootstrap(config.simulation.clone(), &config.storage, store.clone())
        .await
        .expect("test market");
    (Arc::new(AppState::new(market, config)), store)
}
