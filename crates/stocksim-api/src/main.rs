//! 모의 주식 거래 서버.
//!
//! 스냅샷 파일에서 가격표와 원장을 읽어 시장을 구성하고,
//! WebSocket 거래 세션과 REST 조회 엔드포인트를 제공합니다.

use std::sync::Arc;

use anyhow::Context;
use stocksim_api::{create_router, setup_metrics_recorder, AppState};
use stocksim_core::{init_logging, AppConfig, LogConfig, Market};
use stocksim_data::JsonFileStore;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    // 설정 로드
    let config = AppConfig::load_default().context("failed to load configuration")?;

    // tracing 초기화
    init_logging(LogConfig::from_settings(&config.logging)).map_err(|e| anyhow::anyhow!(e))?;

    info!("Starting stock simulator server...");

    // Prometheus 메트릭 레코더 설정
    let metrics_handle = match setup_metrics_recorder() {
        Ok(handle) => {
            info!("Prometheus metrics recorder initialized");
            Some(handle)
        }
        Err(e) => {
            warn!(error = %e, "Prometheus recorder unavailable, /metrics disabled");
            None
        }
    };

    // 스냅샷 저장소와 시장 구성
    let store = Arc::new(JsonFileStore::from_config(&config.storage));
    info!(
        prices = %store.prices_path().display(),
        ledger = %store.ledger_path().display(),
        "Loading snapshots"
    );
    let market = Market::bootstrap(config.simulation.clone(), &config.storage, store)
        .await
        .context("failed to bootstrap market from snapshots")?;

    let addr = config.server.bind_addr();
    let state = Arc::new(AppState::new(market, config).with_metrics(metrics_handle));
    info!(version = %state.version, "Application state initialized");

    // 라우터 생성
    let app = create_router(state);

    // 서버 시작
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "Server listening");
    info!("WebSocket available at ws://{}/ws/stocks", addr);
    info!("Metrics available at http://{}/metrics", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped gracefully");

    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 반환합니다.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
