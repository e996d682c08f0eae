//! 스냅샷 조회 endpoint.
//!
//! 메모리에 있는 현재 가격표와 원장을 스냅샷 파일과 같은 형식으로 반환합니다.
//!
//! # 엔드포인트
//!
//! - `GET /stock-data/stocksJson` - 가격표
//! - `GET /stock-data/globalJson` - 원장

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use stocksim_data::{LedgerFile, PriceFile};

use crate::state::AppState;

/// 현재 가격표 조회.
pub async fn get_prices(State(state): State<Arc<AppState>>) -> Json<PriceFile> {
    let snapshot = state.market.prices().get().await;
    Json(PriceFile::from_table(&snapshot.prices))
}

/// 현재 원장 조회.
pub async fn get_ledger(State(state): State<Arc<AppState>>) -> Json<LedgerFile> {
    let snapshot = state.market.ledger().get().await;
    Json(LedgerFile::from_table(&snapshot.holdings))
}

/// 스냅샷 조회 라우터 생성.
pub fn stock_data_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stocksJson", get(get_prices))
        .route("/globalJson", get(get_ledger))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use rust_decimal_macros::dec;
    use stocksim_core::{Symbol, TradeRequest};
    use tower::ServiceExt;

    use crate::state::create_test_state;

    #[tokio::test]
    async fn test_prices_endpoint() {
        let state = create_test_state().await;
        let app = stock_data_router().with_state(state);

        let response = app
            .oneshot(Request::builder().uri("/stocksJson").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let prices: PriceFile = serde_json::from_slice(&body).unwrap();

        assert_eq!(prices.stocks.len(), 2);
        assert_eq!(prices.stocks[0].symbol, Symbol::new("AAPL"));
        assert_eq!(prices.stocks[0].price, dec!(100));
    }

    #[tokio::test]
    async fn test_ledger_endpoint_reflects_trades() {
        let state = create_test_state().await;
        let session = state.market.open_session().await.unwrap();
        session
            .trade(&TradeRequest::from_pairs([("MSFT", 3)]))
            .await
            .unwrap();

        let app = stock_data_router().with_state(state);
        let response = app
            .oneshot(Request::builder().uri("/globalJson").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let ledger: LedgerFile = serde_json::from_slice(&body).unwrap();

        let msft = ledger
            .stocks
            .iter()
            .find(|entry| entry.symbol.as_str() == "MSFT")
            .unwrap();
        assert_eq!(msft.held, 3);
    }
}
