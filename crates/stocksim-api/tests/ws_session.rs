//! WebSocket 세션 종단 간 테스트
//!
//! 실제 서버를 임의 포트에 띄우고 tokio-tungstenite 클라이언트로 접속합니다.

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;
use stocksim_api::{create_router, AppState};
use stocksim_core::{
    AppConfig, HoldingTable, Market, MemorySnapshotStore, PriceTable, SimulationConfig, Symbol,
};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start_server(simulation: SimulationConfig) -> (SocketAddr, Arc<AppState>) {
    let mut prices = PriceTable::new();
    prices.insert(Symbol::new("AAPL"), dec!(100));
    prices.insert(Symbol::new("MSFT"), dec!(50));
    let store = Arc::new(MemorySnapshotStore::new(prices, HoldingTable::new()));

    let config = AppConfig {
        simulation,
        ..Default::default()
    };
    let market = Market::bootstrap(config.simulation.clone(), &config.storage, store)
        .await
        .unwrap();
    let state = Arc::new(AppState::new(market, config));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = create_router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, state)
}

async fn connect(addr: SocketAddr) -> (Client, Value) {
    let (mut client, _) = connect_async(format!("ws://{addr}/ws/stocks"))
        .await
        .unwrap();
    let welcome = next_json(&mut client).await;
    assert_eq!(welcome["type"], "welcome");
    (client, welcome)
}

async fn send(client: &mut Client, json: &str) {
    client.send(Message::Text(json.to_string())).await.unwrap();
}

async fn next_json(client: &mut Client) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("server reply timed out")
            .expect("connection closed")
            .unwrap();
        if msg.is_text() {
            return serde_json::from_str(msg.to_text().unwrap()).unwrap();
        }
    }
}

fn balance_of(msg: &Value) -> Decimal {
    Decimal::from_str(msg["balance"].as_str().unwrap()).unwrap()
}

fn simulation(starting_balance: Decimal) -> SimulationConfig {
    SimulationConfig {
        starting_balance,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_trade_balance_and_update_flow() {
    let (addr, state) = start_server(simulation(dec!(1000))).await;
    let (mut client, welcome) = connect(addr).await;
    assert_eq!(welcome["session_id"], 1);

    // 승인된 거래에는 응답이 없음
    send(&mut client, r#"{"quantities":[{"symbol":"AAPL","quantity":"5"}]}"#).await;

    send(&mut client, r#"{"type":"balance"}"#).await;
    let reply = next_json(&mut client).await;
    assert_eq!(reply["type"], "balance");
    assert_eq!(balance_of(&reply), dec!(500));

    // 보유 수량 초과 매도는 조용히 거절
    send(&mut client, r#"{"type":"trade","quantities":[{"symbol":"AAPL","quantity":-10}]}"#).await;

    send(&mut client, r#"{"type":"update"}"#).await;
    let reply = next_json(&mut client).await;
    assert_eq!(reply["type"], "update");
    assert_eq!(reply["stocks"][0]["symbol"], "AAPL");
    assert_eq!(reply["stocks"][0]["held"], 5);
    assert_eq!(balance_of(&reply), dec!(500));

    // 유일한 세션이므로 이번 update 에서 가격이 진행됨
    assert_eq!(state.market.prices().get().await.round, 1);
    assert_eq!(
        state.market.ledger().held(&Symbol::new("AAPL")).await,
        Some(5)
    );
}

#[tokio::test]
async fn test_bad_requests_get_errors_and_keep_connection() {
    let (addr, state) = start_server(simulation(dec!(1000))).await;
    let (mut client, _) = connect(addr).await;

    send(&mut client, "not json").await;
    let reply = next_json(&mut client).await;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["code"], "INVALID_MESSAGE");

    send(&mut client, r#"{"type":"dance"}"#).await;
    let reply = next_json(&mut client).await;
    assert_eq!(reply["code"], "UNKNOWN_MESSAGE_TYPE");

    send(&mut client, r#"{"quantities":[{"symbol":"NOPE","quantity":"1"}]}"#).await;
    let reply = next_json(&mut client).await;
    assert_eq!(reply["code"], "UNKNOWN_SYMBOL");

    // 연결은 여전히 유효
    send(&mut client, r#"{"type":"balance"}"#).await;
    let reply = next_json(&mut client).await;
    assert_eq!(balance_of(&reply), dec!(1000));
    assert_eq!(state.market.ledger().get().await.version, 0);
}

#[tokio::test]
async fn test_rejected_trade_notification_when_enabled() {
    let config = SimulationConfig {
        notify_rejected_trades: true,
        ..simulation(dec!(1000))
    };
    let (addr, _state) = start_server(config).await;
    let (mut client, _) = connect(addr).await;

    // 10 * 100 = 1000, 잔고를 정확히 소진하는 요청은 거절
    send(&mut client, r#"{"quantities":[{"symbol":"AAPL","quantity":"10"}]}"#).await;
    let reply = next_json(&mut client).await;
    assert_eq!(reply["type"], "trade_rejected");
    assert!(reply["reason"].as_str().unwrap().contains("insufficient balance"));
}

#[tokio::test]
async fn test_only_oldest_session_ticks_and_disconnect_hands_over() {
    let (addr, state) = start_server(simulation(dec!(1000))).await;
    let (mut first, _) = connect(addr).await;
    let (mut second, _) = connect(addr).await;

    send(&mut second, r#"{"type":"update"}"#).await;
    next_json(&mut second).await;
    assert_eq!(state.market.prices().get().await.round, 0);

    send(&mut first, r#"{"type":"update"}"#).await;
    next_json(&mut first).await;
    assert_eq!(state.market.prices().get().await.round, 1);

    first.close(None).await.unwrap();

    // 서버가 첫 세션을 정리할 때까지 대기
    for _ in 0..100 {
        if state.market.registry().len().await == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(state.market.registry().len().await, 1);

    send(&mut second, r#"{"type":"update"}"#).await;
    next_json(&mut second).await;
    assert_eq!(state.market.prices().get().await.round, 2);
}
