//! 세션 엔진 통합 테스트
//!
//! 여러 세션이 같은 시장을 동시에 사용할 때의 원장 보존, 틱 단일성,
//! 거절 거래의 무변경을 검증합니다.

use std::sync::Arc;

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use stocksim_core::{
    HoldingTable, Market, MemorySnapshotStore, PriceTable, SessionReply, SessionRequest,
    SimulationConfig, StorageConfig, Symbol, TradeDecision, TradeRequest,
};

const SYMBOLS: [&str; 3] = ["AAPL", "MSFT", "NVDA"];

async fn market_with(starting_balance: Decimal) -> (Arc<Market>, Arc<MemorySnapshotStore>) {
    let mut prices = PriceTable::new();
    prices.insert(Symbol::new("AAPL"), dec!(100));
    prices.insert(Symbol::new("MSFT"), dec!(40));
    prices.insert(Symbol::new("NVDA"), dec!(7.5));
    let store = Arc::new(MemorySnapshotStore::new(prices, HoldingTable::new()));

    let config = SimulationConfig {
        starting_balance,
        ..Default::default()
    };
    let market = Market::bootstrap(config, &StorageConfig::default(), store.clone())
        .await
        .unwrap();
    (market, store)
}

#[tokio::test]
async fn test_buy_then_oversell_example() {
    let (market, _store) = market_with(dec!(1000)).await;
    let session = market.open_session().await.unwrap();
    let aapl = Symbol::new("AAPL");

    // 5 * 100 = 500 < 1000 → 승인
    let decision = session
        .handle(SessionRequest::Trade(TradeRequest::from_pairs([("AAPL", 5)])))
        .await
        .unwrap();
    assert!(matches!(decision, SessionReply::Trade(ref d) if d.is_accepted()));
    assert_eq!(session.portfolio().await.held(&aapl), 5);
    assert_eq!(market.ledger().held(&aapl).await, Some(5));

    // 5 - 10 < 0 → 거절, 상태 불변
    let before = session.portfolio().await;
    let decision = session
        .handle(SessionRequest::Trade(TradeRequest::from_pairs([("AAPL", -10)])))
        .await
        .unwrap();
    assert!(matches!(decision, SessionReply::Trade(ref d) if !d.is_accepted()));
    assert_eq!(session.portfolio().await, before);
    assert_eq!(market.ledger().held(&aapl).await, Some(5));
}

#[tokio::test]
async fn test_exact_balance_boundary_example() {
    let (market, store) = market_with(dec!(1000)).await;
    let session = market.open_session().await.unwrap();
    let prices_before = market.prices().get().await;

    // 10 * 100 = 1000, 1000 > 1000 은 거짓 → 거절
    let decision = session
        .trade(&TradeRequest::from_pairs([("AAPL", 10)]))
        .await
        .unwrap();

    assert!(!decision.is_accepted());
    assert_eq!(session.portfolio().await.balance(), dec!(1000));
    assert_eq!(market.ledger().get().await.version, 0);
    assert_eq!(market.prices().get().await, prices_before);
    assert_eq!(store.ledger_saves(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_updates_tick_once() {
    let (market, store) = market_with(dec!(1000)).await;

    let mut sessions = Vec::new();
    for _ in 0..8 {
        sessions.push(market.open_session().await.unwrap());
    }
    let leader = sessions[0].id();

    let handles: Vec<_> = sessions
        .into_iter()
        .map(|session| {
            tokio::spawn(async move {
                let reply = session.handle(SessionRequest::Update).await.unwrap();
                (session, reply)
            })
        })
        .collect();

    let mut tickers = Vec::new();
    let mut sessions = Vec::new();
    for handle in handles {
        let (session, reply) = handle.await.unwrap();
        if let SessionReply::Update {
            ticked_round: Some(_),
            ..
        } = reply
        {
            tickers.push(session.id());
        }
        sessions.push(session);
    }

    assert_eq!(tickers, vec![leader]);
    assert_eq!(market.prices().get().await.round, 1);
    assert_eq!(store.price_saves(), 1);
}

#[tokio::test]
async fn test_tick_driver_hands_over_on_close() {
    let (market, _store) = market_with(dec!(1000)).await;
    let mut first = market.open_session().await.unwrap();
    let second = market.open_session().await.unwrap();

    first.close().await;

    let reply = second.update().await.unwrap();
    assert!(matches!(
        reply,
        SessionReply::Update {
            ticked_round: Some(1),
            ..
        }
    ));
}

/// (세션 번호, 심볼 번호, 수량) 거래 목록
fn trade_plan() -> impl Strategy<Value = Vec<(usize, usize, i64)>> {
    prop::collection::vec((0usize..4, 0usize..SYMBOLS.len(), -6i64..8), 1..60)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_ledger_equals_sum_of_accepted_deltas(plan in trade_plan()) {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(4)
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async move {
            let (market, _store) = market_with(dec!(2000)).await;

            let mut tasks = Vec::new();
            for index in 0..4 {
                let session = market.open_session().await.unwrap();
                let trades: Vec<TradeRequest> = plan
                    .iter()
                    .filter(|(owner, _, _)| *owner == index)
                    .map(|(_, symbol, delta)| TradeRequest::from_pairs([(SYMBOLS[*symbol], *delta)]))
                    .collect();

                tasks.push(tokio::spawn(async move {
                    let mut accepted = Vec::new();
                    for trade in trades {
                        if let TradeDecision::Accepted { .. } = session.trade(&trade).await.unwrap() {
                            accepted.push(trade);
                        }
                    }
                    let portfolio = session.portfolio().await;
                    (session, accepted, portfolio)
                }));
            }

            let mut expected = HoldingTable::new();
            let mut sessions = Vec::new();
            for task in tasks {
                let (session, accepted, portfolio) = task.await.unwrap();

                assert!(portfolio.balance() >= Decimal::ZERO);
                for held in portfolio.holdings().values() {
                    assert!(*held >= 0);
                }
                for trade in accepted {
                    for (symbol, delta) in trade.iter() {
                        *expected.entry(symbol.clone()).or_insert(0) += delta;
                    }
                }
                sessions.push(session);
            }

            let ledger = market.ledger().get().await;
            for symbol in SYMBOLS {
                let symbol = Symbol::new(symbol);
                assert_eq!(
                    ledger.held(&symbol),
                    expected.get(&symbol).copied().unwrap_or(0)
                );
            }
        });
    }
}
