//! 거래 검증.
//!
//! 포트폴리오, 가격 스냅샷, 요청 수량만 보고 승인/거절을 결정하는 순수 함수입니다.
//! 어떤 상태도 변경하지 않습니다.
//!
//! 1. 매도(`delta < 0`)는 `보유 + delta >= 0` 이어야 하며, 한 심볼이라도 어기면 즉시 거절
//! 2. 매수(`delta > 0`) 금액만 합산 (같은 요청의 매도 대금은 상쇄하지 않음)
//! 3. `잔고 > 매수 합계` 일 때만 승인 (잔고를 정확히 소진하는 요청은 거절)
//!
//! 보유 수량이나 금액이 표현 범위를 넘는 요청은 [`RejectReason::OutOfRange`] 로 거절합니다.

use rust_decimal::Decimal;
use std::fmt;

use crate::domain::portfolio::Portfolio;
use crate::domain::price_book::PriceSnapshot;
use crate::domain::request::TradeRequest;
use crate::error::SimError;
use crate::types::{notional, Balance, ShareCount, Symbol};

/// 거래 거절 사유.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// 보유 수량보다 많이 매도
    InsufficientHoldings {
        symbol: Symbol,
        held: ShareCount,
        requested: ShareCount,
    },
    /// 매수 금액이 잔고 이상
    InsufficientBalance { balance: Balance, required: Decimal },
    /// 반영하면 수량 또는 금액이 범위를 넘음
    OutOfRange { symbol: Symbol },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::InsufficientHoldings {
                symbol,
                held,
                requested,
            } => write!(
                f,
                "insufficient holdings for {}: held {}, selling {}",
                symbol,
                held,
                requested.unsigned_abs()
            ),
            RejectReason::InsufficientBalance { balance, required } => write!(
                f,
                "insufficient balance: balance {}, required {}",
                balance, required
            ),
            RejectReason::OutOfRange { symbol } => {
                write!(f, "quantity or amount out of range for {}", symbol)
            }
        }
    }
}

/// 거래 검증 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TradeDecision {
    /// 승인 (매수 금액 합계)
    Accepted { cost: Decimal },
    /// 거절
    Rejected(RejectReason),
}

impl TradeDecision {
    /// 승인 여부.
    pub fn is_accepted(&self) -> bool {
        matches!(self, TradeDecision::Accepted { .. })
    }
}

/// 요청을 검증합니다.
///
/// 요청의 모든 심볼이 `prices` 에 있다고 가정합니다. 가격표에 없는 심볼은
/// 호출 측에서 먼저 걸러야 합니다.
pub fn validate_trade(
    portfolio: &Portfolio,
    prices: &PriceSnapshot,
    request: &TradeRequest,
) -> TradeDecision {
    let mut cost = Decimal::ZERO;

    for (symbol, delta) in request.iter() {
        if delta < 0 {
            let held = portfolio.held(symbol);
            if held + delta < 0 {
                return TradeDecision::Rejected(RejectReason::InsufficientHoldings {
                    symbol: symbol.clone(),
                    held,
                    requested: delta,
                });
            }
        } else {
            let price = prices.price(symbol).unwrap_or(Decimal::ZERO);
            match notional(delta, price).and_then(|amount| cost.checked_add(amount)) {
                Some(total) => cost = total,
                None => return out_of_range(symbol),
            }
        }
    }

    if let Err(SimError::OutOfRange(symbol)) = portfolio.settle(request, prices) {
        return out_of_range(&symbol);
    }

    if portfolio.balance() > cost {
        TradeDecision::Accepted { cost }
    } else {
        TradeDecision::Rejected(RejectReason::InsufficientBalance {
            balance: portfolio.balance(),
            required: cost,
        })
    }
}

fn out_of_range(symbol: &Symbol) -> TradeDecision {
    TradeDecision::Rejected(RejectReason::OutOfRange {
        symbol: symbol.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price_book::PriceTable;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn prices(aapl: Decimal) -> PriceSnapshot {
        let mut prices = PriceTable::new();
        prices.insert(Symbol::new("AAPL"), aapl);
        prices.insert(Symbol::new("MSFT"), dec!(50));
        PriceSnapshot { round: 0, prices }
    }

    #[test]
    fn test_buy_within_balance_is_accepted() {
        let portfolio = Portfolio::new(dec!(1000));
        let request = TradeRequest::from_pairs([("AAPL", 5)]);

        let decision = validate_trade(&portfolio, &prices(dec!(100)), &request);
        assert_eq!(decision, TradeDecision::Accepted { cost: dec!(500) });
    }

    #[test]
    fn test_exact_balance_is_rejected() {
        let portfolio = Portfolio::new(dec!(1000));
        let request = TradeRequest::from_pairs([("AAPL", 10)]);

        let decision = validate_trade(&portfolio, &prices(dec!(100)), &request);
        assert_eq!(
            decision,
            TradeDecision::Rejected(RejectReason::InsufficientBalance {
                balance: dec!(1000),
                required: dec!(1000),
            })
        );
    }

    #[test]
    fn test_oversell_is_rejected() {
        let mut portfolio = Portfolio::new(dec!(1000));
        portfolio
            .apply_trade(&TradeRequest::from_pairs([("AAPL", 5)]), &prices(dec!(100)))
            .unwrap();

        let request = TradeRequest::from_pairs([("AAPL", -10)]);
        let decision = validate_trade(&portfolio, &prices(dec!(100)), &request);

        assert_eq!(
            decision,
            TradeDecision::Rejected(RejectReason::InsufficientHoldings {
                symbol: Symbol::new("AAPL"),
                held: 5,
                requested: -10,
            })
        );
    }

    #[test]
    fn test_oversell_rejects_whole_batch() {
        // 매수 부분은 충분히 감당 가능하지만 매도 부분 때문에 전체 거절
        let portfolio = Portfolio::new(dec!(1000));
        let request = TradeRequest::from_pairs([("AAPL", 1), ("MSFT", -1)]);

        let decision = validate_trade(&portfolio, &prices(dec!(100)), &request);
        assert!(matches!(
            decision,
            TradeDecision::Rejected(RejectReason::InsufficientHoldings { .. })
        ));
    }

    #[test]
    fn test_sells_do_not_offset_buy_budget() {
        let mut portfolio = Portfolio::new(dec!(600));
        portfolio
            .apply_trade(&TradeRequest::from_pairs([("MSFT", 10)]), &prices(dec!(100)))
            .unwrap();
        assert_eq!(portfolio.balance(), dec!(100));

        // 매도 대금 500 이 들어와도 매수 예산 계산에는 포함되지 않음
        let request = TradeRequest::from_pairs([("MSFT", -10), ("AAPL", 2)]);
        let decision = validate_trade(&portfolio, &prices(dec!(100)), &request);
        assert!(!decision.is_accepted());
    }

    #[test]
    fn test_sell_only_is_accepted() {
        let mut portfolio = Portfolio::new(dec!(1000));
        portfolio
            .apply_trade(&TradeRequest::from_pairs([("AAPL", 3)]), &prices(dec!(100)))
            .unwrap();

        let request = TradeRequest::from_pairs([("AAPL", -3)]);
        let decision = validate_trade(&portfolio, &prices(dec!(100)), &request);
        assert_eq!(decision, TradeDecision::Accepted { cost: dec!(0) });
    }

    proptest! {
        #[test]
        fn prop_accepted_trades_keep_invariants(
            balance in 0i64..5_000,
            held in 0i64..20,
            aapl in -20i64..20,
            msft in -20i64..20,
        ) {
            let mut portfolio = Portfolio::new(Decimal::from(balance));
            if held > 0 {
                portfolio
                    .apply_trade(&TradeRequest::from_pairs([("AAPL", held)]), &prices(dec!(0)))
                    .unwrap();
            }
            let snapshot = prices(dec!(100));
            let request = TradeRequest::from_pairs([("AAPL", aapl), ("MSFT", msft)]);

            let before = portfolio.clone();
            match validate_trade(&portfolio, &snapshot, &request) {
                TradeDecision::Accepted { cost } => {
                    prop_assert!(before.balance() > cost);
                    portfolio.apply_trade(&request, &snapshot).unwrap();
                    prop_assert!(portfolio.balance() >= Decimal::ZERO);
                    for (_, qty) in portfolio.holdings() {
                        prop_assert!(*qty >= 0);
                    }
                }
                TradeDecision::Rejected(_) => {
                    prop_assert_eq!(portfolio, before);
                }
            }
        }
    }

    #[test]
    fn test_holding_overflow_is_rejected() {
        let mut snapshot = prices(dec!(100));
        snapshot.prices.insert(Symbol::new("PENNY"), dec!(0));

        let mut portfolio = Portfolio::new(dec!(1000));
        let request = TradeRequest::from_pairs([("PENNY", i64::MAX)]);
        assert_eq!(
            validate_trade(&portfolio, &snapshot, &request),
            TradeDecision::Accepted { cost: dec!(0) }
        );
        portfolio.apply_trade(&request, &snapshot).unwrap();

        let request = TradeRequest::from_pairs([("PENNY", 1)]);
        assert_eq!(
            validate_trade(&portfolio, &snapshot, &request),
            TradeDecision::Rejected(RejectReason::OutOfRange {
                symbol: Symbol::new("PENNY"),
            })
        );
    }

    #[test]
    fn test_amount_overflow_is_rejected() {
        let snapshot = prices(Decimal::MAX);
        let portfolio = Portfolio::new(dec!(1000));

        let request = TradeRequest::from_pairs([("AAPL", 2)]);
        assert!(matches!(
            validate_trade(&portfolio, &snapshot, &request),
            TradeDecision::Rejected(RejectReason::OutOfRange { ref symbol }) if symbol.as_str() == "AAPL"
        ));
    }
}
