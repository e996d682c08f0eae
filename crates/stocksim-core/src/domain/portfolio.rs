//! 세션별 포트폴리오.
//!
//! 한 세션의 현금 잔고와 심볼별 보유 수량입니다. 소유 세션 외에는
//! 읽거나 쓸 수 없으며, 세션이 종료되면 함께 폐기됩니다.

use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::Mutex;

use crate::domain::price_book::PriceSnapshot;
use crate::domain::request::TradeRequest;
use crate::error::{SimError, SimResult};
use crate::types::{notional, Balance, ShareCount, Symbol};

/// 세션이 소유하는 포트폴리오 핸들.
pub type SharedPortfolio = Arc<Mutex<Portfolio>>;

/// 거래 반영 후의 보유 수량과 잔고.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    holdings: Vec<(Symbol, ShareCount)>,
    balance: Balance,
    cash_flow: Decimal,
}

impl Settlement {
    /// 반영 후 잔고.
    pub fn balance(&self) -> Balance {
        self.balance
    }

    /// 순 현금 변화량.
    pub fn cash_flow(&self) -> Decimal {
        self.cash_flow
    }
}

/// 현금 잔고와 보유 수량.
#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    balance: Balance,
    holdings: BTreeMap<Symbol, ShareCount>,
}

impl Portfolio {
    /// 시작 잔고와 빈 보유 목록으로 생성합니다.
    pub fn new(starting_balance: Balance) -> Self {
        Self {
            balance: starting_balance,
            holdings: BTreeMap::new(),
        }
    }

    /// 현금 잔고.
    pub fn balance(&self) -> Balance {
        self.balance
    }

    /// 심볼별 보유 수량 (거래한 적 있는 심볼만).
    pub fn holdings(&self) -> &BTreeMap<Symbol, ShareCount> {
        &self.holdings
    }

    /// 심볼 보유 수량 (없으면 0).
    pub fn held(&self, symbol: &Symbol) -> ShareCount {
        self.holdings.get(symbol).copied().unwrap_or(0)
    }

    /// 거래 반영 결과를 계산합니다. 포트폴리오는 바꾸지 않습니다.
    ///
    /// 보유 수량이 `i64` 범위를 넘거나 금액이 `Decimal` 범위를 넘으면
    /// [`SimError::OutOfRange`] 입니다.
    pub fn settle(
        &self,
        request: &TradeRequest,
        prices: &PriceSnapshot,
    ) -> SimResult<Settlement> {
        let mut holdings = Vec::with_capacity(request.len());
        let mut cash_flow = Decimal::ZERO;
        let mut balance = self.balance;

        for (symbol, delta) in request.iter() {
            let out_of_range = || SimError::OutOfRange(symbol.clone());
            let price = prices.price(symbol).unwrap_or(Decimal::ZERO);
            let amount = notional(delta, price).ok_or_else(out_of_range)?;
            cash_flow = cash_flow.checked_sub(amount).ok_or_else(out_of_range)?;
            balance = balance.checked_sub(amount).ok_or_else(out_of_range)?;
            let held = self.held(symbol).checked_add(delta).ok_or_else(out_of_range)?;
            holdings.push((symbol.clone(), held));
        }

        Ok(Settlement {
            holdings,
            balance,
            cash_flow,
        })
    }

    /// [`settle`](Self::settle) 로 계산한 결과를 반영하고 순 현금 변화량을 반환합니다.
    pub fn commit(&mut self, settlement: Settlement) -> Decimal {
        self.holdings.extend(settlement.holdings);
        self.balance = settlement.balance;
        settlement.cash_flow
    }

    /// 검증된 거래를 반영하고 순 현금 변화량을 반환합니다.
    ///
    /// 각 심볼 수량에 `delta` 를 더하고, 잔고에서 `Σ delta * price` 를 뺍니다.
    /// 매수는 현금을 쓰고 매도는 현금을 돌려받습니다. 범위를 넘으면
    /// 아무것도 바꾸지 않고 에러를 반환합니다.
    pub fn apply_trade(
        &mut self,
        request: &TradeRequest,
        prices: &PriceSnapshot,
    ) -> SimResult<Decimal> {
        let settlement = self.settle(request, prices)?;
        Ok(self.commit(settlement))
    }

    /// 공유 핸들로 감쌉니다.
    pub fn into_shared(self) -> SharedPortfolio {
        Arc::new(Mutex::new(self))
    }
}
