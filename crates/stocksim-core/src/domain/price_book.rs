//! 전역 가격표.
//!
//! 거래 가능한 모든 심볼의 현재 가격을 보관합니다. 심볼 집합은 시작 시
//! 한 번 로드되며 이후 새 심볼이 추가되지 않습니다.
//!
//! 틱과 일괄 갱신은 하나의 쓰기 잠금 안에서 전체 심볼에 적용되므로
//! 읽는 쪽은 절반만 갱신된 가격표를 볼 수 없습니다.

use std::collections::BTreeMap;

use rand::Rng;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::types::{Price, Symbol, PRICE_SCALE};

/// 심볼별 가격 테이블.
pub type PriceTable = BTreeMap<Symbol, Price>;

/// 특정 시점의 가격표 스냅샷.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSnapshot {
    /// 틱/일괄 갱신마다 1씩 증가하는 라운드 번호
    pub round: u64,
    /// 심볼별 가격
    pub prices: PriceTable,
}

impl PriceSnapshot {
    /// 심볼 가격 조회.
    pub fn price(&self, symbol: &Symbol) -> Option<Price> {
        self.prices.get(symbol).copied()
    }

    /// 심볼이 가격표에 있는지 확인.
    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.prices.contains_key(symbol)
    }
}

#[derive(Debug)]
struct PriceState {
    prices: PriceTable,
    round: u64,
}

impl PriceState {
    fn snapshot(&self) -> PriceSnapshot {
        PriceSnapshot {
            round: self.round,
            prices: self.prices.clone(),
        }
    }
}

/// 프로세스 전역 가격표.
#[derive(Debug)]
pub struct PriceBook {
    state: RwLock<PriceState>,
}

impl PriceBook {
    /// 초기 가격으로 가격표를 생성합니다.
    pub fn new(prices: PriceTable) -> Self {
        Self {
            state: RwLock::new(PriceState { prices, round: 0 }),
        }
    }

    /// 일관된 스냅샷을 반환합니다.
    pub async fn get(&self) -> PriceSnapshot {
        self.state.read().await.snapshot()
    }

    /// 단일 심볼 가격 조회.
    pub async fn price(&self, symbol: &Symbol) -> Option<Price> {
        self.state.read().await.prices.get(symbol).copied()
    }

    /// 등록된 심볼 수.
    pub async fn len(&self) -> usize {
        self.state.read().await.prices.len()
    }

    /// 가격표가 비어 있는지 확인.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.prices.is_empty()
    }

    /// 가격을 일괄 갱신합니다.
    ///
    /// 이미 등록된 심볼만 갱신되며, 모르는 심볼은 무시됩니다.
    /// 갱신 대상에 없는 심볼은 기존 가격을 유지합니다.
    pub async fn update_prices(&self, updates: PriceTable) -> PriceSnapshot {
        let mut state = self.state.write().await;

        for (symbol, price) in updates {
            match state.prices.get_mut(&symbol) {
                Some(current) => *current = price,
                None => warn!(symbol = %symbol, "Ignoring price update for unknown symbol"),
            }
        }
        state.round += 1;

        debug!(round = state.round, "Price book bulk-updated");
        state.snapshot()
    }

    /// 랜덤 워크 틱을 한 번 진행합니다.
    ///
    /// 모든 가격이 `price + volatility * r` (r ~ U[-1, 1]) 로 바뀌고
    /// `floor` 아래로 내려가지 않습니다.
    pub async fn tick(&self, volatility: Decimal, floor: Price) -> PriceSnapshot {
        let mut state = self.state.write().await;
        {
            let mut rng = rand::thread_rng();
            random_walk(&mut state.prices, volatility, floor, &mut rng);
        }
        state.round += 1;

        debug!(round = state.round, symbols = state.prices.len(), "Price tick applied");
        state.snapshot()
    }

    /// 주어진 난수 생성기로 틱을 진행합니다.
    pub async fn tick_with_rng<R: Rng + ?Sized>(
        &self,
        volatility: Decimal,
        floor: Price,
        rng: &mut R,
    ) -> PriceSnapshot {
        let mut state = self.state.write().await;
        random_walk(&mut state.prices, volatility, floor, rng);
        state.round += 1;
        state.snapshot()
    }
}

/// 가격 테이블 전체에 랜덤 워크 한 스텝을 적용합니다.
///
/// 변동분은 소수점 [`PRICE_SCALE`] 자리로 반올림됩니다.
pub fn random_walk<R: Rng + ?Sized>(
    prices: &mut PriceTable,
    volatility: Decimal,
    floor: Price,
    rng: &mut R,
) {
    for price in prices.values_mut() {
        let r: f64 = rng.gen_range(-1.0..=1.0);
        let step = (volatility * Decimal::try_from(r).unwrap_or(Decimal::ZERO))
            .round_dp(PRICE_SCALE);
        *price = (*price + step).max(floor);
    }
}
