//! 전역 보유 수량 원장.
//!
//! 모든 세션이 체결한 거래의 심볼별 누적 수량을 보관합니다.
//! 세션이 종료되어도 차감되지 않는 누적 집계이며, 음수 하한도 두지 않습니다.
//! 거래 검증은 호출 측 책임입니다.

use std::collections::BTreeMap;

use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::request::TradeRequest;
use crate::error::{SimError, SimResult};
use crate::types::{ShareCount, Symbol};

/// 심볼별 누적 수량 테이블.
pub type HoldingTable = BTreeMap<Symbol, ShareCount>;

/// 특정 시점의 원장 스냅샷.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSnapshot {
    /// 반영된 배치 수 (배치마다 1씩 증가)
    pub version: u64,
    /// 심볼별 누적 수량
    pub holdings: HoldingTable,
}

impl LedgerSnapshot {
    /// 심볼 수량 조회 (없으면 0).
    pub fn held(&self, symbol: &Symbol) -> ShareCount {
        self.holdings.get(symbol).copied().unwrap_or(0)
    }
}

#[derive(Debug)]
struct LedgerState {
    holdings: HoldingTable,
    version: u64,
}

impl LedgerState {
    fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            version: self.version,
            holdings: self.holdings.clone(),
        }
    }
}

/// 프로세스 전역 원장.
#[derive(Debug)]
pub struct Ledger {
    state: RwLock<LedgerState>,
}

impl Ledger {
    /// 초기 수량으로 원장을 생성합니다.
    pub fn new(holdings: HoldingTable) -> Self {
        Self {
            state: RwLock::new(LedgerState {
                holdings,
                version: 0,
            }),
        }
    }

    /// 주어진 심볼들을 0 수량으로 가진 원장을 생성합니다.
    pub fn with_symbols<'a>(symbols: impl IntoIterator<Item = &'a Symbol>) -> Self {
        Self::new(symbols.into_iter().map(|s| (s.clone(), 0)).collect())
    }

    /// 일관된 스냅샷을 반환합니다.
    pub async fn get(&self) -> LedgerSnapshot {
        self.state.read().await.snapshot()
    }

    /// 단일 심볼 수량 조회.
    pub async fn held(&self, symbol: &Symbol) -> Option<ShareCount> {
        self.state.read().await.holdings.get(symbol).copied()
    }

    /// 한 거래의 수량 변화를 하나의 임계 구역에서 반영합니다.
    ///
    /// 원장이 모르는 심볼이 하나라도 있으면 아무것도 바꾸지 않고
    /// [`SimError::UnknownSymbol`] 을, 누적 수량이 `i64` 범위를 넘으면
    /// [`SimError::OutOfRange`] 를 반환합니다.
    pub async fn apply_deltas(&self, request: &TradeRequest) -> SimResult<LedgerSnapshot> {
        let mut state = self.state.write().await;

        if let Some(unknown) = request
            .symbols()
            .find(|symbol| !state.holdings.contains_key(*symbol))
        {
            return Err(SimError::UnknownSymbol(unknown.clone()));
        }

        let mut updated = Vec::with_capacity(request.len());
        for (symbol, delta) in request.iter() {
            let held = state.holdings.get(symbol).copied().unwrap_or(0);
            let next = held
                .checked_add(delta)
                .ok_or_else(|| SimError::OutOfRange(symbol.clone()))?;
            updated.push((symbol.clone(), next));
        }

        state.holdings.extend(updated);
        state.version += 1;

        debug!(version = state.version, symbols = request.len(), "Ledger deltas applied");
        Ok(state.snapshot())
    }
}
