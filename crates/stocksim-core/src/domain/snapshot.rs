//! 스냅샷 저장소 인터페이스.
//!
//! 가격표와 원장의 영속화는 외부 협력자가 담당합니다. 코어는 시작 시 한 번
//! 로드하고, 틱 후에는 가격을, 거래 승인 후에는 원장을 저장합니다.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::ledger::HoldingTable;
use crate::domain::price_book::PriceTable;
use crate::error::{SimError, SimResult};

/// 가격/원장 스냅샷 저장소.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// 저장소 이름 (로그용).
    fn name(&self) -> &str;

    /// 가격 스냅샷을 로드합니다.
    async fn load_prices(&self) -> SimResult<PriceTable>;

    /// 가격 스냅샷을 저장합니다.
    async fn save_prices(&self, prices: &PriceTable) -> SimResult<()>;

    /// 원장 스냅샷을 로드합니다.
    async fn load_ledger(&self) -> SimResult<HoldingTable>;

    /// 원장 스냅샷을 저장합니다.
    async fn save_ledger(&self, holdings: &HoldingTable) -> SimResult<()>;
}

/// 메모리 내 스냅샷 저장소.
///
/// 테스트와 데이터 디렉토리 없이 실행할 때 사용합니다.
/// `fail_next_saves` 로 저장 실패를 흉내낼 수 있습니다.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    prices: RwLock<PriceTable>,
    ledger: RwLock<HoldingTable>,
    failing_saves: AtomicUsize,
    price_saves: AtomicUsize,
    ledger_saves: AtomicUsize,
}

impl MemorySnapshotStore {
    /// 초기 가격과 원장으로 생성합니다.
    pub fn new(prices: PriceTable, ledger: HoldingTable) -> Self {
        Self {
            prices: RwLock::new(prices),
            ledger: RwLock::new(ledger),
            ..Default::default()
        }
    }

    /// 다음 `count` 번의 저장을 실패시킵니다.
    pub fn fail_next_saves(&self, count: usize) {
        self.failing_saves.store(count, Ordering::SeqCst);
    }

    /// 성공한 가격 저장 횟수.
    pub fn price_saves(&self) -> usize {
        self.price_saves.load(Ordering::SeqCst)
    }

    /// 성공한 원장 저장 횟수.
    pub fn ledger_saves(&self) -> usize {
        self.ledger_saves.load(Ordering::SeqCst)
    }

    /// 마지막으로 저장된 가격.
    pub async fn stored_prices(&self) -> PriceTable {
        self.prices.read().await.clone()
    }

    /// 마지막으로 저장된 원장.
    pub async fn stored_ledger(&self) -> HoldingTable {
        self.ledger.read().await.clone()
    }

    fn take_failure(&self) -> SimResult<()> {
        let consumed = self
            .failing_saves
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if consumed {
            Err(SimError::Snapshot("simulated save failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load_prices(&self) -> SimResult<PriceTable> {
        Ok(self.prices.read().await.clone())
    }

    async fn save_prices(&self, prices: &PriceTable) -> SimResult<()> {
        self.take_failure()?;
        *self.prices.write().await = prices.clone();
        self.price_saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load_ledger(&self) -> SimResult<HoldingTable> {
        Ok(self.ledger.read().await.clone())
    }

    async fn save_ledger(&self, holdings: &HoldingTable) -> SimResult<()> {
        self.take_failure()?;
        *self.ledger.write().await = holdings.clone();
        self.ledger_saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
