//! 공유 시장 상태.
//!
//! 모든 세션이 함께 쓰는 가격표, 원장, 레지스트리, 틱 코디네이터와
//! 스냅샷 저장소를 하나로 묶습니다. 프로세스당 하나만 만들어
//! `Arc<Market>` 으로 세션들에 나눠 줍니다.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::config::{SimulationConfig, StorageConfig};
use crate::domain::{
    HoldingTable, Ledger, LedgerSnapshot, PriceBook, PriceSnapshot, PriceTable, SessionRegistry,
    SnapshotStore, TickCoordinator,
};
use crate::error::{SimError, SimResult};
use crate::session::Session;

/// 스냅샷 저장 직렬화기.
///
/// 저장은 한 번에 하나씩만 진행되며, 이미 더 새로운 버전이 저장되었다면
/// 늦게 도착한 오래된 스냅샷은 건너뜁니다. 실패하면 설정된 횟수만큼
/// 재시도하고, 그래도 실패하면 로그만 남깁니다. 메모리 상태는 되돌리지 않습니다.
pub struct SnapshotWriter {
    store: Arc<dyn SnapshotStore>,
    retries: u32,
    backoff: Duration,
    /// 마지막으로 저장된 원장 버전
    ledger_version: Mutex<Option<u64>>,
    /// 마지막으로 저장된 가격 라운드
    price_round: Mutex<Option<u64>>,
    /// 가장 최근 저장이 포기되었을 때의 에러 (성공하면 비움)
    last_failure: RwLock<Option<String>>,
}

impl SnapshotWriter {
    /// 새 저장기를 생성합니다.
    pub fn new(store: Arc<dyn SnapshotStore>, retries: u32, backoff: Duration) -> Self {
        Self {
            store,
            retries,
            backoff,
            ledger_version: Mutex::new(None),
            price_round: Mutex::new(None),
            last_failure: RwLock::new(None),
        }
    }

    /// 원장 스냅샷을 저장합니다.
    ///
    /// 실제로 저장되었으면 `true` 를 반환합니다.
    pub async fn save_ledger(&self, snapshot: &LedgerSnapshot) -> bool {
        let mut last = self.ledger_version.lock().await;
        if last.is_some_and(|version| version >= snapshot.version) {
            debug!(version = snapshot.version, "Skipping stale ledger snapshot");
            return false;
        }

        let store = &self.store;
        let holdings = &snapshot.holdings;
        let saved = self
            .with_retries("ledger", snapshot.version, move || store.save_ledger(holdings))
            .await;
        if saved {
            *last = Some(snapshot.version);
        }
        saved
    }

    /// 가격 스냅샷을 저장합니다.
    ///
    /// 실제로 저장되었으면 `true` 를 반환합니다.
    pub async fn save_prices(&self, snapshot: &PriceSnapshot) -> bool {
        let mut last = self.price_round.lock().await;
        if last.is_some_and(|round| round >= snapshot.round) {
            debug!(round = snapshot.round, "Skipping stale price snapshot");
            return false;
        }

        let store = &self.store;
        let prices = &snapshot.prices;
        let saved = self
            .with_retries("prices", snapshot.round, move || store.save_prices(prices))
            .await;
        if saved {
            *last = Some(snapshot.round);
        }
        saved
    }

    /// 가장 최근 저장이 실패했으면 그 에러 메시지.
    pub async fn last_failure(&self) -> Option<String> {
        self.last_failure.read().await.clone()
    }

    async fn with_retries<F, Fut>(&self, kind: &'static str, version: u64, op: F) -> bool
    where
        F: Fn() -> Fut,
        Fut: Future<Output = SimResult<()>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(()) => {
                    debug!(store = self.store.name(), kind, version, "Snapshot saved");
                    *self.last_failure.write().await = None;
                    return true;
                }
                Err(e) if attempt < self.retries => {
                    attempt += 1;
                    warn!(
                        store = self.store.name(),
                        kind,
                        version,
                        attempt,
                        error = %e,
                        "Snapshot save failed, retrying"
                    );
                    tokio::time::sleep(self.backoff).await;
                }
                Err(e) => {
                    error!(
                        store = self.store.name(),
                        kind,
                        version,
                        error = %e,
                        "Snapshot save failed, keeping in-memory state"
                    );
                    *self.last_failure.write().await = Some(format!("{kind} {version}: {e}"));
                    return false;
                }
            }
        }
    }
}

impl fmt::Debug for SnapshotWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotWriter")
            .field("store", &self.store.name())
            .field("retries", &self.retries)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

/// 세션들이 공유하는 시장 상태.
pub struct Market {
    config: SimulationConfig,
    prices: Arc<PriceBook>,
    ledger: Arc<Ledger>,
    registry: Arc<SessionRegistry>,
    ticks: TickCoordinator,
    snapshots: SnapshotWriter,
    store: Arc<dyn SnapshotStore>,
}

impl Market {
    /// 저장소에서 가격과 원장을 읽어 시장을 구성합니다.
    ///
    /// 가격표가 비어 있으면 에러입니다. 원장은 가격표와 같은 심볼 집합으로
    /// 맞춰집니다 ([`reconcile_ledger`]).
    pub async fn bootstrap(
        config: SimulationConfig,
        storage: &StorageConfig,
        store: Arc<dyn SnapshotStore>,
    ) -> SimResult<Arc<Self>> {
        let prices = store.load_prices().await?;
        if prices.is_empty() {
            return Err(SimError::Snapshot(format!(
                "{}: price snapshot contains no symbols",
                store.name()
            )));
        }

        let loaded = store.load_ledger().await?;
        let holdings = reconcile_ledger(&prices, loaded);

        info!(
            store = store.name(),
            symbols = prices.len(),
            starting_balance = %config.starting_balance,
            "Market bootstrapped"
        );

        let prices = Arc::new(PriceBook::new(prices));
        let ledger = Arc::new(Ledger::new(holdings));
        let registry = Arc::new(SessionRegistry::new(config.starting_balance));
        let ticks = TickCoordinator::new(
            registry.clone(),
            prices.clone(),
            config.tick_volatility,
            config.price_floor,
        );
        let snapshots = SnapshotWriter::new(
            store.clone(),
            storage.save_retries,
            storage.retry_backoff(),
        );

        Ok(Arc::new(Self {
            config,
            prices,
            ledger,
            registry,
            ticks,
            snapshots,
            store,
        }))
    }

    /// 새 세션을 엽니다.
    pub async fn open_session(self: &Arc<Self>) -> SimResult<Session> {
        if self.config.reload_prices_on_open {
            self.reload_prices().await;
        }

        let (id, portfolio) = self.registry.open_next().await?;
        Ok(Session::new(id, portfolio, Arc::clone(self)))
    }

    /// 저장소의 가격으로 가격표를 갱신합니다.
    ///
    /// 실패하면 기존 가격을 유지합니다.
    pub async fn reload_prices(&self) {
        match self.store.load_prices().await {
            Ok(table) => {
                let snapshot = self.prices.update_prices(table).await;
                debug!(round = snapshot.round, "Prices reloaded from store");
            }
            Err(e) => warn!(error = %e, "Price reload failed, keeping current prices"),
        }
    }

    /// 시뮬레이션 설정.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// 가격표.
    pub fn prices(&self) -> &Arc<PriceBook> {
        &self.prices
    }

    /// 원장.
    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    /// 세션 레지스트리.
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// 틱 코디네이터.
    pub fn ticks(&self) -> &TickCoordinator {
        &self.ticks
    }

    /// 스냅샷 저장기.
    pub fn snapshots(&self) -> &SnapshotWriter {
        &self.snapshots
    }

    /// 저장소 이름.
    pub fn store_name(&self) -> &str {
        self.store.name()
    }
}

impl fmt::Debug for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Market")
            .field("config", &self.config)
            .field("store", &self.store.name())
            .finish_non_exhaustive()
    }
}

/// 원장을 가격표의 심볼 집합에 맞춥니다.
///
/// 가격표에 없는 심볼은 버리고, 원장에 없는 심볼은 0 으로 채웁니다.
pub fn reconcile_ledger(prices: &PriceTable, loaded: HoldingTable) -> HoldingTable {
    let mut holdings: HoldingTable = prices.keys().map(|symbol| (symbol.clone(), 0)).collect();

    for (symbol, held) in loaded {
        match holdings.get_mut(&symbol) {
            Some(slot) => *slot = held,
            None => warn!(symbol = %symbol, held, "Dropping ledger entry for unlisted symbol"),
        }
    }

    holdings
}
