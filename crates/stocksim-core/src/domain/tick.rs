//! 틱 담당 세션 선출.
//!
//! 모든 세션이 주기적으로 `update` 를 보내므로, 세션 수만큼 가격이 움직이지
//! 않도록 라운드마다 한 세션만 가격을 진행시킵니다. 담당 세션은 매 요청마다
//! 살아 있는 레지스트리에서 가장 작은 ID 로 다시 계산하며 캐시하지 않습니다.
//! 담당 세션이 끊기면 다음 라운드에 그다음 ID 가 자연스럽게 이어받습니다.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::debug;

use crate::domain::price_book::{PriceBook, PriceSnapshot};
use crate::domain::registry::SessionRegistry;
use crate::types::{Price, SessionId};

/// 틱 담당 세션 선출 및 가격 진행.
#[derive(Debug, Clone)]
pub struct TickCoordinator {
    registry: Arc<SessionRegistry>,
    prices: Arc<PriceBook>,
    volatility: Decimal,
    floor: Price,
}

impl TickCoordinator {
    /// 새 코디네이터를 생성합니다.
    pub fn new(
        registry: Arc<SessionRegistry>,
        prices: Arc<PriceBook>,
        volatility: Decimal,
        floor: Price,
    ) -> Self {
        Self {
            registry,
            prices,
            volatility,
            floor,
        }
    }

    /// 이 세션이 이번 라운드의 틱 담당인지 확인합니다.
    pub async fn is_driver(&self, id: SessionId) -> bool {
        self.registry.ids().await.first() == Some(&id)
    }

    /// `update` 요청 처리 시 호출됩니다.
    ///
    /// 요청 세션이 담당이면 가격을 한 번 진행하고 새 스냅샷을 반환합니다.
    /// 담당이 아니면 `None` 입니다.
    pub async fn on_update(&self, id: SessionId) -> Option<PriceSnapshot> {
        if !self.is_driver(id).await {
            return None;
        }

        let snapshot = self.prices.tick(self.volatility, self.floor).await;
        debug!(session_id = %id, round = snapshot.round, "Elected tick driver advanced prices");
        Some(snapshot)
    }
}
