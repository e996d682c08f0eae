//! 세션 엔진.
//!
//! 연결 하나당 하나의 [`Session`] 이 만들어지며, 요청을 도착 순서대로
//! 처리합니다. 상태는 `Open → Closed` 두 가지뿐입니다.
//!
//! 거래 처리 시 잠금 순서는 포트폴리오 → 가격표(읽기, 스냅샷 복제 후 해제)
//! → 원장(쓰기) 입니다. 스냅샷 저장은 모든 잠금을 놓은 뒤에 합니다.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::{
    validate_trade, Portfolio, RejectReason, SharedPortfolio, TradeDecision, TradeRequest,
};
use crate::error::{SimError, SimResult};
use crate::market::Market;
use crate::types::{Balance, SessionId, ShareCount, Symbol};

/// 세션 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// 요청 처리 중
    Open,
    /// 종료됨
    Closed,
}

/// 세션 요청.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionRequest {
    /// 잔고 조회
    Balance,
    /// 포트폴리오 조회 (틱 선출 포함)
    Update,
    /// 거래
    Trade(TradeRequest),
}

/// 잔고 조회 응답.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceReply {
    pub balance: Balance,
}

/// 심볼별 보유 수량.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HoldingView {
    pub symbol: Symbol,
    pub held: ShareCount,
}

/// 포트폴리오 조회 응답.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortfolioView {
    pub stocks: Vec<HoldingView>,
    pub balance: Balance,
}

impl From<&Portfolio> for PortfolioView {
    fn from(portfolio: &Portfolio) -> Self {
        Self {
            stocks: portfolio
                .holdings()
                .iter()
                .map(|(symbol, held)| HoldingView {
                    symbol: symbol.clone(),
                    held: *held,
                })
                .collect(),
            balance: portfolio.balance(),
        }
    }
}

/// 세션 응답.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionReply {
    /// 잔고
    Balance(BalanceReply),
    /// 포트폴리오와 이번 요청으로 진행된 가격 라운드 (틱 담당일 때만)
    Update {
        portfolio: PortfolioView,
        ticked_round: Option<u64>,
    },
    /// 거래 결과
    Trade(TradeDecision),
}

/// 연결 하나의 세션.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    portfolio: SharedPortfolio,
    market: Arc<Market>,
    state: SessionState,
}

impl Session {
    pub(crate) fn new(id: SessionId, portfolio: SharedPortfolio, market: Arc<Market>) -> Self {
        Self {
            id,
            portfolio,
            market,
            state: SessionState::Open,
        }
    }

    /// 세션 ID.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// 현재 상태.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// 열려 있는지 확인.
    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    /// 포트폴리오 복사본.
    pub async fn portfolio(&self) -> Portfolio {
        self.portfolio.lock().await.clone()
    }

    /// 요청을 처리합니다.
    pub async fn handle(&self, request: SessionRequest) -> SimResult<SessionReply> {
        match request {
            SessionRequest::Balance => self.balance().await.map(SessionReply::Balance),
            SessionRequest::Update => self.update().await,
            SessionRequest::Trade(trade) => self.trade(&trade).await.map(SessionReply::Trade),
        }
    }

    /// 잔고를 조회합니다.
    pub async fn balance(&self) -> SimResult<BalanceReply> {
        self.ensure_open()?;
        let balance = self.portfolio.lock().await.balance();
        Ok(BalanceReply { balance })
    }

    /// 포트폴리오를 조회하고, 이 세션이 틱 담당이면 가격을 진행시킵니다.
    pub async fn update(&self) -> SimResult<SessionReply> {
        self.ensure_open()?;

        let portfolio = PortfolioView::from(&*self.portfolio.lock().await);

        let ticked_round = match self.market.ticks().on_update(self.id).await {
            Some(snapshot) => {
                self.market.snapshots().save_prices(&snapshot).await;
                Some(snapshot.round)
            }
            None => None,
        };

        Ok(SessionReply::Update {
            portfolio,
            ticked_round,
        })
    }

    /// 거래를 검증하고, 승인되면 포트폴리오와 원장에 반영합니다.
    ///
    /// 가격표에 없는 심볼이 있으면 [`SimError::UnknownSymbol`], 빈 요청이면
    /// [`SimError::MalformedRequest`] 입니다. 두 경우 모두 상태는 바뀌지 않습니다.
    pub async fn trade(&self, request: &TradeRequest) -> SimResult<TradeDecision> {
        self.ensure_open()?;
        if request.is_empty() {
            return Err(SimError::MalformedRequest(
                "trade contains no quantities".to_string(),
            ));
        }

        let mut portfolio = self.portfolio.lock().await;
        let prices = self.market.prices().get().await;

        if let Some(unknown) = request.symbols().find(|symbol| !prices.contains(symbol)) {
            return Err(SimError::UnknownSymbol(unknown.clone()));
        }

        let cost = match validate_trade(&portfolio, &prices, request) {
            TradeDecision::Accepted { cost } => cost,
            TradeDecision::Rejected(reason) => return Ok(self.reject(reason)),
        };
        let settlement = match portfolio.settle(request, &prices) {
            Ok(settlement) => settlement,
            Err(SimError::OutOfRange(symbol)) => {
                return Ok(self.reject(RejectReason::OutOfRange { symbol }));
            }
            Err(e) => return Err(e),
        };
        // 원장이 거절하면 포트폴리오도 그대로 둠
        let ledger = match self.market.ledger().apply_deltas(request).await {
            Ok(ledger) => ledger,
            Err(SimError::OutOfRange(symbol)) => {
                return Ok(self.reject(RejectReason::OutOfRange { symbol }));
            }
            Err(e) => return Err(e),
        };
        let cash_flow = portfolio.commit(settlement);
        info!(
            session_id = %self.id,
            symbols = request.len(),
            cost = %cost,
            cash_flow = %cash_flow,
            balance = %portfolio.balance(),
            version = ledger.version,
            "Trade accepted"
        );
        drop(portfolio);

        self.market.snapshots().save_ledger(&ledger).await;
        Ok(TradeDecision::Accepted { cost })
    }

    fn reject(&self, reason: RejectReason) -> TradeDecision {
        debug!(session_id = %self.id, reason = %reason, "Trade rejected");
        TradeDecision::Rejected(reason)
    }

    /// 세션을 종료하고 레지스트리에서 제거합니다.
    ///
    /// 원장과 가격은 되돌리지 않습니다. 이미 종료된 세션이면 `false` 입니다.
    pub async fn close(&mut self) -> bool {
        if self.state == SessionState::Closed {
            return false;
        }
        self.state = SessionState::Closed;
        self.market.registry().close(self.id).await
    }

    fn ensure_open(&self) -> SimResult<()> {
        match self.state {
            SessionState::Open => Ok(()),
            SessionState::Closed => Err(SimError::SessionClosed(self.id)),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }

        // close() 없이 버려진 세션도 레지스트리에서 빠져야 틱 담당이 넘어감
        let registry = Arc::clone(self.market.registry());
        let id = self.id;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    registry.close(id).await;
                });
            }
            Err(_) => warn!(session_id = %id, "Session dropped outside runtime, not deregistered"),
        }
    }
}
