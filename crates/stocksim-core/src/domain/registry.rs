//! 세션 레지스트리.
//!
//! 현재 연결된 세션 ID 와 각 세션의 포트폴리오를 관리합니다.
//! 틱 담당 세션 선출에 필요한 정렬된 ID 목록도 여기서 제공합니다.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::domain::portfolio::{Portfolio, SharedPortfolio};
use crate::error::{SimError, SimResult};
use crate::types::{Balance, SessionId};

/// 연결된 세션 목록.
#[derive(Debug)]
pub struct SessionRegistry {
    /// 세션 시작 잔고
    starting_balance: Balance,
    /// 다음에 발급할 세션 ID
    next_id: AtomicU64,
    /// 세션 ID → 포트폴리오 (ID 오름차순)
    sessions: RwLock<BTreeMap<SessionId, SharedPortfolio>>,
}

impl SessionRegistry {
    /// 새 레지스트리를 생성합니다.
    pub fn new(starting_balance: Balance) -> Self {
        Self {
            starting_balance,
            next_id: AtomicU64::new(1),
            sessions: RwLock::new(BTreeMap::new()),
        }
    }

    /// 세션 시작 잔고.
    pub fn starting_balance(&self) -> Balance {
        self.starting_balance
    }

    /// 새 세션 ID 를 발급합니다.
    pub fn next_id(&self) -> SessionId {
        SessionId::new(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// 세션을 등록하고 새 포트폴리오를 반환합니다.
    ///
    /// 이미 열려 있는 ID 면 [`SimError::DuplicateSession`] 입니다.
    pub async fn open(&self, id: SessionId) -> SimResult<SharedPortfolio> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&id) {
            return Err(SimError::DuplicateSession(id));
        }

        let portfolio = Portfolio::new(self.starting_balance).into_shared();
        sessions.insert(id, portfolio.clone());

        info!(session_id = %id, sessions = sessions.len(), "Session registered");
        Ok(portfolio)
    }

    /// 새 ID 를 발급해 바로 등록합니다.
    pub async fn open_next(&self) -> SimResult<(SessionId, SharedPortfolio)> {
        let id = self.next_id();
        let portfolio = self.open(id).await?;
        Ok((id, portfolio))
    }

    /// 세션을 제거합니다. 없는 세션이면 아무것도 하지 않습니다.
    pub async fn close(&self, id: SessionId) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            info!(session_id = %id, "Session removed");
        } else {
            debug!(session_id = %id, "Session already removed");
        }
        removed
    }

    /// 열린 세션 ID 를 오름차순으로 반환합니다.
    pub async fn ids(&self) -> Vec<SessionId> {
        self.sessions.read().await.keys().copied().collect()
    }

    /// 가장 작은 세션 ID (틱 담당 세션).
    pub async fn leader(&self) -> Option<SessionId> {
        self.sessions.read().await.keys().next().copied()
    }

    /// 열린 세션 수.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// 열린 세션이 없는지 확인.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
