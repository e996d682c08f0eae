//! 시뮬레이터의 에러 타입.
//!
//! 이 모듈은 코어 전반에서 사용되는 에러 타입을 정의합니다.
//! 잔고/보유 수량 부족으로 거절된 거래는 에러가 아니라
//! [`TradeDecision::Rejected`](crate::domain::TradeDecision) 로 표현됩니다.

use thiserror::Error;

use crate::types::{SessionId, Symbol};

/// 시뮬레이터 핵심 에러.
#[derive(Debug, Error)]
pub enum SimError {
    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 해석할 수 없는 요청 (필드 누락, 숫자가 아닌 수량 등)
    #[error("잘못된 요청: {0}")]
    MalformedRequest(String),

    /// 가격표/원장에 없는 심볼
    #[error("알 수 없는 심볼: {0}")]
    UnknownSymbol(Symbol),

    /// 수량 또는 금액이 표현 범위를 넘음
    #[error("범위 초과: {0}")]
    OutOfRange(Symbol),

    /// 이미 열려 있는 세션 ID
    #[error("중복 세션: {0}")]
    DuplicateSession(SessionId),

    /// 종료된 세션에 대한 요청
    #[error("종료된 세션: {0}")]
    SessionClosed(SessionId),

    /// 스냅샷 로드/저장 실패
    #[error("스냅샷 에러: {0}")]
    Snapshot(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),
}

/// 시뮬레이터 작업을 위한 Result 타입.
pub type SimResult<T> = Result<T, SimError>;

impl SimError {
    /// 클라이언트 요청이 원인인 에러인지 확인합니다.
    ///
    /// 이런 에러는 해당 클라이언트에게만 보고되며 세션을 종료시키지 않습니다.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SimError::MalformedRequest(_) | SimError::UnknownSymbol(_) | SimError::OutOfRange(_)
        )
    }

    /// 클라이언트에게 전달할 에러 코드.
    pub fn code(&self) -> &'static str {
        match self {
            SimError::Config(_) => "CONFIG_ERROR",
            SimError::MalformedRequest(_) => "INVALID_MESSAGE",
            SimError::UnknownSymbol(_) => "UNKNOWN_SYMBOL",
            SimError::OutOfRange(_) => "OUT_OF_RANGE",
            SimError::DuplicateSession(_) => "DUPLICATE_SESSION",
            SimError::SessionClosed(_) => "SESSION_CLOSED",
            SimError::Snapshot(_) => "SNAPSHOT_ERROR",
            SimError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

impl From<serde_json::Error> for SimError {
    fn from(err: serde_json::Error) -> Self {
        SimError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for SimError {
    fn from(err: config::ConfigError) -> Self {
        SimError::Config(err.to_string())
    }
}
