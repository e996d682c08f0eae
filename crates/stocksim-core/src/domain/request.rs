//! 거래 요청.
//!
//! 한 메시지로 제출된 심볼별 수량 변화(양수 = 매수, 음수 = 매도)의 묶음입니다.
//! 요청 하나를 처리하는 동안에만 존재합니다.

use std::collections::BTreeMap;

use crate::error::{SimError, SimResult};
use crate::types::{ShareCount, Symbol};

/// 심볼별 수량 변화 묶음.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TradeRequest {
    deltas: BTreeMap<Symbol, ShareCount>,
}

impl TradeRequest {
    /// 빈 요청을 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// (심볼, 수량) 쌍에서 요청을 생성합니다.
    ///
    /// 같은 심볼이 여러 번 나오면 마지막 값이 남습니다.
    pub fn from_pairs<S: Into<Symbol>>(pairs: impl IntoIterator<Item = (S, ShareCount)>) -> Self {
        let mut request = Self::new();
        for (symbol, delta) in pairs {
            request.insert(symbol, delta);
        }
        request
    }

    /// 심볼 수량 변화를 설정합니다 (기존 값 대체).
    pub fn insert(&mut self, symbol: impl Into<Symbol>, delta: ShareCount) {
        self.deltas.insert(symbol.into(), delta);
    }

    /// 클라이언트가 보낸 항목을 추가합니다. 빈 심볼은 [`SimError::MalformedRequest`] 입니다.
    pub fn try_insert(&mut self, symbol: &str, delta: ShareCount) -> SimResult<()> {
        if symbol.is_empty() {
            return Err(SimError::MalformedRequest("empty symbol".to_string()));
        }
        self.insert(symbol, delta);
        Ok(())
    }

    /// 문자열 수량 항목을 추가합니다.
    ///
    /// 빈 심볼이나 정수가 아닌 수량은 [`SimError::MalformedRequest`] 입니다.
    pub fn insert_raw(&mut self, symbol: &str, quantity: &str) -> SimResult<()> {
        self.try_insert(symbol, parse_quantity(quantity)?)
    }

    /// 심볼 수량 변화 조회.
    pub fn delta(&self, symbol: &Symbol) -> Option<ShareCount> {
        self.deltas.get(symbol).copied()
    }

    /// 심볼 순으로 (심볼, 수량) 을 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, ShareCount)> {
        self.deltas.iter().map(|(s, d)| (s, *d))
    }

    /// 요청에 포함된 심볼들.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.deltas.keys()
    }

    /// 심볼 수.
    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    /// 빈 요청인지 확인.
    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }
}

/// 정수 문자열 수량을 파싱합니다.
pub fn parse_quantity(raw: &str) -> SimResult<ShareCount> {
    raw.trim()
        .parse::<ShareCount>()
        .map_err(|e| SimError::MalformedRequest(format!("invalid quantity '{}': {}", raw, e)))
}
