//! 심볼 및 세션 식별자.
//!
//! - `Symbol` - 거래 가능한 종목의 불투명한 식별자 (예: 티커)
//! - `SessionId` - 연결된 세션의 식별자, 전순서를 가짐

use serde::{Deserialize, Serialize};
use std::fmt;

/// 거래 가능한 종목 심볼.
///
/// 대소문자 변환 등 정규화를 하지 않는 불투명한 문자열입니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// 새 심볼을 생성합니다.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    /// 심볼 문자열을 반환합니다.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// 세션 식별자.
///
/// 레지스트리가 단조 증가 카운터로 발급하므로, 가장 작은 ID 는
/// 현재 연결된 세션 중 가장 먼저 접속한 세션입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(u64);

impl SessionId {
    /// 새 세션 ID 를 생성합니다.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// 내부 값을 반환합니다.
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
