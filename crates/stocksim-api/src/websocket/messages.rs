//! WebSocket 메시지 타입.
//!
//! 클라이언트-서버 간 교환되는 메시지 정의.

use serde::{Deserialize, Serialize};
use stocksim_core::{
    Balance, HoldingView, PortfolioView, SessionId, SessionRequest, SimError, TradeRequest,
};

/// WebSocket 에러.
#[derive(Debug, thiserror::Error)]
pub enum WsError {
    #[error("잘못된 메시지 형식: {0}")]
    InvalidMessage(String),
    #[error("알 수 없는 메시지 타입: {0}")]
    UnknownMessageType(String),
    #[error("직렬화 실패: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl WsError {
    /// 클라이언트에게 전달할 에러 코드.
    pub fn code(&self) -> &'static str {
        match self {
            WsError::InvalidMessage(_) => "INVALID_MESSAGE",
            WsError::UnknownMessageType(_) => "UNKNOWN_MESSAGE_TYPE",
            WsError::SerializationError(_) => "SERIALIZATION_ERROR",
        }
    }
}

impl From<SimError> for WsError {
    fn from(err: SimError) -> Self {
        WsError::InvalidMessage(err.to_string())
    }
}

// ==================== 클라이언트 → 서버 메시지 ====================

/// 수량 값 (정수 또는 정수 문자열).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum QuantityValue {
    Integer(i64),
    Text(String),
}

/// 거래 수량 항목.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuantityEntry {
    /// 심볼
    pub symbol: String,
    /// 수량 (양수 = 매수, 음수 = 매도)
    pub quantity: QuantityValue,
}

/// 수신 원문. `type` 이 없으면 거래로 취급합니다.
#[derive(Debug, Deserialize)]
struct RawClientMessage {
    #[serde(rename = "type")]
    kind: Option<String>,
    quantities: Option<Vec<QuantityEntry>>,
}

/// 클라이언트에서 서버로 보내는 메시지.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// 잔고 조회
    Balance,
    /// 포트폴리오 조회
    Update,
    /// 거래
    Trade {
        /// 심볼별 수량
        quantities: Vec<QuantityEntry>,
    },
}

impl ClientMessage {
    /// JSON 문자열에서 파싱.
    pub fn from_json(json: &str) -> Result<Self, WsError> {
        let raw: RawClientMessage =
            serde_json::from_str(json).map_err(|e| WsError::InvalidMessage(e.to_string()))?;

        match raw.kind.as_deref() {
            Some("balance") => Ok(ClientMessage::Balance),
            Some("update") => Ok(ClientMessage::Update),
            None | Some("trade") => raw
                .quantities
                .map(|quantities| ClientMessage::Trade { quantities })
                .ok_or_else(|| WsError::InvalidMessage("missing field `quantities`".to_string())),
            Some(other) => Err(WsError::UnknownMessageType(other.to_string())),
        }
    }

    /// 세션 요청으로 변환합니다.
    ///
    /// 같은 심볼이 여러 번 나오면 마지막 값이 남습니다.
    pub fn into_request(self) -> Result<SessionRequest, WsError> {
        match self {
            ClientMessage::Balance => Ok(SessionRequest::Balance),
            ClientMessage::Update => Ok(SessionRequest::Update),
            ClientMessage::Trade { quantities } => {
                let mut request = TradeRequest::new();
                for entry in quantities {
                    match entry.quantity {
                        QuantityValue::Integer(n) => request.try_insert(&entry.symbol, n)?,
                        QuantityValue::Text(text) => request.insert_raw(&entry.symbol, &text)?,
                    }
                }
                Ok(SessionRequest::Trade(request))
            }
        }
    }
}

// ==================== 서버 → 클라이언트 메시지 ====================

/// 서버에서 클라이언트로 보내는 메시지.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// 연결 환영 메시지
    Welcome {
        /// 세션 ID
        session_id: SessionId,
        /// 서버 버전
        version: String,
        /// 서버 타임스탬프
        timestamp: i64,
    },
    /// 잔고
    Balance {
        /// 현금 잔고
        balance: Balance,
    },
    /// 포트폴리오
    Update {
        /// 심볼별 보유 수량
        stocks: Vec<HoldingView>,
        /// 현금 잔고
        balance: Balance,
    },
    /// 거래 거절 (설정 시에만 전송)
    TradeRejected {
        /// 거절 사유
        reason: String,
    },
    /// 에러
    Error {
        /// 에러 코드
        code: String,
        /// 에러 메시지
        message: String,
    },
}

impl ServerMessage {
    /// JSON 문자열로 직렬화.
    pub fn to_json(&self) -> Result<String, WsError> {
        serde_json::to_string(self).map_err(WsError::from)
    }

    /// 에러 메시지 생성 헬퍼.
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        ServerMessage::Error {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<PortfolioView> for ServerMessage {
    fn from(view: PortfolioView) -> Self {
        ServerMessage::Update {
            stocks: view.stocks,
            balance: view.balance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use stocksim_core::Symbol;

    #[test]
    fn test_parse_request_types() {
        assert_eq!(
            ClientMessage::from_json(r#"{"type":"balance"}"#).unwrap(),
            ClientMessage::Balance
        );
        assert_eq!(
            ClientMessage::from_json(r#"{"type":"update"}"#).unwrap(),
            ClientMessage::Update
        );
    }

    #[test]
    fn test_trade_without_type() {
        let msg = ClientMessage::from_json(
            r#"{"quantities":[{"symbol":"AAPL","quantity":"5"},{"symbol":"MSFT","quantity":-2}]}"#,
        )
        .unwrap();

        let SessionRequest::Trade(request) = msg.into_request().unwrap() else {
            panic!("expected trade");
        };
        assert_eq!(request.delta(&Symbol::new("AAPL")), Some(5));
        assert_eq!(request.delta(&Symbol::new("MSFT")), Some(-2));
    }

    #[test]
    fn test_duplicate_symbol_last_wins() {
        let msg = ClientMessage::from_json(
            r#"{"type":"trade","quantities":[{"symbol":"AAPL","quantity":"5"},{"symbol":"AAPL","quantity":"1"}]}"#,
        )
        .unwrap();

        let SessionRequest::Trade(request) = msg.into_request().unwrap() else {
            panic!("expected trade");
        };
        assert_eq!(request.len(), 1);
        assert_eq!(request.delta(&Symbol::new("AAPL")), Some(1));
    }

    #[test]
    fn test_malformed_messages() {
        let err = ClientMessage::from_json("not json").unwrap_err();
        assert_eq!(err.code(), "INVALID_MESSAGE");

        let err = ClientMessage::from_json(r#"{"type":"trade"}"#).unwrap_err();
        assert_eq!(err.code(), "INVALID_MESSAGE");

        let err = ClientMessage::from_json(r#"{"type":"dance"}"#).unwrap_err();
        assert_eq!(err.code(), "UNKNOWN_MESSAGE_TYPE");

        let err = ClientMessage::from_json(r#"{"quantities":[{"symbol":"AAPL","quantity":"five"}]}"#)
            .unwrap()
            .into_request()
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_MESSAGE");

        let err = ClientMessage::from_json(r#"{"quantities":[{"symbol":"","quantity":3}]}"#)
            .unwrap()
            .into_request()
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_MESSAGE");
    }

    #[test]
    fn test_integer_quantity_extremes() {
        let msg = ClientMessage::from_json(
            r#"{"quantities":[{"symbol":"AAPL","quantity":9223372036854775807},{"symbol":"MSFT","quantity":-9223372036854775808}]}"#,
        )
        .unwrap();

        let SessionRequest::Trade(request) = msg.into_request().unwrap() else {
            panic!("expected trade");
        };
        assert_eq!(request.delta(&Symbol::new("AAPL")), Some(i64::MAX));
        assert_eq!(request.delta(&Symbol::new("MSFT")), Some(i64::MIN));
    }

    #[test]
    fn test_server_message_serialization() {
        let msg = ServerMessage::Update {
            stocks: vec![HoldingView {
                symbol: Symbol::new("AAPL"),
                held: 5,
            }],
            balance: dec!(500),
        };
        let json: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();

        assert_eq!(json["type"], "update");
        assert_eq!(json["stocks"][0]["symbol"], "AAPL");
        assert_eq!(json["stocks"][0]["held"], 5);
        assert_eq!(json["balance"], "500");

        let welcome = ServerMessage::Welcome {
            session_id: SessionId::new(3),
            version: "0.1.0".to_string(),
            timestamp: 0,
        };
        let json: serde_json::Value = serde_json::from_str(&welcome.to_json().unwrap()).unwrap();
        assert_eq!(json["type"], "welcome");
        assert_eq!(json["session_id"], 3);
    }
}
