//! 거래 세션을 위한 WebSocket 서버.
//!
//! 연결 하나가 세션 하나이며, 요청은 도착 순서대로 처리됩니다.
//!
//! # 메시지 형식
//!
//! 모든 메시지는 JSON 형식으로 교환됩니다.
//!
//! ## 클라이언트 → 서버
//!
//! ```json
//! {"type": "balance"}
//! {"type": "update"}
//! {"quantities": [{"symbol": "AAPL", "quantity": "5"}]}
//! {"type": "trade", "quantities": [{"symbol": "AAPL", "quantity": -2}]}
//! ```
//!
//! ## 서버 → 클라이언트
//!
//! ```json
//! {"type": "welcome", "session_id": 3, "version": "0.1.0", "timestamp": 1700000000000}
//! {"type": "balance", "balance": "9500.00"}
//! {"type": "update", "stocks": [{"symbol": "AAPL", "held": 5}], "balance": "9500.00"}
//! {"type": "trade_rejected", "reason": "..."}
//! {"type": "error", "code": "INVALID_MESSAGE", "message": "..."}
//! ```
//!
//! 승인된 거래에는 응답이 없습니다. 거절된 거래는 설정에 따라
//! `trade_rejected` 를 보내거나 조용히 무시합니다.

pub mod handler;
pub mod messages;

pub use handler::{websocket_handler, websocket_router};
pub use messages::{ClientMessage, QuantityEntry, QuantityValue, ServerMessage, WsError};
