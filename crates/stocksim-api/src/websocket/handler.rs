//! WebSocket 연결 handler.
//!
//! 연결 하나가 세션 하나입니다. 수신 루프 하나가 요청을 도착 순서대로
//! 세션 엔진에 넘기고, 응답이 있으면 같은 연결로 돌려보냅니다.

use std::ops::ControlFlow;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::Utc;
use futures::{Sink, SinkExt, StreamExt};
use stocksim_core::{Session, SessionReply, TradeDecision};
use tracing::{debug, error, info, warn, Instrument};

use super::messages::{ClientMessage, ServerMessage};
use crate::metrics::{
    decrement_websocket_connections, increment_websocket_connections, record_request_error,
    record_tick, record_trade,
};
use crate::state::AppState;

/// WebSocket 업그레이드 핸들러.
///
/// # 엔드포인트
///
/// `GET /ws/stocks`
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// WebSocket 연결 처리.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let session = match state.market.open_session().await {
        Ok(session) => session,
        Err(e) => {
            error!(error = %e, "Failed to open session");
            return;
        }
    };
    let span = stocksim_core::session_span!("ws_session", session.id());

    run_session(socket, session, state).instrument(span).await;
}

/// 세션 수신 루프.
async fn run_session(socket: WebSocket, mut session: Session, state: Arc<AppState>) {
    let session_id = session.id();
    info!(session_id = %session_id, "WebSocket connected");

    // WebSocket 연결 메트릭 증가
    increment_websocket_connections();

    let (mut sender, mut receiver) = socket.split();

    // 환영 메시지 전송
    let welcome = ServerMessage::Welcome {
        session_id,
        version: state.version.clone(),
        timestamp: Utc::now().timestamp_millis(),
    };

    if send_message(&mut sender, &welcome).await {
        while let Some(result) = receiver.next().await {
            let msg = match result {
                Ok(msg) => msg,
                Err(e) => {
                    warn!(session_id = %session_id, error = %e, "WebSocket receive error");
                    break;
                }
            };

            match handle_client_message(&session, msg, &state).await {
                ControlFlow::Continue(Some(reply)) => {
                    if !send_message(&mut sender, &reply).await {
                        break;
                    }
                }
                ControlFlow::Continue(None) => {}
                ControlFlow::Break(()) => break,
            }
        }
    }

    // 세션 정리
    session.close().await;

    // WebSocket 연결 메트릭 감소
    decrement_websocket_connections();

    info!(session_id = %session_id, "WebSocket disconnected");
}

/// 메시지를 전송합니다. 연결이 끊겼으면 `false`.
async fn send_message<S>(sender: &mut S, msg: &ServerMessage) -> bool
where
    S: Sink<Message> + Unpin,
{
    match msg.to_json() {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            error!(error = %e, "Failed to serialize server message");
            true
        }
    }
}

/// 클라이언트 메시지 처리.
///
/// `Continue` 면 연결 유지 (응답이 있으면 함께 반환), `Break` 면 연결 종료.
async fn handle_client_message(
    session: &Session,
    msg: Message,
    state: &AppState,
) -> ControlFlow<(), Option<ServerMessage>> {
    match msg {
        Message::Text(text) => {
            let request = ClientMessage::from_json(&text).and_then(ClientMessage::into_request);
            match request {
                Ok(request) => {
                    ControlFlow::Continue(process_request(session, request, state).await)
                }
                Err(e) => {
                    warn!(session_id = %session.id(), error = %e, "Invalid message");
                    record_request_error(e.code());
                    // 연결은 유지
                    ControlFlow::Continue(Some(ServerMessage::error(e.code(), e.to_string())))
                }
            }
        }
        Message::Binary(_) => {
            warn!("Binary messages not supported");
            ControlFlow::Continue(None)
        }
        Message::Ping(_) | Message::Pong(_) => ControlFlow::Continue(None),
        Message::Close(_) => {
            debug!(session_id = %session.id(), "Close message received");
            ControlFlow::Break(())
        }
    }
}

/// 파싱된 요청을 세션 엔진에 넘기고 응답 메시지를 만듭니다.
async fn process_request(
    session: &Session,
    request: stocksim_core::SessionRequest,
    state: &AppState,
) -> Option<ServerMessage> {
    match session.handle(request).await {
        Ok(SessionReply::Balance(reply)) => Some(ServerMessage::Balance {
            balance: reply.balance,
        }),
        Ok(SessionReply::Update {
            portfolio,
            ticked_round,
        }) => {
            if ticked_round.is_some() {
                record_tick();
            }
            Some(ServerMessage::from(portfolio))
        }
        Ok(SessionReply::Trade(decision)) => {
            record_trade(&decision);
            match decision {
                TradeDecision::Accepted { .. } => None,
                TradeDecision::Rejected(reason) => state
                    .notify_rejected_trades()
                    .then(|| ServerMessage::TradeRejected {
                        reason: reason.to_string(),
                    }),
            }
        }
        Err(e) => {
            if e.is_client_error() {
                warn!(session_id = %session.id(), error = %e, "Request refused");
            } else {
                error!(session_id = %session.id(), error = %e, "Request failed");
            }
            record_request_error(e.code());
            Some(ServerMessage::error(e.code(), e.to_string()))
        }
    }
}

/// WebSocket 라우터 생성.
///
/// `/ws` 아래에 중첩해서 사용합니다.
pub fn websocket_router() -> Router<Arc<AppState>> {
    Router::new().route("/stocks", get(websocket_handler))
}
