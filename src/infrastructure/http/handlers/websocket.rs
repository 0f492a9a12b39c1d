//! WebSocket Handler - 任务状态推送

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::infrastructure::http::dto::UserFilter;
use crate::infrastructure::http::state::AppState;

/// 任务事件 WebSocket，可用 ?userId= 只订阅自己的任务
pub async fn jobs_websocket_handler(
    ws: WebSocketUpgrade,
    Query(filter): Query<UserFilter>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let user_id = filter.user_id.filter(|u| !u.trim().is_empty());
    ws.on_upgrade(move |socket| handle_jobs_socket(socket, user_id, state))
}

async fn handle_jobs_socket(socket: WebSocket, user_id: Option<String>, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut event_rx = state.event_publisher.subscribe();

    tracing::info!(user_id = ?user_id, "Jobs WebSocket connected");

    // 事件转发任务
    let forward_user = user_id.clone();
    let forward_task = tokio::spawn(async move {
        loop {
            let event = match event_rx.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Jobs WebSocket lagging, events dropped");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            if !event.is_visible_to(forward_user.as_deref()) {
                continue;
            }

            let msg = match serde_json::to_string(&event) {
                Ok(json) => Message::Text(json),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize event");
                    continue;
                }
            };

            if let Err(e) = sender.send(msg).await {
                tracing::debug!(error = %e, "Failed to send WebSocket message");
                break;
            }
        }
    });

    // 接收客户端消息（心跳）
    let receive_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    tracing::info!("Jobs WebSocket closed by client");
                    break;
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Jobs WebSocket error");
                    break;
                }
                _ => {}
            }
        }
    });

    // 等待任一任务完成
    tokio::select! {
        _ = forward_task => {}
        _ = receive_task => {}
    }

    tracing::info!(user_id = ?user_id, "Jobs WebSocket disconnected");
}
