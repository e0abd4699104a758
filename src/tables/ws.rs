use axum::{
    debug_handler,
    extract::{State, WebSocketUpgrade, ws::{Message, WebSocket}},
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};

use crate::AppState;
use crate::events::{ClientEvent, ServerEvent};
use crate::registry::{ConnectionId, RoomKey};

#[debug_handler]
pub(crate) async fn table_ws(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (conn_id, mut outbound) = state.rooms.connect();
    tracing::info!(%conn_id, "client connected");

    let (mut sender, mut receiver) = socket.split();

    // Drains this connection's queue independently of every other member, so
    // a slow socket only ever delays itself.
    let pump = tokio::spawn(async move {
        while let Some(event) = outbound.recv().await {
            let Ok(text) = serde_json::to_string(&event) else {
                continue;
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = receiver.next().await {
        let Message::Text(text) = msg else {
            continue;
        };
        match serde_json::from_str::<ClientEvent>(&text) {
            Ok(event) => handle_event(&state, conn_id, event).await,
            Err(err) => {
                // Incomplete frames are bounced straight back to the sender;
                // the store and room state are never touched.
                tracing::debug!(%conn_id, %err, "malformed event");
                state
                    .rooms
                    .send_to(conn_id, ServerEvent::Error { message: format!("malformed event: {err}") });
            }
        }
    }

    state.rooms.drop_connection(conn_id);
    pump.abort();
    tracing::info!(%conn_id, "client disconnected");
}

async fn handle_event(state: &AppState, conn_id: ConnectionId, event: ClientEvent) {
    match event {
        ClientEvent::Join { table_id, nickname } => {
            let room = RoomKey::for_table(table_id);
            state.rooms.join(conn_id, &room);
            tracing::info!(
                %conn_id,
                %room,
                nickname = nickname.as_deref().unwrap_or("?"),
                "joined room"
            );
        }
        ClientEvent::Leave { table_id, nickname } => {
            let room = RoomKey::for_table(table_id);
            state.rooms.leave(conn_id, &room);
            tracing::info!(
                %conn_id,
                %room,
                nickname = nickname.as_deref().unwrap_or("?"),
                "left room"
            );
        }
        ClientEvent::SendAction { table_id, user_id, action_type, details } => {
            if let Err(err) = state
                .engine
                .submit_action(table_id, user_id, &action_type, &details)
                .await
            {
                // Failures go to the submitter only; members see nothing.
                tracing::debug!(%conn_id, table_id, %err, "action rejected");
                state.rooms.send_to(conn_id, ServerEvent::Error { message: err.to_string() });
            }
        }
    }
}
