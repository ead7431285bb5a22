//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    domain::{ClientId, ConnectionState, RegistryError, RoomId, Timestamp},
    infrastructure::dto::websocket::{
        ChatFrame, ErrorCode, ErrorFrame, FrameType, ParticipantJoinedFrame, ParticipantLeftFrame,
        RoomConnectedFrame,
    },
    usecase::{ConnectError, SendMessageError},
};

use super::super::state::AppState;

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub client_id: String,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let room_id_str = room_id;
    let client_id_str = query.client_id;

    // Convert String -> RoomId / ClientId (Domain Model)
    let room_id = match RoomId::try_from(room_id_str.clone()) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!("Invalid room_id '{}': {}", room_id_str, e);
            return Err(StatusCode::BAD_REQUEST);
        }
    };
    let client_id = match ClientId::try_from(client_id_str.clone()) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!("Invalid client_id '{}': {}", client_id_str, e);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    // Create a channel for this client to receive messages
    let (tx, rx) = mpsc::unbounded_channel();

    let room_id_for_handle = room_id.clone();
    let client_id_for_handle = client_id.clone();
    match state
        .connect_participant_usecase
        .execute(room_id, client_id, tx)
        .await
    {
        Ok(connected_at) => {
            tracing::info!(
                "Client '{}' connected to room '{}'",
                client_id_str,
                room_id_str
            );
            Ok(ws.on_upgrade(move |socket| {
                handle_socket(
                    socket,
                    state,
                    room_id_for_handle,
                    client_id_for_handle,
                    rx,
                    connected_at,
                )
            }))
        }
        Err(ConnectError::Registry(RegistryError::AlreadyRegistered { .. })) => {
            tracing::warn!(
                "Client '{}' is already connected to room '{}'. Rejecting connection.",
                client_id_str,
                room_id_str
            );
            Err(StatusCode::CONFLICT)
        }
        Err(ConnectError::Registry(e)) => {
            tracing::warn!(
                "Failed to register '{}' in room '{}': {}",
                client_id_str,
                room_id_str,
                e
            );
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// This function handles the outbound message flow: messages from other clients
/// (via rx channel) are sent to this client's WebSocket connection.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            // Send the message to this client
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

/// Apply a connection state transition, logging anomalies instead of failing.
///
/// An invalid transition is a programming anomaly, never a reason to tear
/// down someone else's session; the current state is kept in that case.
fn apply_transition(current: ConnectionState, next: ConnectionState) -> ConnectionState {
    match current.try_transition(next) {
        Ok(new_state) => {
            tracing::debug!("Connection state: {} -> {}", current, new_state);
            new_state
        }
        Err(e) => {
            tracing::warn!("Connection state anomaly: {}", e);
            current
        }
    }
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    room_id: RoomId,
    client_id: ClientId,
    rx: mpsc::UnboundedReceiver<String>,
    connected_at: Timestamp,
) {
    let (mut sender, mut receiver) = socket.split();
    let conn_state = ConnectionState::Connecting;

    // Send current room participants to the newly connected client
    {
        let participants = state
            .connect_participant_usecase
            .build_participant_list(&room_id)
            .await;

        let room_msg = RoomConnectedFrame {
            r#type: FrameType::RoomConnected,
            room_id: room_id.as_str().to_string(),
            participants: participants.into_iter().map(Into::into).collect(),
        };

        let room_json = serde_json::to_string(&room_msg).unwrap();
        if let Err(e) = sender.send(Message::Text(room_json.into())).await {
            tracing::error!(
                "Failed to send room snapshot to '{}': {}",
                client_id.as_str(),
                e
            );
            // The socket died before reaching Open; undo the registration
            state
                .disconnect_participant_usecase
                .execute(&room_id, &client_id)
                .await;
            return;
        }
    }

    // Broadcast participant-joined to all other clients
    {
        let joined_msg = ParticipantJoinedFrame {
            r#type: FrameType::ParticipantJoined,
            client_id: client_id.as_str().to_string(),
            connected_at: connected_at.value(),
        };

        let joined_json = serde_json::to_string(&joined_msg).unwrap();
        state
            .connect_participant_usecase
            .broadcast_participant_joined(&room_id, &client_id, &joined_json)
            .await;
        tracing::info!("Broadcasted participant-joined for '{}'", client_id.as_str());
    }

    // Handshake complete; inbound messages may flow from here on
    let conn_state = apply_transition(conn_state, ConnectionState::Open);

    let state_clone = state.clone();
    let room_id_clone = room_id.clone();
    let client_id_clone = client_id.clone();

    // Spawn a task to receive messages from this client
    let mut recv_task = tokio::spawn(async move {
        let mut conn_state = conn_state;
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!(
                        "WebSocket error on '{}': {}",
                        client_id_clone.as_str(),
                        e
                    );
                    conn_state = apply_transition(conn_state, ConnectionState::Faulted);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    // Inbound handling outside Open is a no-op, not a fatal error
                    if !conn_state.is_open() {
                        tracing::warn!(
                            "Dropping inbound message from '{}' in state '{}'",
                            client_id_clone.as_str(),
                            conn_state
                        );
                        continue;
                    }
                    route_inbound(
                        &state_clone,
                        &room_id_clone,
                        &client_id_clone,
                        text.to_string(),
                    )
                    .await;
                }
                Message::Binary(_) => {
                    tracing::warn!(
                        "Ignoring binary frame from '{}' (text protocol only)",
                        client_id_clone.as_str()
                    );
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("Client '{}' requested close", client_id_clone.as_str());
                    conn_state = apply_transition(conn_state, ConnectionState::Closing);
                    break;
                }
                _ => {}
            }
        }

        // Drive the state machine to Closed (peers that vanish without a
        // Close frame pass through Closing as well)
        if conn_state.is_open() {
            conn_state = apply_transition(conn_state, ConnectionState::Closing);
        }
        apply_transition(conn_state, ConnectionState::Closed);
    });

    // Spawn a task to receive messages from other clients and send to this client
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // Deregister (idempotent) and broadcast participant-left to the rest
    let disconnected_at = state
        .disconnect_participant_usecase
        .execute(&room_id, &client_id)
        .await;
    tracing::info!(
        "Client '{}' disconnected from room '{}'",
        client_id.as_str(),
        room_id.as_str()
    );

    let left_msg = ParticipantLeftFrame {
        r#type: FrameType::ParticipantLeft,
        client_id: client_id.as_str().to_string(),
        disconnected_at: disconnected_at.value(),
    };
    let left_json = serde_json::to_string(&left_msg).unwrap();
    state
        .disconnect_participant_usecase
        .broadcast_participant_left(&room_id, &left_json)
        .await;
    tracing::info!("Broadcasted participant-left for '{}'", client_id.as_str());
}

/// Route one inbound message: validate, persist, broadcast.
///
/// Failures are reported to the sender only; the connection stays open and
/// no other session is affected.
async fn route_inbound(state: &Arc<AppState>, room_id: &RoomId, client_id: &ClientId, raw_body: String) {
    let result = state
        .send_message_usecase
        .execute(room_id.clone(), client_id.clone(), raw_body, |message| {
            serde_json::to_string(&ChatFrame::from(message)).unwrap()
        })
        .await;

    match result {
        Ok((message, report)) => {
            tracing::info!(
                "Broadcasted message #{} from '{}' in room '{}' to {} connection(s)",
                message.sequence.value(),
                client_id.as_str(),
                room_id.as_str(),
                report.delivered
            );
        }
        Err(SendMessageError::Validation(e)) => {
            tracing::warn!(
                "Rejected message from '{}' in room '{}': {}",
                client_id.as_str(),
                room_id.as_str(),
                e
            );
            let frame = ErrorFrame::new(ErrorCode::ValidationError, e.to_string());
            state
                .send_message_usecase
                .notify_sender(room_id, client_id, &serde_json::to_string(&frame).unwrap())
                .await;
        }
        Err(SendMessageError::Storage(e)) => {
            tracing::error!(
                "Failed to persist message from '{}' in room '{}': {}",
                client_id.as_str(),
                room_id.as_str(),
                e
            );
            let frame = ErrorFrame::new(ErrorCode::StorageError, e.to_string());
            state
                .send_message_usecase
                .notify_sender(room_id, client_id, &serde_json::to_string(&frame).unwrap())
                .await;
        }
    }
}
