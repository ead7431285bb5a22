//! Server execution logic.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::usecase::{
    CheckHealthUseCase, ConnectParticipantUseCase, DisconnectParticipantUseCase,
    ListHistoryUseCase, SendMessageUseCase,
};

use super::{
    handler::{
        http::{health_check, list_messages},
        websocket::websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Room-based WebSocket chat server
///
/// This struct encapsulates the wired-up use cases and provides methods to
/// build the router and run the server.
///
/// # Example
///
/// ```ignore
/// let server = Server::new(
///     connect_participant_usecase,
///     disconnect_participant_usecase,
///     send_message_usecase,
///     list_history_usecase,
///     check_health_usecase,
/// );
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    /// ConnectParticipantUseCase（参加者接続のユースケース）
    connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    /// DisconnectParticipantUseCase（参加者切断のユースケース）
    disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    /// SendMessageUseCase（メッセージ送信のユースケース）
    send_message_usecase: Arc<SendMessageUseCase>,
    /// ListHistoryUseCase（履歴取得のユースケース）
    list_history_usecase: Arc<ListHistoryUseCase>,
    /// CheckHealthUseCase（ヘルスチェックのユースケース）
    check_health_usecase: Arc<CheckHealthUseCase>,
}

impl Server {
    /// Create a new Server instance
    pub fn new(
        connect_participant_usecase: Arc<ConnectParticipantUseCase>,
        disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
        send_message_usecase: Arc<SendMessageUseCase>,
        list_history_usecase: Arc<ListHistoryUseCase>,
        check_health_usecase: Arc<CheckHealthUseCase>,
    ) -> Self {
        Self {
            connect_participant_usecase,
            disconnect_participant_usecase,
            send_message_usecase,
            list_history_usecase,
            check_health_usecase,
        }
    }

    /// Build the axum router (also used by in-process integration tests)
    pub fn into_router(self) -> Router {
        let app_state = Arc::new(AppState {
            connect_participant_usecase: self.connect_participant_usecase,
            disconnect_participant_usecase: self.disconnect_participant_usecase,
            send_message_usecase: self.send_message_usecase,
            list_history_usecase: self.list_history_usecase,
            check_health_usecase: self.check_health_usecase,
        });

        Router::new()
            // WebSocket エンドポイント
            .route("/ws/{room_id}", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/v1/health", get(health_check))
            .route("/api/v1/rooms/{room_id}/messages", get(list_messages))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state)
    }

    /// Run the chat server
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address
    /// or if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let app = self.into_router();

        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        // Start the server
        tracing::info!("Chat server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws/{{room_id}}?client_id=...", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        // Set up graceful shutdown signal handler
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
