//! Server state shared across request handlers.

use std::sync::Arc;

use crate::usecase::{
    CheckHealthUseCase, ConnectParticipantUseCase, DisconnectParticipantUseCase,
    ListHistoryUseCase, SendMessageUseCase,
};

/// Shared application state
pub struct AppState {
    /// ConnectParticipantUseCase（参加者接続のユースケース）
    pub connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    /// DisconnectParticipantUseCase（参加者切断のユースケース）
    pub disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    /// SendMessageUseCase（メッセージ送信のユースケース）
    pub send_message_usecase: Arc<SendMessageUseCase>,
    /// ListHistoryUseCase（履歴取得のユースケース）
    pub list_history_usecase: Arc<ListHistoryUseCase>,
    /// CheckHealthUseCase（ヘルスチェックのユースケース）
    pub check_health_usecase: Arc<CheckHealthUseCase>,
}
