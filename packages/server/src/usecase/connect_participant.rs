//! UseCase: 参加者接続処理
//!
//! WebSocket 接続の確立時に呼ばれる。(room_id, client_id) の組で接続を
//! レジストリに登録し、既存参加者への join 通知を行う。
//! ルームは最初の接続時に暗黙に作られる（事前のルーム作成操作は存在しない）。

use std::sync::Arc;

use idobata_shared::time::Clock;

use crate::domain::{
    BroadcastReport, ClientId, ConnectionRegistry, Participant, PusherChannel, RoomId, Timestamp,
};

use super::error::ConnectError;

/// 参加者接続のユースケース
pub struct ConnectParticipantUseCase {
    /// ConnectionRegistry（接続管理の抽象化）
    registry: Arc<dyn ConnectionRegistry>,
    /// Clock（時刻取得の抽象化）
    clock: Arc<dyn Clock>,
}

impl ConnectParticipantUseCase {
    /// 新しい ConnectParticipantUseCase を作成
    pub fn new(registry: Arc<dyn ConnectionRegistry>, clock: Arc<dyn Clock>) -> Self {
        Self { registry, clock }
    }

    /// 参加者接続を実行
    ///
    /// # Arguments
    ///
    /// * `room_id` - 接続先ルームの ID
    /// * `client_id` - 接続するクライアントの ID
    /// * `sender` - クライアントへのメッセージ送信用チャンネル
    ///
    /// # Returns
    ///
    /// * `Ok(Timestamp)` - 接続成功(接続時刻を返す)
    /// * `Err(ConnectError)` - 接続失敗。既存の接続には影響しない
    pub async fn execute(
        &self,
        room_id: RoomId,
        client_id: ClientId,
        sender: PusherChannel,
    ) -> Result<Timestamp, ConnectError> {
        let connected_at = Timestamp::new(self.clock.now_millis());

        self.registry
            .register(room_id, client_id, sender, connected_at)
            .await?;

        Ok(connected_at)
    }

    /// ルームの参加者リストを構築（client_id 昇順）
    pub async fn build_participant_list(&self, room_id: &RoomId) -> Vec<Participant> {
        self.registry.participants(room_id).await
    }

    /// 参加者が join したことを既存の参加者にブロードキャスト
    ///
    /// # Arguments
    ///
    /// * `room_id` - 対象ルームの ID
    /// * `new_client_id` - 新規接続したクライアントの ID（通知対象から除外）
    /// * `message` - ブロードキャストするメッセージ（JSON）
    pub async fn broadcast_participant_joined(
        &self,
        room_id: &RoomId,
        new_client_id: &ClientId,
        message: &str,
    ) -> BroadcastReport {
        self.registry
            .broadcast(room_id, message, Some(new_client_id))
            .await
    }
}
