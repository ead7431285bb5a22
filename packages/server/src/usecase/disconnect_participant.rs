//! UseCase: 参加者切断処理
//!
//! WebSocket 切断時に呼ばれる。登録解除は冪等（存在しない接続の解除は no-op）。
//! 接続のクローズはその接続の未送信分のみを破棄し、受理済みメッセージの
//! 永続化はロールバックしない。

use std::sync::Arc;

use idobata_shared::time::Clock;

use crate::domain::{BroadcastReport, ClientId, ConnectionRegistry, RoomId, Timestamp};

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase {
    /// ConnectionRegistry（接続管理の抽象化）
    registry: Arc<dyn ConnectionRegistry>,
    /// Clock（時刻取得の抽象化）
    clock: Arc<dyn Clock>,
}

impl DisconnectParticipantUseCase {
    /// 新しい DisconnectParticipantUseCase を作成
    pub fn new(registry: Arc<dyn ConnectionRegistry>, clock: Arc<dyn Clock>) -> Self {
        Self { registry, clock }
    }

    /// 参加者切断を実行
    ///
    /// # Arguments
    ///
    /// * `room_id` - 対象ルームの ID
    /// * `client_id` - 切断するクライアントの ID
    ///
    /// # Returns
    ///
    /// 切断時刻。登録解除は冪等なので常に成功する
    pub async fn execute(&self, room_id: &RoomId, client_id: &ClientId) -> Timestamp {
        self.registry.deregister(room_id, client_id).await;
        Timestamp::new(self.clock.now_millis())
    }

    /// 参加者が left したことを残りの参加者にブロードキャスト
    ///
    /// # Arguments
    ///
    /// * `room_id` - 対象ルームの ID
    /// * `message` - ブロードキャストするメッセージ（JSON）
    pub async fn broadcast_participant_left(
        &self,
        room_id: &RoomId,
        message: &str,
    ) -> BroadcastReport {
        // 切断したクライアントは既に登録解除済みのため、除外指定は不要
        self.registry.broadcast(room_id, message, None).await
    }

    /// 残りの参加者数を取得
    pub async fn count_remaining_participants(&self, room_id: &RoomId) -> usize {
        self.registry.count_connections(room_id).await
    }
}
