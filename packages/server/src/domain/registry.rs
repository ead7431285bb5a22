//! Connection Registry trait 定義
//!
//! ルームごとのアクティブな WebSocket 接続を管理するインターフェース。
//! WebSocket 自体の生成は UI 層が行い、レジストリは生成済みの
//! `UnboundedSender` を預かってメッセージ送信に使用します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use tokio::sync::mpsc;

use super::{ClientId, Participant, RegistryError, RoomId, Timestamp};

/// クライアントへのメッセージ送信用チャンネル
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// ブロードキャストの結果
///
/// 一部の宛先への送信失敗はブロードキャスト全体を中断しない。
/// 失敗した宛先はレジストリから除去され、`evicted` に記録される。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BroadcastReport {
    /// 送信に成功した接続数
    pub delivered: usize,
    /// 送信に失敗し、レジストリから除去された接続
    pub evicted: Vec<ClientId>,
}

/// Connection Registry trait
///
/// ## 並行性
///
/// - register / deregister / ブロードキャスト時のスナップショット取得は
///   同一ルームについて相互排他でなければならない
/// - 異なるルームの操作は並行して進行してよい
/// - レジストリのロックを保持したまま永続化 I/O を行ってはならない
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// 接続を登録する
    ///
    /// # Returns
    ///
    /// * `Ok(())` - 登録成功
    /// * `Err(RegistryError::AlreadyRegistered)` - (room_id, client_id) の組が登録済み。
    ///   既存の接続には影響しない
    async fn register(
        &self,
        room_id: RoomId,
        client_id: ClientId,
        sender: PusherChannel,
        connected_at: Timestamp,
    ) -> Result<(), RegistryError>;

    /// 接続を登録解除する（冪等。存在しなければ no-op）
    async fn deregister(&self, room_id: &RoomId, client_id: &ClientId);

    /// 特定の接続にのみメッセージを送信する（エラーフレーム用）
    async fn push_to(
        &self,
        room_id: &RoomId,
        client_id: &ClientId,
        content: &str,
    ) -> Result<(), RegistryError>;

    /// ルーム内の全接続（`exclude` を除く）にメッセージを送信する
    ///
    /// 一部の宛先への送信失敗は他の宛先への配送を妨げない。
    /// 失敗した宛先は副作用として登録解除される。
    async fn broadcast(
        &self,
        room_id: &RoomId,
        content: &str,
        exclude: Option<&ClientId>,
    ) -> BroadcastReport;

    /// ルームの参加者一覧を取得（client_id 昇順）
    async fn participants(&self, room_id: &RoomId) -> Vec<Participant>;

    /// ルーム内の接続数を取得
    async fn count_connections(&self, room_id: &RoomId) -> usize;
}
