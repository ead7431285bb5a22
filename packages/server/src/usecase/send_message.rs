//! UseCase: メッセージ送信処理（Message Router）
//!
//! 受信した生ペイロードを検証し、Persistence 層で採番・永続化してから
//! ルーム内にブロードキャストする。
//!
//! ## 順序保証
//!
//! 同一ルーム内では、ブロードキャストの順序がシーケンス番号の採番順と
//! 一致しなければならない。そのためルームごとの Mutex で
//! 「採番・永続化 → ブロードキャスト」の区間を直列化する。
//! 異なるルームは並行して進行する。レジストリのロックは
//! ブロードキャスト内部でのみ使われ、永続化 I/O 中には保持されない。

use std::collections::HashMap;
use std::sync::Arc;

use idobata_shared::time::Clock;
use tokio::sync::Mutex;

use crate::domain::{
    BroadcastReport, ChatMessage, ClientId, ConnectionRegistry, MessageBody, MessageRepository,
    RoomId, Timestamp,
};

use super::error::SendMessageError;

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn MessageRepository>,
    /// ConnectionRegistry（接続管理の抽象化）
    registry: Arc<dyn ConnectionRegistry>,
    /// Clock（時刻取得の抽象化）
    clock: Arc<dyn Clock>,
    /// ルームごとの順序保証用ロック
    room_locks: Mutex<HashMap<RoomId, Arc<Mutex<()>>>>,
    /// 送信者自身にもメッセージを配送するか
    echo_to_sender: bool,
}

impl SendMessageUseCase {
    /// 新しい SendMessageUseCase を作成
    pub fn new(
        repository: Arc<dyn MessageRepository>,
        registry: Arc<dyn ConnectionRegistry>,
        clock: Arc<dyn Clock>,
        echo_to_sender: bool,
    ) -> Self {
        Self {
            repository,
            registry,
            clock,
            room_locks: Mutex::new(HashMap::new()),
            echo_to_sender,
        }
    }

    /// メッセージ送信を実行
    ///
    /// # Arguments
    ///
    /// * `room_id` - 送信先ルームの ID
    /// * `from` - 送信者のクライアント ID
    /// * `raw_body` - 受信した生のメッセージ本文（検証前）
    /// * `encode` - 採番済みメッセージからワイヤフレーム（JSON）を生成する関数。
    ///   フレームの形式は UI 層の責務のため、ここでは関数として注入する
    ///
    /// # Returns
    ///
    /// * `Ok((ChatMessage, BroadcastReport))` - 採番済みメッセージと配送結果
    /// * `Err(SendMessageError::Validation)` - 不正な本文。永続化・配送は行われない
    /// * `Err(SendMessageError::Storage)` - 永続化失敗。配送は一切行われない
    pub async fn execute<F>(
        &self,
        room_id: RoomId,
        from: ClientId,
        raw_body: String,
        encode: F,
    ) -> Result<(ChatMessage, BroadcastReport), SendMessageError>
    where
        F: FnOnce(&ChatMessage) -> String + Send,
    {
        // 1. バリデーション（ロック取得前に弾く）
        let body = MessageBody::new(raw_body)?;

        // 2. ルームごとの順序保証ロックを取得
        let room_lock = self.room_lock(&room_id).await;
        let _ordering_guard = room_lock.lock().await;

        // 3. 採番・永続化（Persistence 層がシーケンス番号をアトミックに採番）
        let timestamp = Timestamp::new(self.clock.now_millis());
        let message = self
            .repository
            .append_message(&room_id, &from, body, timestamp)
            .await?;

        // 4. ブロードキャスト（エコーポリシーに応じて送信者を除外）
        let frame = encode(&message);
        let exclude = if self.echo_to_sender {
            None
        } else {
            Some(&from)
        };
        let report = self.registry.broadcast(&room_id, &frame, exclude).await;

        if !report.evicted.is_empty() {
            tracing::warn!(
                "Evicted {} dead connection(s) from room '{}' during broadcast",
                report.evicted.len(),
                room_id.as_str()
            );
        }

        Ok((message, report))
    }

    /// 送信者にのみエラーフレームを通知する
    ///
    /// 通知自体の失敗は警告ログに留める（送信者の切断と競合した場合など）。
    pub async fn notify_sender(&self, room_id: &RoomId, client_id: &ClientId, frame: &str) {
        if let Err(e) = self.registry.push_to(room_id, client_id, frame).await {
            tracing::warn!(
                "Failed to push error frame to '{}' in room '{}': {}",
                client_id.as_str(),
                room_id.as_str(),
                e
            );
        }
    }

    /// ルームごとの順序保証ロックを取得（なければ作成）
    ///
    /// エントリはルームが dormant になっても残るが、ロック 1 本分のみ。
    async fn room_lock(&self, room_id: &RoomId) -> Arc<Mutex<()>> {
        let mut locks = self.room_locks.lock().await;
        locks.entry(room_id.clone()).or_default().clone()
    }
}
