//! UseCase: メッセージ履歴取得処理
//!
//! シーケンス番号ベースの差分取得。クライアントは最後に受信した
//! シーケンス番号を `after` に渡すことで、取りこぼしなく履歴を追従できる。

use std::sync::Arc;

use crate::domain::{ChatMessage, MessageRepository, RoomId};

use super::error::ListHistoryError;

/// `limit` 未指定時のデフォルト取得件数
pub const DEFAULT_HISTORY_LIMIT: i64 = 50;

/// 1 回のクエリで取得できる最大件数
pub const MAX_HISTORY_LIMIT: i64 = 1000;

/// メッセージ履歴取得のユースケース
pub struct ListHistoryUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn MessageRepository>,
}

impl ListHistoryUseCase {
    /// 新しい ListHistoryUseCase を作成
    pub fn new(repository: Arc<dyn MessageRepository>) -> Self {
        Self { repository }
    }

    /// 履歴取得を実行
    ///
    /// # Arguments
    ///
    /// * `room_id` - 対象ルームの ID
    /// * `after_sequence` - このシーケンス番号より後のメッセージを取得（0 で先頭から）
    /// * `limit` - 最大取得件数。未指定時は [`DEFAULT_HISTORY_LIMIT`]、
    ///   [`MAX_HISTORY_LIMIT`] を超える指定は切り詰める
    ///
    /// # Returns
    ///
    /// シーケンス番号昇順のメッセージ列。該当なし（空のルームを含む）は空の Vec
    pub async fn execute(
        &self,
        room_id: &RoomId,
        after_sequence: i64,
        limit: Option<i64>,
    ) -> Result<Vec<ChatMessage>, ListHistoryError> {
        let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT).clamp(1, MAX_HISTORY_LIMIT);
        let after = after_sequence.max(0);

        let messages = self.repository.query_messages(room_id, after, limit).await?;
        Ok(messages)
    }
}
