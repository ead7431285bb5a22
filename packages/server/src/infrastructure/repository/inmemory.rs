//! InMemory Message Repository 実装
//!
//! ルームごとの Vec をインメモリ DB として使用します。
//! 追記専用のためシーケンス番号は Vec の長さ + 1 で採番でき、
//! 単調増加・欠番なしの不変条件がそのまま成立します。
//!
//! テストと `--in-memory` 指定でのローカル実行に使われます。
//! プロセスを跨ぐ並行書き込みは存在しないため、PostgreSQL 実装のような
//! 衝突リトライは不要です。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ChatMessage, ClientId, MessageBody, MessageRepository, RepositoryError, RoomId,
    SequenceNumber, Timestamp,
};

/// インメモリ Message Repository 実装
pub struct InMemoryMessageRepository {
    /// ルーム ID → メッセージ列（シーケンス番号昇順）
    rooms: Mutex<HashMap<RoomId, Vec<ChatMessage>>>,
}

impl InMemoryMessageRepository {
    /// 新しい InMemoryMessageRepository を作成
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryMessageRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn append_message(
        &self,
        room_id: &RoomId,
        from: &ClientId,
        body: MessageBody,
        timestamp: Timestamp,
    ) -> Result<ChatMessage, RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        let messages = rooms.entry(room_id.clone()).or_default();

        let sequence = SequenceNumber::new(messages.len() as i64 + 1)
            .map_err(|e| RepositoryError::Io(e.to_string()))?;
        let message = ChatMessage::new(
            room_id.clone(),
            from.clone(),
            body,
            sequence,
            timestamp,
        );
        messages.push(message.clone());

        Ok(message)
    }

    async fn query_messages(
        &self,
        room_id: &RoomId,
        after_sequence: i64,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rooms = self.rooms.lock().await;
        let Some(messages) = rooms.get(room_id) else {
            return Ok(Vec::new());
        };

        Ok(messages
            .iter()
            .filter(|m| m.sequence.value() > after_sequence)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(value: &str) -> RoomId {
        RoomId::new(value.to_string()).unwrap()
    }

    fn client(value: &str) -> ClientId {
        ClientId::new(value.to_string()).unwrap()
    }

    fn body(value: &str) -> MessageBody {
        MessageBody::new(value.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_append_assigns_strictly_increasing_sequence() {
        // テスト項目: シーケンス番号が 1 から欠番・重複なく増加する
        // given (前提条件):
        let repo = InMemoryMessageRepository::new();

        // when (操作):
        let mut sequences = Vec::new();
        for i in 0..5 {
            let message = repo
                .append_message(
                    &room("general"),
                    &client("alice"),
                    body(&format!("message {}", i)),
                    Timestamp::new(1000 + i),
                )
                .await
                .unwrap();
            sequences.push(message.sequence.value());
        }

        // then (期待する結果):
        assert_eq!(sequences, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_append_keeps_room_sequences_independent() {
        // テスト項目: ルームごとにシーケンス番号が独立している
        // given (前提条件):
        let repo = InMemoryMessageRepository::new();

        // when (操作):
        let m1 = repo
            .append_message(&room("general"), &client("alice"), body("a"), Timestamp::new(1))
            .await
            .unwrap();
        let m2 = repo
            .append_message(&room("random"), &client("alice"), body("b"), Timestamp::new(2))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(m1.sequence.value(), 1);
        assert_eq!(m2.sequence.value(), 1);
    }

    #[tokio::test]
    async fn test_query_empty_room_returns_empty_vec() {
        // テスト項目: 空のルームへのクエリは空の Vec を返す（エラーにしない）
        // given (前提条件):
        let repo = InMemoryMessageRepository::new();

        // when (操作):
        let result = repo.query_messages(&room("empty"), 0, 10).await;

        // then (期待する結果):
        assert_eq!(result, Ok(vec![]));
    }

    #[tokio::test]
    async fn test_query_filters_by_after_sequence_and_limit() {
        // テスト項目: after と limit によるフィルタリングが正しく働く
        // given (前提条件):
        let repo = InMemoryMessageRepository::new();
        for i in 0..5 {
            repo.append_message(
                &room("general"),
                &client("alice"),
                body(&format!("message {}", i)),
                Timestamp::new(1000 + i),
            )
            .await
            .unwrap();
        }

        // when (操作): sequence > 1 のメッセージを最大 2 件取得
        let messages = repo.query_messages(&room("general"), 1, 2).await.unwrap();

        // then (期待する結果): 2, 3 が昇順で返る
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sequence.value(), 2);
        assert_eq!(messages[1].sequence.value(), 3);
    }

    #[tokio::test]
    async fn test_appended_message_is_immutable_in_history() {
        // テスト項目: 追記したメッセージが内容そのままで取得できる
        // given (前提条件):
        let repo = InMemoryMessageRepository::new();
        let appended = repo
            .append_message(&room("general"), &client("alice"), body("hi"), Timestamp::new(42))
            .await
            .unwrap();

        // when (操作):
        let messages = repo.query_messages(&room("general"), 0, 10).await.unwrap();

        // then (期待する結果):
        assert_eq!(messages, vec![appended]);
    }

    #[tokio::test]
    async fn test_ping_always_succeeds() {
        // テスト項目: インメモリ実装の ping は常に成功する
        // given (前提条件):
        let repo = InMemoryMessageRepository::new();

        // when (操作):
        let result = repo.ping().await;

        // then (期待する結果):
        assert_eq!(result, Ok(()));
    }
}
