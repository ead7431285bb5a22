//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::{ChatMessage, ClientId, MessageBody, RepositoryError, RoomId, Timestamp};

/// Message Repository trait
///
/// メッセージ履歴の永続化インターフェース。
/// UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には依存しない。
///
/// ## 不変条件
///
/// - `append_message` はルームごとのシーケンス番号をアトミックに採番する。
///   複数のサービスインスタンスが並行して書き込んでも、同一ルーム内で
///   シーケンス番号が重複・逆行してはならない
/// - 永続化されたメッセージは不変
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// メッセージを追記し、採番済みの ChatMessage を返す
    async fn append_message(
        &self,
        room_id: &RoomId,
        from: &ClientId,
        body: MessageBody,
        timestamp: Timestamp,
    ) -> Result<ChatMessage, RepositoryError>;

    /// `after_sequence` より大きいシーケンス番号のメッセージを昇順で取得
    ///
    /// 該当なしの場合は空の Vec を返す（エラーにはしない）。
    async fn query_messages(
        &self,
        room_id: &RoomId,
        after_sequence: i64,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, RepositoryError>;

    /// 軽量な接続確認（ヘルスチェック用）
    async fn ping(&self) -> Result<(), RepositoryError>;
}
