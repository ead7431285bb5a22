//! ドメイン層のエラー定義
//!
//! エラー分類の方針:
//! - `ValidationError`: 不正な入力。接続は維持し、送信者にのみエラーを返す
//! - `RegistryError`: 接続レジストリの操作失敗。重複登録は新しい接続のみ拒否
//! - `RepositoryError`: ストレージ障害。回復可能（次のリクエストで再試行）
//!
//! どのエラーも、他の接続のセッションやプロセス全体を終了させてはならない。

use thiserror::Error;

use super::entity::ConnectionState;

/// 入力バリデーションエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// メッセージ本文が空（空白のみを含む）
    #[error("message body must not be empty")]
    EmptyBody,

    /// メッセージ本文が最大長を超過
    #[error("message body exceeds {max} characters (got {got})")]
    BodyTooLong { max: usize, got: usize },

    /// 識別子が空
    #[error("identifier must not be empty")]
    EmptyIdentifier,

    /// 識別子が最大長を超過
    #[error("identifier exceeds {max} characters (got {got})")]
    IdentifierTooLong { max: usize, got: usize },

    /// 識別子に制御文字・空白が含まれる
    #[error("identifier contains control or whitespace characters")]
    InvalidIdentifier,

    /// シーケンス番号が 1 未満
    #[error("sequence number must be positive (got {0})")]
    InvalidSequence(i64),
}

/// 接続レジストリのエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// (room_id, client_id) の組が既に登録済み
    #[error("connection '{client_id}' is already registered in room '{room_id}'")]
    AlreadyRegistered { room_id: String, client_id: String },

    /// 対象の接続がレジストリに存在しない
    #[error("connection '{client_id}' not found in room '{room_id}'")]
    ConnectionNotFound { room_id: String, client_id: String },

    /// チャンネルへの送信失敗（相手側のタスクが終了している）
    #[error("failed to push message to connection: {0}")]
    PushFailed(String),
}

/// ストレージ（Persistence Adapter）のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// データベースに到達できない
    #[error("database connection failed: {0}")]
    Connection(String),

    /// 並行書き込みによるシーケンス番号の衝突（リトライ上限超過）
    #[error("sequence assignment conflicted repeatedly in room '{0}'")]
    SequenceConflict(String),

    /// その他の I/O・制約違反
    #[error("storage operation failed: {0}")]
    Io(String),
}

/// 接続状態機械のエラー
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStateError {
    /// 状態機械で許されない遷移
    #[error("invalid connection state transition: {from} -> {to}")]
    InvalidTransition {
        from: ConnectionState,
        to: ConnectionState,
    },
}
