//! PostgreSQL Message Repository 実装
//!
//! ## シーケンス採番
//!
//! `(room_id, sequence)` の一意制約を前提に、
//! `COALESCE(MAX(sequence), 0) + 1` のサブクエリで採番して INSERT する。
//! 並行書き込みで衝突した場合（SQLSTATE 23505）は採番からやり直す
//! （unique-constraint-and-retry）。プロセス内カウンタと異なり、
//! 複数のサービスインスタンスが同じ DB に書き込んでも不変条件が保たれる。
//!
//! ## DB Row とドメインモデルの変換
//!
//! `MessageRow`（sqlx::FromRow） → `ChatMessage`（ドメインモデル）の
//! 変換層を経由する。INSERT 時に検証済みの値のみが格納されるため変換は
//! 通常失敗しないが、外部から直接投入された不正な行は `RepositoryError`
//! として報告する。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use idobata_shared::time::millis_to_datetime;

use crate::domain::{
    ChatMessage, ClientId, MessageBody, MessageRepository, RepositoryError, RoomId,
    SequenceNumber, Timestamp,
};

/// シーケンス採番の衝突リトライ上限
const MAX_SEQUENCE_RETRIES: u32 = 5;

/// コネクションプールの最大接続数
const MAX_POOL_CONNECTIONS: u32 = 10;

/// コネクション取得のタイムアウト
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// PostgreSQL の一意制約違反を示す SQLSTATE
const SQLSTATE_UNIQUE_VIOLATION: &str = "23505";

/// messages テーブルの 1 行
#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    room_id: String,
    sequence: i64,
    sender_id: String,
    body: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<MessageRow> for ChatMessage {
    type Error = RepositoryError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        let corrupt = |e: &dyn std::fmt::Display| RepositoryError::Io(format!("corrupt row: {}", e));

        Ok(ChatMessage::new(
            RoomId::new(row.room_id).map_err(|e| corrupt(&e))?,
            ClientId::new(row.sender_id).map_err(|e| corrupt(&e))?,
            MessageBody::new(row.body).map_err(|e| corrupt(&e))?,
            SequenceNumber::new(row.sequence).map_err(|e| corrupt(&e))?,
            Timestamp::new(row.created_at.timestamp_millis()),
        ))
    }
}

/// sqlx のエラーをドメインのエラーに分類する
fn map_sqlx_error(e: sqlx::Error) -> RepositoryError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            RepositoryError::Connection(e.to_string())
        }
        other => RepositoryError::Io(other.to_string()),
    }
}

/// 一意制約違反（シーケンス採番の衝突）かどうか
fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(
        e,
        sqlx::Error::Database(db) if db.code().as_deref() == Some(SQLSTATE_UNIQUE_VIOLATION)
    )
}

/// PostgreSQL を使った Message Repository 実装
pub struct PostgresMessageRepository {
    /// コネクションプール
    pool: PgPool,
}

impl PostgresMessageRepository {
    /// 既存のプールから作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 接続文字列からプールを作成して接続する
    ///
    /// コネクション取得にはタイムアウトを設定し、DB 障害時に
    /// リクエスト処理が無期限にブロックしないようにする。
    pub async fn connect(database_url: &str) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_POOL_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(database_url)
            .await
            .map_err(map_sqlx_error)?;

        Ok(Self::new(pool))
    }

    /// マイグレーションを実行する
    pub async fn run_migrations(&self) -> Result<(), RepositoryError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| RepositoryError::Io(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl MessageRepository for PostgresMessageRepository {
    async fn append_message(
        &self,
        room_id: &RoomId,
        from: &ClientId,
        body: MessageBody,
        timestamp: Timestamp,
    ) -> Result<ChatMessage, RepositoryError> {
        let created_at = millis_to_datetime(timestamp.value());

        for attempt in 1..=MAX_SEQUENCE_RETRIES {
            let result = sqlx::query_as::<_, MessageRow>(
                r#"
                INSERT INTO messages (room_id, sequence, sender_id, body, created_at)
                VALUES (
                    $1,
                    (SELECT COALESCE(MAX(sequence), 0) + 1 FROM messages WHERE room_id = $1),
                    $2,
                    $3,
                    $4
                )
                RETURNING room_id, sequence, sender_id, body, created_at
                "#,
            )
            .bind(room_id.as_str())
            .bind(from.as_str())
            .bind(body.as_str())
            .bind(created_at)
            .fetch_one(&self.pool)
            .await;

            match result {
                Ok(row) => return ChatMessage::try_from(row),
                Err(e) if is_unique_violation(&e) => {
                    tracing::debug!(
                        "Sequence conflict in room '{}' (attempt {}/{}), retrying",
                        room_id.as_str(),
                        attempt,
                        MAX_SEQUENCE_RETRIES
                    );
                    continue;
                }
                Err(e) => return Err(map_sqlx_error(e)),
            }
        }

        Err(RepositoryError::SequenceConflict(
            room_id.as_str().to_string(),
        ))
    }

    async fn query_messages(
        &self,
        room_id: &RoomId,
        after_sequence: i64,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT room_id, sequence, sender_id, body, created_at
            FROM messages
            WHERE room_id = $1 AND sequence > $2
            ORDER BY sequence ASC
            LIMIT $3
            "#,
        )
        .bind(room_id.as_str())
        .bind(after_sequence)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(ChatMessage::try_from).collect()
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}
