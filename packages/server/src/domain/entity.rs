//! エンティティ定義
//!
//! チャットメッセージ・参加者・接続状態・ヘルスステータスのドメインモデル。

use super::error::ConnectionStateError;
use super::value_object::{ClientId, MessageBody, RoomId, SequenceNumber, Timestamp};

/// 永続化されたチャットメッセージ
///
/// シーケンス番号はルーム内で一意・単調増加。永続化後は不変。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// 所属ルーム
    pub room_id: RoomId,
    /// 送信者
    pub from: ClientId,
    /// 本文
    pub body: MessageBody,
    /// ルーム内シーケンス番号（Persistence 層が採番）
    pub sequence: SequenceNumber,
    /// 作成時刻
    pub timestamp: Timestamp,
}

impl ChatMessage {
    pub fn new(
        room_id: RoomId,
        from: ClientId,
        body: MessageBody,
        sequence: SequenceNumber,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            room_id,
            from,
            body,
            sequence,
            timestamp,
        }
    }
}

/// ルームの参加者（接続中のクライアント）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// クライアント ID
    pub id: ClientId,
    /// 接続時刻
    pub connected_at: Timestamp,
}

impl Participant {
    pub fn new(id: ClientId, connected_at: Timestamp) -> Self {
        Self { id, connected_at }
    }
}

/// サービスのヘルスステータス（一時的な値、永続化されない）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthStatus {
    /// サービス自体が稼働しているか
    pub service_up: bool,
    /// データベースに到達できるか
    pub database_reachable: bool,
}

impl HealthStatus {
    /// 全てのコンポーネントが正常か
    pub fn is_ok(&self) -> bool {
        self.service_up && self.database_reachable
    }
}

/// WebSocket 接続の状態機械
///
/// ```text
/// Connecting -> Open -> { Closing -> Closed | Faulted -> Closed }
/// ```
///
/// メッセージの送受信が許されるのは `Open` のみ。それ以外の状態での
/// メッセージ処理は no-op（異常としてログに記録するが、致命的エラーにはしない）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// ハンドシェイク中（登録前）
    Connecting,
    /// 確立済み。メッセージの送受信が可能
    Open,
    /// クライアントから Close フレームを受信し、終了処理中
    Closing,
    /// プロトコルエラーや送受信エラーで異常終了中
    Faulted,
    /// 終了済み
    Closed,
}

impl ConnectionState {
    /// メッセージの送受信が許される状態か
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }

    /// 指定した状態へ遷移できるか
    pub fn can_transition_to(&self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (*self, next),
            (Connecting, Open) | (Open, Closing) | (Open, Faulted) | (Closing, Closed) | (Faulted, Closed)
        )
    }

    /// 状態遷移を実行
    ///
    /// # Returns
    ///
    /// * `Ok(ConnectionState)` - 遷移後の状態
    /// * `Err(ConnectionStateError)` - 状態機械で許されない遷移
    pub fn try_transition(self, next: ConnectionState) -> Result<Self, ConnectionStateError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(ConnectionStateError::InvalidTransition { from: self, to: next })
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closing => "closing",
            ConnectionState::Faulted => "faulted",
            ConnectionState::Closed => "closed",
        };
        write!(f, "{}", s)
    }
}
