//! WebSocket を使った ConnectionRegistry 実装
//!
//! ## 責務
//!
//! - ルームごとの接続（`UnboundedSender`）の管理
//! - クライアントへのメッセージ送信（push_to, broadcast）
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は生成された `UnboundedSender` を受け取り、メッセージ送信に使用します。
//!
//! ## ロック構造
//!
//! 2 段ロック。外側のロックはルームエントリの検索・作成・削除のみに使い、
//! ルーム内の変更・スナップショット取得はルームごとのロックで行う。
//! これにより異なるルームへのブロードキャストは並行して進行する。
//! どちらのロックも保持したまま永続化 I/O を行うことはない。
//! ロック順序は常に 外側 → ルーム（逆順に取ることはない）。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    BroadcastReport, ClientId, ConnectionRegistry, Participant, PusherChannel, RegistryError,
    RoomId, Timestamp,
};

/// 接続 1 本分の情報
struct Connection {
    /// メッセージ送信用チャンネル
    sender: PusherChannel,
    /// 接続時刻
    connected_at: Timestamp,
}

type RoomConnections = Arc<Mutex<HashMap<ClientId, Connection>>>;

/// WebSocket を使った ConnectionRegistry 実装
///
/// ルームは最初の register で作られる。最後の接続が deregister したとき
/// ルームエントリも削除される（ブロードキャスト中の退去で空になった場合は
/// dormant なエントリとして残り、次の deregister で回収される）。
pub struct WebSocketConnectionRegistry {
    /// ルーム ID → ルーム内の接続マップ
    rooms: Mutex<HashMap<RoomId, RoomConnections>>,
}

impl WebSocketConnectionRegistry {
    /// 新しい WebSocketConnectionRegistry を作成
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
        }
    }

    /// ルームエントリを取得（存在しなければ None）
    async fn find_room(&self, room_id: &RoomId) -> Option<RoomConnections> {
        let rooms = self.rooms.lock().await;
        rooms.get(room_id).cloned()
    }
}

impl Default for WebSocketConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectionRegistry for WebSocketConnectionRegistry {
    async fn register(
        &self,
        room_id: RoomId,
        client_id: ClientId,
        sender: PusherChannel,
        connected_at: Timestamp,
    ) -> Result<(), RegistryError> {
        // 登録は外側ロックを保持したままルームロックを取る。
        // ルームエントリの削除（deregister）と直列化され、
        // 削除済みエントリへの登録（幽霊ルーム）を防ぐ
        let mut rooms = self.rooms.lock().await;
        let room = rooms.entry(room_id.clone()).or_default().clone();
        let mut connections = room.lock().await;

        if connections.contains_key(&client_id) {
            return Err(RegistryError::AlreadyRegistered {
                room_id: room_id.into_string(),
                client_id: client_id.into_string(),
            });
        }

        connections.insert(
            client_id.clone(),
            Connection {
                sender,
                connected_at,
            },
        );
        tracing::debug!(
            "Connection '{}' registered to room '{}'",
            client_id.as_str(),
            room_id.as_str()
        );
        Ok(())
    }

    async fn deregister(&self, room_id: &RoomId, client_id: &ClientId) {
        let mut rooms = self.rooms.lock().await;
        let Some(room) = rooms.get(room_id).cloned() else {
            return;
        };

        let mut connections = room.lock().await;
        if connections.remove(client_id).is_some() {
            tracing::debug!(
                "Connection '{}' deregistered from room '{}'",
                client_id.as_str(),
                room_id.as_str()
            );
        }

        // 最後の接続が抜けたらルームエントリも回収する
        if connections.is_empty() {
            drop(connections);
            rooms.remove(room_id);
            tracing::debug!("Room '{}' is now empty and was removed", room_id.as_str());
        }
    }

    async fn push_to(
        &self,
        room_id: &RoomId,
        client_id: &ClientId,
        content: &str,
    ) -> Result<(), RegistryError> {
        let Some(room) = self.find_room(room_id).await else {
            return Err(RegistryError::ConnectionNotFound {
                room_id: room_id.as_str().to_string(),
                client_id: client_id.as_str().to_string(),
            });
        };

        let connections = room.lock().await;
        let Some(connection) = connections.get(client_id) else {
            return Err(RegistryError::ConnectionNotFound {
                room_id: room_id.as_str().to_string(),
                client_id: client_id.as_str().to_string(),
            });
        };

        connection
            .sender
            .send(content.to_string())
            .map_err(|e| RegistryError::PushFailed(e.to_string()))
    }

    async fn broadcast(
        &self,
        room_id: &RoomId,
        content: &str,
        exclude: Option<&ClientId>,
    ) -> BroadcastReport {
        let Some(room) = self.find_room(room_id).await else {
            return BroadcastReport::default();
        };

        let mut connections = room.lock().await;
        let mut report = BroadcastReport::default();

        for (client_id, connection) in connections.iter() {
            if Some(client_id) == exclude {
                continue;
            }
            // 送信失敗はこの宛先のみの問題として扱い、他の宛先への配送は続行する
            if connection.sender.send(content.to_string()).is_ok() {
                report.delivered += 1;
            } else {
                tracing::warn!(
                    "Failed to push message to '{}' in room '{}', evicting",
                    client_id.as_str(),
                    room_id.as_str()
                );
                report.evicted.push(client_id.clone());
            }
        }

        // 死んだチャンネルを退去させる（空になったエントリは次の deregister で回収）
        for client_id in &report.evicted {
            connections.remove(client_id);
        }

        report
    }

    async fn participants(&self, room_id: &RoomId) -> Vec<Participant> {
        let Some(room) = self.find_room(room_id).await else {
            return Vec::new();
        };

        let connections = room.lock().await;
        let mut participants: Vec<Participant> = connections
            .iter()
            .map(|(client_id, connection)| {
                Participant::new(client_id.clone(), connection.connected_at)
            })
            .collect();

        // Sort by client_id for consistent ordering
        participants.sort_by(|a, b| a.id.cmp(&b.id));
        participants
    }

    async fn count_connections(&self, room_id: &RoomId) -> usize {
        let Some(room) = self.find_room(room_id).await else {
            return 0;
        };
        let connections = room.lock().await;
        connections.len()
    }
}
