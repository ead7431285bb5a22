//! WebSocket frame DTOs.
//!
//! Outbound frames are JSON, tagged by `type`. Inbound frames are raw
//! UTF-8 message bodies and have no DTO.

use serde::{Deserialize, Serialize};

/// Frame type discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameType {
    /// Chat message fan-out
    Chat,
    /// Error report to the sender only
    Error,
    /// Snapshot of room membership, sent to a newly connected client
    RoomConnected,
    /// A participant joined the room
    ParticipantJoined,
    /// A participant left the room
    ParticipantLeft,
}

/// Error code reported to the sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Malformed or oversized inbound payload
    ValidationError,
    /// Message could not be persisted
    StorageError,
}

/// Chat message frame: `{"type":"chat","senderId":..,"body":..,"sequence":..,"timestamp":..}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatFrame {
    pub r#type: FrameType,
    pub sender_id: String,
    pub body: String,
    pub sequence: i64,
    /// Unix timestamp in milliseconds (UTC)
    pub timestamp: i64,
}

/// Error frame, sent to the offending sender only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorFrame {
    pub r#type: FrameType,
    pub code: ErrorCode,
    pub reason: String,
}

impl ErrorFrame {
    pub fn new(code: ErrorCode, reason: String) -> Self {
        Self {
            r#type: FrameType::Error,
            code,
            reason,
        }
    }
}

/// Participant entry inside a `room_connected` frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantInfo {
    pub client_id: String,
    /// Unix timestamp in milliseconds (UTC)
    pub connected_at: i64,
}

/// Room membership snapshot, sent to a newly connected client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomConnectedFrame {
    pub r#type: FrameType,
    pub room_id: String,
    pub participants: Vec<ParticipantInfo>,
}

/// Participant-joined notification, broadcast to the other participants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantJoinedFrame {
    pub r#type: FrameType,
    pub client_id: String,
    /// Unix timestamp in milliseconds (UTC)
    pub connected_at: i64,
}

/// Participant-left notification, broadcast to the remaining participants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantLeftFrame {
    pub r#type: FrameType,
    pub client_id: String,
    /// Unix timestamp in milliseconds (UTC)
    pub disconnected_at: i64,
}
