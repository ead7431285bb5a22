//! Conversion logic between domain entities and DTOs.

use crate::domain::{entity, Participant};
use crate::infrastructure::dto::http;
use crate::infrastructure::dto::websocket as dto;

// ========================================
// Domain Entity → DTO
// ========================================

impl From<entity::ChatMessage> for dto::ChatFrame {
    fn from(model: entity::ChatMessage) -> Self {
        Self {
            r#type: dto::FrameType::Chat,
            sender_id: model.from.into_string(),
            body: model.body.into_string(),
            sequence: model.sequence.value(),
            timestamp: model.timestamp.value(),
        }
    }
}

impl From<&entity::ChatMessage> for dto::ChatFrame {
    fn from(model: &entity::ChatMessage) -> Self {
        model.clone().into()
    }
}

impl From<entity::ChatMessage> for http::MessageDto {
    fn from(model: entity::ChatMessage) -> Self {
        Self {
            sender_id: model.from.into_string(),
            body: model.body.into_string(),
            sequence: model.sequence.value(),
            timestamp: model.timestamp.value(),
        }
    }
}

impl From<Participant> for dto::ParticipantInfo {
    fn from(model: Participant) -> Self {
        Self {
            client_id: model.id.into_string(),
            connected_at: model.connected_at.value(),
        }
    }
}
