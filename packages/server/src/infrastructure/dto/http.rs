//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

/// Overall health state reported by `GET /api/v1/health`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    /// Every component is reachable
    Ok,
    /// The service is up but the database is unreachable
    Degraded,
}

/// Health response DTO
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthDto {
    pub status: HealthState,
    pub service: String,
    pub version: String,
    pub database_reachable: bool,
}

/// Chat message DTO returned by the history endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub sender_id: String,
    pub body: String,
    pub sequence: i64,
    /// Unix timestamp in milliseconds (UTC)
    pub timestamp: i64,
}
