//! Room-based WebSocket chat server library.
//!
//! Clients join a room over `/ws/{room_id}`, messages are validated,
//! persisted with a per-room sequence number, and fanned out to the room's
//! active connections. History is served over a REST endpoint.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
