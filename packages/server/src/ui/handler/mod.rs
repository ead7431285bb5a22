//! Request handlers (WebSocket + HTTP API).

pub mod http;
pub mod websocket;
