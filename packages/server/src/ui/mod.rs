//! UI 層（axum ルーター・ハンドラ・サーバーランナー）

pub mod handler;
mod server;
mod signal;
pub mod state;

pub use server::Server;
