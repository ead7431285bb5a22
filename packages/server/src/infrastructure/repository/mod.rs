//! Message Repository の実装
//!
//! ドメイン層が定義する `MessageRepository` trait の具体的な実装。
//!
//! - `postgres`: PostgreSQL（sqlx）を使った本番実装
//! - `inmemory`: HashMap をインメモリ DB として使うテスト・ローカル実行用実装

pub mod inmemory;
pub mod postgres;

pub use inmemory::InMemoryMessageRepository;
pub use postgres::PostgresMessageRepository;
