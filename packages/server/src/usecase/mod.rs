//! UseCase 層
//!
//! 1 操作 = 1 UseCase。Repository / Registry trait（ドメイン層が定義）に
//! 依存し、Infrastructure 層の具体的な実装には依存しない。

mod check_health;
mod connect_participant;
mod disconnect_participant;
mod error;
mod list_history;
mod send_message;

pub use check_health::{CheckHealthUseCase, DEFAULT_PROBE_TIMEOUT};
pub use connect_participant::ConnectParticipantUseCase;
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use error::{ConnectError, ListHistoryError, SendMessageError};
pub use list_history::{DEFAULT_HISTORY_LIMIT, ListHistoryUseCase, MAX_HISTORY_LIMIT};
pub use send_message::SendMessageUseCase;
