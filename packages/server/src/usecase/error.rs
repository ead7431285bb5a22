//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{RegistryError, RepositoryError, ValidationError};

/// 参加者接続のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectError {
    /// レジストリへの登録失敗（重複登録など）
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// メッセージ送信のエラー
///
/// `Validation` は接続を維持したまま送信者にのみ通知する。
/// `Storage` はメッセージを配送済みとして扱わない（部分ブロードキャストは発生しない）。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendMessageError {
    /// 不正な本文（空・最大長超過）
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// 永続化失敗
    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

/// 履歴取得のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ListHistoryError {
    /// 永続化層からの読み出し失敗
    #[error(transparent)]
    Storage(#[from] RepositoryError),
}
