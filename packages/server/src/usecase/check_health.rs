//! UseCase: ヘルスチェック処理
//!
//! データベースへの軽量な接続確認を行う。プローブは必ずタイムアウトで
//! 打ち切られ、無期限にブロックしない。接続エラーは伝播させず
//! `database_reachable = false` として報告する。

use std::sync::Arc;
use std::time::Duration;

use crate::domain::{HealthStatus, MessageRepository};

/// プローブのデフォルトタイムアウト
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(2000);

/// ヘルスチェックのユースケース
pub struct CheckHealthUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn MessageRepository>,
    /// プローブのタイムアウト
    probe_timeout: Duration,
}

impl CheckHealthUseCase {
    /// 新しい CheckHealthUseCase を作成
    pub fn new(repository: Arc<dyn MessageRepository>, probe_timeout: Duration) -> Self {
        Self {
            repository,
            probe_timeout,
        }
    }

    /// ヘルスチェックを実行
    ///
    /// このメソッドはエラーを返さない。データベース障害・タイムアウトは
    /// `database_reachable = false` に畳み込まれる。
    pub async fn execute(&self) -> HealthStatus {
        let database_reachable =
            match tokio::time::timeout(self.probe_timeout, self.repository.ping()).await {
                Ok(Ok(())) => true,
                Ok(Err(e)) => {
                    tracing::warn!("Database health probe failed: {}", e);
                    false
                }
                Err(_) => {
                    tracing::warn!(
                        "Database health probe timed out after {:?}",
                        self.probe_timeout
                    );
                    false
                }
            };

        HealthStatus {
            service_up: true,
            database_reachable,
        }
    }
}
