//! Provider Health Port - 提供方健康记录

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::synthesis::ProviderId;

/// 提供方健康状态快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderHealthStatus {
    pub provider: ProviderId,
    /// 连续失败次数低于阈值即视为健康
    pub healthy: bool,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_failure_at: Option<DateTime<Utc>>,
    pub total_successes: u64,
    pub total_failures: u64,
}

/// Provider Health Port
///
/// 每次提供方尝试后更新
pub trait ProviderHealthPort: Send + Sync {
    fn record_success(&self, provider: ProviderId);

    fn record_failure(&self, provider: ProviderId, error: &str);

    fn status(&self, provider: ProviderId) -> ProviderHealthStatus;

    fn all(&self) -> Vec<ProviderHealthStatus> {
        ProviderId::ALL.iter().map(|p| self.status(*p)).collect()
    }
}
