//! In-Memory Provider Health Registry

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::application::ports::{ProviderHealthPort, ProviderHealthStatus};
use crate::domain::synthesis::ProviderId;

/// 单个提供方的健康记录
#[derive(Debug, Clone, Default)]
pub struct ProviderRecord {
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_failure_at: Option<DateTime<Utc>>,
    pub total_successes: u64,
    pub total_failures: u64,
}

/// 内存提供方健康注册表
pub struct InMemoryProviderHealth {
    records: DashMap<ProviderId, ProviderRecord>,
    /// 连续失败达到该值视为不健康，0 表示任一连续失败即不健康
    failure_threshold: u32,
}

impl InMemoryProviderHealth {
    pub fn new(failure_threshold: u32) -> Self {
        Self {
            records: DashMap::new(),
            failure_threshold,
        }
    }

    fn is_healthy(&self, consecutive_failures: u32) -> bool {
        if self.failure_threshold == 0 {
            consecutive_failures == 0
        } else {
            consecutive_failures < self.failure_threshold
        }
    }
}

impl Default for InMemoryProviderHealth {
    fn default() -> Self {
        Self::new(3)
    }
}

impl ProviderHealthPort for InMemoryProviderHealth {
    fn record_success(&self, provider: ProviderId) {
        let mut record = self.records.entry(provider).or_default();
        record.consecutive_failures = 0;
        record.last_success_at = Some(Utc::now());
        record.total_successes += 1;
    }

    fn record_failure(&self, provider: ProviderId, error: &str) {
        let mut record = self.records.entry(provider).or_default();
        record.consecutive_failures += 1;
        record.last_error = Some(error.to_string());
        record.last_failure_at = Some(Utc::now());
        record.total_failures += 1;

        tracing::debug!(
            provider = %provider,
            consecutive_failures = record.consecutive_failures,
            "Provider failure recorded"
        );
    }

    fn status(&self, provider: ProviderId) -> ProviderHealthStatus {
        let record = self
            .records
            .get(&provider)
            .map(|r| r.clone())
            .unwrap_or_default();

        ProviderHealthStatus {
            provider,
            healthy: self.is_healthy(record.consecutive_failures),
            consecutive_failures: record.consecutive_failures,
            last_error: record.last_error,
            last_success_at: record.last_success_at,
            last_failure_at: record.last_failure_at,
            total_successes: record.total_successes,
            total_failures: record.total_failures,
        }
    }
}
