//! TTS Analytics Port - 合成记录与统计
//!
//! 每次实际调用提供方的合成（成功或全部失败）记录一条，缓存命中不计入

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::synthesis::ProviderId;

/// 合成结果分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationOutcome {
    Success,
    FallbackSuccess,
    Failed,
}

impl GenerationOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, GenerationOutcome::Failed)
    }
}

/// 单次合成记录
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRecord {
    pub content_hash: String,
    /// 产出音频的提供方；失败时为最后尝试的提供方
    pub provider: ProviderId,
    pub fallback_triggered: bool,
    pub outcome: GenerationOutcome,
    pub execution_time_ms: u64,
    pub audio_duration_ms: Option<u64>,
    pub text_length: usize,
    /// 首次之外的尝试次数
    pub retry_count: u32,
    pub error_message: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// 统计窗口内的聚合结果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TtsAnalyticsStats {
    pub days: u32,
    pub total_generations: u64,
    pub successful: u64,
    pub failed: u64,
    pub fallback_triggered: u64,
    pub total_retries: u64,
    /// provider -> 记录数
    pub providers: BTreeMap<String, u64>,
    pub avg_execution_time_ms: f64,
    pub avg_audio_duration_ms: f64,
    pub total_text_chars: u64,
    /// 百分比，无记录时为 0
    pub success_rate: f64,
    pub fallback_rate: f64,
}

impl TtsAnalyticsStats {
    /// 聚合一组记录
    pub fn aggregate<'a>(days: u32, records: impl IntoIterator<Item = &'a GenerationRecord>) -> Self {
        let mut stats = Self {
            days,
            ..Default::default()
        };
        let mut execution_total = 0u64;
        let mut duration_total = 0u64;
        let mut duration_count = 0u64;

        for record in records {
            stats.total_generations += 1;
            if record.outcome.is_success() {
                stats.successful += 1;
            } else {
                stats.failed += 1;
            }
            if record.fallback_triggered {
                stats.fallback_triggered += 1;
            }
            stats.total_retries += u64::from(record.retry_count);
            *stats
                .providers
                .entry(record.provider.to_string())
                .or_insert(0) += 1;
            execution_total += record.execution_time_ms;
            if let Some(duration) = record.audio_duration_ms {
                duration_total += duration;
                duration_count += 1;
            }
            stats.total_text_chars += record.text_length as u64;
        }

        if stats.total_generations > 0 {
            let total = stats.total_generations as f64;
            stats.avg_execution_time_ms = round2(execution_total as f64 / total);
            stats.success_rate = round2(stats.successful as f64 / total * 100.0);
            stats.fallback_rate = round2(stats.fallback_triggered as f64 / total * 100.0);
        }
        if duration_count > 0 {
            stats.avg_audio_duration_ms = round2(duration_total as f64 / duration_count as f64);
        }
        stats
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// TTS Analytics Port
pub trait TtsAnalyticsPort: Send + Sync {
    fn record(&self, record: GenerationRecord);

    /// 最近 `days` 天的统计
    fn stats(&self, days: u32) -> TtsAnalyticsStats;
}
