//! In-Memory TTS Analytics
//!
//! 有界环形缓冲，超出容量时丢弃最旧记录

use chrono::{Duration, Utc};
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::application::ports::{GenerationRecord, TtsAnalyticsPort, TtsAnalyticsStats};

/// 内存合成记录
pub struct InMemoryTtsAnalytics {
    records: Mutex<VecDeque<GenerationRecord>>,
    /// 0 表示关闭记录
    capacity: usize,
}

impl InMemoryTtsAnalytics {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.capacity > 0
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryTtsAnalytics {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl TtsAnalyticsPort for InMemoryTtsAnalytics {
    fn record(&self, record: GenerationRecord) {
        if !self.is_enabled() {
            return;
        }

        tracing::debug!(
            provider = %record.provider,
            outcome = ?record.outcome,
            execution_time_ms = record.execution_time_ms,
            "TTS generation recorded"
        );

        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        if records.len() >= self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    fn stats(&self, days: u32) -> TtsAnalyticsStats {
        let since = Utc::now() - Duration::days(i64::from(days));
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        TtsAnalyticsStats::aggregate(days, records.iter().filter(|r| r.recorded_at >= since))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::GenerationOutcome;
    use crate::domain::synthesis::ProviderId;

    fn record(age: Duration) -> GenerationRecord {
        GenerationRecord {
            content_hash: "h".to_string(),
            provider: ProviderId::VibeVoice,
            fallback_triggered: false,
            outcome: GenerationOutcome::Success,
            execution_time_ms: 120,
            audio_duration_ms: None,
            text_length: 5,
            retry_count: 0,
            error_message: None,
            recorded_at: Utc::now() - age,
        }
    }

    #[test]
    fn test_stats_window() {
        let analytics = InMemoryTtsAnalytics::default();
        analytics.record(record(Duration::minutes(5)));
        analytics.record(record(Duration::hours(30)));

        assert_eq!(analytics.stats(1).total_generations, 1);
        assert_eq!(analytics.stats(2).total_generations, 2);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let analytics = InMemoryTtsAnalytics::new(2);
        for _ in 0..3 {
            analytics.record(record(Duration::zero()));
        }
        assert_eq!(analytics.len(), 2);
    }

    #[test]
    fn test_zero_capacity_disables_recording() {
        let analytics = InMemoryTtsAnalytics::new(0);
        analytics.record(record(Duration::zero()));
        assert!(analytics.is_empty());
        assert_eq!(analytics.stats(1).total_generations, 0);
    }
}
