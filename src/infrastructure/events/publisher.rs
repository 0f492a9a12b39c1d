//! Event Publisher Implementation
//!
//! WebSocket 事件推送实现

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::domain::job::{Job, JobErrorKind};
use crate::domain::synthesis::ProviderId;

/// WebSocket 事件类型
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum WsEvent {
    /// 任务状态变更
    #[serde(rename_all = "camelCase")]
    VideoStatus {
        job_id: String,
        user_id: String,
        status: String,
        progress: u8,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        video_url: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error_kind: Option<JobErrorKind>,
    },
    /// 首选 TTS 提供方变更
    ProviderChanged {
        provider: ProviderId,
        #[serde(rename = "override")]
        override_active: bool,
    },
    /// 缓存条目失效
    #[serde(rename_all = "camelCase")]
    CacheInvalidated { content_hash: String },
    /// 缓存被整体清空
    CacheCleared { removed: usize },
}

impl WsEvent {
    /// 用户过滤，非任务事件对所有订阅者可见
    pub fn is_visible_to(&self, user_id: Option<&str>) -> bool {
        match (self, user_id) {
            (WsEvent::VideoStatus { user_id: owner, .. }, Some(user)) => owner == user,
            _ => true,
        }
    }
}

/// 事件发布器
pub struct EventPublisher {
    channel: broadcast::Sender<WsEvent>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { channel: tx }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WsEvent> {
        self.channel.subscribe()
    }

    /// 发布任务快照
    pub fn publish_job_updated(&self, job: &Job) {
        self.publish(WsEvent::VideoStatus {
            job_id: job.id().to_string(),
            user_id: job.user_id().to_string(),
            status: job.status().as_str().to_string(),
            progress: job.progress(),
            message: job.stage_message().to_string(),
            video_url: job.video_url().map(str::to_string),
            error_kind: job.error().map(|e| e.kind),
        });
    }

    pub fn publish_provider_changed(&self, provider: ProviderId, override_active: bool) {
        self.publish(WsEvent::ProviderChanged {
            provider,
            override_active,
        });
    }

    pub fn publish_cache_invalidated(&self, content_hash: &str) {
        self.publish(WsEvent::CacheInvalidated {
            content_hash: content_hash.to_string(),
        });
    }

    pub fn publish_cache_cleared(&self, removed: usize) {
        self.publish(WsEvent::CacheCleared { removed });
    }

    fn publish(&self, event: WsEvent) {
        if let Err(e) = self.channel.send(event) {
            tracing::trace!(error = %e, "Failed to publish event (no receivers)");
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
