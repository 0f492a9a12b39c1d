//! Avatar Renderer Port - 数字人视频渲染

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Render timeout")]
    Timeout,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Service error: {0}")]
    ServiceError(String),
}

/// 渲染请求
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// 渲染服务可下载的音频 URL
    pub audio_url: String,
    /// 模板 / avatar ID
    pub template: String,
    /// 用于追踪
    pub job_id: String,
}

/// 渲染结果
#[derive(Debug, Clone)]
pub struct RenderedVideo {
    pub video_data: Vec<u8>,
    pub content_type: String,
}

#[async_trait]
pub trait AvatarRendererPort: Send + Sync {
    async fn render(&self, request: &RenderRequest) -> Result<RenderedVideo, RenderError>;
}
