//! TTS Provider Port - TTS 提供方抽象
//!
//! 主提供方为流式协议，备用提供方为请求/响应协议，
//! 重试、超时与 fallback 由 TtsAdapter 统一处理

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::job::JobErrorKind;
use crate::domain::synthesis::{ProviderId, SynthesisRequest};

/// TTS 错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TtsError {
    /// 连接超时、空闲超时或单次尝试超时
    #[error("Request timeout: {0}")]
    Timeout(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Service error: {0}")]
    Service(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// 连续失败被跳过，携带最近一次记录的错误
    #[error("Provider unavailable: {0}")]
    Unavailable(String),
}

impl TtsError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TtsError::Timeout(_))
    }

    /// 对外稳定的错误类型
    pub fn kind(&self) -> JobErrorKind {
        match self {
            TtsError::Timeout(_) => JobErrorKind::ProviderTimeout,
            _ => JobErrorKind::ProviderTransportError,
        }
    }
}

/// 提供方返回的音频
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    pub audio_data: Vec<u8>,
    pub content_type: String,
    pub sample_rate: Option<u32>,
}

/// TTS Provider Port
#[async_trait]
pub trait TtsProviderPort: Send + Sync {
    /// 提供方标识
    fn id(&self) -> ProviderId;

    /// 执行一次合成尝试（不重试）
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesizedAudio, TtsError>;

    /// 提供方是否已配置
    fn is_configured(&self) -> bool {
        true
    }
}
