//! Fake TTS Client - 本地静音合成
//!
//! mock 模式下替代真实提供方，不访问网络

use async_trait::async_trait;
use std::time::Duration;

use super::wav::silent_wav;
use crate::application::ports::{SynthesizedAudio, TtsError, TtsProviderPort};
use crate::domain::synthesis::{ProviderId, SynthesisRequest};

/// Fake TTS Client 配置
#[derive(Debug, Clone)]
pub struct FakeTtsClientConfig {
    /// 冒充的提供方
    pub provider: ProviderId,
    /// 生成音频时长（毫秒）
    pub duration_ms: u64,
    pub sample_rate: u32,
    /// 模拟合成延迟
    pub latency: Duration,
}

impl Default for FakeTtsClientConfig {
    fn default() -> Self {
        Self {
            provider: ProviderId::VibeVoice,
            duration_ms: 1000,
            sample_rate: 24000,
            latency: Duration::from_millis(50),
        }
    }
}

/// Fake TTS Client
pub struct FakeTtsClient {
    config: FakeTtsClientConfig,
}

impl FakeTtsClient {
    pub fn new(config: FakeTtsClientConfig) -> Self {
        tracing::info!(
            provider = %config.provider,
            duration_ms = config.duration_ms,
            "FakeTtsClient initialized"
        );
        Self { config }
    }

    pub fn for_provider(provider: ProviderId) -> Self {
        Self::new(FakeTtsClientConfig {
            provider,
            ..Default::default()
        })
    }
}

#[async_trait]
impl TtsProviderPort for FakeTtsClient {
    fn id(&self) -> ProviderId {
        self.config.provider
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesizedAudio, TtsError> {
        tracing::debug!(
            provider = %self.config.provider,
            text_len = request.text.len(),
            "FakeTtsClient: returning silent audio"
        );

        tokio::time::sleep(self.config.latency).await;

        Ok(SynthesizedAudio {
            audio_data: silent_wav(self.config.sample_rate, self.config.duration_ms),
            content_type: "audio/wav".to_string(),
            sample_rate: Some(self.config.sample_rate),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fake_returns_one_second_of_silence() {
        let client = FakeTtsClient::for_provider(ProviderId::ElevenLabs);
        assert_eq!(client.id(), ProviderId::ElevenLabs);

        let request = SynthesisRequest::new("Hello", "default", "default", None);
        let audio = client.synthesize(&request).await.unwrap();
        assert_eq!(audio.audio_data.len(), 44 + 24000 * 2);
        assert_eq!(audio.sample_rate, Some(24000));
    }
}
