//! HTTP TTS Client - ElevenLabs 请求/响应客户端
//!
//! POST {base_url}/v1/text-to-speech/{voice_id}
//! Header: xi-api-key
//! Request: {"text": "...", "seed": 42}  (JSON)
//! Response: audio/mpeg binary

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::application::ports::{SynthesizedAudio, TtsError, TtsProviderPort};
use crate::domain::synthesis::{ProviderId, SynthesisRequest};

#[derive(Debug, Serialize)]
struct TtsHttpRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
}

/// HTTP TTS 客户端配置
#[derive(Debug, Clone)]
pub struct HttpTtsClientConfig {
    /// TTS 服务基础 URL
    pub base_url: String,
    /// API Key，为空表示未配置
    pub api_key: String,
    /// 请求未指定音色时使用
    pub default_voice: String,
    pub connect_timeout: Duration,
    /// 整个请求的超时时间
    pub timeout: Duration,
}

impl Default for HttpTtsClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.elevenlabs.io".to_string(),
            api_key: String::new(),
            default_voice: "default".to_string(),
            connect_timeout: Duration::from_secs(10),
            timeout: Duration::from_secs(60),
        }
    }
}

/// HTTP TTS 客户端
pub struct HttpTtsClient {
    client: Client,
    config: HttpTtsClientConfig,
}

impl HttpTtsClient {
    /// 创建新的 HTTP TTS 客户端
    pub fn new(config: HttpTtsClientConfig) -> Result<Self, TtsError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .build()
            .map_err(|e| TtsError::Transport(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn synthesize_url(&self, voice: &str) -> String {
        format!(
            "{}/v1/text-to-speech/{}",
            self.config.base_url.trim_end_matches('/'),
            voice
        )
    }

    fn resolve_voice<'a>(&'a self, request: &'a SynthesisRequest) -> &'a str {
        if request.voice_profile.is_empty() || request.voice_profile == "default" {
            &self.config.default_voice
        } else {
            &request.voice_profile
        }
    }
}

#[async_trait]
impl TtsProviderPort for HttpTtsClient {
    fn id(&self) -> ProviderId {
        ProviderId::ElevenLabs
    }

    fn is_configured(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesizedAudio, TtsError> {
        let url = self.synthesize_url(self.resolve_voice(request));
        let body = TtsHttpRequest {
            text: &request.text,
            seed: request.seed,
        };

        tracing::debug!(url = %url, text_len = request.text.len(), "Sending TTS request");

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.config.api_key)
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TtsError::Timeout(e.to_string())
                } else if e.is_connect() {
                    TtsError::Transport(format!("Cannot connect to TTS service: {}", e))
                } else {
                    TtsError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TtsError::Service(format!("HTTP {}: {}", status, error_text)));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("audio/mpeg")
            .to_string();

        let audio_data = response
            .bytes()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TtsError::Timeout(e.to_string())
                } else {
                    TtsError::InvalidResponse(format!("Failed to read audio: {}", e))
                }
            })?
            .to_vec();

        if audio_data.is_empty() {
            return Err(TtsError::InvalidResponse("Empty audio body".to_string()));
        }

        tracing::info!(
            audio_size = audio_data.len(),
            content_type = %content_type,
            "TTS request completed"
        );

        Ok(SynthesizedAudio {
            audio_data,
            content_type,
            sample_rate: None,
        })
    }
}
