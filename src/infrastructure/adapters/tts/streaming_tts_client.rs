//! Streaming TTS Client - VibeVoice WebSocket 客户端
//!
//! 协议:
//! -> {"action":"synthesize","text":..,"voice":..,"style":..,"seed":..,"sample_rate":..,"format":"pcm"}
//! <- 二进制帧为 PCM 分片
//! <- {"status":"completed"} 结束，{"status":"error","message":".."} 失败

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use super::wav::encode_pcm16_wav;
use crate::application::ports::{SynthesizedAudio, TtsError, TtsProviderPort};
use crate::domain::synthesis::{ProviderId, SynthesisRequest};

/// 流式客户端配置
#[derive(Debug, Clone)]
pub struct StreamingTtsClientConfig {
    /// ws:// 或 wss:// 端点，空字符串表示未配置
    pub url: String,
    pub sample_rate: u32,
    /// 请求未指定音色时使用
    pub default_voice: String,
    pub connect_timeout: Duration,
    /// 两帧之间允许的最长间隔
    pub idle_timeout: Duration,
}

impl Default for StreamingTtsClientConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:8765/stream".to_string(),
            sample_rate: 24000,
            default_voice: "default".to_string(),
            connect_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Serialize)]
struct SynthesizeMessage<'a> {
    action: &'static str,
    text: &'a str,
    voice: &'a str,
    style: &'a str,
    seed: Option<u64>,
    sample_rate: u32,
    format: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum StatusMessage {
    Completed,
    Error {
        #[serde(default)]
        message: String,
    },
    #[serde(other)]
    Progress,
}

/// VibeVoice 流式 TTS 客户端
pub struct StreamingTtsClient {
    config: StreamingTtsClientConfig,
}

impl StreamingTtsClient {
    pub fn new(config: StreamingTtsClientConfig) -> Self {
        Self { config }
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
impl TtsProviderPort for StreamingTtsClient {
    fn id(&self) -> ProviderId {
        ProviderId::VibeVoice
    }

    fn is_configured(&self) -> bool {
        !self.config.url.is_empty()
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesizedAudio, TtsError> {
        let connect = connect_async(self.config.url.as_str());
        let (mut ws_stream, _) = timeout(self.config.connect_timeout, connect)
            .await
            .map_err(|_| {
                TtsError::Timeout(format!(
                    "connect to {} exceeded {:?}",
                    self.config.url, self.config.connect_timeout
                ))
            })?
            .map_err(|e| TtsError::Transport(format!("Cannot connect to TTS stream: {}", e)))?;

        let message = SynthesizeMessage {
            action: "synthesize",
            text: &request.text,
            voice: self.resolve_voice(request),
            style: &request.style,
            seed: request.seed,
            sample_rate: self.config.sample_rate,
            format: "pcm",
        };
        let payload = serde_json::to_string(&message)
            .map_err(|e| TtsError::InvalidResponse(e.to_string()))?;

        tracing::debug!(
            url = %self.config.url,
            text_len = request.text.len(),
            voice = %message.voice,
            "Sending streaming synthesize request"
        );

        ws_stream
            .send(Message::Text(payload.into()))
            .await
            .map_err(|e| TtsError::Transport(e.to_string()))?;

        let mut pcm: Vec<u8> = Vec::new();
        loop {
            let frame = timeout(self.config.idle_timeout, ws_stream.next())
                .await
                .map_err(|_| {
                    TtsError::Timeout(format!(
                        "no frame for {:?} after {} bytes",
                        self.config.idle_timeout,
                        pcm.len()
                    ))
                })?;

            match frame {
                Some(Ok(Message::Binary(data))) => pcm.extend_from_slice(&data),
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<StatusMessage>(&text) {
                    Ok(StatusMessage::Completed) => break,
                    Ok(StatusMessage::Error { message }) => {
                        let _ = ws_stream.close(None).await;
                        return Err(TtsError::Service(message));
                    }
                    Ok(StatusMessage::Progress) => {}
                    Err(e) => {
                        return Err(TtsError::InvalidResponse(format!(
                            "Unexpected status frame: {}",
                            e
                        )))
                    }
                },
                Some(Ok(Message::Ping(payload))) => {
                    let _ = ws_stream.send(Message::Pong(payload)).await;
                }
                Some(Ok(Message::Close(_))) | None => {
                    return Err(TtsError::Transport(
                        "Stream closed before completion".to_string(),
                    ))
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(TtsError::Transport(e.to_string())),
            }
        }

        let _ = ws_stream.close(None).await;

        if pcm.is_empty() {
            return Err(TtsError::InvalidResponse("Stream produced no audio".to_string()));
        }

        tracing::info!(
            pcm_bytes = pcm.len(),
            sample_rate = self.config.sample_rate,
            "Streaming synthesis completed"
        );

        Ok(SynthesizedAudio {
            audio_data: encode_pcm16_wav(&pcm, self.config.sample_rate),
            content_type: "audio/wav".to_string(),
            sample_rate: Some(self.config.sample_rate),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    fn client(url: String) -> StreamingTtsClient {
        StreamingTtsClient::new(StreamingTtsClientConfig {
            url,
            connect_timeout: Duration::from_millis(500),
            idle_timeout: Duration::from_millis(200),
            ..Default::default()
        })
    }

    fn request() -> SynthesisRequest {
        SynthesisRequest::new("Hello world", "default", "default", None)
    }

    /// 启动一个按脚本回复的本地 WS 服务
    async fn serve(frames: Vec<Message>, hold_open: bool) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            let _request = ws.next().await;
            for frame in frames {
                ws.send(frame).await.unwrap();
            }
            if hold_open {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        });

        format!("ws://{}", addr)
    }

    #[tokio::test]
    async fn test_streaming_success_wraps_pcm() {
        let url = serve(
            vec![
                Message::Binary(vec![1u8, 0, 2, 0].into()),
                Message::Binary(vec![3u8, 0].into()),
                Message::Text(r#"{"status":"completed"}"#.to_string().into()),
            ],
            false,
        )
        .await;

        let audio = client(url).synthesize(&request()).await.unwrap();
        assert_eq!(&audio.audio_data[0..4], b"RIFF");
        assert_eq!(audio.audio_data.len(), 44 + 6);
        assert_eq!(audio.sample_rate, Some(24000));
    }

    #[tokio::test]
    async fn test_streaming_error_status() {
        let url = serve(
            vec![Message::Text(
                r#"{"status":"error","message":"model overloaded"}"#.to_string().into(),
            )],
            false,
        )
        .await;

        let err = client(url).synthesize(&request()).await.unwrap_err();
        assert_eq!(err, TtsError::Service("model overloaded".to_string()));
    }

    #[tokio::test]
    async fn test_streaming_idle_timeout() {
        let url = serve(vec![Message::Binary(vec![1u8, 0].into())], true).await;

        let err = client(url).synthesize(&request()).await.unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(format!("ws://{}", addr))
            .synthesize(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, TtsError::Transport(_)));
    }

    #[test]
    fn test_unconfigured_when_url_empty() {
        assert!(!client(String::new()).is_configured());
    }
}
