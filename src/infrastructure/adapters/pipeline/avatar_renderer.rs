//! Avatar Renderer - 数字人视频渲染客户端
//!
//! POST {base_url}/render
//! Request: {"audioUrl": "...", "avatarId": "...", "jobId": "..."}
//! Response: video/mp4 binary

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::application::ports::{AvatarRendererPort, RenderError, RenderRequest, RenderedVideo};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RenderHttpRequest<'a> {
    audio_url: &'a str,
    avatar_id: &'a str,
    job_id: &'a str,
}

#[derive(Debug, Clone)]
pub struct HttpAvatarRendererConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for HttpAvatarRendererConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9000".to_string(),
            timeout: Duration::from_secs(600),
        }
    }
}

/// HTTP 渲染客户端
pub struct HttpAvatarRenderer {
    client: Client,
    config: HttpAvatarRendererConfig,
}

impl HttpAvatarRenderer {
    pub fn new(config: HttpAvatarRendererConfig) -> Result<Self, RenderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RenderError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn render_url(&self) -> String {
        format!("{}/render", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl AvatarRendererPort for HttpAvatarRenderer {
    async fn render(&self, request: &RenderRequest) -> Result<RenderedVideo, RenderError> {
        let body = RenderHttpRequest {
            audio_url: &request.audio_url,
            avatar_id: &request.template,
            job_id: &request.job_id,
        };

        tracing::debug!(
            url = %self.render_url(),
            job_id = %request.job_id,
            template = %request.template,
            "Sending render request"
        );

        let response = self
            .client
            .post(self.render_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RenderError::Timeout
                } else {
                    RenderError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(RenderError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("video/mp4")
            .to_string();

        let video_data = response
            .bytes()
            .await
            .map_err(|e| RenderError::NetworkError(e.to_string()))?
            .to_vec();

        Ok(RenderedVideo {
            video_data,
            content_type,
        })
    }
}

/// 本地占位渲染
///
/// 输出仅含 ftyp 头的最小 MP4
#[derive(Debug, Default)]
pub struct MockAvatarRenderer {
    latency: Duration,
}

impl MockAvatarRenderer {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    fn placeholder_mp4() -> Vec<u8> {
        let mut data = Vec::with_capacity(132);
        data.extend_from_slice(b"\x00\x00\x00\x20ftypisom\x00\x00\x02\x00isomiso2mp41");
        data.extend_from_slice(&[0u8; 100]);
        data
    }
}

#[async_trait]
impl AvatarRendererPort for MockAvatarRenderer {
    async fn render(&self, request: &RenderRequest) -> Result<RenderedVideo, RenderError> {
        tracing::debug!(job_id = %request.job_id, "MockAvatarRenderer: returning placeholder video");
        tokio::time::sleep(self.latency).await;

        Ok(RenderedVideo {
            video_data: Self::placeholder_mp4(),
            content_type: "video/mp4".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use tokio::net::TcpListener;

    fn request() -> RenderRequest {
        RenderRequest {
            audio_url: "http://localhost/media/audio/a.wav".to_string(),
            template: "presenter1".to_string(),
            job_id: "job-1".to_string(),
        }
    }

    async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_mock_renderer() {
        let video = MockAvatarRenderer::default().render(&request()).await.unwrap();
        assert_eq!(&video.video_data[4..8], b"ftyp");
        assert_eq!(video.content_type, "video/mp4");
    }

    #[tokio::test]
    async fn test_http_render_success() {
        let router = Router::new().route(
            "/render",
            post(|Json(body): Json<serde_json::Value>| async move {
                assert_eq!(body["avatarId"], "presenter1");
                assert_eq!(body["jobId"], "job-1");
                ([("content-type", "video/mp4")], vec![1u8, 2, 3])
            }),
        );
        let renderer = HttpAvatarRenderer::new(HttpAvatarRendererConfig {
            base_url: serve(router).await,
            timeout: Duration::from_secs(5),
        })
        .unwrap();

        let video = renderer.render(&request()).await.unwrap();
        assert_eq!(video.video_data, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_http_render_service_error() {
        let router = Router::new().route(
            "/render",
            post(|| async { (StatusCode::BAD_GATEWAY, "avatar offline") }),
        );
        let renderer = HttpAvatarRenderer::new(HttpAvatarRendererConfig {
            base_url: serve(router).await,
            timeout: Duration::from_secs(5),
        })
        .unwrap();

        let err = renderer.render(&request()).await.unwrap_err();
        assert!(matches!(err, RenderError::ServiceError(msg) if msg.contains("502")));
    }
}
