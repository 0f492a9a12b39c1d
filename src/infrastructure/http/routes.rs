//! HTTP Routes
//!
//! API Endpoints:
//! - /generate-video            POST  提交视频生成任务（202，后台执行）
//! - /video-status/{id}         GET   任务状态快照
//! - /jobs[?userId=]            GET   任务列表
//! - /jobs/stats                GET   各状态任务数
//! - /jobs/{id}/cancel          POST  请求取消
//! - /admin/set-tts-provider    POST  设置首选 TTS 提供方
//! - /admin/cache/invalidate    POST  使缓存条目失效
//! - /admin/cache/clear         POST  清空合成缓存
//! - /tts/health                GET   提供方健康状态
//! - /tts/cache/stats           GET   缓存统计
//! - /tts/analytics[?days=]     GET   合成统计（默认最近 1 天）
//! - /ws/jobs[?userId=]         WS    任务状态事件
//! - /health                    GET   存活检查

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/generate-video", post(handlers::generate_video))
        .route("/video-status/:id", get(handlers::video_status))
        .merge(job_routes())
        .merge(tts_routes())
        .route("/ws/jobs", get(handlers::jobs_websocket_handler))
}

/// Job 路由
fn job_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/jobs", get(handlers::list_jobs))
        .route("/jobs/stats", get(handlers::job_stats))
        .route("/jobs/:id/cancel", post(handlers::cancel_job))
}

/// TTS 与管理员路由
fn tts_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tts/health", get(handlers::tts_health))
        .route("/tts/cache/stats", get(handlers::cache_stats))
        .route("/tts/analytics", get(handlers::tts_analytics))
        .route("/admin/set-tts-provider", post(handlers::set_tts_provider))
        .route("/admin/cache/invalidate", post(handlers::invalidate_cache))
        .route("/admin/cache/clear", post(handlers::clear_cache))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tokio::sync::mpsc;
    use tower::util::ServiceExt;

    use crate::application::ports::{JobManagerPort, TtsProviderPort};
    use crate::application::{TtsAdapter, TtsAdapterConfig};
    use crate::domain::job::{JobId, PipelineStage};
    use crate::domain::synthesis::{ProviderId, SynthesisRequest};
    use crate::infrastructure::adapters::FakeTtsClient;
    use crate::infrastructure::events::EventPublisher;
    use crate::infrastructure::memory::{
        InMemoryJobManager, InMemoryProviderHealth, InMemorySynthesisCache, InMemoryTtsAnalytics,
    };

    struct Fixture {
        router: Router,
        manager: Arc<InMemoryJobManager>,
        tts: Arc<TtsAdapter>,
        _queue: mpsc::Receiver<JobId>,
    }

    fn fixture() -> Fixture {
        let (tx, rx) = mpsc::channel(16);
        let publisher = EventPublisher::new().arc();
        let manager = InMemoryJobManager::new(tx, publisher.clone()).arc();
        let cache = Arc::new(InMemorySynthesisCache::new(None));
        let health = Arc::new(InMemoryProviderHealth::new(3));
        let analytics = Arc::new(InMemoryTtsAnalytics::default());
        let tts = Arc::new(
            TtsAdapter::new(
                TtsAdapterConfig::default(),
                vec![
                    Arc::new(FakeTtsClient::for_provider(ProviderId::VibeVoice))
                        as Arc<dyn TtsProviderPort>,
                    Arc::new(FakeTtsClient::for_provider(ProviderId::ElevenLabs)),
                ],
                cache.clone(),
                health.clone(),
            )
            .with_analytics(analytics.clone()),
        );

        let state = AppState::new(
            manager.clone(),
            tts.clone(),
            cache,
            health,
            analytics,
            publisher,
        );
        Fixture {
            router: create_routes().with_state(Arc::new(state)),
            manager,
            tts,
            _queue: rx,
        }
    }

    async fn call(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_generate_video_then_poll() {
        let f = fixture();

        let (status, body) = call(
            &f.router,
            "POST",
            "/generate-video",
            Some(json!({"script": "Hello world", "template": "presenter1", "userId": "u1"})),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["errno"], 0);
        assert_eq!(body["data"]["status"], "started");

        let id = body["data"]["id"].as_str().unwrap().to_string();
        let (status, body) = call(&f.router, "GET", &format!("/video-status/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["id"], id);
        assert_eq!(body["data"]["status"], "pending");
        assert_eq!(body["data"]["progress"], 0);
        assert!(body["data"].get("videoUrl").is_none());
    }

    #[tokio::test]
    async fn test_generate_video_requires_script() {
        let f = fixture();

        let (status, body) = call(
            &f.router,
            "POST",
            "/generate-video",
            Some(json!({"template": "presenter1", "userId": "u1"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errno"], 400);
        assert_eq!(f.manager.stats().total, 0);
    }

    #[tokio::test]
    async fn test_unknown_job_is_not_found() {
        let f = fixture();

        let (status, _) = call(&f.router, "GET", &format!("/video-status/{}", JobId::new()), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = call(&f.router, "GET", "/video-status/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["errno"], 404);
    }

    #[tokio::test]
    async fn test_set_tts_provider() {
        let f = fixture();

        let (status, _) = call(
            &f.router,
            "POST",
            "/admin/set-tts-provider",
            Some(json!({"provider": "azure"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, health) = call(&f.router, "GET", "/tts/health", None).await;
        assert_eq!(health["data"]["currentProvider"], "vibevoice");

        let (status, body) = call(
            &f.router,
            "POST",
            "/admin/set-tts-provider",
            Some(json!({"provider": "elevenlabs"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["provider"], "elevenlabs");

        let (_, health) = call(&f.router, "GET", "/tts/health", None).await;
        assert_eq!(health["data"]["currentProvider"], "elevenlabs");
        assert_eq!(health["data"]["overrideProvider"], "elevenlabs");
        assert_eq!(health["data"]["providers"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_jobs_and_stats() {
        let f = fixture();
        for user in ["u1", "u2", "u1"] {
            call(
                &f.router,
                "POST",
                "/generate-video",
                Some(json!({"script": "Hi", "template": "t", "userId": user})),
            )
            .await;
        }

        let (_, all) = call(&f.router, "GET", "/jobs", None).await;
        assert_eq!(all["data"].as_array().unwrap().len(), 3);

        let (_, mine) = call(&f.router, "GET", "/jobs?userId=u1", None).await;
        let mine = mine["data"].as_array().unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|j| j["userId"] == "u1"));

        let (_, stats) = call(&f.router, "GET", "/jobs/stats", None).await;
        assert_eq!(stats["data"]["total"], 3);
        assert_eq!(stats["data"]["pending"], 3);
    }

    #[tokio::test]
    async fn test_cancel_job() {
        let f = fixture();
        let (_, body) = call(
            &f.router,
            "POST",
            "/generate-video",
            Some(json!({"script": "Hi", "template": "t", "userId": "u1"})),
        )
        .await;
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, _) = call(&f.router, "POST", &format!("/jobs/{}/cancel", id), None).await;
        assert_eq!(status, StatusCode::OK);

        let job_id: JobId = id.parse().unwrap();
        assert!(f.manager.is_cancel_requested(job_id));

        // 终态任务不可取消
        let other = crate::domain::job::Job::new("Hi", "t", "u1").unwrap();
        let other_id = f.manager.submit(other).unwrap();
        f.manager.begin_stage(other_id, PipelineStage::Enhance).unwrap();
        f.manager.complete(other_id, "http://x/v.mp4").unwrap();

        let (status, body) =
            call(&f.router, "POST", &format!("/jobs/{}/cancel", other_id), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["errno"], 409);
    }

    #[tokio::test]
    async fn test_cache_endpoints() {
        let f = fixture();

        let (status, body) = call(&f.router, "GET", "/tts/cache/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["backend"], "memory");
        assert_eq!(body["data"]["totalEntries"], 0);

        let (status, _) = call(&f.router, "POST", "/admin/cache/invalidate", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(
            &f.router,
            "POST",
            "/admin/cache/invalidate",
            Some(json!({"hash": "abc"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["removed"], false);
    }

    #[tokio::test]
    async fn test_clear_cache_endpoint() {
        let f = fixture();
        f.tts
            .generate(&SynthesisRequest::new("Hello world", "narrator", "", None))
            .await
            .unwrap();

        let (_, body) = call(&f.router, "GET", "/tts/cache/stats", None).await;
        assert_eq!(body["data"]["totalEntries"], 1);

        let (status, body) = call(&f.router, "POST", "/admin/cache/clear", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["removed"], 1);

        let (_, body) = call(&f.router, "GET", "/tts/cache/stats", None).await;
        assert_eq!(body["data"]["totalEntries"], 0);
    }

    #[tokio::test]
    async fn test_tts_analytics_endpoint() {
        let f = fixture();
        let request = SynthesisRequest::new("Hello world", "narrator", "", None);
        f.tts.generate(&request).await.unwrap();
        f.tts.generate(&request).await.unwrap();

        let (status, body) = call(&f.router, "GET", "/tts/analytics", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["days"], 1);
        assert_eq!(body["data"]["totalGenerations"], 1);
        assert_eq!(body["data"]["providers"]["vibevoice"], 1);
        assert_eq!(body["data"]["successRate"], 100.0);

        let (status, body) = call(&f.router, "GET", "/tts/analytics?days=7", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["days"], 7);

        let (status, body) = call(&f.router, "GET", "/tts/analytics?days=0", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errno"], 400);
    }

    #[tokio::test]
    async fn test_health() {
        let f = fixture();
        let (status, body) = call(&f.router, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}
