//! Scriptcast - 脚本生成数字人视频服务
//!
//! 装配所有适配器并启动 HTTP 服务与后台 Worker

use std::sync::Arc;
use std::time::Duration;

use scriptcast::application::ports::{
    AvatarRendererPort, ProviderHealthPort, SynthesisCachePort, TtsAnalyticsPort, TtsProviderPort,
};
use scriptcast::application::TtsAdapter;
use scriptcast::config::{load_config, print_config, AppConfig, CacheBackend};
use scriptcast::domain::synthesis::ProviderId;
use scriptcast::infrastructure::adapters::{
    BasicScriptEnhancer, FakeTtsClient, FakeTtsClientConfig, FileObjectStore, HttpAvatarRenderer,
    HttpAvatarRendererConfig, HttpTtsClient, HttpTtsClientConfig, MockAvatarRenderer,
    StreamingTtsClient, StreamingTtsClientConfig,
};
use scriptcast::infrastructure::events::EventPublisher;
use scriptcast::infrastructure::http::{AppState, HttpServer, ServerConfig};
use scriptcast::infrastructure::memory::{
    InMemoryJobManager, InMemoryProviderHealth, InMemorySynthesisCache, InMemoryTtsAnalytics,
};
use scriptcast::infrastructure::persistence::sled::SledSynthesisCache;
use scriptcast::infrastructure::worker::{PipelineContext, VideoWorker, VideoWorkerConfig};
use tokio::sync::mpsc;

fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},scriptcast={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn build_providers(config: &AppConfig) -> anyhow::Result<Vec<Arc<dyn TtsProviderPort>>> {
    if config.pipeline.mock_mode {
        return Ok(vec![
            Arc::new(FakeTtsClient::for_provider(ProviderId::VibeVoice)) as Arc<dyn TtsProviderPort>,
            Arc::new(FakeTtsClient::new(FakeTtsClientConfig {
                provider: ProviderId::ElevenLabs,
                ..Default::default()
            })),
        ]);
    }

    let tts = &config.tts;
    let vibevoice = StreamingTtsClient::new(StreamingTtsClientConfig {
        url: tts.vibevoice.url.clone(),
        sample_rate: tts.vibevoice.sample_rate,
        default_voice: tts.vibevoice.voice.clone(),
        connect_timeout: tts.connect_timeout(),
        idle_timeout: tts.idle_timeout(),
    });
    let elevenlabs = HttpTtsClient::new(HttpTtsClientConfig {
        base_url: tts.elevenlabs.url.clone(),
        api_key: tts.elevenlabs.api_key.clone(),
        default_voice: tts.elevenlabs.voice.clone(),
        connect_timeout: tts.connect_timeout(),
        timeout: tts.attempt_timeout(),
    })?;

    Ok(vec![
        Arc::new(vibevoice) as Arc<dyn TtsProviderPort>,
        Arc::new(elevenlabs),
    ])
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    tracing::info!("Scriptcast - 脚本生成数字人视频");
    print_config(&config);

    tokio::fs::create_dir_all(&config.storage.media_dir).await?;

    // 事件发布器与任务队列
    let event_publisher = EventPublisher::new().arc();
    let (job_tx, job_rx) = mpsc::channel(config.pipeline.queue_capacity);
    let job_manager = InMemoryJobManager::new(job_tx, event_publisher.clone()).arc();

    // 合成缓存
    let cache: Arc<dyn SynthesisCachePort> = match config.cache.backend {
        CacheBackend::Memory => Arc::new(InMemorySynthesisCache::new(config.cache.ttl())),
        CacheBackend::Sled => {
            if let Some(parent) = std::path::Path::new(&config.cache.path).parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            SledSynthesisCache::open(&config.cache.path, config.cache.ttl())?.arc()
        }
    };

    // TTS 提供方与适配器
    let health: Arc<dyn ProviderHealthPort> =
        Arc::new(InMemoryProviderHealth::new(config.tts.failure_threshold));
    let providers = build_providers(&config)?;
    let analytics: Arc<dyn TtsAnalyticsPort> =
        Arc::new(InMemoryTtsAnalytics::new(config.tts.analytics_capacity));
    let tts = Arc::new(
        TtsAdapter::new(
            config.tts.adapter_config(),
            providers,
            cache.clone(),
            health.clone(),
        )
        .with_analytics(analytics.clone()),
    );

    // 流水线其余阶段
    let renderer: Arc<dyn AvatarRendererPort> = if config.pipeline.mock_mode {
        Arc::new(MockAvatarRenderer::new(Duration::from_millis(200)))
    } else {
        Arc::new(HttpAvatarRenderer::new(HttpAvatarRendererConfig {
            base_url: config.pipeline.renderer_url.clone(),
            timeout: Duration::from_secs(config.pipeline.render_timeout_secs),
        })?)
    };
    let object_store = Arc::new(
        FileObjectStore::new(
            &config.storage.media_dir,
            format!("{}/media", config.server.public_base_url()),
        )
        .await?,
    );

    let worker = VideoWorker::new(
        VideoWorkerConfig {
            max_concurrent: config.pipeline.max_concurrent,
            ..Default::default()
        },
        job_rx,
        PipelineContext {
            job_manager: job_manager.clone(),
            enhancer: Arc::new(BasicScriptEnhancer::new()),
            tts: tts.clone(),
            renderer,
            object_store,
        },
    );
    tokio::spawn(worker.run());

    // HTTP 服务器
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        media_dir: config.storage.media_dir.clone(),
        ..Default::default()
    };
    let state = AppState::new(job_manager, tts, cache, health, analytics, event_publisher);
    let server = HttpServer::new(server_config, state);

    tracing::info!("Starting HTTP server...");

    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
