//! Video Worker - Background Video Pipeline Processor
//!
//! 从队列消费任务，依次执行 enhance → synthesize → render → upload，
//! 每个阶段开始前检查取消标记

use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};

use crate::application::ports::{
    AvatarRendererPort, JobManagerError, JobManagerPort, ObjectStorePort, RenderError,
    RenderRequest, ScriptEnhancerPort, StorageError,
};
use crate::application::services::TtsAdapter;
use crate::domain::job::{JobErrorKind, JobFailure, JobId, PipelineStage};
use crate::domain::synthesis::SynthesisRequest;

/// Worker 配置
#[derive(Debug, Clone)]
pub struct VideoWorkerConfig {
    /// 最大并发任务数
    pub max_concurrent: usize,
    /// 合成使用的音色
    pub voice_profile: String,
    /// 合成使用的风格
    pub style: String,
}

impl Default for VideoWorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            voice_profile: "default".to_string(),
            style: "default".to_string(),
        }
    }
}

/// 流水线依赖
#[derive(Clone)]
pub struct PipelineContext {
    pub job_manager: Arc<dyn JobManagerPort>,
    pub enhancer: Arc<dyn ScriptEnhancerPort>,
    pub tts: Arc<TtsAdapter>,
    pub renderer: Arc<dyn AvatarRendererPort>,
    pub object_store: Arc<dyn ObjectStorePort>,
}

/// 阶段中止原因
enum StageError {
    /// 任务以该失败结束
    Failed(JobFailure),
    /// 任务记录无法再更新
    Lost(JobManagerError),
}

impl From<JobFailure> for StageError {
    fn from(failure: JobFailure) -> Self {
        StageError::Failed(failure)
    }
}

impl From<JobManagerError> for StageError {
    fn from(e: JobManagerError) -> Self {
        StageError::Lost(e)
    }
}

/// 视频 Worker
pub struct VideoWorker {
    config: VideoWorkerConfig,
    queue_receiver: mpsc::Receiver<JobId>,
    context: PipelineContext,
}

impl VideoWorker {
    pub fn new(
        config: VideoWorkerConfig,
        queue_receiver: mpsc::Receiver<JobId>,
        context: PipelineContext,
    ) -> Self {
        Self {
            config,
            queue_receiver,
            context,
        }
    }

    /// 启动 Worker，发送端全部关闭后退出
    pub async fn run(mut self) {
        tracing::info!(
            max_concurrent = self.config.max_concurrent,
            "VideoWorker started"
        );

        // 使用 semaphore 控制并发
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent.max(1)));

        while let Some(job_id) = self.queue_receiver.recv().await {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    tracing::error!("Failed to acquire semaphore permit");
                    continue;
                }
            };

            let context = self.context.clone();
            let config = self.config.clone();

            tokio::spawn(async move {
                let _permit = permit; // 持有 permit 直到任务完成
                Self::process_job(job_id, &config, &context).await;
            });
        }

        tracing::info!("VideoWorker stopped");
    }

    /// 处理单个任务
    async fn process_job(job_id: JobId, config: &VideoWorkerConfig, ctx: &PipelineContext) {
        let job = match ctx.job_manager.get(job_id) {
            Some(job) => job,
            None => {
                tracing::warn!(job_id = %job_id, "Job not found, skipping");
                return;
            }
        };

        if job.status().is_terminal() {
            tracing::debug!(job_id = %job_id, status = %job.status(), "Job already terminal");
            return;
        }

        let started = std::time::Instant::now();
        let result = Self::run_pipeline(job_id, job.script(), job.template(), config, ctx).await;

        match result {
            Ok(video_url) => match ctx.job_manager.complete(job_id, &video_url) {
                Ok(_) => tracing::info!(
                    job_id = %job_id,
                    video_url = %video_url,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Job completed"
                ),
                Err(e) => tracing::error!(job_id = %job_id, error = %e, "Failed to complete job"),
            },
            Err(StageError::Failed(failure)) => {
                tracing::warn!(
                    job_id = %job_id,
                    kind = %failure.kind,
                    error = %failure.message,
                    "Job failed"
                );
                if let Err(e) = ctx.job_manager.fail(job_id, failure) {
                    tracing::error!(job_id = %job_id, error = %e, "Failed to mark job failed");
                }
            }
            Err(StageError::Lost(e)) => {
                tracing::error!(job_id = %job_id, error = %e, "Job record rejected update, abandoning");
            }
        }
    }

    async fn run_pipeline(
        job_id: JobId,
        script: &str,
        template: &str,
        config: &VideoWorkerConfig,
        ctx: &PipelineContext,
    ) -> Result<String, StageError> {
        // Stage 1: enhance
        Self::enter_stage(ctx, job_id, PipelineStage::Enhance)?;
        let script = ctx
            .enhancer
            .enhance(script)
            .await
            .map_err(|e| JobFailure::new(JobErrorKind::EnhanceFailure, e.to_string()))?;

        // Stage 2: synthesize
        Self::enter_stage(ctx, job_id, PipelineStage::Synthesize)?;
        let request = SynthesisRequest::new(script, &config.voice_profile, &config.style, None);
        let outcome = ctx
            .tts
            .generate(&request)
            .await
            .map_err(|e| JobFailure::new(e.kind(), e.to_string()))?;

        let provenance = outcome.provenance.clone();
        ctx.job_manager.record_provenance(job_id, provenance.clone())?;
        ctx.job_manager.set_stage_message(
            job_id,
            &format!(
                "Voiceover generated with {}{}",
                provenance.provider,
                if provenance.cache_hit { " (cached)" } else { "" }
            ),
        )?;

        // Stage 3: render
        Self::enter_stage(ctx, job_id, PipelineStage::Render)?;
        let artifact = &outcome.artifact;
        let audio_key = format!("audio/{}.{}", job_id, artifact.extension());
        let audio_url = ctx
            .object_store
            .put(&audio_key, &artifact.audio_data, &artifact.content_type)
            .await
            .map_err(storage_failure)?;

        let video = ctx
            .renderer
            .render(&RenderRequest {
                audio_url,
                template: template.to_string(),
                job_id: job_id.to_string(),
            })
            .await
            .map_err(render_failure)?;

        // Stage 4: upload
        Self::enter_stage(ctx, job_id, PipelineStage::Upload)?;
        let video_url = ctx
            .object_store
            .put(
                &format!("videos/{}.mp4", job_id),
                &video.video_data,
                &video.content_type,
            )
            .await
            .map_err(storage_failure)?;

        Ok(video_url)
    }

    fn enter_stage(
        ctx: &PipelineContext,
        job_id: JobId,
        stage: PipelineStage,
    ) -> Result<(), StageError> {
        if ctx.job_manager.is_cancel_requested(job_id) {
            tracing::info!(job_id = %job_id, stage = %stage.as_str(), "Job cancelled before stage");
            return Err(JobFailure::cancelled().into());
        }

        ctx.job_manager.begin_stage(job_id, stage)?;
        tracing::debug!(job_id = %job_id, stage = %stage.as_str(), "Stage started");
        Ok(())
    }
}

fn storage_failure(e: StorageError) -> JobFailure {
    JobFailure::new(JobErrorKind::StorageFailure, e.to_string())
}

fn render_failure(e: RenderError) -> JobFailure {
    JobFailure::new(JobErrorKind::RenderFailure, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{
        RenderedVideo, SynthesizedAudio, TtsError, TtsProviderPort,
    };
    use crate::application::services::TtsAdapterConfig;
    use crate::domain::job::{Job, JobStatus};
    use crate::domain::synthesis::ProviderId;
    use crate::infrastructure::adapters::{
        BasicScriptEnhancer, FakeTtsClient, FileObjectStore, MockAvatarRenderer,
    };
    use crate::infrastructure::events::{EventPublisher, WsEvent};
    use crate::infrastructure::memory::{
        InMemoryJobManager, InMemoryProviderHealth, InMemorySynthesisCache,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::sync::{broadcast, Notify};

    /// 始终连接失败的提供方
    struct DownProvider {
        id: ProviderId,
        calls: AtomicU32,
    }

    impl DownProvider {
        fn new(id: ProviderId) -> Arc<Self> {
            Arc::new(Self {
                id,
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl TtsProviderPort for DownProvider {
        fn id(&self) -> ProviderId {
            self.id
        }

        async fn synthesize(&self, _: &SynthesisRequest) -> Result<SynthesizedAudio, TtsError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(TtsError::Transport("connection refused".to_string()))
        }
    }

    /// 合成开始后阻塞，直到测试放行
    struct GatedProvider {
        id: ProviderId,
        entered: Notify,
        release: Notify,
    }

    impl GatedProvider {
        fn new(id: ProviderId) -> Arc<Self> {
            Arc::new(Self {
                id,
                entered: Notify::new(),
                release: Notify::new(),
            })
        }
    }

    #[async_trait]
    impl TtsProviderPort for GatedProvider {
        fn id(&self) -> ProviderId {
            self.id
        }

        async fn synthesize(&self, _: &SynthesisRequest) -> Result<SynthesizedAudio, TtsError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(SynthesizedAudio {
                audio_data: vec![0u8; 64],
                content_type: "audio/wav".to_string(),
                sample_rate: Some(16_000),
            })
        }
    }

    #[derive(Default)]
    struct CountingRenderer {
        calls: AtomicU32,
    }

    #[async_trait]
    impl AvatarRendererPort for CountingRenderer {
        async fn render(&self, _: &RenderRequest) -> Result<RenderedVideo, RenderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(RenderedVideo {
                video_data: vec![1, 2, 3],
                content_type: "video/mp4".to_string(),
            })
        }
    }

    struct BrokenRenderer;

    #[async_trait]
    impl AvatarRendererPort for BrokenRenderer {
        async fn render(&self, _: &RenderRequest) -> Result<RenderedVideo, RenderError> {
            Err(RenderError::ServiceError("avatar offline".to_string()))
        }
    }

    struct Harness {
        manager: Arc<InMemoryJobManager>,
        publisher: Arc<EventPublisher>,
        queue: Option<mpsc::Receiver<JobId>>,
        context: PipelineContext,
        _media: TempDir,
    }

    impl Harness {
        async fn new(
            providers: Vec<Arc<dyn TtsProviderPort>>,
            renderer: Arc<dyn AvatarRendererPort>,
        ) -> Self {
            let media = tempfile::tempdir().unwrap();
            let (tx, rx) = mpsc::channel(16);
            let publisher = EventPublisher::new().arc();
            let manager = InMemoryJobManager::new(tx, publisher.clone()).arc();

            let tts_config = TtsAdapterConfig {
                retry_delay: Duration::from_millis(5),
                attempt_timeout: Duration::from_secs(2),
                max_input_chars: 50,
                ..Default::default()
            };
            let health = Arc::new(InMemoryProviderHealth::new(tts_config.failure_threshold));
            let tts = Arc::new(TtsAdapter::new(
                tts_config,
                providers,
                Arc::new(InMemorySynthesisCache::new(None)),
                health,
            ));

            let store = FileObjectStore::new(media.path(), "http://localhost:8080/media")
                .await
                .unwrap();

            let context = PipelineContext {
                job_manager: manager.clone(),
                enhancer: Arc::new(BasicScriptEnhancer::new()),
                tts,
                renderer,
                object_store: Arc::new(store),
            };

            Self {
                manager,
                publisher,
                queue: Some(rx),
                context,
                _media: media,
            }
        }

        fn start(&mut self) {
            let worker = VideoWorker::new(
                VideoWorkerConfig::default(),
                self.queue.take().unwrap(),
                self.context.clone(),
            );
            tokio::spawn(worker.run());
        }

        fn submit(&self, script: &str) -> JobId {
            let job = Job::new(script, "presenter1", "u1").unwrap();
            self.manager.submit(job).unwrap()
        }

        /// 等待任务进入终态，返回期间观察到的事件
        async fn wait_terminal(
            &self,
            rx: &mut broadcast::Receiver<WsEvent>,
            job_id: JobId,
        ) -> Vec<(String, u8)> {
            let mut seen = Vec::new();
            let wait = async {
                loop {
                    let event = rx.recv().await;
                    if let Ok(WsEvent::VideoStatus {
                        job_id: id,
                        status,
                        progress,
                        ..
                    }) = event
                    {
                        if id != job_id.to_string() {
                            continue;
                        }
                        let done = status == "completed" || status == "failed";
                        seen.push((status, progress));
                        if done {
                            break;
                        }
                    }
                }
            };
            tokio::time::timeout(Duration::from_secs(5), wait)
                .await
                .expect("job did not finish in time");
            seen
        }
    }

    fn fake(id: ProviderId) -> Arc<dyn TtsProviderPort> {
        Arc::new(FakeTtsClient::for_provider(id))
    }

    #[tokio::test]
    async fn test_job_completes_with_video_url() {
        let mut h = Harness::new(
            vec![fake(ProviderId::VibeVoice), fake(ProviderId::ElevenLabs)],
            Arc::new(MockAvatarRenderer::default()),
        )
        .await;
        let mut rx = h.publisher.subscribe();
        h.start();

        let job_id = h.submit("Hello world");
        h.wait_terminal(&mut rx, job_id).await;

        let job = h.manager.get(job_id).unwrap();
        assert_eq!(job.status(), JobStatus::Completed);
        assert_eq!(job.progress(), 100);
        assert_eq!(
            job.video_url(),
            Some(format!("http://localhost:8080/media/videos/{}.mp4", job_id).as_str())
        );
        let provenance = job.tts_provenance().unwrap();
        assert_eq!(provenance.provider, ProviderId::VibeVoice);
        assert!(!provenance.fallback_used);
    }

    #[tokio::test]
    async fn test_unreachable_primary_falls_back() {
        let primary = DownProvider::new(ProviderId::VibeVoice);
        let mut h = Harness::new(
            vec![
                primary.clone() as Arc<dyn TtsProviderPort>,
                fake(ProviderId::ElevenLabs),
            ],
            Arc::new(MockAvatarRenderer::default()),
        )
        .await;
        let mut rx = h.publisher.subscribe();
        h.start();

        let job_id = h.submit("Hello world");
        h.wait_terminal(&mut rx, job_id).await;

        let job = h.manager.get(job_id).unwrap();
        assert_eq!(job.status(), JobStatus::Completed);
        let provenance = job.tts_provenance().unwrap();
        assert_eq!(provenance.provider, ProviderId::ElevenLabs);
        assert!(provenance.fallback_used);
        assert_eq!(primary.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_too_long_script_fails_without_provider_calls() {
        let primary = DownProvider::new(ProviderId::VibeVoice);
        let secondary = DownProvider::new(ProviderId::ElevenLabs);
        let mut h = Harness::new(
            vec![
                primary.clone() as Arc<dyn TtsProviderPort>,
                secondary.clone(),
            ],
            Arc::new(MockAvatarRenderer::default()),
        )
        .await;
        let mut rx = h.publisher.subscribe();
        h.start();

        let job_id = h.submit(&"word ".repeat(40));
        h.wait_terminal(&mut rx, job_id).await;

        let job = h.manager.get(job_id).unwrap();
        assert_eq!(job.status(), JobStatus::Failed);
        assert_eq!(job.error().unwrap().kind, JobErrorKind::ValidationError);
        assert_eq!(primary.calls.load(Ordering::SeqCst), 0);
        assert_eq!(secondary.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_both_providers_down_fails_with_tts_failure() {
        let mut h = Harness::new(
            vec![
                DownProvider::new(ProviderId::VibeVoice) as Arc<dyn TtsProviderPort>,
                DownProvider::new(ProviderId::ElevenLabs),
            ],
            Arc::new(MockAvatarRenderer::default()),
        )
        .await;
        let mut rx = h.publisher.subscribe();
        h.start();

        let job_id = h.submit("Hello world");
        h.wait_terminal(&mut rx, job_id).await;

        let job = h.manager.get(job_id).unwrap();
        assert_eq!(job.status(), JobStatus::Failed);
        assert_eq!(job.error().unwrap().kind, JobErrorKind::TtsFailure);
        assert_eq!(job.progress(), PipelineStage::Synthesize.progress());
        assert!(job.video_url().is_none());
    }

    #[tokio::test]
    async fn test_render_failure_terminates_job() {
        let mut h = Harness::new(
            vec![fake(ProviderId::VibeVoice), fake(ProviderId::ElevenLabs)],
            Arc::new(BrokenRenderer),
        )
        .await;
        let mut rx = h.publisher.subscribe();
        h.start();

        let job_id = h.submit("Hello world");
        h.wait_terminal(&mut rx, job_id).await;

        let job = h.manager.get(job_id).unwrap();
        assert_eq!(job.status(), JobStatus::Failed);
        assert_eq!(job.error().unwrap().kind, JobErrorKind::RenderFailure);
        // 音频已合成，provenance 保留
        assert!(job.tts_provenance().is_some());
    }

    #[tokio::test]
    async fn test_cancel_before_start() {
        let mut h = Harness::new(
            vec![fake(ProviderId::VibeVoice), fake(ProviderId::ElevenLabs)],
            Arc::new(MockAvatarRenderer::default()),
        )
        .await;
        let mut rx = h.publisher.subscribe();

        let job_id = h.submit("Hello world");
        h.manager.request_cancel(job_id).unwrap();
        h.start();
        h.wait_terminal(&mut rx, job_id).await;

        let job = h.manager.get(job_id).unwrap();
        assert_eq!(job.status(), JobStatus::Failed);
        assert_eq!(job.error().unwrap().kind, JobErrorKind::CancellationError);
        assert_eq!(job.progress(), 0);
    }

    #[tokio::test]
    async fn test_cancel_during_synthesis_stops_before_render() {
        let primary = GatedProvider::new(ProviderId::VibeVoice);
        let renderer = Arc::new(CountingRenderer::default());
        let mut h = Harness::new(
            vec![
                primary.clone() as Arc<dyn TtsProviderPort>,
                fake(ProviderId::ElevenLabs),
            ],
            renderer.clone(),
        )
        .await;
        let mut rx = h.publisher.subscribe();
        h.start();

        let job_id = h.submit("Hello world");
        tokio::time::timeout(Duration::from_secs(5), primary.entered.notified())
            .await
            .expect("synthesis never started");

        let running = h.manager.get(job_id).unwrap();
        assert_eq!(running.status(), JobStatus::Processing);
        h.manager.request_cancel(job_id).unwrap();
        primary.release.notify_one();

        h.wait_terminal(&mut rx, job_id).await;

        let job = h.manager.get(job_id).unwrap();
        assert_eq!(job.status(), JobStatus::Failed);
        assert_eq!(job.error().unwrap().kind, JobErrorKind::CancellationError);
        assert_eq!(job.progress(), PipelineStage::Synthesize.progress());
        assert!(job.video_url().is_none());
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_observed_progress_is_monotonic() {
        let mut h = Harness::new(
            vec![fake(ProviderId::VibeVoice), fake(ProviderId::ElevenLabs)],
            Arc::new(MockAvatarRenderer::default()),
        )
        .await;
        let mut rx = h.publisher.subscribe();
        h.start();

        let job_id = h.submit("Hello world");
        let seen = h.wait_terminal(&mut rx, job_id).await;

        let rank = |s: &str| match s {
            "pending" => 0,
            "processing" => 1,
            _ => 2,
        };
        for pair in seen.windows(2) {
            assert!(pair[0].1 <= pair[1].1, "progress regressed: {:?}", seen);
            assert!(rank(&pair[0].0) <= rank(&pair[1].0), "status regressed: {:?}", seen);
        }

        let stages: Vec<u8> = seen.iter().map(|(_, p)| *p).collect();
        for stage in PipelineStage::ALL {
            assert!(stages.contains(&stage.progress()));
        }
        assert_eq!(seen.last().unwrap(), &("completed".to_string(), 100));
    }
}
