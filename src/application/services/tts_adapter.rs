//! TTS Adapter - 带缓存、重试与 fallback 的语音合成编排
//!
//! 流程:
//! 1. 内容哈希 → 查缓存，命中直接返回（不调用任何提供方）
//! 2. 文本长度校验
//! 3. 首选提供方按次数重试，每次尝试受单次超时约束
//! 4. 首选耗尽后尝试另一提供方一次
//! 5. 成功写缓存并记录健康状态；全部失败返回 TtsFailure
//!
//! 同一内容哈希的并发请求串行化，保证至多一次外部合成。
//! 每次真正调用提供方的生成（成功或全部失败）写入一条统计记录，缓存命中不计。

use chrono::Utc;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::application::ports::{
    GenerationOutcome, GenerationRecord, ProviderHealthPort, SynthesisCachePort,
    TtsAnalyticsPort, TtsError, TtsProviderPort,
};
use crate::domain::job::JobErrorKind;
use crate::domain::synthesis::{AudioArtifact, ProviderId, SynthesisRequest, TtsProvenance};

/// TTS Adapter 配置
#[derive(Debug, Clone)]
pub struct TtsAdapterConfig {
    /// 默认首选提供方
    pub default_provider: ProviderId,
    /// 首选提供方最大尝试次数（含首次）
    pub max_attempts: u32,
    /// 两次尝试之间的固定间隔
    pub retry_delay: Duration,
    /// 单次尝试的总时限
    pub attempt_timeout: Duration,
    /// 最大输入字符数
    pub max_input_chars: usize,
    /// 连续失败达到该值后跳过首选提供方，0 表示关闭
    pub failure_threshold: u32,
    /// 跳过状态的持续时间，过后重新尝试
    pub cooldown: Duration,
}

impl Default for TtsAdapterConfig {
    fn default() -> Self {
        Self {
            default_provider: ProviderId::VibeVoice,
            max_attempts: 2,
            retry_delay: Duration::from_millis(500),
            attempt_timeout: Duration::from_secs(90),
            max_input_chars: 3000,
            failure_threshold: 3,
            cooldown: Duration::from_secs(60),
        }
    }
}

/// 单个提供方的失败记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    pub provider: ProviderId,
    pub attempts: u32,
    pub last_error: Option<TtsError>,
    /// 因连续失败被跳过
    pub skipped: bool,
}

impl std::fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.last_error, self.skipped) {
            (Some(e), true) => write!(
                f,
                "{} skipped (persistently failing) [{}] {}",
                self.provider,
                e.kind(),
                e
            ),
            (None, true) => write!(f, "{} skipped (persistently failing)", self.provider),
            (Some(e), false) => write!(
                f,
                "{} after {} attempt(s): [{}] {}",
                self.provider,
                self.attempts,
                e.kind(),
                e
            ),
            (None, false) => write!(f, "{} not attempted", self.provider),
        }
    }
}

/// 合成错误
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("TTS failure: primary {primary}; secondary {secondary}")]
    Exhausted {
        primary: ProviderFailure,
        secondary: ProviderFailure,
    },
}

impl SynthesisError {
    pub fn kind(&self) -> JobErrorKind {
        match self {
            SynthesisError::Validation(_) => JobErrorKind::ValidationError,
            SynthesisError::Exhausted { .. } => JobErrorKind::TtsFailure,
        }
    }
}

/// 合成结果
#[derive(Debug, Clone)]
pub struct SynthesisOutcome {
    pub artifact: AudioArtifact,
    pub provenance: TtsProvenance,
}

enum AttemptResult {
    Success(AudioArtifact, u32),
    Failure(ProviderFailure),
}

/// TTS Adapter
pub struct TtsAdapter {
    config: TtsAdapterConfig,
    providers: HashMap<ProviderId, Arc<dyn TtsProviderPort>>,
    cache: Arc<dyn SynthesisCachePort>,
    health: Arc<dyn ProviderHealthPort>,
    /// 管理员设置的首选提供方
    preferred_override: RwLock<Option<ProviderId>>,
    /// content_hash -> 合成锁
    inflight: DashMap<String, Arc<Mutex<()>>>,
    analytics: Option<Arc<dyn TtsAnalyticsPort>>,
}

impl TtsAdapter {
    pub fn new(
        config: TtsAdapterConfig,
        providers: Vec<Arc<dyn TtsProviderPort>>,
        cache: Arc<dyn SynthesisCachePort>,
        health: Arc<dyn ProviderHealthPort>,
    ) -> Self {
        let providers = providers.into_iter().map(|p| (p.id(), p)).collect();
        Self {
            config,
            providers,
            cache,
            health,
            preferred_override: RwLock::new(None),
            inflight: DashMap::new(),
            analytics: None,
        }
    }

    /// 挂接生成统计
    pub fn with_analytics(mut self, analytics: Arc<dyn TtsAnalyticsPort>) -> Self {
        self.analytics = Some(analytics);
        self
    }

    pub fn config(&self) -> &TtsAdapterConfig {
        &self.config
    }

    /// 当前首选提供方
    pub fn preferred_provider(&self) -> ProviderId {
        self.preference_override()
            .unwrap_or(self.config.default_provider)
    }

    pub fn preference_override(&self) -> Option<ProviderId> {
        *self
            .preferred_override
            .read()
            .unwrap_or_else(|e| e.into_inner())
    }

    /// 设置首选提供方（仅影响尝试顺序，fallback 保持开启）
    pub fn set_preferred_provider(&self, provider: Option<ProviderId>) {
        let mut guard = self
            .preferred_override
            .write()
            .unwrap_or_else(|e| e.into_inner());
        *guard = provider;
        tracing::info!(provider = ?provider, "TTS provider preference updated");
    }

    pub fn is_configured(&self, provider: ProviderId) -> bool {
        self.providers
            .get(&provider)
            .map(|p| p.is_configured())
            .unwrap_or(false)
    }

    /// 生成音频
    pub async fn generate(
        &self,
        request: &SynthesisRequest,
    ) -> Result<SynthesisOutcome, SynthesisError> {
        let started = Instant::now();
        let content_hash = request.content_hash();

        let lock = self
            .inflight
            .entry(content_hash.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let result = {
            let _guard = lock.lock().await;
            self.generate_locked(&request.normalized(), &content_hash, started)
                .await
        };

        drop(lock);
        self.inflight
            .remove_if(&content_hash, |_, l| Arc::strong_count(l) == 1);

        result
    }

    async fn generate_locked(
        &self,
        request: &SynthesisRequest,
        content_hash: &str,
        started: Instant,
    ) -> Result<SynthesisOutcome, SynthesisError> {
        // 1. 缓存
        match self.cache.get(content_hash).await {
            Ok(Some(artifact)) => {
                tracing::info!(content_hash = %content_hash, provider = %artifact.provider, "Synthesis cache hit");
                let provenance = TtsProvenance {
                    provider: artifact.provider,
                    fallback_used: false,
                    cache_hit: true,
                    attempts: 0,
                    primary_attempts: 0,
                    latency_ms: elapsed_ms(started),
                };
                return Ok(SynthesisOutcome {
                    artifact,
                    provenance,
                });
            }
            Ok(None) => {
                tracing::debug!(content_hash = %content_hash, "Synthesis cache miss");
            }
            Err(e) => {
                tracing::warn!(content_hash = %content_hash, error = %e, "Synthesis cache lookup failed, treating as miss");
            }
        }

        // 2. 校验
        let char_count = request.text.chars().count();
        if char_count == 0 {
            return Err(SynthesisError::Validation("Text cannot be empty".to_string()));
        }
        if char_count > self.config.max_input_chars {
            return Err(SynthesisError::Validation(format!(
                "Text too long (maximum {} characters, got {})",
                self.config.max_input_chars, char_count
            )));
        }

        // 3. 首选提供方
        let first = self.preferred_provider();
        let second = first.other();

        let primary = if self.should_skip(first) {
            let reason = self
                .health
                .status(first)
                .last_error
                .unwrap_or_else(|| "consecutive failures over threshold".to_string());
            tracing::warn!(provider = %first, last_error = %reason, "Provider persistently failing, skipping to fallback");
            AttemptResult::Failure(ProviderFailure {
                provider: first,
                attempts: 0,
                last_error: Some(TtsError::Unavailable(reason)),
                skipped: true,
            })
        } else {
            self.attempt_provider(first, request, content_hash, self.config.max_attempts)
                .await
        };

        let primary_failure = match primary {
            AttemptResult::Success(artifact, attempts) => {
                return Ok(self
                    .finish(artifact, request, first, attempts, 0, content_hash, started)
                    .await);
            }
            AttemptResult::Failure(failure) => failure,
        };

        // 4. fallback
        tracing::info!(
            content_hash = %content_hash,
            from = %first,
            to = %second,
            "Primary provider exhausted, falling back"
        );

        match self.attempt_provider(second, request, content_hash, 1).await {
            AttemptResult::Success(artifact, attempts) => Ok(self
                .finish(
                    artifact,
                    request,
                    first,
                    primary_failure.attempts,
                    attempts,
                    content_hash,
                    started,
                )
                .await),
            AttemptResult::Failure(secondary_failure) => {
                tracing::error!(
                    content_hash = %content_hash,
                    primary = %primary_failure,
                    secondary = %secondary_failure,
                    "All TTS providers failed"
                );
                let attempts = primary_failure.attempts + secondary_failure.attempts;
                let error = SynthesisError::Exhausted {
                    primary: primary_failure,
                    secondary: secondary_failure,
                };
                self.record(GenerationRecord {
                    content_hash: content_hash.to_string(),
                    provider: second,
                    fallback_triggered: true,
                    outcome: GenerationOutcome::Failed,
                    execution_time_ms: elapsed_ms(started),
                    audio_duration_ms: None,
                    text_length: request.text.chars().count(),
                    retry_count: attempts.saturating_sub(1),
                    error_message: Some(error.to_string()),
                    recorded_at: Utc::now(),
                });
                Err(error)
            }
        }
    }

    /// 5. 写缓存、记录统计并组装来源信息
    #[allow(clippy::too_many_arguments)]
    async fn finish(
        &self,
        artifact: AudioArtifact,
        request: &SynthesisRequest,
        first: ProviderId,
        primary_attempts: u32,
        secondary_attempts: u32,
        content_hash: &str,
        started: Instant,
    ) -> SynthesisOutcome {
        if let Err(e) = self.cache.put(content_hash, artifact.clone()).await {
            tracing::warn!(content_hash = %content_hash, error = %e, "Failed to cache synthesized audio");
        }

        let provenance = TtsProvenance {
            provider: artifact.provider,
            fallback_used: artifact.provider != first,
            cache_hit: false,
            attempts: primary_attempts + secondary_attempts,
            primary_attempts,
            latency_ms: elapsed_ms(started),
        };

        tracing::info!(
            content_hash = %content_hash,
            provider = %provenance.provider,
            fallback_used = provenance.fallback_used,
            attempts = provenance.attempts,
            latency_ms = provenance.latency_ms,
            audio_size = artifact.audio_data.len(),
            "Synthesis completed"
        );

        self.record(GenerationRecord {
            content_hash: content_hash.to_string(),
            provider: provenance.provider,
            fallback_triggered: provenance.fallback_used,
            outcome: if provenance.fallback_used {
                GenerationOutcome::FallbackSuccess
            } else {
                GenerationOutcome::Success
            },
            execution_time_ms: provenance.latency_ms,
            audio_duration_ms: artifact.estimated_duration_ms(),
            text_length: request.text.chars().count(),
            retry_count: provenance.attempts.saturating_sub(1),
            error_message: None,
            recorded_at: Utc::now(),
        });

        SynthesisOutcome {
            artifact,
            provenance,
        }
    }

    async fn attempt_provider(
        &self,
        provider_id: ProviderId,
        request: &SynthesisRequest,
        content_hash: &str,
        max_attempts: u32,
    ) -> AttemptResult {
        let provider = match self.providers.get(&provider_id) {
            Some(p) if p.is_configured() => p.clone(),
            _ => {
                let error = TtsError::Service(format!("{} is not configured", provider_id));
                self.health.record_failure(provider_id, &error.to_string());
                return AttemptResult::Failure(ProviderFailure {
                    provider: provider_id,
                    attempts: 0,
                    last_error: Some(error),
                    skipped: false,
                });
            }
        };

        let max_attempts = max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            tracing::debug!(provider = %provider_id, attempt, max_attempts, "Synthesis attempt");

            let result =
                match tokio::time::timeout(self.config.attempt_timeout, provider.synthesize(request))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(TtsError::Timeout(format!(
                        "attempt exceeded {}ms",
                        self.config.attempt_timeout.as_millis()
                    ))),
                };

            match result {
                Ok(audio) if !audio.audio_data.is_empty() => {
                    self.health.record_success(provider_id);
                    let artifact = AudioArtifact {
                        content_hash: content_hash.to_string(),
                        audio_data: audio.audio_data,
                        content_type: audio.content_type,
                        sample_rate: audio.sample_rate,
                        provider: provider_id,
                        created_at: Utc::now(),
                    };
                    return AttemptResult::Success(artifact, attempt);
                }
                Ok(_) => {
                    let error = TtsError::InvalidResponse("no audio data received".to_string());
                    self.on_attempt_failed(provider_id, attempt, &error);
                    last_error = Some(error);
                }
                Err(error) => {
                    self.on_attempt_failed(provider_id, attempt, &error);
                    last_error = Some(error);
                }
            }

            if attempt < max_attempts && !self.config.retry_delay.is_zero() {
                tokio::time::sleep(self.config.retry_delay).await;
            }
        }

        AttemptResult::Failure(ProviderFailure {
            provider: provider_id,
            attempts: max_attempts,
            last_error,
            skipped: false,
        })
    }

    fn record(&self, record: GenerationRecord) {
        if let Some(analytics) = &self.analytics {
            analytics.record(record);
        }
    }

    fn on_attempt_failed(&self, provider: ProviderId, attempt: u32, error: &TtsError) {
        tracing::warn!(
            provider = %provider,
            attempt,
            timeout = error.is_timeout(),
            error = %error,
            "Synthesis attempt failed"
        );
        self.health.record_failure(provider, &error.to_string());
    }

    fn should_skip(&self, provider: ProviderId) -> bool {
        if self.config.failure_threshold == 0 {
            return false;
        }
        let status = self.health.status(provider);
        if status.consecutive_failures < self.config.failure_threshold {
            return false;
        }
        let cooldown = chrono::Duration::from_std(self.config.cooldown)
            .unwrap_or_else(|_| chrono::Duration::zero());
        status
            .last_failure_at
            .map(|at| Utc::now() - at < cooldown)
            .unwrap_or(false)
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
