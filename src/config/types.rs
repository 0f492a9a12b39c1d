//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::application::TtsAdapterConfig;
use crate::domain::synthesis::ProviderId;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// TTS 配置
    #[serde(default)]
    pub tts: TtsConfig,

    /// 合成缓存配置
    #[serde(default)]
    pub cache: CacheConfig,

    /// 视频流水线配置
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// 存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 公开访问的 Base URL（videoUrl 与渲染服务下载音频使用）
    /// 如果未设置，则使用 http://{host}:{port}
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_url: None,
        }
    }
}

impl ServerConfig {
    /// 获取公开的 Base URL
    pub fn public_base_url(&self) -> String {
        self.base_url
            .as_deref()
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| {
                let host = if self.host == "0.0.0.0" {
                    "localhost"
                } else {
                    &self.host
                };
                format!("http://{}:{}", host, self.port)
            })
    }
}

/// TTS 配置
#[derive(Debug, Clone, Deserialize)]
pub struct TtsConfig {
    /// 默认首选提供方
    #[serde(default = "default_provider")]
    pub default_provider: ProviderId,

    /// 首选提供方最大尝试次数（含首次）
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// 重试间隔（毫秒）
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// 建立连接超时（毫秒）
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// 流式空闲超时（毫秒）
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    /// 单次尝试总时限（毫秒）
    #[serde(default = "default_attempt_timeout_ms")]
    pub attempt_timeout_ms: u64,

    /// 最大输入字符数
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,

    /// 连续失败达到该值后跳过首选提供方，0 表示关闭
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// 跳过状态的持续时间（秒）
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,

    /// 合成统计保留的最大记录数，0 表示关闭
    #[serde(default = "default_analytics_capacity")]
    pub analytics_capacity: usize,

    #[serde(default)]
    pub vibevoice: VibeVoiceConfig,

    #[serde(default)]
    pub elevenlabs: ElevenLabsConfig,
}

fn default_provider() -> ProviderId {
    ProviderId::VibeVoice
}

fn default_max_attempts() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_idle_timeout_ms() -> u64 {
    30_000
}

fn default_attempt_timeout_ms() -> u64 {
    90_000
}

fn default_max_input_chars() -> usize {
    3000
}

fn default_failure_threshold() -> u32 {
    3
}

fn default_cooldown_secs() -> u64 {
    60
}

fn default_analytics_capacity() -> usize {
    10_000
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
            attempt_timeout_ms: default_attempt_timeout_ms(),
            max_input_chars: default_max_input_chars(),
            failure_threshold: default_failure_threshold(),
            cooldown_secs: default_cooldown_secs(),
            analytics_capacity: default_analytics_capacity(),
            vibevoice: VibeVoiceConfig::default(),
            elevenlabs: ElevenLabsConfig::default(),
        }
    }
}

impl TtsConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }

    /// 转换为 TtsAdapter 配置
    pub fn adapter_config(&self) -> TtsAdapterConfig {
        TtsAdapterConfig {
            default_provider: self.default_provider,
            max_attempts: self.max_attempts,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            attempt_timeout: self.attempt_timeout(),
            max_input_chars: self.max_input_chars,
            failure_threshold: self.failure_threshold,
            cooldown: Duration::from_secs(self.cooldown_secs),
        }
    }
}

/// VibeVoice（流式主提供方）配置
#[derive(Debug, Clone, Deserialize)]
pub struct VibeVoiceConfig {
    /// WebSocket 端点，为空表示未配置
    #[serde(default = "default_vibevoice_url")]
    pub url: String,

    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    #[serde(default = "default_voice")]
    pub voice: String,
}

fn default_vibevoice_url() -> String {
    "ws://localhost:8765/stream".to_string()
}

fn default_sample_rate() -> u32 {
    24000
}

fn default_voice() -> String {
    "default".to_string()
}

impl Default for VibeVoiceConfig {
    fn default() -> Self {
        Self {
            url: default_vibevoice_url(),
            sample_rate: default_sample_rate(),
            voice: default_voice(),
        }
    }
}

/// ElevenLabs（请求/响应备用提供方）配置
#[derive(Debug, Clone, Deserialize)]
pub struct ElevenLabsConfig {
    #[serde(default = "default_elevenlabs_url")]
    pub url: String,

    /// 为空表示未配置
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_voice")]
    pub voice: String,
}

fn default_elevenlabs_url() -> String {
    "https://api.elevenlabs.io".to_string()
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self {
            url: default_elevenlabs_url(),
            api_key: String::new(),
            voice: default_voice(),
        }
    }
}

/// 缓存后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Memory,
    Sled,
}

/// 合成缓存配置
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,

    /// sled 数据库路径
    #[serde(default = "default_cache_path")]
    pub path: String,

    /// 条目有效期（秒），0 表示永不过期
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

fn default_cache_path() -> String {
    "data/tts_cache.sled".to_string()
}

fn default_cache_ttl() -> u64 {
    168 * 3600 // 7 天
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            path: default_cache_path(),
            ttl_secs: default_cache_ttl(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Option<Duration> {
        (self.ttl_secs > 0).then(|| Duration::from_secs(self.ttl_secs))
    }
}

/// 视频流水线配置
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// 所有外部服务替换为本地假实现
    #[serde(default)]
    pub mock_mode: bool,

    /// 最大并发任务数
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// 任务队列容量
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// 渲染服务 URL
    #[serde(default = "default_renderer_url")]
    pub renderer_url: String,

    /// 渲染超时（秒）
    #[serde(default = "default_render_timeout")]
    pub render_timeout_secs: u64,
}

fn default_max_concurrent() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    1000
}

fn default_renderer_url() -> String {
    "http://localhost:9000".to_string()
}

fn default_render_timeout() -> u64 {
    600
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mock_mode: false,
            max_concurrent: default_max_concurrent(),
            queue_capacity: default_queue_capacity(),
            renderer_url: default_renderer_url(),
            render_timeout_secs: default_render_timeout(),
        }
    }
}

/// 存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// 音频与视频存储目录，通过 /media 对外提供
    #[serde(default = "default_media_dir")]
    pub media_dir: PathBuf,
}

fn default_media_dir() -> PathBuf {
    PathBuf::from("data/media")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            media_dir: default_media_dir(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.tts.default_provider, ProviderId::VibeVoice);
        assert_eq!(config.tts.max_input_chars, 3000);
        assert_eq!(config.tts.analytics_capacity, 10_000);
        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert!(!config.pipeline.mock_mode);
    }

    #[test]
    fn test_public_base_url() {
        let mut config = ServerConfig::default();
        assert_eq!(config.public_base_url(), "http://localhost:8080");

        config.base_url = Some("https://cast.example.com/".to_string());
        assert_eq!(config.public_base_url(), "https://cast.example.com");
    }

    #[test]
    fn test_adapter_config() {
        let mut config = TtsConfig::default();
        config.default_provider = ProviderId::ElevenLabs;
        config.retry_delay_ms = 250;

        let adapter = config.adapter_config();
        assert_eq!(adapter.default_provider, ProviderId::ElevenLabs);
        assert_eq!(adapter.retry_delay, Duration::from_millis(250));
        assert_eq!(adapter.max_attempts, 2);
    }

    #[test]
    fn test_cache_ttl_zero_disables_expiry() {
        let mut config = CacheConfig::default();
        assert_eq!(config.ttl(), Some(Duration::from_secs(168 * 3600)));
        config.ttl_secs = 0;
        assert!(config.ttl().is_none());
    }
}
