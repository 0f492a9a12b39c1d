//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, CacheBackend};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// # 环境变量示例
/// - `SCRIPTCAST_SERVER__PORT=8080`
/// - `SCRIPTCAST_TTS__DEFAULT_PROVIDER=elevenlabs`
/// - `SCRIPTCAST_TTS__ELEVENLABS__API_KEY=...`
/// - `SCRIPTCAST_CACHE__BACKEND=sled`
/// - `SCRIPTCAST_PIPELINE__MOCK_MODE=true`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080)?
        .set_default("tts.default_provider", "vibevoice")?
        .set_default("tts.max_attempts", 2)?
        .set_default("tts.retry_delay_ms", 500)?
        .set_default("tts.connect_timeout_ms", 10_000)?
        .set_default("tts.idle_timeout_ms", 30_000)?
        .set_default("tts.attempt_timeout_ms", 90_000)?
        .set_default("tts.max_input_chars", 3000)?
        .set_default("tts.failure_threshold", 3)?
        .set_default("tts.cooldown_secs", 60)?
        .set_default("tts.analytics_capacity", 10_000)?
        .set_default("cache.backend", "memory")?
        .set_default("cache.path", "data/tts_cache.sled")?
        .set_default("cache.ttl_secs", 168 * 3600)?
        .set_default("pipeline.mock_mode", false)?
        .set_default("pipeline.max_concurrent", 4)?
        .set_default("pipeline.queue_capacity", 1000)?
        .set_default("storage.media_dir", "data/media")?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 前缀 SCRIPTCAST_，层级分隔符 __ (双下划线)
    builder = builder.add_source(
        Environment::with_prefix("SCRIPTCAST")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.tts.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "tts.max_attempts must be at least 1".to_string(),
        ));
    }

    if config.tts.max_input_chars == 0 {
        return Err(ConfigError::ValidationError(
            "tts.max_input_chars cannot be 0".to_string(),
        ));
    }

    if config.pipeline.max_concurrent == 0 || config.pipeline.queue_capacity == 0 {
        return Err(ConfigError::ValidationError(
            "pipeline.max_concurrent and pipeline.queue_capacity must be at least 1".to_string(),
        ));
    }

    if config.cache.backend == CacheBackend::Sled && config.cache.path.is_empty() {
        return Err(ConfigError::ValidationError(
            "cache.path cannot be empty when cache.backend is sled".to_string(),
        ));
    }

    if !config.pipeline.mock_mode && config.pipeline.renderer_url.is_empty() {
        return Err(ConfigError::ValidationError(
            "pipeline.renderer_url is required unless mock_mode is enabled".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("Public Base URL: {}", config.server.public_base_url());
    tracing::info!("Mock Mode: {}", config.pipeline.mock_mode);
    tracing::info!("TTS Default Provider: {}", config.tts.default_provider);
    tracing::info!("TTS VibeVoice URL: {}", config.tts.vibevoice.url);
    tracing::info!("TTS ElevenLabs URL: {}", config.tts.elevenlabs.url);
    tracing::info!(
        "TTS ElevenLabs Key: {}",
        if config.tts.elevenlabs.api_key.is_empty() { "<unset>" } else { "<set>" }
    );
    tracing::info!(
        "TTS Retry: {} attempts, {}ms delay",
        config.tts.max_attempts,
        config.tts.retry_delay_ms
    );
    tracing::info!("TTS Analytics Capacity: {}", config.tts.analytics_capacity);
    tracing::info!("Cache Backend: {:?}", config.cache.backend);
    if config.cache.backend == CacheBackend::Sled {
        tracing::info!("Cache Path: {}", config.cache.path);
    }
    tracing::info!("Renderer URL: {}", config.pipeline.renderer_url);
    tracing::info!("Max Concurrent Jobs: {}", config.pipeline.max_concurrent);
    tracing::info!("Media Directory: {:?}", config.storage.media_dir);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
