//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod avatar_renderer;
mod job_manager;
mod object_store;
mod provider_health;
mod script_enhancer;
mod synthesis_cache;
mod tts_analytics;
mod tts_provider;

pub use avatar_renderer::{AvatarRendererPort, RenderError, RenderRequest, RenderedVideo};
pub use job_manager::{JobManagerError, JobManagerPort, JobStats};
pub use object_store::{ObjectStorePort, StorageError};
pub use provider_health::{ProviderHealthPort, ProviderHealthStatus};
pub use script_enhancer::{EnhanceError, ScriptEnhancerPort};
pub use synthesis_cache::{CacheError, CacheStats, SynthesisCachePort};
pub use tts_analytics::{
    GenerationOutcome, GenerationRecord, TtsAnalyticsPort, TtsAnalyticsStats,
};
pub use tts_provider::{SynthesizedAudio, TtsError, TtsProviderPort};
