//! Memory Layer - In-Memory State Management
//!
//! 实现 JobManager、ProviderHealth、TTS 统计与内存版 SynthesisCache

mod job_manager;
mod provider_health;
mod synthesis_cache;
mod tts_analytics;

pub use job_manager::InMemoryJobManager;
pub use provider_health::{InMemoryProviderHealth, ProviderRecord};
pub use synthesis_cache::InMemorySynthesisCache;
pub use tts_analytics::InMemoryTtsAnalytics;
