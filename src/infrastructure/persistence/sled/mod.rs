//! Sled - 嵌入式 KV 存储

mod synthesis_cache;

pub use synthesis_cache::{SledCacheConfig, SledSynthesisCache};
