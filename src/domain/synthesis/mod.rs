//! Synthesis Context - 语音合成限界上下文
//!
//! 职责:
//! - TTS 提供方标识（封闭集合）
//! - 合成请求规范化与内容哈希
//! - 合成结果及其来源信息

mod value_objects;

pub use value_objects::{AudioArtifact, ProviderId, SynthesisRequest, TtsProvenance};
