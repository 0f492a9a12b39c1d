//! Application Services - 跨端口的编排逻辑

mod tts_adapter;

pub use tts_adapter::{
    ProviderFailure, SynthesisError, SynthesisOutcome, TtsAdapter, TtsAdapterConfig,
};
