//! TTS Adapter - TTS 提供方客户端实现

mod fake_tts_client;
mod http_tts_client;
mod streaming_tts_client;
mod wav;

pub use fake_tts_client::{FakeTtsClient, FakeTtsClientConfig};
pub use http_tts_client::{HttpTtsClient, HttpTtsClientConfig};
pub use streaming_tts_client::{StreamingTtsClient, StreamingTtsClientConfig};
pub use wav::{encode_pcm16_wav, silent_wav};
