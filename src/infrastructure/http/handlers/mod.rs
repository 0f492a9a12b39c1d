//! HTTP Handlers

mod jobs;
mod ping;
mod tts;
mod video;
mod websocket;

pub use jobs::*;
pub use ping::*;
pub use tts::*;
pub use video::{generate_video, video_status};
pub use websocket::*;
