//! Query Handlers 实现

mod job_handlers;
mod tts_handlers;

pub use job_handlers::*;
pub use tts_handlers::*;
