//! Command Handlers 实现
//!
//! 所有 CommandHandler 的具体实现

mod admin_handlers;
mod video_handlers;

pub use admin_handlers::*;
pub use video_handlers::*;
