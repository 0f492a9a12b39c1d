//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod pipeline;
pub mod storage;
pub mod tts;

pub use pipeline::*;
pub use storage::*;
pub use tts::*;
