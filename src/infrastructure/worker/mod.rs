//! Worker - 后台任务处理

mod video_worker;

pub use video_worker::{PipelineContext, VideoWorker, VideoWorkerConfig};
