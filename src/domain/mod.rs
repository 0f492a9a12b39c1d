//! Domain Layer - 领域层
//!
//! 包含两个限界上下文:
//! - Job Context: 视频生成任务的生命周期与状态机
//! - Synthesis Context: 语音合成请求、内容哈希与来源信息

pub mod job;
pub mod synthesis;
