//! Scriptcast - 脚本生成数字人视频
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Job Context: 视频任务生命周期
//! - Synthesis Context: 语音合成请求与来源
//!
//! 应用层 (application/):
//! - Ports: 端口定义（JobManager, TtsProvider, SynthesisCache, ProviderHealth, Pipeline）
//! - Services: TtsAdapter 主备切换、缓存与单飞合成
//! - Commands / Queries: CQRS 处理器
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API + WebSocket
//! - Memory: JobManager, ProviderHealth, SynthesisCache 内存实现
//! - Worker: VideoWorker 后台流水线
//! - Persistence: Sled 合成缓存
//! - Adapters: TTS 客户端、润色、渲染、对象存储
//! - Events: WebSocket 事件发布

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
