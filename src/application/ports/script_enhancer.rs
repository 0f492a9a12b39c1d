//! Script Enhancer Port - 脚本润色

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Script enhancement failed: {0}")]
pub struct EnhanceError(pub String);

#[async_trait]
pub trait ScriptEnhancerPort: Send + Sync {
    async fn enhance(&self, script: &str) -> Result<String, EnhanceError>;
}
