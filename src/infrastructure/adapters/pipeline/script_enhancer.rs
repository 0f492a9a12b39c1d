//! Basic Script Enhancer
//!
//! 本地润色：整理空白，保留段落

use async_trait::async_trait;

use crate::application::ports::{EnhanceError, ScriptEnhancerPort};

#[derive(Debug, Default)]
pub struct BasicScriptEnhancer;

impl BasicScriptEnhancer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ScriptEnhancerPort for BasicScriptEnhancer {
    async fn enhance(&self, script: &str) -> Result<String, EnhanceError> {
        let paragraphs: Vec<String> = script
            .split("\n\n")
            .map(|p| p.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|p| !p.is_empty())
            .collect();

        if paragraphs.is_empty() {
            return Err(EnhanceError("Script is empty after cleanup".to_string()));
        }

        Ok(paragraphs.join("\n\n"))
    }
}
