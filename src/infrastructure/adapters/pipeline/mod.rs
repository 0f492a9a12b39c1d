//! Pipeline Adapters - 润色与渲染

mod avatar_renderer;
mod script_enhancer;

pub use avatar_renderer::{HttpAvatarRenderer, HttpAvatarRendererConfig, MockAvatarRenderer};
pub use script_enhancer::BasicScriptEnhancer;
