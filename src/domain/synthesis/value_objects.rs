//! Synthesis Context - Value Objects

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// TTS 提供方
///
/// 已知提供方的封闭集合，未知名称在边界处被拒绝
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// 流式 WebSocket 合成（默认主提供方）
    VibeVoice,
    /// 请求/响应式 HTTP 合成（默认备用提供方）
    ElevenLabs,
}

impl ProviderId {
    pub const ALL: [ProviderId; 2] = [ProviderId::VibeVoice, ProviderId::ElevenLabs];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::VibeVoice => "vibevoice",
            ProviderId::ElevenLabs => "elevenlabs",
        }
    }

    /// 另一个提供方（用于 fallback）
    pub fn other(&self) -> ProviderId {
        match self {
            ProviderId::VibeVoice => ProviderId::ElevenLabs,
            ProviderId::ElevenLabs => ProviderId::VibeVoice,
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "vibevoice" => Ok(ProviderId::VibeVoice),
            "elevenlabs" => Ok(ProviderId::ElevenLabs),
            other => Err(format!(
                "Unknown TTS provider '{}'. Use \"vibevoice\" or \"elevenlabs\"",
                other
            )),
        }
    }
}

/// 合成请求
///
/// 规范化后的 (text, voice_profile, style, seed) 决定内容哈希
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice_profile: String,
    pub style: String,
    pub seed: Option<u64>,
}

impl SynthesisRequest {
    pub fn new(
        text: impl Into<String>,
        voice_profile: impl Into<String>,
        style: impl Into<String>,
        seed: Option<u64>,
    ) -> Self {
        Self {
            text: text.into(),
            voice_profile: voice_profile.into(),
            style: style.into(),
            seed,
        }
    }

    /// 规范化
    ///
    /// - text: 去除首尾空白，内部连续空白折叠为单个空格（保留大小写）
    /// - voice_profile / style: 去空白、小写，空值视为 "default"
    pub fn normalized(&self) -> Self {
        Self {
            text: self.text.split_whitespace().collect::<Vec<_>>().join(" "),
            voice_profile: normalize_param(&self.voice_profile),
            style: normalize_param(&self.style),
            seed: self.seed,
        }
    }

    /// 内容哈希（缓存 key）
    ///
    /// md5(规范化字段以 0x1F 分隔)
    pub fn content_hash(&self) -> String {
        let n = self.normalized();
        let seed = n
            .seed
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        let input = format!(
            "{}\u{1f}{}\u{1f}{}\u{1f}{}",
            n.text, n.voice_profile, n.style, seed
        );
        format!("{:x}", md5::compute(input.as_bytes()))
    }

    /// 规范化后的字符数
    pub fn char_count(&self) -> usize {
        self.normalized().text.chars().count()
    }
}

fn normalize_param(value: &str) -> String {
    let value = value.trim().to_lowercase();
    if value.is_empty() {
        "default".to_string()
    } else {
        value
    }
}

/// 合成产物（音频引用）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioArtifact {
    pub content_hash: String,
    pub audio_data: Vec<u8>,
    pub content_type: String,
    pub sample_rate: Option<u32>,
    pub provider: ProviderId,
    pub created_at: DateTime<Utc>,
}

impl AudioArtifact {
    pub fn size_bytes(&self) -> u64 {
        self.audio_data.len() as u64
    }

    /// 文件扩展名（对象存储 key 使用）
    pub fn extension(&self) -> &'static str {
        match self.content_type.as_str() {
            "audio/mpeg" => "mp3",
            _ => "wav",
        }
    }

    /// 估算时长（毫秒），仅对带采样率的 16-bit 单声道 WAV 有效
    pub fn estimated_duration_ms(&self) -> Option<u64> {
        const WAV_HEADER_LEN: usize = 44;

        if self.content_type != "audio/wav" {
            return None;
        }
        let sample_rate = u64::from(self.sample_rate.filter(|rate| *rate > 0)?);
        let samples = self.audio_data.len().checked_sub(WAV_HEADER_LEN)? as u64 / 2;
        Some(samples * 1000 / sample_rate)
    }
}

/// 合成来源信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TtsProvenance {
    /// 实际产出音频的提供方（缓存命中时为写入缓存的提供方）
    pub provider: ProviderId,
    pub fallback_used: bool,
    pub cache_hit: bool,
    /// 所有提供方的尝试总数
    pub attempts: u32,
    /// 首选提供方的尝试次数
    pub primary_attempts: u32,
    pub latency_ms: u64,
}
