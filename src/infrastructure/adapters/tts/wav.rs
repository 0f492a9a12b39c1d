//! WAV 封装
//!
//! 流式提供方只返回裸 PCM，需要补上 RIFF 头

/// 将 16-bit little-endian 单声道 PCM 封装为 WAV
pub fn encode_pcm16_wav(pcm: &[u8], sample_rate: u32) -> Vec<u8> {
    let bits_per_sample: u16 = 16;
    let num_channels: u16 = 1;
    let byte_rate = sample_rate * num_channels as u32 * (bits_per_sample / 8) as u32;
    let block_align = num_channels * (bits_per_sample / 8);

    // 丢弃不完整的采样
    let data_size = pcm.len() - pcm.len() % 2;
    let file_size = 36 + data_size;

    let mut wav = Vec::with_capacity(44 + data_size);

    // RIFF header
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(file_size as u32).to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    // fmt chunk
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM format
    wav.extend_from_slice(&num_channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data chunk
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&(data_size as u32).to_le_bytes());
    wav.extend_from_slice(&pcm[..data_size]);

    wav
}

/// 生成指定时长的静音 WAV
pub fn silent_wav(sample_rate: u32, duration_ms: u64) -> Vec<u8> {
    let samples = sample_rate as u64 * duration_ms / 1000;
    encode_pcm16_wav(&vec![0u8; samples as usize * 2], sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let wav = encode_pcm16_wav(&[1, 0, 2, 0], 24000);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(u32::from_le_bytes(wav[24..28].try_into().unwrap()), 24000);
        assert_eq!(u32::from_le_bytes(wav[40..44].try_into().unwrap()), 4);
        assert_eq!(wav.len(), 48);
    }

    #[test]
    fn test_odd_trailing_byte_dropped() {
        let wav = encode_pcm16_wav(&[1, 0, 2], 16000);
        assert_eq!(wav.len(), 46);
    }

    #[test]
    fn test_silent_one_second() {
        let wav = silent_wav(24000, 1000);
        assert_eq!(wav.len(), 44 + 48000);
        assert!(wav[44..].iter().all(|b| *b == 0));
    }
}
