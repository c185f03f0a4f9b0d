//! Silent fallback audio track

use crate::config::SpeechConfig;
use std::path::Path;

/// Seconds of silence standing in for `narration`
///
/// `chars / chars_per_sec`, clamped to the configured bounds.
pub fn fallback_duration(narration: &str, config: &SpeechConfig) -> f64 {
    let chars = narration.chars().count() as f64;
    let estimate = chars / f64::from(config.fallback_chars_per_sec.max(1));
    estimate.clamp(
        f64::from(config.fallback_min_secs),
        f64::from(config.fallback_max_secs),
    )
}

/// Write a mono 16-bit PCM WAV of silence
///
/// Blocking; call through `spawn_blocking`.
pub fn write_silence_wav(path: &Path, duration_secs: f64, sample_rate: u32) -> hound::Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let frames = (duration_secs.max(0.0) * f64::from(sample_rate)).round() as u64;
    // RIFF sizes are u32; keep the data chunk and header under that
    if frames.saturating_mul(2) > u64::from(u32::MAX) - 44 {
        return Err(hound::Error::IoError(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{duration_secs}s of audio does not fit in a WAV file"),
        )));
    }

    let mut writer = hound::WavWriter::create(path, spec)?;
    for _ in 0..frames {
        writer.write_sample(0i16)?;
    }
    writer.finalize()
}
