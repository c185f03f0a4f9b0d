//! Speech synthesis adapters

use crate::process;
use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Text-to-speech engine
///
/// Implementations write an audio file to `output`. Callers fall back to a
/// silent track when synthesis fails.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Speak `text` with `voice` into `output`
    async fn synthesize(&self, text: &str, voice: &str, output: &Path) -> crate::Result<()>;

    /// Whether this implementation can do real work
    fn is_available(&self) -> bool;

    /// Implementation name (for logging and `/capabilities`)
    fn name(&self) -> &'static str;
}

/// Synthesizer driving the `edge-tts` CLI
///
/// The text is handed over through a sidecar file next to `output` so that
/// long narrations never hit argument length limits.
pub struct EdgeTtsSynthesizer {
    binary_path: PathBuf,
    timeout: Duration,
}

impl EdgeTtsSynthesizer {
    /// Create a synthesizer with an explicit binary path
    pub fn new(binary_path: PathBuf, timeout: Duration) -> Self {
        Self {
            binary_path,
            timeout,
        }
    }

    /// Binary names tried on PATH
    pub const CANDIDATES: &'static [&'static str] = &["edge-tts"];
}

#[async_trait]
impl SpeechSynthesizer for EdgeTtsSynthesizer {
    async fn synthesize(&self, text: &str, voice: &str, output: &Path) -> crate::Result<()> {
        if text.trim().is_empty() {
            return Err(crate::Error::InvalidRequest("nothing to speak".into()));
        }

        let text_file = output.with_extension("txt");
        tokio::fs::write(&text_file, text).await?;

        let args: [&OsStr; 6] = [
            OsStr::new("--voice"),
            OsStr::new(voice),
            OsStr::new("--file"),
            text_file.as_os_str(),
            OsStr::new("--write-media"),
            output.as_os_str(),
        ];
        let result = process::run(&self.binary_path, args, self.timeout).await;

        let _ = tokio::fs::remove_file(&text_file).await;
        result?;

        match tokio::fs::metadata(output).await {
            Ok(meta) if meta.len() > 0 => Ok(()),
            _ => Err(crate::Error::ExternalTool(
                "edge-tts produced no audio".into(),
            )),
        }
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "edge-tts"
    }
}

/// Synthesizer used when no TTS engine is available
pub struct NoOpSpeechSynthesizer;

#[async_trait]
impl SpeechSynthesizer for NoOpSpeechSynthesizer {
    async fn synthesize(&self, _text: &str, _voice: &str, _output: &Path) -> crate::Result<()> {
        Err(crate::Error::NotSupported(
            "Speech synthesis requires the edge-tts CLI. \
             Configure tools.edge_tts_path or ensure edge-tts is in PATH."
                .into(),
        ))
    }

    fn is_available(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
