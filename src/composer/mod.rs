//! Narration and visual composition: narration + visuals → MP4
//!
//! Speech is attempted first; when it fails a silent track of estimated
//! length stands in and the task carries on. Encoding failures are fatal.

pub mod silence;
pub mod speech;
pub mod video;
pub mod voices;

pub use speech::{EdgeTtsSynthesizer, NoOpSpeechSynthesizer, SpeechSynthesizer};
pub use video::{EncodePlan, FfmpegEncoder, NoOpVideoEncoder, VideoEncoder};

use crate::config::{SpeechConfig, VideoConfig};
use crate::error::{ComposeError, Error, Result};
use crate::storage::StorageLayout;
use crate::types::{Outcome, TaskId};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of the compose stage
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedVideo {
    /// Encoded MP4
    pub video_path: PathBuf,
    /// Voice id used
    pub voice: String,
    /// True when the audio track is generated silence
    pub audio_fallback: bool,
    /// Visuals placed in the video, in order
    pub visuals_used: Vec<PathBuf>,
    /// Audio (and video) duration in seconds, when known before encoding
    pub duration_secs: Option<f64>,
    /// Real or degraded audio
    pub outcome: Outcome,
}

/// Turns narration and visuals into a video
pub struct Composer {
    speech: Arc<dyn SpeechSynthesizer>,
    encoder: Arc<dyn VideoEncoder>,
    storage: StorageLayout,
    speech_config: SpeechConfig,
    video_config: VideoConfig,
}

impl Composer {
    /// Create a composer around the selected adapters
    pub fn new(
        speech: Arc<dyn SpeechSynthesizer>,
        encoder: Arc<dyn VideoEncoder>,
        storage: StorageLayout,
        speech_config: SpeechConfig,
        video_config: VideoConfig,
    ) -> Self {
        Self {
            speech,
            encoder,
            storage,
            speech_config,
            video_config,
        }
    }

    /// The active speech synthesizer
    pub fn speech(&self) -> &Arc<dyn SpeechSynthesizer> {
        &self.speech
    }

    /// The active video encoder
    pub fn encoder(&self) -> &Arc<dyn VideoEncoder> {
        &self.encoder
    }

    /// Compose the video for task `id`
    pub async fn compose(
        &self,
        id: TaskId,
        narration: &str,
        images: &[PathBuf],
        screenshots: &[PathBuf],
        voice: Option<&str>,
    ) -> Result<ComposedVideo> {
        let voice = voice
            .map(str::to_string)
            .unwrap_or_else(|| voices::default_voice(narration, &self.speech_config).to_string());

        let speech_path = self.storage.speech_path(id);
        if let Some(parent) = speech_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let (audio, duration_secs, outcome) = match self
            .speech
            .synthesize(narration, &voice, &speech_path)
            .await
        {
            Ok(()) => {
                let duration = match self.encoder.probe_duration(&speech_path).await {
                    Ok(d) => Some(d),
                    Err(e) => {
                        warn!(task_id = %id, error = %e, "could not read speech duration, encoding until the audio ends");
                        None
                    }
                };
                debug!(task_id = %id, voice = %voice, duration = ?duration, "speech synthesized");
                (speech_path, duration, Outcome::Real)
            }
            Err(e) => {
                warn!(task_id = %id, voice = %voice, error = %e, "speech synthesis failed, using silent track");
                let duration = silence::fallback_duration(narration, &self.speech_config);
                let path = self.write_fallback_audio(id, duration).await?;
                (path, Some(duration), Outcome::degraded(format!("speech synthesis failed: {e}")))
            }
        };
        let audio_fallback = outcome.is_degraded();

        let visuals_used = if images.is_empty() {
            screenshots.to_vec()
        } else {
            images.to_vec()
        };

        let output = self.storage.video_path(id);
        let plan = EncodePlan {
            audio,
            duration_secs,
            visuals: visuals_used.clone(),
            output: output.clone(),
            width: self.video_config.width,
            height: self.video_config.height,
            fps: self.video_config.fps,
            placeholder_color: self.video_config.placeholder_color.clone(),
            video_codec: self.video_config.video_codec.clone(),
            audio_codec: self.video_config.audio_codec.clone(),
        };

        self.encoder.encode(&plan).await.map_err(|e| {
            Error::Compose(ComposeError::EncodeFailed {
                reason: e.to_string(),
            })
        })?;

        if !tokio::fs::try_exists(&output).await.unwrap_or(false) {
            return Err(Error::Compose(ComposeError::OutputMissing { path: output }));
        }

        info!(
            task_id = %id,
            visuals = visuals_used.len(),
            duration = ?duration_secs,
            audio_fallback,
            encoder = self.encoder.name(),
            "video composed"
        );

        Ok(ComposedVideo {
            video_path: output,
            voice,
            audio_fallback,
            visuals_used,
            duration_secs,
            outcome,
        })
    }

    /// Synthesize a voice sample, reusing a cached file when one exists
    pub async fn preview(&self, voice: &str, text: Option<&str>) -> Result<PathBuf> {
        let voice = voice.trim();
        if voice.is_empty() {
            return Err(Error::InvalidRequest("voice must not be empty".into()));
        }
        let text = text
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(self.speech_config.preview_text.as_str());

        let path = self.storage.preview_path(voice, &text_digest(text));
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            debug!(voice, path = %path.display(), "voice preview served from cache");
            return Ok(path);
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let partial = path.with_extension("mp3.part");
        if let Err(e) = self.speech.synthesize(text, voice, &partial).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e);
        }
        tokio::fs::rename(&partial, &path).await?;

        info!(voice, path = %path.display(), "voice preview generated");
        Ok(path)
    }

    async fn write_fallback_audio(&self, id: TaskId, duration: f64) -> Result<PathBuf> {
        let path = self.storage.fallback_audio_path(id);
        let sample_rate = self.speech_config.sample_rate;
        let target = path.clone();

        tokio::task::spawn_blocking(move || silence::write_silence_wav(&target, duration, sample_rate))
            .await
            .map_err(|e| ComposeError::AudioUnavailable {
                reason: format!("silent track writer panicked: {e}"),
            })?
            .map_err(|e| ComposeError::AudioUnavailable {
                reason: format!("failed to write {}: {e}", path.display()),
            })?;

        Ok(path)
    }
}

/// Short hex digest identifying preview text
fn text_digest(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    hex::encode(&digest[..8])
}

/// Whether `path` is a non-empty regular file
pub async fn is_nonempty_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::video::build_ffmpeg_args;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Writes fixed bytes, or fails when `fail` is set
    struct StubSpeech {
        fail: bool,
        calls: AtomicUsize,
    }

    impl StubSpeech {
        fn new(fail: bool) -> Self {
            Self {
                fail,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SpeechSynthesizer for StubSpeech {
        async fn synthesize(&self, _text: &str, _voice: &str, output: &Path) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::ExternalTool("tts offline".into()));
            }
            tokio::fs::write(output, b"ID3fake").await?;
            Ok(())
        }

        fn is_available(&self) -> bool {
            !self.fail
        }

        fn name(&self) -> &'static str {
            "stub"
        }
    }

    /// Records plans and writes an empty-but-present MP4
    #[derive(Default)]
    struct RecordingEncoder {
        plans: Mutex<Vec<EncodePlan>>,
        fail: bool,
        skip_output: bool,
        no_probe: bool,
    }

    #[async_trait]
    impl VideoEncoder for RecordingEncoder {
        async fn probe_duration(&self, _audio: &Path) -> Result<f64> {
            if self.no_probe {
                return Err(Error::NotSupported("no ffprobe".into()));
            }
            Ok(42.5)
        }

        async fn encode(&self, plan: &EncodePlan) -> Result<()> {
            self.plans.lock().unwrap().push(plan.clone());
            if self.fail {
                return Err(Error::ExternalTool("ffmpeg exploded".into()));
            }
            if !self.skip_output {
                tokio::fs::create_dir_all(plan.output.parent().unwrap()).await?;
                tokio::fs::write(&plan.output, b"mp4").await?;
            }
            Ok(())
        }

        fn is_available(&self) -> bool {
            true
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    fn composer(
        temp: &TempDir,
        speech: Arc<dyn SpeechSynthesizer>,
        encoder: Arc<dyn VideoEncoder>,
    ) -> Composer {
        Composer::new(
            speech,
            encoder,
            StorageLayout::new(temp.path()),
            SpeechConfig::default(),
            VideoConfig::default(),
        )
    }

    #[tokio::test]
    async fn speech_success_uses_measured_duration_and_images() {
        let temp = TempDir::new().unwrap();
        let encoder = Arc::new(RecordingEncoder::default());
        let composer = composer(&temp, Arc::new(StubSpeech::new(false)), encoder.clone());
        let id = TaskId::new();
        let images = vec![PathBuf::from("a.jpg"), PathBuf::from("b.jpg")];
        let screenshots = vec![PathBuf::from("s.png")];

        let video = composer
            .compose(id, "Hello world", &images, &screenshots, None)
            .await
            .unwrap();

        assert!(!video.audio_fallback);
        assert_eq!(video.outcome, Outcome::Real);
        assert_eq!(video.voice, "en-US-AriaNeural");
        assert_eq!(video.duration_secs, Some(42.5));
        assert_eq!(video.visuals_used, images);
        assert_eq!(video.video_path, temp.path().join(format!("videos/{id}.mp4")));

        let plans = encoder.plans.lock().unwrap();
        assert_eq!(plans[0].audio, temp.path().join(format!("temp/{id}.mp3")));
        assert_eq!(plans[0].segment_secs(), 21.25);
        assert!(!build_ffmpeg_args(&plans[0]).contains(&"-shortest".to_string()));
    }

    #[tokio::test]
    async fn speech_failure_writes_silent_track_of_estimated_length() {
        let temp = TempDir::new().unwrap();
        let encoder = Arc::new(RecordingEncoder::default());
        let composer = composer(&temp, Arc::new(StubSpeech::new(true)), encoder.clone());
        let id = TaskId::new();
        let narration = "字".repeat(280);

        let video = composer
            .compose(id, &narration, &[], &[PathBuf::from("s.png")], None)
            .await
            .unwrap();

        assert!(video.audio_fallback);
        assert!(video.outcome.is_degraded());
        assert_eq!(video.voice, "zh-CN-XiaoxiaoNeural");
        assert_eq!(video.duration_secs, Some(20.0));
        assert_eq!(video.visuals_used, vec![PathBuf::from("s.png")]);

        let wav = temp.path().join(format!("temp/{id}.wav"));
        let reader = hound::WavReader::open(&wav).unwrap();
        assert_eq!(reader.duration(), 20 * reader.spec().sample_rate);

        let plans = encoder.plans.lock().unwrap();
        assert_eq!(plans[0].audio, wav);
        assert_eq!(plans[0].duration_secs, Some(20.0));
    }

    #[tokio::test]
    async fn unknown_speech_length_is_never_cut_to_the_estimate() {
        let temp = TempDir::new().unwrap();
        let encoder = Arc::new(RecordingEncoder {
            no_probe: true,
            ..Default::default()
        });
        let composer = composer(&temp, Arc::new(StubSpeech::new(false)), encoder.clone());
        let narration = "A long narration sentence. ".repeat(300);

        let video = composer
            .compose(TaskId::new(), &narration, &[PathBuf::from("a.jpg")], &[], None)
            .await
            .unwrap();

        assert!(!video.audio_fallback);
        assert_eq!(video.duration_secs, None);

        let plans = encoder.plans.lock().unwrap();
        assert_eq!(plans[0].duration_secs, None);
        let args = build_ffmpeg_args(&plans[0]);
        assert!(args.contains(&"-shortest".to_string()));
        let estimate = format!("{:.3}", silence::fallback_duration(&narration, &SpeechConfig::default()));
        assert!(!args.windows(2).any(|w| w[0] == "-t" && w[1] == estimate));
    }

    #[tokio::test]
    async fn no_visuals_means_placeholder_plan() {
        let temp = TempDir::new().unwrap();
        let encoder = Arc::new(RecordingEncoder::default());
        let composer = composer(&temp, Arc::new(StubSpeech::new(false)), encoder.clone());

        let video = composer
            .compose(TaskId::new(), "text", &[], &[], Some("en-GB-SoniaNeural"))
            .await
            .unwrap();

        assert!(video.visuals_used.is_empty());
        assert_eq!(video.voice, "en-GB-SoniaNeural");
        let plans = encoder.plans.lock().unwrap();
        assert!(plans[0].visuals.is_empty());
        assert_eq!(plans[0].placeholder_color, "0f172a");
    }

    #[tokio::test]
    async fn encode_failure_is_fatal() {
        let temp = TempDir::new().unwrap();
        let encoder = Arc::new(RecordingEncoder {
            fail: true,
            ..Default::default()
        });
        let composer = composer(&temp, Arc::new(StubSpeech::new(false)), encoder);

        let err = composer
            .compose(TaskId::new(), "text", &[], &[], None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Compose(ComposeError::EncodeFailed { .. })));
    }

    #[tokio::test]
    async fn missing_output_is_reported() {
        let temp = TempDir::new().unwrap();
        let encoder = Arc::new(RecordingEncoder {
            skip_output: true,
            ..Default::default()
        });
        let composer = composer(&temp, Arc::new(StubSpeech::new(false)), encoder);

        let err = composer
            .compose(TaskId::new(), "text", &[], &[], None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Compose(ComposeError::OutputMissing { .. })));
    }

    #[tokio::test]
    async fn preview_is_cached_per_voice_and_text() {
        let temp = TempDir::new().unwrap();
        let speech = Arc::new(StubSpeech::new(false));
        let composer = composer(&temp, speech.clone(), Arc::new(RecordingEncoder::default()));

        let first = composer.preview("en-US-GuyNeural", Some("Hi there")).await.unwrap();
        let again = composer.preview("en-US-GuyNeural", Some("Hi there")).await.unwrap();
        let other = composer.preview("en-US-GuyNeural", None).await.unwrap();

        assert_eq!(first, again);
        assert_ne!(first, other);
        assert!(first.starts_with(temp.path().join("temp")));
        assert!(is_nonempty_file(&first).await);
        assert_eq!(speech.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn preview_failure_propagates_and_leaves_no_file() {
        let temp = TempDir::new().unwrap();
        let composer = composer(
            &temp,
            Arc::new(StubSpeech::new(true)),
            Arc::new(RecordingEncoder::default()),
        );

        let err = composer.preview("en-US-GuyNeural", None).await.unwrap_err();
        assert!(matches!(err, Error::ExternalTool(_)));
        assert!(composer.preview("  ", None).await.is_err());

        let leftovers: Vec<_> = std::fs::read_dir(temp.path().join("temp"))
            .unwrap()
            .collect();
        assert!(leftovers.is_empty());
    }
}
