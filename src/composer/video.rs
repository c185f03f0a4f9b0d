//! Video encoding adapters

use crate::process;
use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Everything an encoder needs to produce one video
#[derive(Debug, Clone, PartialEq)]
pub struct EncodePlan {
    /// Audio track (speech MP3 or silent WAV)
    pub audio: PathBuf,
    /// Total duration in seconds (the audio duration); `None` encodes until
    /// the audio track ends
    pub duration_secs: Option<f64>,
    /// Visuals shown in order, each for an equal share; empty means a
    /// solid-colour placeholder
    pub visuals: Vec<PathBuf>,
    /// Output MP4
    pub output: PathBuf,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Frames per second
    pub fps: u32,
    /// Placeholder colour, RRGGBB
    pub placeholder_color: String,
    /// Video codec
    pub video_codec: String,
    /// Audio codec
    pub audio_codec: String,
}

/// Hold per visual when the audio length is unknown; the last visual then
/// stays on screen until the audio ends
pub const UNKNOWN_LENGTH_HOLD_SECS: f64 = 8.0;

impl EncodePlan {
    /// Seconds each visual is held
    pub fn segment_secs(&self) -> f64 {
        match self.duration_secs {
            Some(total) if self.visuals.is_empty() => total,
            Some(total) => total / self.visuals.len() as f64,
            None => UNKNOWN_LENGTH_HOLD_SECS,
        }
    }
}

/// Video encoder
#[async_trait]
pub trait VideoEncoder: Send + Sync {
    /// Duration of an audio file in seconds
    async fn probe_duration(&self, audio: &Path) -> crate::Result<f64>;

    /// Encode `plan.output`
    async fn encode(&self, plan: &EncodePlan) -> crate::Result<()>;

    /// Whether this implementation can do real work
    fn is_available(&self) -> bool;

    /// Implementation name (for logging and `/capabilities`)
    fn name(&self) -> &'static str;
}

/// Encoder driving `ffmpeg` (and `ffprobe` for durations)
pub struct FfmpegEncoder {
    ffmpeg: PathBuf,
    ffprobe: Option<PathBuf>,
    timeout: Duration,
}

impl FfmpegEncoder {
    /// Create an encoder with explicit binary paths
    pub fn new(ffmpeg: PathBuf, ffprobe: Option<PathBuf>, timeout: Duration) -> Self {
        Self {
            ffmpeg,
            ffprobe,
            timeout,
        }
    }
}

#[async_trait]
impl VideoEncoder for FfmpegEncoder {
    async fn probe_duration(&self, audio: &Path) -> crate::Result<f64> {
        let Some(ffprobe) = &self.ffprobe else {
            return Err(crate::Error::NotSupported(
                "Reading audio duration requires ffprobe".into(),
            ));
        };

        let args: [&OsStr; 7] = [
            OsStr::new("-v"),
            OsStr::new("error"),
            OsStr::new("-show_entries"),
            OsStr::new("format=duration"),
            OsStr::new("-of"),
            OsStr::new("default=noprint_wrappers=1:nokey=1"),
            audio.as_os_str(),
        ];
        let output = process::run(ffprobe, args, self.timeout).await?;

        parse_probe_duration(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
            crate::Error::ExternalTool(format!(
                "ffprobe returned no duration for {}",
                audio.display()
            ))
        })
    }

    async fn encode(&self, plan: &EncodePlan) -> crate::Result<()> {
        if let Some(parent) = plan.output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        process::run(&self.ffmpeg, build_ffmpeg_args(plan), self.timeout).await?;
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "ffmpeg"
    }
}

/// Parse ffprobe's bare `duration` output
pub fn parse_probe_duration(stdout: &str) -> Option<f64> {
    stdout
        .lines()
        .map(str::trim)
        .find_map(|l| l.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
}

/// Build the ffmpeg command line for `plan`
///
/// With visuals: each image is looped for its share, scaled to cover the frame,
/// centre-cropped, then all segments are concatenated and the audio attached.
/// Without visuals: a lavfi colour source covers the whole duration.
/// When the duration is unknown the output is bounded by the audio instead
/// (`-shortest`) and the last visual loops until then.
pub fn build_ffmpeg_args(plan: &EncodePlan) -> Vec<String> {
    let (w, h, fps) = (plan.width, plan.height, plan.fps);
    let total = plan.duration_secs.map(|d| format!("{d:.3}"));
    let mut args: Vec<String> = ["-y", "-hide_banner", "-loglevel", "error"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    if plan.visuals.is_empty() {
        args.extend([
            "-f".into(),
            "lavfi".into(),
            "-i".into(),
            match &total {
                Some(total) => format!(
                    "color=c=0x{}:s={w}x{h}:r={fps}:d={total}",
                    plan.placeholder_color
                ),
                None => format!("color=c=0x{}:s={w}x{h}:r={fps}", plan.placeholder_color),
            },
            "-i".into(),
            plan.audio.display().to_string(),
            "-map".into(),
            "0:v".into(),
            "-map".into(),
            "1:a".into(),
        ]);
    } else {
        let segment = format!("{:.3}", plan.segment_secs());
        let last = plan.visuals.len() - 1;
        for (i, visual) in plan.visuals.iter().enumerate() {
            args.extend(["-loop".into(), "1".into()]);
            if total.is_some() || i < last {
                args.extend(["-t".into(), segment.clone()]);
            }
            args.extend(["-i".into(), visual.display().to_string()]);
        }
        args.extend(["-i".into(), plan.audio.display().to_string()]);

        let n = plan.visuals.len();
        let mut filter = String::new();
        for i in 0..n {
            filter.push_str(&format!(
                "[{i}:v]scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h},setsar=1,fps={fps},format=yuv420p[v{i}];"
            ));
        }
        for i in 0..n {
            filter.push_str(&format!("[v{i}]"));
        }
        filter.push_str(&format!("concat=n={n}:v=1:a=0[vout]"));

        args.extend([
            "-filter_complex".into(),
            filter,
            "-map".into(),
            "[vout]".into(),
            "-map".into(),
            format!("{n}:a"),
        ]);
    }

    args.extend([
        "-c:v".into(),
        plan.video_codec.clone(),
        "-pix_fmt".into(),
        "yuv420p".into(),
        "-r".into(),
        fps.to_string(),
        "-c:a".into(),
        plan.audio_codec.clone(),
    ]);
    match total {
        Some(total) => args.extend(["-t".into(), total]),
        None => args.push("-shortest".into()),
    }
    args.extend([
        "-movflags".into(),
        "+faststart".into(),
        plan.output.display().to_string(),
    ]);
    args
}

/// Encoder used when ffmpeg is not available
pub struct NoOpVideoEncoder;

#[async_trait]
impl VideoEncoder for NoOpVideoEncoder {
    async fn probe_duration(&self, _audio: &Path) -> crate::Result<f64> {
        Err(crate::Error::NotSupported(
            "Reading audio duration requires ffprobe".into(),
        ))
    }

    async fn encode(&self, _plan: &EncodePlan) -> crate::Result<()> {
        Err(crate::Error::NotSupported(
            "Video encoding requires an external ffmpeg binary. \
             Configure tools.ffmpeg_path or ensure ffmpeg is in PATH."
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
