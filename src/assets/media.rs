use std::path::{Path, PathBuf};

use crate::foundation::error::{KineError, KineResult};

/// Sample rate audio tracks are decoded at; the audio clock counts in these samples.
pub const CLOCK_SAMPLE_RATE: u32 = 48_000;

/// Probed properties of a video file used as a background.
#[derive(Clone, Debug)]
pub struct VideoSourceInfo {
    pub source_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub fps_num: u32,
    pub fps_den: u32,
    pub duration_sec: f64,
}

impl VideoSourceInfo {
    pub fn source_fps(&self) -> f64 {
        if self.fps_den == 0 {
            0.0
        } else {
            f64::from(self.fps_num) / f64::from(self.fps_den)
        }
    }

    /// Source frame index shown at `elapsed_ms`, looping over the clip duration.
    pub fn looped_frame_index(&self, elapsed_ms: f64) -> u64 {
        let fps = self.source_fps();
        if fps <= 0.0 || self.duration_sec <= 0.0 {
            return 0;
        }
        let t = (elapsed_ms.max(0.0) / 1000.0) % self.duration_sec;
        (t * fps).floor() as u64
    }
}

/// Decoded audio track.
///
/// Only the sample count survives decoding; the file itself is re-read by the encoder when it
/// is muxed into the artifact.
#[derive(Clone, Debug)]
pub struct AudioTrack {
    pub source_path: PathBuf,
    pub sample_rate: u32,
    pub channels: u16,
    pub frames: u64,
}

impl AudioTrack {
    pub fn duration_ms(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        1000.0 * self.frames as f64 / f64::from(self.sample_rate)
    }
}

pub fn probe_video(source_path: &Path) -> KineResult<VideoSourceInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        r_frame_rate: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let out = std::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| KineError::asset(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(KineError::asset(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| KineError::asset(format!("ffprobe json parse failed: {e}")))?;
    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| KineError::asset("no video stream found"))?;
    let width = video_stream
        .width
        .ok_or_else(|| KineError::asset("missing video width from ffprobe"))?;
    let height = video_stream
        .height
        .ok_or_else(|| KineError::asset("missing video height from ffprobe"))?;

    let (fps_num, fps_den) = parse_ff_ratio(video_stream.r_frame_rate.as_deref().unwrap_or("0/1"))
        .ok_or_else(|| KineError::asset("invalid video r_frame_rate"))?;
    let duration_sec = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);

    Ok(VideoSourceInfo {
        source_path: source_path.to_path_buf(),
        width,
        height,
        fps_num,
        fps_den,
        duration_sec,
    })
}

/// Decode up to `frame_count` straight-alpha RGBA frames starting at `start_frame`.
pub(crate) fn decode_video_frames_rgba8(
    source: &VideoSourceInfo,
    start_frame: u64,
    frame_count: u32,
) -> KineResult<Vec<Vec<u8>>> {
    if frame_count == 0 {
        return Ok(Vec::new());
    }
    let fps = source.source_fps();
    let start_time_sec = if fps > 0.0 {
        start_frame as f64 / fps
    } else {
        0.0
    };

    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-ss", &format!("{start_time_sec:.9}")])
        .arg("-i")
        .arg(&source.source_path)
        .args([
            "-frames:v",
            &frame_count.to_string(),
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "pipe:1",
        ])
        .output()
        .map_err(|e| KineError::asset(format!("failed to run ffmpeg for video decode: {e}")))?;

    if !out.status.success() {
        return Err(KineError::asset(format!(
            "ffmpeg video decode failed for '{}': {}",
            source.source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let expected_len = source.width as usize * source.height as usize * 4;
    if expected_len == 0 {
        return Err(KineError::asset(
            "decoded video frame size is zero (invalid source dimensions)",
        ));
    }
    if out.stdout.len() < expected_len || !out.stdout.len().is_multiple_of(expected_len) {
        return Err(KineError::asset(format!(
            "decoded video batch has invalid size: got {} bytes, expected multiples of {expected_len}",
            out.stdout.len()
        )));
    }

    Ok(out
        .stdout
        .chunks_exact(expected_len)
        .take(frame_count as usize)
        .map(<[u8]>::to_vec)
        .collect())
}

/// Decode an audio file to learn its exact sample count at [`CLOCK_SAMPLE_RATE`].
pub fn decode_audio_track(path: &Path) -> KineResult<AudioTrack> {
    const CHANNELS: u16 = 2;

    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            &CHANNELS.to_string(),
            "-ar",
            &CLOCK_SAMPLE_RATE.to_string(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| KineError::asset(format!("failed to run ffmpeg for audio decode: {e}")))?;

    if !out.status.success() {
        return Err(KineError::asset(format!(
            "ffmpeg audio decode failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let frame_bytes = 4 * usize::from(CHANNELS);
    if !out.stdout.len().is_multiple_of(frame_bytes) {
        return Err(KineError::asset(
            "decoded audio byte length is not aligned to f32 sample frames",
        ));
    }
    let frames = (out.stdout.len() / frame_bytes) as u64;
    if frames == 0 {
        return Err(KineError::asset(format!(
            "audio file '{}' decoded to zero samples",
            path.display()
        )));
    }

    Ok(AudioTrack {
        source_path: path.to_path_buf(),
        sample_rate: CLOCK_SAMPLE_RATE,
        channels: CHANNELS,
        frames,
    })
}

fn parse_ff_ratio(s: &str) -> Option<(u32, u32)> {
    let mut parts = s.split('/');
    let a = parts.next()?.parse::<u32>().ok()?;
    let b = parts.next()?.parse::<u32>().ok()?;
    if b == 0 {
        return None;
    }
    Some((a, b))
}
