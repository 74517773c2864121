use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::foundation::core::{Fps, Rgba8};
use crate::foundation::error::{KineError, KineResult};
use crate::render::backend::FrameRGBA;

/// Output encodings, most capable first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncodingProfile {
    Vp9Alpha,
    Vp8Alpha,
    Vp9,
    Vp8,
    H264,
}

impl EncodingProfile {
    /// Preference order used when picking a recorder.
    pub const PREFERENCE: [Self; 5] = [
        Self::Vp9Alpha,
        Self::Vp8Alpha,
        Self::Vp9,
        Self::Vp8,
        Self::H264,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Vp9Alpha => "vp9-alpha",
            Self::Vp8Alpha => "vp8-alpha",
            Self::Vp9 => "vp9",
            Self::Vp8 => "vp8",
            Self::H264 => "h264",
        }
    }

    pub fn supports_alpha(self) -> bool {
        matches!(self, Self::Vp9Alpha | Self::Vp8Alpha)
    }

    /// ffmpeg encoder name.
    pub fn codec(self) -> &'static str {
        match self {
            Self::Vp9Alpha | Self::Vp9 => "libvpx-vp9",
            Self::Vp8Alpha | Self::Vp8 => "libvpx",
            Self::H264 => "libx264",
        }
    }

    pub fn pix_fmt(self) -> &'static str {
        if self.supports_alpha() {
            "yuva420p"
        } else {
            "yuv420p"
        }
    }

    /// ffmpeg muxer name.
    pub fn container(self) -> &'static str {
        match self {
            Self::H264 => "mp4",
            _ => "webm",
        }
    }

    /// Audio codec paired with this container.
    pub fn audio_codec(self) -> &'static str {
        match self {
            Self::H264 => "aac",
            _ => "libopus",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Vp9Alpha | Self::Vp9 => "video/webm;codecs=vp9",
            Self::Vp8Alpha | Self::Vp8 => "video/webm;codecs=vp8",
            Self::H264 => "video/mp4;codecs=avc1",
        }
    }

    pub fn file_extension(self) -> &'static str {
        self.container()
    }

    /// Candidate profiles in preference order. Transparent output only accepts alpha profiles.
    pub fn candidates(transparent: bool) -> impl Iterator<Item = Self> {
        Self::PREFERENCE
            .into_iter()
            .filter(move |p| !transparent || p.supports_alpha())
    }
}

impl std::fmt::Display for EncodingProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Parameters for one recorder instance.
#[derive(Clone, Debug)]
pub struct RecorderConfig {
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
    pub profile: EncodingProfile,
    /// Audio file muxed into the output, if any.
    pub audio: Option<PathBuf>,
    /// Color that non-alpha profiles flatten transparency onto.
    pub matte: Rgba8,
}

/// Accumulates encoded output for one capture session.
///
/// Chunks are append-only until [`Recorder::stop`] returns them.
pub trait Recorder {
    /// Push one frame in presentation order.
    fn push_frame(&mut self, frame: &FrameRGBA) -> KineResult<()>;
    /// Finish encoding and hand back every recorded chunk. Called at most once.
    fn stop(&mut self) -> KineResult<Vec<Vec<u8>>>;
}

/// Creates recorders and reports which encodings are available.
pub trait RecorderFactory {
    /// Fail when no capture method is available at all.
    fn probe(&self) -> KineResult<()> {
        Ok(())
    }
    fn is_supported(&self, profile: EncodingProfile) -> bool;
    fn create(&self, cfg: &RecorderConfig) -> KineResult<Box<dyn Recorder>>;
}

/// Pick the first supported encoding and construct its recorder.
///
/// Construction failures fall through to the next candidate.
pub fn select_recorder(
    factory: &dyn RecorderFactory,
    base: &RecorderConfig,
    transparent: bool,
) -> KineResult<(EncodingProfile, Box<dyn Recorder>)> {
    factory.probe()?;
    let mut last_err = None;
    for profile in EncodingProfile::candidates(transparent) {
        if !factory.is_supported(profile) {
            continue;
        }
        let cfg = RecorderConfig {
            profile,
            ..base.clone()
        };
        match factory.create(&cfg) {
            Ok(rec) => {
                tracing::info!(profile = %profile, "recorder created");
                return Ok((profile, rec));
            }
            Err(e) => {
                tracing::warn!(profile = %profile, error = %e, "recorder construction failed; trying next encoding");
                last_err = Some(e);
            }
        }
    }
    let what = if transparent {
        "no supported alpha-capable recording encoding"
    } else {
        "no supported recording encoding"
    };
    Err(match last_err {
        Some(e) => KineError::capture(format!("{what}: {}", e.user_message())),
        None => KineError::capture(what),
    })
}

/// What an [`InMemoryRecorder`] has seen; shared with the factory that created it.
#[derive(Debug, Default)]
pub struct RecorderLog {
    pub profile: Option<EncodingProfile>,
    pub frames: Vec<FrameRGBA>,
    pub stopped: u32,
}

/// Recorder that keeps frames in memory; for tests and headless previews.
#[derive(Debug)]
pub struct InMemoryRecorder {
    log: Arc<Mutex<RecorderLog>>,
    emit_bytes: bool,
}

impl Recorder for InMemoryRecorder {
    fn push_frame(&mut self, frame: &FrameRGBA) -> KineResult<()> {
        let mut log = self
            .log
            .lock()
            .map_err(|_| KineError::capture("recorder log poisoned"))?;
        log.frames.push(frame.clone());
        Ok(())
    }

    fn stop(&mut self) -> KineResult<Vec<Vec<u8>>> {
        let mut log = self
            .log
            .lock()
            .map_err(|_| KineError::capture("recorder log poisoned"))?;
        log.stopped += 1;
        if !self.emit_bytes {
            return Ok(Vec::new());
        }
        Ok(log.frames.iter().map(|f| f.data.clone()).collect())
    }
}

/// Factory for [`InMemoryRecorder`] with configurable capabilities.
#[derive(Debug, Clone)]
pub struct InMemoryRecorderFactory {
    pub supported: Vec<EncodingProfile>,
    /// Profiles whose construction fails even though they are reported supported.
    pub broken: Vec<EncodingProfile>,
    /// When `false`, `stop` yields no chunks (an empty artifact).
    pub emit_bytes: bool,
    pub log: Arc<Mutex<RecorderLog>>,
}

impl Default for InMemoryRecorderFactory {
    fn default() -> Self {
        Self {
            supported: EncodingProfile::PREFERENCE.to_vec(),
            broken: Vec::new(),
            emit_bytes: true,
            log: Arc::new(Mutex::new(RecorderLog::default())),
        }
    }
}

impl InMemoryRecorderFactory {
    pub fn with_supported(supported: impl Into<Vec<EncodingProfile>>) -> Self {
        Self {
            supported: supported.into(),
            ..Self::default()
        }
    }
}

impl RecorderFactory for InMemoryRecorderFactory {
    fn is_supported(&self, profile: EncodingProfile) -> bool {
        self.supported.contains(&profile)
    }

    fn create(&self, cfg: &RecorderConfig) -> KineResult<Box<dyn Recorder>> {
        if self.broken.contains(&cfg.profile) {
            return Err(KineError::capture(format!(
                "{} recorder failed to start",
                cfg.profile
            )));
        }
        let mut log = self
            .log
            .lock()
            .map_err(|_| KineError::capture("recorder log poisoned"))?;
        *log = RecorderLog {
            profile: Some(cfg.profile),
            ..RecorderLog::default()
        };
        Ok(Box::new(InMemoryRecorder {
            log: Arc::clone(&self.log),
            emit_bytes: self.emit_bytes,
        }))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/recorder.rs"]
mod tests;
