//! Kinetype turns a short script (or a transcribed voice clip) into an animated typography video.
//!
//! The pipeline is:
//!
//! - Parse word markup into [`StyledToken`]s
//! - Schedule them on a [`Timeline`] (timestamped, paged or ambient)
//! - Lay each page out with shrink-to-fit and derive a pure [`FrameState`] per frame
//! - Paint frames with [`CpuPainter`] and record them through an [`ExportSession`]
#![forbid(unsafe_code)]

mod foundation;

pub(crate) mod animation;
pub(crate) mod assets;
pub(crate) mod capture;
/// Script generation and transcription seams.
pub mod collab;
/// Render request document.
pub mod config;
pub(crate) mod layout;
pub(crate) mod markup;
pub(crate) mod render;
pub(crate) mod timeline;

pub use crate::foundation::core::{Affine, Canvas, Fps, Rgba8};
pub use crate::foundation::error::{KineError, KineResult};

pub use crate::animation::ease::Ease;
pub use crate::assets::background::{BackgroundAsset, BackgroundFrame, PreparedImage};
pub use crate::assets::color::parse_color;
pub use crate::assets::font::{FixedAdvanceMeasurer, LoadedFont, ParleyMeasurer, TextMeasurer};
pub use crate::assets::media::{AudioTrack, decode_audio_track};
pub use crate::capture::clock::RenderClock;
pub use crate::capture::ffmpeg::{FfmpegRecorder, FfmpegRecorderFactory, write_artifact};
pub use crate::capture::recorder::{
    EncodingProfile, InMemoryRecorder, InMemoryRecorderFactory, Recorder, RecorderConfig,
    RecorderFactory, RecorderLog, select_recorder,
};
pub use crate::capture::session::{
    Artifact, CaptureState, ExportObserver, ExportSession, PreviewSession, progress_percent,
};
pub use crate::collab::{ScriptInput, Transcript, Transcriber, TranscriptFile, resolve_script};
pub use crate::config::RenderRequest;
pub use crate::layout::engine::{FontConfig, Line, Page, PositionedWord, layout};
pub use crate::markup::script::{ensure_emphasis, parse_script};
pub use crate::markup::token::{Effect, Span, StyledToken, parse_token};
pub use crate::render::backend::{FramePainter, FrameRGBA};
pub use crate::render::cpu::CpuPainter;
pub use crate::render::frame::{FrameState, FrameStyle, GlyphVisual, WordVisual, frame_state};
pub use crate::render::theme::Theme;
pub use crate::timeline::builder::{TimelineMode, build_timeline};
pub use crate::timeline::model::{PageLookup, TimedWord, Timeline, TimelinePage, TranscriptSegment};
