//! Export and preview sessions.
//!
//! An [`ExportSession`] walks `Idle -> Setup -> Recording -> Stopping -> Done`, with `Error`
//! reachable from every active state. A [`PreviewSession`] shares the same staging but loops and
//! never records.

use std::path::Path;

use crate::assets::background::BackgroundAsset;
use crate::assets::font::{LoadedFont, ParleyMeasurer, TextMeasurer};
use crate::assets::media::decode_audio_track;
use crate::capture::clock::RenderClock;
use crate::capture::recorder::{EncodingProfile, Recorder, RecorderConfig, RecorderFactory, select_recorder};
use crate::collab::ScriptInput;
use crate::config::RenderRequest;
use crate::foundation::core::Canvas;
use crate::foundation::error::{KineError, KineResult};
use crate::layout::engine::{FontConfig, Page, layout};
use crate::render::backend::{FramePainter, FrameRGBA};
use crate::render::cpu::CpuPainter;
use crate::render::frame::{FrameStyle, frame_state};
use crate::render::theme::Theme;
use crate::timeline::builder::{TimelineMode, build_timeline};
use crate::timeline::model::Timeline;

/// Export lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CaptureState {
    Idle,
    Setup,
    Recording,
    Stopping,
    Done,
    Error,
}

/// Finished recording.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    /// Container bytes (all recorded chunks, concatenated).
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub profile: EncodingProfile,
}

impl Artifact {
    /// File extension matching the container.
    pub fn file_extension(&self) -> &'static str {
        self.profile.file_extension()
    }
}

/// Receives export notifications.
///
/// A session calls exactly one of `on_complete` and `on_error`, exactly once.
pub trait ExportObserver {
    /// Progress percentage in `0..=100`, non-decreasing.
    fn on_progress(&mut self, _percent: u8) {}
    fn on_complete(&mut self, artifact: &Artifact);
    fn on_error(&mut self, message: &str);
}

/// Load the font named by `request` (required for the CPU painter).
fn load_request_font(request: &RenderRequest) -> KineResult<LoadedFont> {
    let path = request
        .font_path
        .as_deref()
        .ok_or_else(|| KineError::input("font_path is required to render"))?;
    LoadedFont::from_path(path)
}

/// Decode `path` for the audio clock.
///
/// Without usable audio, offline exports fall back to the frame clock and previews to the wall
/// clock.
fn audio_clock(
    path: Option<&Path>,
    request: &RenderRequest,
    offline: bool,
) -> (RenderClock, Option<f64>) {
    let fallback = || {
        if offline {
            RenderClock::frame(request.fps)
        } else {
            RenderClock::wall(request.fps)
        }
    };
    let Some(path) = path else {
        return (fallback(), None);
    };
    match decode_audio_track(path) {
        Ok(track) => {
            tracing::info!(
                path = %path.display(),
                duration_ms = track.duration_ms(),
                "audio clock selected"
            );
            (
                RenderClock::audio(track.sample_rate, request.fps),
                Some(track.duration_ms()),
            )
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, offline, "audio decode failed; using fallback clock");
            (fallback(), None)
        }
    }
}

/// Everything derived once per session: timeline, page layouts, background and style.
struct Stage {
    timeline: Timeline,
    pages: Vec<Page>,
    background: BackgroundAsset,
    style: FrameStyle,
}

impl Stage {
    fn build(
        request: &RenderRequest,
        script: &ScriptInput,
        measurer: &mut dyn TextMeasurer,
        audio_ms: Option<f64>,
        preview: bool,
    ) -> KineResult<Self> {
        let canvas = Canvas::new(request.resolution.width, request.resolution.height)?;
        let theme = Theme::preset(request.theme);

        let mode = TimelineMode::select(&script.segments, script.tokens.len(), audio_ms, preview);
        let timeline = build_timeline(&script.tokens, &mode, preview)?;

        let font = FontConfig {
            size_class: request.font_size,
            family: request.font_family,
        };
        let pages = timeline
            .pages
            .iter()
            .map(|p| layout(&p.words, canvas, font, measurer))
            .collect();

        let background = BackgroundAsset::load(&request.background, theme.background);

        Ok(Self {
            timeline,
            pages,
            background,
            style: FrameStyle {
                animation: request.animation,
                text_style: request.text_style,
                theme,
                font_weight: request.font_weight,
                fps: request.fps,
                seed: request.seed,
            },
        })
    }

    fn render(&mut self, painter: &mut dyn FramePainter, elapsed_ms: f64) -> KineResult<FrameRGBA> {
        if !self.background.is_ready() {
            return Err(KineError::capture("background is not ready"));
        }
        let local = self.timeline.local_elapsed(elapsed_ms);
        let idx = self
            .timeline
            .page_index_at(local)
            .ok_or_else(|| KineError::input("timeline has no pages"))?;
        let state = frame_state(&self.pages[idx], local, &self.style);
        let background = self.background.frame_at(local);
        painter.paint(&background, &state)
    }
}

/// Progress percentage for `elapsed_ms` out of `total_ms`.
pub fn progress_percent(elapsed_ms: f64, total_ms: f64) -> u8 {
    if total_ms <= 0.0 {
        return 100;
    }
    (100.0 * elapsed_ms / total_ms).round().clamp(0.0, 100.0) as u8
}

/// One export run, driven frame by frame.
pub struct ExportSession {
    request: RenderRequest,
    script: ScriptInput,
    painter: Box<dyn FramePainter>,
    measurer: Box<dyn TextMeasurer>,
    factory: Box<dyn RecorderFactory>,
    observer: Option<Box<dyn ExportObserver>>,
    clock_override: Option<RenderClock>,

    state: CaptureState,
    stage: Option<Stage>,
    clock: Option<RenderClock>,
    recorder: Option<Box<dyn Recorder>>,
    profile: Option<EncodingProfile>,
    last_progress: Option<u8>,
    frames_pushed: u64,
    artifact: Option<Artifact>,
    error: Option<String>,
}

impl ExportSession {
    /// Rejects an empty script before the session leaves `Idle`.
    pub fn new(
        request: RenderRequest,
        script: ScriptInput,
        painter: Box<dyn FramePainter>,
        measurer: Box<dyn TextMeasurer>,
        factory: Box<dyn RecorderFactory>,
    ) -> KineResult<Self> {
        if script.tokens.is_empty() {
            return Err(KineError::input("script is empty"));
        }
        Ok(Self {
            request,
            script,
            painter,
            measurer,
            factory,
            observer: None,
            clock_override: None,
            state: CaptureState::Idle,
            stage: None,
            clock: None,
            recorder: None,
            profile: None,
            last_progress: None,
            frames_pushed: 0,
            artifact: None,
            error: None,
        })
    }

    /// Build a session that paints with [`CpuPainter`] and measures with Parley.
    pub fn from_request(
        request: RenderRequest,
        script: ScriptInput,
        factory: Box<dyn RecorderFactory>,
    ) -> KineResult<Self> {
        request.validate()?;
        let font = load_request_font(&request)?;
        let painter = CpuPainter::new(request.canvas(), &font)?;
        let measurer = ParleyMeasurer::new(&font)?;
        Self::new(
            request,
            script,
            Box::new(painter),
            Box::new(measurer),
            factory,
        )
    }

    /// Use `clock` instead of the one setup would pick.
    pub fn with_clock(mut self, clock: RenderClock) -> Self {
        self.clock_override = Some(clock);
        self
    }

    pub fn with_observer(mut self, observer: Box<dyn ExportObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Encoding chosen during setup.
    pub fn profile(&self) -> Option<EncodingProfile> {
        self.profile
    }

    pub fn timeline(&self) -> Option<&Timeline> {
        self.stage.as_ref().map(|s| &s.timeline)
    }

    pub fn frames_pushed(&self) -> u64 {
        self.frames_pushed
    }

    /// Message of the failure that moved the session to `Error`.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn take_artifact(&mut self) -> Option<Artifact> {
        self.artifact.take()
    }

    fn transition(&mut self, to: CaptureState) {
        tracing::debug!(from = ?self.state, to = ?to, "export state");
        self.state = to;
    }

    /// Run setup and enter `Recording`.
    ///
    /// Only valid from `Idle`. A setup failure moves the session to `Error` and is returned.
    #[tracing::instrument(skip(self))]
    pub fn start(&mut self) -> KineResult<()> {
        if self.state != CaptureState::Idle {
            return Err(KineError::validation(format!(
                "cannot start an export session in state {:?}",
                self.state
            )));
        }
        self.transition(CaptureState::Setup);
        match self.setup() {
            Ok(()) => {
                self.transition(CaptureState::Recording);
                Ok(())
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    fn setup(&mut self) -> KineResult<()> {
        let (clock, audio_ms) = audio_clock(self.request.audio.as_deref(), &self.request, true);
        let audio = audio_ms.and(self.request.audio.clone());
        let mut clock = self.clock_override.take().unwrap_or(clock);

        let stage = Stage::build(
            &self.request,
            &self.script,
            self.measurer.as_mut(),
            audio_ms,
            false,
        )?;
        let transparent = stage.background.is_transparent();

        let base = RecorderConfig {
            width: self.request.resolution.width,
            height: self.request.resolution.height,
            fps: self.request.fps,
            // Replaced per candidate by `select_recorder`.
            profile: EncodingProfile::H264,
            audio,
            matte: stage.style.theme.background,
        };
        let (profile, recorder) = select_recorder(self.factory.as_ref(), &base, transparent)?;

        tracing::info!(
            profile = %profile,
            total_ms = stage.timeline.total_ms,
            pages = stage.pages.len(),
            audio_clock = clock.is_audio(),
            "export recording"
        );
        // Setup time must not count against the first frame.
        clock.reset();
        self.profile = Some(profile);
        self.recorder = Some(recorder);
        self.clock = Some(clock);
        self.stage = Some(stage);
        self.last_progress = None;
        self.frames_pushed = 0;
        Ok(())
    }

    /// Advance by one frame. Returns the state after the tick.
    ///
    /// Outside `Recording` this is a no-op.
    pub fn tick(&mut self) -> KineResult<CaptureState> {
        if self.state != CaptureState::Recording {
            return Ok(self.state);
        }
        match self.record_frame() {
            Ok(()) => Ok(self.state),
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    fn record_frame(&mut self) -> KineResult<()> {
        let (Some(stage), Some(clock)) = (self.stage.as_mut(), self.clock.as_mut()) else {
            return Err(KineError::capture("recording without a prepared stage"));
        };
        let elapsed = clock.elapsed_ms();
        let total = stage.timeline.total_ms;

        let percent = progress_percent(elapsed, total);
        if self.last_progress.is_none_or(|p| percent > p) {
            self.last_progress = Some(percent);
            if let Some(obs) = self.observer.as_mut() {
                obs.on_progress(percent);
            }
        }

        if stage.timeline.is_finished(elapsed) {
            return self.finish();
        }

        let frame = stage.render(self.painter.as_mut(), elapsed)?;
        let recorder = self
            .recorder
            .as_mut()
            .ok_or_else(|| KineError::capture("recorder was released"))?;
        recorder.push_frame(&frame)?;
        self.frames_pushed += 1;
        clock.advance();
        Ok(())
    }

    /// Stop recording and assemble the artifact.
    ///
    /// Safe to call any number of times; only the first call from `Recording` does work.
    pub fn stop(&mut self) -> KineResult<()> {
        if self.state != CaptureState::Recording {
            return Ok(());
        }
        self.finish().inspect_err(|e| self.fail(e))
    }

    fn finish(&mut self) -> KineResult<()> {
        self.transition(CaptureState::Stopping);
        self.clock = None;
        let mut recorder = self
            .recorder
            .take()
            .ok_or_else(|| KineError::finalize("recorder was already released"))?;
        let chunks = recorder.stop()?;
        drop(recorder);

        let bytes = chunks.concat();
        if bytes.is_empty() {
            return Err(KineError::finalize("recording produced no data"));
        }
        let profile = self
            .profile
            .ok_or_else(|| KineError::finalize("no encoding was selected"))?;
        if let Some(stage) = self.stage.as_mut() {
            stage.background.release();
        }

        let artifact = Artifact {
            bytes,
            mime_type: profile.mime_type(),
            profile,
        };
        tracing::info!(
            bytes = artifact.bytes.len(),
            frames = self.frames_pushed,
            profile = %profile,
            "export complete"
        );
        if let Some(obs) = self.observer.as_mut() {
            obs.on_complete(&artifact);
        }
        self.artifact = Some(artifact);
        self.transition(CaptureState::Done);
        Ok(())
    }

    fn release(&mut self) {
        self.recorder = None;
        self.clock = None;
        if let Some(stage) = self.stage.as_mut() {
            stage.background.release();
        }
    }

    fn fail(&mut self, err: &KineError) {
        if self.state == CaptureState::Error {
            return;
        }
        let message = err.user_message();
        tracing::error!(state = ?self.state, error = %err, "export failed");
        self.release();
        self.transition(CaptureState::Error);
        if let Some(obs) = self.observer.as_mut() {
            obs.on_error(&message);
        }
        self.error = Some(message);
    }

    /// Cancel without notifying the observer and return to `Idle`.
    pub fn dispose(&mut self) {
        self.release();
        self.stage = None;
        self.profile = None;
        self.last_progress = None;
        self.transition(CaptureState::Idle);
    }

    /// Return from `Done` or `Error` to `Idle`, clearing the previous outcome.
    pub fn reset(&mut self) {
        if matches!(self.state, CaptureState::Done | CaptureState::Error) {
            self.dispose();
            self.artifact = None;
            self.error = None;
            self.frames_pushed = 0;
        }
    }

    /// Start (when idle) and tick until the session settles.
    pub fn run(&mut self) -> KineResult<Artifact> {
        if self.state == CaptureState::Idle {
            self.start()?;
        }
        while self.state == CaptureState::Recording {
            self.tick()?;
        }
        match self.state {
            CaptureState::Done => self
                .take_artifact()
                .ok_or_else(|| KineError::finalize("artifact was already taken")),
            CaptureState::Error => Err(KineError::capture(
                self.error.clone().unwrap_or_else(|| "export failed".to_owned()),
            )),
            other => Err(KineError::validation(format!(
                "export session ended in state {other:?}"
            ))),
        }
    }
}

/// Looping preview without a recorder.
pub struct PreviewSession {
    stage: Option<Stage>,
    clock: Option<RenderClock>,
    painter: Box<dyn FramePainter>,
}

impl PreviewSession {
    pub fn new(
        request: &RenderRequest,
        script: &ScriptInput,
        painter: Box<dyn FramePainter>,
        measurer: &mut dyn TextMeasurer,
    ) -> KineResult<Self> {
        let (clock, audio_ms) = audio_clock(request.audio.as_deref(), request, false);
        let stage = Stage::build(request, script, measurer, audio_ms, true)?;
        tracing::debug!(
            total_ms = stage.timeline.total_ms,
            audio_clock = clock.is_audio(),
            "preview ready"
        );
        Ok(Self {
            stage: Some(stage),
            clock: Some(clock),
            painter,
        })
    }

    pub fn from_request(request: &RenderRequest, script: &ScriptInput) -> KineResult<Self> {
        request.validate()?;
        let font = load_request_font(request)?;
        let painter = CpuPainter::new(request.canvas(), &font)?;
        let mut measurer = ParleyMeasurer::new(&font)?;
        Self::new(request, script, Box::new(painter), &mut measurer)
    }

    pub fn with_clock(mut self, clock: RenderClock) -> Self {
        if self.clock.is_some() {
            self.clock = Some(clock);
        }
        self
    }

    /// `true` while the preview holds a prepared stage with a ready background.
    pub fn is_ready(&self) -> bool {
        self.stage.as_ref().is_some_and(|s| s.background.is_ready())
    }

    pub fn timeline(&self) -> Option<&Timeline> {
        self.stage.as_ref().map(|s| &s.timeline)
    }

    /// Render the frame at the current clock position; `None` once disposed.
    pub fn frame(&mut self) -> KineResult<Option<FrameRGBA>> {
        let Some(elapsed) = self.clock.as_ref().map(RenderClock::elapsed_ms) else {
            return Ok(None);
        };
        self.frame_at(elapsed)
    }

    /// Render the frame at an explicit clock reading (wrapped onto the loop).
    pub fn frame_at(&mut self, elapsed_ms: f64) -> KineResult<Option<FrameRGBA>> {
        let Some(stage) = self.stage.as_mut() else {
            return Ok(None);
        };
        stage.render(self.painter.as_mut(), elapsed_ms).map(Some)
    }

    /// Move the clock one frame forward.
    pub fn advance(&mut self) {
        if let Some(clock) = self.clock.as_mut() {
            clock.advance();
        }
    }

    /// Stop the loop and release the clock and background. Idempotent.
    pub fn dispose(&mut self) {
        self.clock = None;
        if let Some(mut stage) = self.stage.take() {
            stage.background.release();
            tracing::debug!("preview disposed");
        }
    }
}

impl Drop for PreviewSession {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/session.rs"]
mod tests;
