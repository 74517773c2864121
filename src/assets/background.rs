//! Owned background resources.
//!
//! A background is acquired once at session setup and released on teardown. Load failures never
//! propagate: the asset degrades to the theme's solid color and the failure is logged.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use crate::assets::color::parse_color;
use crate::assets::media::{VideoSourceInfo, decode_video_frames_rgba8, probe_video};
use crate::config::BackgroundDesc;
use crate::foundation::core::{Affine, Canvas, Rgba8};
use crate::foundation::error::KineResult;

const VIDEO_BATCH_FRAMES: u32 = 30;

/// Decoded premultiplied RGBA8 raster.
#[derive(Clone, Debug)]
pub struct PreparedImage {
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Arc<Vec<u8>>,
}

pub fn decode_image(bytes: &[u8]) -> KineResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(prepared_from_straight(width, height, rgba.into_raw()))
}

fn prepared_from_straight(width: u32, height: u32, mut rgba8: Vec<u8>) -> PreparedImage {
    premultiply_rgba8_in_place(&mut rgba8);
    PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8),
    }
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

/// What to paint under the words for one frame.
#[derive(Clone, Debug)]
pub enum BackgroundFrame {
    /// Fill the canvas with a color.
    Solid(Rgba8),
    /// Clear the canvas to transparent.
    Clear,
    /// Draw a raster scaled to cover the canvas.
    Raster(PreparedImage),
}

struct VideoFrames {
    info: VideoSourceInfo,
    batch_start: u64,
    batch: Vec<PreparedImage>,
}

impl VideoFrames {
    fn frame_at(&mut self, elapsed_ms: f64) -> KineResult<PreparedImage> {
        let idx = self.info.looped_frame_index(elapsed_ms);
        let cached = idx
            .checked_sub(self.batch_start)
            .and_then(|off| self.batch.get(off as usize));
        if let Some(img) = cached {
            return Ok(img.clone());
        }

        let raw = decode_video_frames_rgba8(&self.info, idx, VIDEO_BATCH_FRAMES)?;
        self.batch = raw
            .into_iter()
            .map(|f| prepared_from_straight(self.info.width, self.info.height, f))
            .collect();
        self.batch_start = idx;
        self.batch.first().cloned().ok_or_else(|| {
            crate::foundation::error::KineError::asset(format!(
                "no video frame decoded at index {idx}"
            ))
        })
    }
}

enum Source {
    Solid(Rgba8),
    Transparent,
    Image(PreparedImage),
    Video(Box<VideoFrames>),
}

/// Session-owned background handle.
pub struct BackgroundAsset {
    source: Source,
    fallback: Rgba8,
    loaded: bool,
}

impl std::fmt::Debug for BackgroundAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.source {
            Source::Solid(_) => "solid",
            Source::Transparent => "transparent",
            Source::Image(_) => "image",
            Source::Video(_) => "video",
        };
        f.debug_struct("BackgroundAsset")
            .field("kind", &kind)
            .field("loaded", &self.loaded)
            .field("dimensions", &self.dimensions())
            .finish()
    }
}

impl BackgroundAsset {
    /// Acquire the background described by `desc`; `fallback` is the theme background color.
    ///
    /// Image and video sources are decoded/probed synchronously. Any failure is logged and the
    /// asset becomes a solid `fallback` fill.
    pub fn load(desc: &BackgroundDesc, fallback: Rgba8) -> Self {
        let source = match desc {
            BackgroundDesc::Solid { color } => Source::Solid(
                color
                    .as_deref()
                    .and_then(|c| {
                        let parsed = parse_color(c);
                        if parsed.is_none() {
                            tracing::warn!(color = c, "unrecognized background color; using theme background");
                        }
                        parsed
                    })
                    .unwrap_or(fallback),
            ),
            BackgroundDesc::Transparent => Source::Transparent,
            BackgroundDesc::Image { source } => match load_image(source) {
                Ok(img) => Source::Image(img),
                Err(e) => {
                    tracing::warn!(path = %source.display(), error = %e, "background image failed to load; using solid fallback");
                    Source::Solid(fallback)
                }
            },
            BackgroundDesc::Video { source } => match probe_video(source) {
                Ok(info) => Source::Video(Box::new(VideoFrames {
                    info,
                    batch_start: 0,
                    batch: Vec::new(),
                })),
                Err(e) => {
                    tracing::warn!(path = %source.display(), error = %e, "background video failed to load; using solid fallback");
                    Source::Solid(fallback)
                }
            },
        };
        Self {
            source,
            fallback,
            loaded: true,
        }
    }

    /// Readiness gate: rendering must not begin until this is `true`.
    pub fn is_ready(&self) -> bool {
        self.loaded
    }

    /// Source pixel dimensions for raster backgrounds.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match &self.source {
            Source::Image(img) => Some((img.width, img.height)),
            Source::Video(v) => Some((v.info.width, v.info.height)),
            Source::Solid(_) | Source::Transparent => None,
        }
    }

    /// `true` when the background leaves the canvas transparent.
    pub fn is_transparent(&self) -> bool {
        matches!(self.source, Source::Transparent)
    }

    /// Frame source for `elapsed_ms`. Video decode failures degrade to the solid fallback.
    pub fn frame_at(&mut self, elapsed_ms: f64) -> BackgroundFrame {
        match &mut self.source {
            Source::Solid(c) => BackgroundFrame::Solid(*c),
            Source::Transparent => BackgroundFrame::Clear,
            Source::Image(img) => BackgroundFrame::Raster(img.clone()),
            Source::Video(v) => match v.frame_at(elapsed_ms) {
                Ok(img) => BackgroundFrame::Raster(img),
                Err(e) => {
                    tracing::warn!(error = %e, "background video frame unavailable; switching to solid fallback");
                    self.source = Source::Solid(self.fallback);
                    BackgroundFrame::Solid(self.fallback)
                }
            },
        }
    }

    /// Drop decoded pixels. The handle stays usable only as "not ready".
    pub fn release(&mut self) {
        if !self.loaded {
            return;
        }
        tracing::debug!("releasing background asset");
        self.source = Source::Solid(self.fallback);
        self.loaded = false;
    }
}

impl Drop for BackgroundAsset {
    fn drop(&mut self) {
        self.release();
    }
}

fn load_image(path: &Path) -> KineResult<PreparedImage> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("read background image '{}'", path.display()))?;
    decode_image(&bytes)
}

/// Transform that scales a `src_w`×`src_h` raster to cover `canvas`, preserving aspect ratio and
/// centering the overflow.
pub fn cover_transform(src_w: u32, src_h: u32, canvas: Canvas) -> Affine {
    if src_w == 0 || src_h == 0 {
        return Affine::IDENTITY;
    }
    let sw = f64::from(src_w);
    let sh = f64::from(src_h);
    let scale = (canvas.w() / sw).max(canvas.h() / sh);
    let tx = (canvas.w() - sw * scale) / 2.0;
    let ty = (canvas.h() - sh * scale) / 2.0;
    Affine::translate((tx, ty)) * Affine::scale(scale)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/background.rs"]
mod tests;
