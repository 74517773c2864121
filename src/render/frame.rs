//! Pure per-frame visual state.
//!
//! [`frame_state`] derives everything a painter needs from `(page, elapsed)`. Nothing is written
//! back to the layout, so calling it twice with the same inputs yields identical output.

use crate::animation::ease::{Ease, lerp};
use crate::assets::color::parse_color;
use crate::config::{AnimationVariant, TextStyleMode};
use crate::foundation::core::{Fps, Rgba8};
use crate::foundation::math::unit_hash;
use crate::layout::engine::{Page, PositionedWord};
use crate::markup::token::Effect;
use crate::render::theme::Theme;
use crate::timeline::builder::FADE_DURATION_MS;

/// FadeZoom starts at this scale.
pub const ZOOM_START_SCALE: f64 = 1.5;
/// DropIn starts this many pixels above the resting position.
pub const DROP_START_OFFSET_PX: f64 = -50.0;
/// Peak of the active-word bounce.
pub const BOUNCE_PEAK_SCALE: f64 = 1.15;
/// Fraction of the active window spent ramping up to the bounce peak.
pub const BOUNCE_RISE_FRACTION: f64 = 0.2;
/// Per-frame probability that a glitch character jumps.
pub const GLITCH_PROBABILITY: f64 = 0.1;
/// Glitch jump range as a fraction of the font size.
pub const GLITCH_JUMP_EM: f64 = 0.15;
pub const GLITCH_ALPHA: f32 = 0.5;
pub const PULSE_AMPLITUDE: f64 = 0.2;
pub const PULSE_PERIOD_MS: f64 = 800.0;
/// Phase shift between neighbouring characters of a pulsing span.
pub const PULSE_PHASE_STEP: f64 = 0.6;

/// Inputs that style every word the same way for a whole session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameStyle {
    pub animation: AnimationVariant,
    pub text_style: TextStyleMode,
    pub theme: Theme,
    pub font_weight: u16,
    /// Frame rate used to bucket pseudo-random effects per frame.
    pub fps: Fps,
    pub seed: u64,
}

/// One character as it should be painted.
#[derive(Clone, Debug, PartialEq)]
pub struct GlyphVisual {
    pub ch: char,
    /// Offset from the word origin, including any jitter.
    pub dx: f64,
    pub dy: f64,
    pub scale: f64,
    pub alpha: f32,
    pub color: Rgba8,
}

/// One visible word as it should be painted.
#[derive(Clone, Debug, PartialEq)]
pub struct WordVisual {
    pub x: f64,
    /// Resting y plus the entrance offset.
    pub y: f64,
    pub width: f64,
    pub alpha: f32,
    /// Entrance scale multiplied by the active bounce; applied around the word center.
    pub scale: f64,
    pub active: bool,
    pub glyphs: Vec<GlyphVisual>,
}

/// Everything painted for one frame, in draw order.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameState {
    pub elapsed_ms: f64,
    pub font_size_px: f64,
    pub line_height_px: f64,
    pub text_style: TextStyleMode,
    /// Weight at or above 600 adds a faux-bold stroke.
    pub faux_bold: bool,
    pub shadow: Rgba8,
    pub words: Vec<WordVisual>,
}

/// Scale overlay for a word that is currently being spoken.
///
/// Linear ramp to the peak over the first 20% of the window, then an eased return to 1.0.
pub fn bounce_scale(active_progress: f64) -> f64 {
    let a = active_progress.clamp(0.0, 1.0);
    let s = if a < BOUNCE_RISE_FRACTION {
        lerp(1.0, BOUNCE_PEAK_SCALE, a / BOUNCE_RISE_FRACTION)
    } else {
        let t = (a - BOUNCE_RISE_FRACTION) / (1.0 - BOUNCE_RISE_FRACTION);
        lerp(BOUNCE_PEAK_SCALE, 1.0, Ease::OutQuad.apply(t))
    };
    s.max(1.0)
}

/// Compute the visual state of `page` at `elapsed_ms`.
pub fn frame_state(page: &Page, elapsed_ms: f64, style: &FrameStyle) -> FrameState {
    let frame_bucket = style.fps.ms_to_frames_floor(elapsed_ms);
    let words = page
        .words()
        .enumerate()
        .filter_map(|(i, w)| word_visual(w, i, elapsed_ms, frame_bucket, page.font_size_px, style))
        .collect();

    FrameState {
        elapsed_ms,
        font_size_px: page.font_size_px,
        line_height_px: page.line_height_px,
        text_style: style.text_style,
        faux_bold: style.font_weight >= 600
            && matches!(style.text_style, TextStyleMode::Fill | TextStyleMode::ThreeD),
        shadow: style.theme.shadow,
        words,
    }
}

fn word_visual(
    placed: &PositionedWord,
    word_index: usize,
    elapsed_ms: f64,
    frame_bucket: u64,
    font_size: f64,
    style: &FrameStyle,
) -> Option<WordVisual> {
    let timed = &placed.word;
    let local = elapsed_ms - timed.absolute_start_ms;
    if local < 0.0 {
        return None;
    }

    let eased = Ease::OutCubic.apply(local / FADE_DURATION_MS);
    let (alpha, mut scale, offset_y) = match style.animation {
        AnimationVariant::Typewriter => (1.0, 1.0, 0.0),
        AnimationVariant::FadeZoom => (eased, lerp(ZOOM_START_SCALE, 1.0, eased), 0.0),
        AnimationVariant::DropIn => (eased, 1.0, lerp(DROP_START_OFFSET_PX, 0.0, eased)),
    };

    let active = timed.is_active_at(elapsed_ms);
    if active {
        scale *= bounce_scale(local / timed.active_duration_ms);
    }

    let token = &timed.token;
    let mut glyphs = Vec::with_capacity(placed.char_offsets.len());
    let mut char_index = 0usize;
    for span in &token.spans {
        let color = if active {
            style.theme.highlight
        } else if let Some(c) = span.color.as_deref().and_then(parse_color) {
            c
        } else if token.is_highlight {
            style.theme.accent
        } else {
            style.theme.base
        };

        for ch in span.text.chars() {
            let mut g = GlyphVisual {
                ch,
                dx: placed.char_offsets.get(char_index).copied().unwrap_or(0.0),
                dy: 0.0,
                scale: 1.0,
                alpha: 1.0,
                color,
            };
            let key = [word_index as u64, char_index as u64, frame_bucket];
            match span.effect {
                Some(Effect::Wiggle) => {
                    let amp = style.theme.wiggle_px;
                    g.dx += (unit_hash(style.seed, &[key[0], key[1], key[2], 0]) * 2.0 - 1.0) * amp;
                    g.dy += (unit_hash(style.seed, &[key[0], key[1], key[2], 1]) * 2.0 - 1.0) * amp;
                }
                Some(Effect::Glitch) => {
                    if unit_hash(style.seed, &[key[0], key[1], key[2], 2]) < GLITCH_PROBABILITY {
                        let jump = unit_hash(style.seed, &[key[0], key[1], key[2], 3]) * 2.0 - 1.0;
                        g.dx += jump * GLITCH_JUMP_EM * font_size;
                        g.alpha = GLITCH_ALPHA;
                    }
                }
                Some(Effect::Pulse) => {
                    let phase = std::f64::consts::TAU * local / PULSE_PERIOD_MS
                        - char_index as f64 * PULSE_PHASE_STEP;
                    g.scale = 1.0 + PULSE_AMPLITUDE * (0.5 + 0.5 * phase.sin());
                }
                None => {}
            }
            glyphs.push(g);
            char_index += 1;
        }
    }

    Some(WordVisual {
        x: placed.x,
        y: placed.y + offset_y,
        width: placed.width,
        alpha: alpha as f32,
        scale,
        active,
        glyphs,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;
