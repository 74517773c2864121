//! Greedy line wrapping with shrink-to-fit.
//!
//! A page layout is computed once and never mutated; per-frame animation reads it but does not
//! write back.

use crate::assets::font::TextMeasurer;
use crate::config::{FontFamily, FontSizeClass};
use crate::foundation::core::Canvas;
use crate::timeline::model::TimedWord;

/// Padding on every side, as a fraction of canvas width.
pub const PADDING_FRACTION: f64 = 0.1;
/// Font size decrement per fit iteration.
pub const FONT_STEP_PX: f64 = 2.0;
/// Smallest font size the fit loop will reach.
pub const MIN_FONT_PX: f64 = 12.0;
/// Hard cap on fit iterations.
pub const MAX_FIT_ITERATIONS: u32 = 200;
/// Line height as a multiple of the font size, before family compensation.
pub const LINE_HEIGHT_FACTOR: f64 = 1.2;

/// Font inputs that affect layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FontConfig {
    pub size_class: FontSizeClass,
    pub family: FontFamily,
}

impl FontConfig {
    /// Starting size for the fit loop on `canvas`.
    pub fn nominal_px(&self, canvas: Canvas) -> f64 {
        self.size_class.reference_px() * canvas.reference_scale() * self.family.size_multiplier()
    }

    fn line_height(&self, size_px: f64) -> f64 {
        size_px * LINE_HEIGHT_FACTOR * self.family.line_height_multiplier()
    }
}

/// A word placed on the canvas (top-left origin, top-aligned).
#[derive(Clone, Debug, PartialEq)]
pub struct PositionedWord {
    pub word: TimedWord,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    /// X offset of each character's start, relative to `x`.
    pub char_offsets: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Line {
    pub words: Vec<PositionedWord>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
}

/// Immutable layout of one timeline page.
#[derive(Clone, Debug, PartialEq)]
pub struct Page {
    pub lines: Vec<Line>,
    pub font_size_px: f64,
    pub line_height_px: f64,
}

impl Page {
    /// Height of the whole line block.
    pub fn block_height(&self) -> f64 {
        self.lines.len() as f64 * self.line_height_px
    }

    /// All placed words in reading order.
    pub fn words(&self) -> impl Iterator<Item = &PositionedWord> {
        self.lines.iter().flat_map(|l| l.words.iter())
    }
}

/// Lay out `words` centered on `canvas`, shrinking the font until the block fits.
///
/// If the block does not fit even at [`MIN_FONT_PX`], the floor size is used anyway.
#[tracing::instrument(skip(words, measurer), fields(words = words.len()))]
pub fn layout(
    words: &[TimedWord],
    canvas: Canvas,
    font: FontConfig,
    measurer: &mut dyn TextMeasurer,
) -> Page {
    let padding = PADDING_FRACTION * canvas.w();
    let max_width = (canvas.w() - 2.0 * padding).max(0.0);
    let max_height = (canvas.h() - 2.0 * padding).max(0.0);

    let mut size = font.nominal_px(canvas).max(MIN_FONT_PX);
    let mut iterations = 0u32;
    let mut lines = wrap(words, size, max_width, measurer);
    while lines.len() as f64 * font.line_height(size) > max_height
        && size > MIN_FONT_PX
        && iterations < MAX_FIT_ITERATIONS
    {
        size = (size - FONT_STEP_PX).max(MIN_FONT_PX);
        iterations += 1;
        lines = wrap(words, size, max_width, measurer);
    }
    if lines.len() as f64 * font.line_height(size) > max_height {
        tracing::debug!(size, lines = lines.len(), "layout overflows at the size floor");
    }

    let line_height = font.line_height(size);
    let top = (canvas.h() - lines.len() as f64 * line_height) / 2.0;
    let lines = lines
        .into_iter()
        .enumerate()
        .map(|(i, range)| place_line(&words[range], i, top, line_height, size, canvas, measurer))
        .collect();

    Page {
        lines,
        font_size_px: size,
        line_height_px: line_height,
    }
}

/// Greedy wrap; returns index ranges into `words`.
fn wrap(
    words: &[TimedWord],
    size: f64,
    max_width: f64,
    measurer: &mut dyn TextMeasurer,
) -> Vec<std::ops::Range<usize>> {
    let mut lines = Vec::new();
    let mut start = 0usize;
    let mut current = String::new();
    for (i, w) in words.iter().enumerate() {
        let text = w.token.clean_text.as_str();
        if current.is_empty() {
            current.push_str(text);
            continue;
        }
        let candidate = format!("{current} {text}");
        if f64::from(measurer.measure_px(&candidate, size as f32)) > max_width {
            lines.push(start..i);
            start = i;
            current = text.to_owned();
        } else {
            current = candidate;
        }
    }
    if start < words.len() {
        lines.push(start..words.len());
    }
    lines
}

fn place_line(
    words: &[TimedWord],
    index: usize,
    top: f64,
    line_height: f64,
    size: f64,
    canvas: Canvas,
    measurer: &mut dyn TextMeasurer,
) -> Line {
    let sz = size as f32;
    let text = words
        .iter()
        .map(|w| w.token.clean_text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let width = f64::from(measurer.measure_px(&text, sz));
    let x = (canvas.w() - width) / 2.0;
    let y = top + index as f64 * line_height;

    let mut prefix = String::new();
    let placed = words
        .iter()
        .map(|w| {
            let word_text = w.token.clean_text.as_str();
            let word_width = f64::from(measurer.measure_px(word_text, sz));
            // Shapers drop trailing whitespace from advances, so measure through the word.
            let offset = if prefix.is_empty() {
                0.0
            } else {
                f64::from(measurer.measure_px(&format!("{prefix} {word_text}"), sz)) - word_width
            };
            let char_offsets = word_text
                .char_indices()
                .map(|(b, _)| f64::from(measurer.measure_px(&word_text[..b], sz)))
                .collect();
            let placed = PositionedWord {
                word: w.clone(),
                x: x + offset,
                y,
                width: word_width,
                char_offsets,
            };
            if !prefix.is_empty() {
                prefix.push(' ');
            }
            prefix.push_str(word_text);
            placed
        })
        .collect();

    Line {
        words: placed,
        x,
        y,
        width,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/engine.rs"]
mod tests;
