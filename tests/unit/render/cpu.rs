use std::path::Path;

use super::*;
use crate::assets::font::FixedAdvanceMeasurer;
use crate::config::{AnimationVariant, ThemeKind};
use crate::foundation::core::Fps;
use crate::layout::engine::{FontConfig, layout};
use crate::markup::script::parse_script;
use crate::render::frame::{FrameStyle, frame_state};
use crate::render::theme::Theme;
use crate::timeline::model::TimedWord;

fn font() -> LoadedFont {
    LoadedFont::from_path(Path::new("tests/data/fonts/DejaVuSans.ttf")).unwrap()
}

fn frame_for(canvas: Canvas, text: &str, text_style: TextStyleMode) -> FrameState {
    let words = parse_script(text)
        .into_iter()
        .map(|token| TimedWord {
            token,
            absolute_start_ms: 0.0,
            active_duration_ms: 0.0,
        })
        .collect::<Vec<_>>();
    let page = layout(&words, canvas, FontConfig::default(), &mut FixedAdvanceMeasurer::default());
    let style = FrameStyle {
        animation: AnimationVariant::Typewriter,
        text_style,
        theme: Theme::preset(ThemeKind::Midnight),
        font_weight: 700,
        fps: Fps::default(),
        seed: 1,
    };
    frame_state(&page, 1000.0, &style)
}

fn px(frame: &FrameRGBA, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * frame.width + x) * 4) as usize;
    [frame.data[i], frame.data[i + 1], frame.data[i + 2], frame.data[i + 3]]
}

#[test]
fn solid_background_fills_canvas() {
    let canvas = Canvas::new(64, 48).unwrap();
    let mut painter = CpuPainter::new(canvas, &font()).unwrap();
    let empty = frame_for(canvas, "x", TextStyleMode::Fill);
    let empty = FrameState {
        words: Vec::new(),
        ..empty
    };
    let out = painter
        .paint(&BackgroundFrame::Solid(Rgba8::rgb(10, 200, 30)), &empty)
        .unwrap();
    assert_eq!((out.width, out.height), (64, 48));
    assert_eq!(out.data.len(), 64 * 48 * 4);
    assert_eq!(px(&out, 0, 0), [10, 200, 30, 255]);
    assert_eq!(px(&out, 63, 47), [10, 200, 30, 255]);
}

#[test]
fn transparent_background_leaves_corners_clear() {
    let canvas = Canvas::new(200, 200).unwrap();
    let mut painter = CpuPainter::new(canvas, &font()).unwrap();
    let frame = frame_for(canvas, "Hi", TextStyleMode::Fill);
    let out = painter.paint(&BackgroundFrame::Clear, &frame).unwrap();
    assert_eq!(px(&out, 0, 0), [0, 0, 0, 0]);
    assert!(out.data.chunks_exact(4).any(|p| p[3] > 0), "text should be visible");
}

#[test]
fn every_text_style_draws_something() {
    let canvas = Canvas::new(240, 160).unwrap();
    let mut painter = CpuPainter::new(canvas, &font()).unwrap();
    for style in [
        TextStyleMode::Fill,
        TextStyleMode::Outline,
        TextStyleMode::Neon,
        TextStyleMode::ThreeD,
    ] {
        let frame = frame_for(canvas, "Word", style);
        let out = painter.paint(&BackgroundFrame::Clear, &frame).unwrap();
        assert!(out.data.chunks_exact(4).any(|p| p[3] > 0), "{style:?}");
    }
}

#[test]
fn raster_background_covers_canvas() {
    let canvas = Canvas::new(32, 16).unwrap();
    let mut painter = CpuPainter::new(canvas, &font()).unwrap();
    let img = PreparedImage {
        width: 4,
        height: 4,
        rgba8_premul: Arc::new([200u8, 0, 0, 255].repeat(16)),
    };
    let frame = FrameState {
        words: Vec::new(),
        ..frame_for(canvas, "x", TextStyleMode::Fill)
    };
    let out = painter.paint(&BackgroundFrame::Raster(img), &frame).unwrap();
    let center = px(&out, 16, 8);
    assert_eq!(center[3], 255);
    assert!(center[0] > 150);
}

#[test]
fn painting_is_repeatable() {
    let canvas = Canvas::new(120, 80).unwrap();
    let mut painter = CpuPainter::new(canvas, &font()).unwrap();
    let frame = frame_for(canvas, "same", TextStyleMode::Fill);
    let bg = BackgroundFrame::Solid(Rgba8::rgb(0, 0, 0));
    let a = painter.paint(&bg, &frame).unwrap();
    let b = painter.paint(&bg, &frame).unwrap();
    assert_eq!(a.data, b.data);
}

#[test]
fn shadow_offset_has_a_floor() {
    assert_eq!(shadow_offset_px(10.0), 2.0);
    assert!((shadow_offset_px(100.0) - 5.0).abs() < 1e-9);
}

#[test]
fn oversized_canvas_is_rejected() {
    let canvas = Canvas::new(70_000, 10).unwrap();
    assert!(CpuPainter::new(canvas, &font()).is_err());
}
