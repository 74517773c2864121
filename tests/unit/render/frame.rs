use super::*;
use crate::assets::font::FixedAdvanceMeasurer;
use crate::config::ThemeKind;
use crate::foundation::core::Canvas;
use crate::layout::engine::{FontConfig, layout};
use crate::markup::token::parse_token;
use crate::timeline::model::TimedWord;

fn style(animation: AnimationVariant) -> FrameStyle {
    FrameStyle {
        animation,
        text_style: TextStyleMode::Fill,
        theme: Theme::preset(ThemeKind::Midnight),
        font_weight: 400,
        fps: Fps::default(),
        seed: 7,
    }
}

fn page_of(words: &[(&str, f64, f64)]) -> Page {
    let timed = words
        .iter()
        .map(|(raw, start, active)| TimedWord {
            token: parse_token(raw),
            absolute_start_ms: *start,
            active_duration_ms: *active,
        })
        .collect::<Vec<_>>();
    layout(
        &timed,
        Canvas::new(1080, 1920).unwrap(),
        FontConfig::default(),
        &mut FixedAdvanceMeasurer::default(),
    )
}

#[test]
fn words_before_start_are_not_drawn() {
    let page = page_of(&[("one", 0.0, 100.0), ("two", 1000.0, 100.0)]);
    let s = frame_state(&page, 999.0, &style(AnimationVariant::FadeZoom));
    assert_eq!(s.words.len(), 1);
    let s = frame_state(&page, 1000.0, &style(AnimationVariant::FadeZoom));
    assert_eq!(s.words.len(), 2);
}

#[test]
fn fade_zoom_progression() {
    let page = page_of(&[("word", 0.0, 0.0)]);
    let st = style(AnimationVariant::FadeZoom);

    let w = &frame_state(&page, 0.0, &st).words[0];
    assert_eq!(w.alpha, 0.0);
    assert!((w.scale - 1.5).abs() < 1e-9);

    let w = &frame_state(&page, 250.0, &st).words[0];
    let eased = 1.0 - 0.5f64.powi(3);
    assert!((f64::from(w.alpha) - eased).abs() < 1e-6);
    assert!((w.scale - (1.5 - 0.5 * eased)).abs() < 1e-9);

    let w = &frame_state(&page, 5000.0, &st).words[0];
    assert_eq!(w.alpha, 1.0);
    assert_eq!(w.scale, 1.0);
}

#[test]
fn drop_in_offsets_from_above() {
    let page = page_of(&[("word", 0.0, 0.0)]);
    let rest_y = page.lines[0].y;
    let st = style(AnimationVariant::DropIn);
    let w = &frame_state(&page, 0.0, &st).words[0];
    assert!((w.y - (rest_y - 50.0)).abs() < 1e-9);
    assert_eq!(w.scale, 1.0);
    let w = &frame_state(&page, 600.0, &st).words[0];
    assert!((w.y - rest_y).abs() < 1e-9);
}

#[test]
fn typewriter_is_binary() {
    let page = page_of(&[("word", 100.0, 0.0)]);
    let st = style(AnimationVariant::Typewriter);
    assert!(frame_state(&page, 99.0, &st).words.is_empty());
    let w = &frame_state(&page, 100.0, &st).words[0];
    assert_eq!((w.alpha, w.scale), (1.0, 1.0));
}

#[test]
fn active_window_and_highlight_color() {
    let page = page_of(&[("*loud*", 1000.0, 500.0)]);
    let st = style(AnimationVariant::Typewriter);
    let theme = st.theme;

    for (t, expect) in [(1000.0, true), (1250.0, true), (1499.9, true), (1500.0, false), (2000.0, false)] {
        let w = &frame_state(&page, t, &st).words[0];
        assert_eq!(w.active, expect, "t={t}");
        let color = w.glyphs[0].color;
        assert_eq!(color, if expect { theme.highlight } else { theme.accent }, "t={t}");
    }
}

#[test]
fn bounce_shape() {
    assert_eq!(bounce_scale(0.0), 1.0);
    assert!((bounce_scale(0.1) - 1.075).abs() < 1e-9);
    assert!((bounce_scale(0.2) - 1.15).abs() < 1e-9);
    assert!((bounce_scale(1.0) - 1.0).abs() < 1e-9);
    for i in 0..=100 {
        let s = bounce_scale(f64::from(i) / 100.0);
        assert!((1.0..=1.15 + 1e-12).contains(&s));
    }
}

#[test]
fn span_color_beats_accent_and_base() {
    let page = page_of(&[("*a[b](red)c*", 0.0, 0.0), ("plain", 0.0, 0.0)]);
    let st = style(AnimationVariant::Typewriter);
    let s = frame_state(&page, 10.0, &st);
    let colors = s.words[0].glyphs.iter().map(|g| g.color).collect::<Vec<_>>();
    assert_eq!(colors, vec![st.theme.accent, Rgba8::rgb(255, 0, 0), st.theme.accent]);
    assert!(s.words[1].glyphs.iter().all(|g| g.color == st.theme.base));
}

#[test]
fn wiggle_is_bounded_and_theme_scaled() {
    let page = page_of(&[("[shaky](wiggle)", 0.0, 0.0)]);
    let mut st = style(AnimationVariant::Typewriter);
    let offsets = &page.lines[0].words[0].char_offsets;
    for frame in 0..60 {
        let t = f64::from(frame) * 33.4;
        for (g, base) in frame_state(&page, t, &st).words[0].glyphs.iter().zip(offsets) {
            assert!((g.dx - base).abs() <= 2.0 && g.dy.abs() <= 2.0);
        }
    }
    st.theme = Theme::preset(ThemeKind::Minimal);
    for frame in 0..60 {
        let t = f64::from(frame) * 33.4;
        for g in &frame_state(&page, t, &st).words[0].glyphs {
            assert!(g.dy.abs() <= 1.0);
        }
    }
}

#[test]
fn glitch_hits_roughly_one_frame_in_ten() {
    let page = page_of(&[("[zap](glitch)", 0.0, 0.0)]);
    let st = style(AnimationVariant::Typewriter);
    let mut hits = 0usize;
    let mut total = 0usize;
    for frame in 0..600 {
        let t = f64::from(frame) * (1000.0 / 30.0) + 1.0;
        for g in &frame_state(&page, t, &st).words[0].glyphs {
            total += 1;
            if g.alpha < 1.0 {
                hits += 1;
                assert_eq!(g.alpha, GLITCH_ALPHA);
            }
        }
    }
    let rate = hits as f64 / total as f64;
    assert!((0.05..0.15).contains(&rate), "rate {rate}");
}

#[test]
fn pulse_phase_depends_on_character_index() {
    let page = page_of(&[("[wave](pulse)", 0.0, 0.0)]);
    let st = style(AnimationVariant::Typewriter);
    let s = frame_state(&page, 200.0, &st);
    let scales = s.words[0].glyphs.iter().map(|g| g.scale).collect::<Vec<_>>();
    assert!(scales.iter().all(|s| (1.0..=1.0 + PULSE_AMPLITUDE).contains(s)));
    assert!(scales.windows(2).any(|w| (w[0] - w[1]).abs() > 1e-6));
}

#[test]
fn rendering_is_idempotent() {
    let page = page_of(&[
        ("[a](wiggle)", 0.0, 300.0),
        ("[b](glitch|blue)", 100.0, 300.0),
        ("[c](pulse)", 200.0, 300.0),
    ]);
    let st = style(AnimationVariant::FadeZoom);
    for t in [0.0, 150.0, 333.0, 1234.5] {
        assert_eq!(frame_state(&page, t, &st), frame_state(&page, t, &st));
    }
}

#[test]
fn faux_bold_only_for_heavy_fill_styles() {
    let page = page_of(&[("x", 0.0, 0.0)]);
    let mut st = style(AnimationVariant::Typewriter);
    st.font_weight = 700;
    assert!(frame_state(&page, 0.0, &st).faux_bold);
    st.text_style = TextStyleMode::Outline;
    assert!(!frame_state(&page, 0.0, &st).faux_bold);
    st.text_style = TextStyleMode::ThreeD;
    st.font_weight = 500;
    assert!(!frame_state(&page, 0.0, &st).faux_bold);
}
