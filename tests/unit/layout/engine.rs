use super::*;
use crate::assets::font::FixedAdvanceMeasurer;
use crate::markup::script::parse_script;

fn timed(text: &str) -> Vec<TimedWord> {
    parse_script(text)
        .into_iter()
        .enumerate()
        .map(|(i, token)| TimedWord {
            token,
            absolute_start_ms: i as f64 * 100.0,
            active_duration_ms: 100.0,
        })
        .collect()
}

/// Every character advances exactly `size` pixels.
struct Square;

impl TextMeasurer for Square {
    fn measure_px(&mut self, text: &str, size_px: f32) -> f32 {
        text.chars().count() as f32 * size_px
    }
}

#[test]
fn single_short_line_is_centered() {
    let canvas = Canvas::new(1000, 1000).unwrap();
    let font = FontConfig {
        size_class: FontSizeClass::Small,
        family: FontFamily::Sans,
    };
    let page = layout(&timed("ab cd"), canvas, font, &mut Square);
    let size = page.font_size_px;
    assert_eq!(page.lines.len(), 1);
    let line = &page.lines[0];
    assert!((line.width - 5.0 * size).abs() < 1e-3);
    assert!((line.x - (1000.0 - line.width) / 2.0).abs() < 1e-6);
    assert!((line.y - (1000.0 - page.line_height_px) / 2.0).abs() < 1e-6);

    let second = &line.words[1];
    assert!((second.x - (line.x + 3.0 * size)).abs() < 1e-3);
    assert_eq!(second.char_offsets.len(), 2);
    assert!((second.char_offsets[1] - size).abs() < 1e-3);
}

#[test]
fn wraps_when_line_exceeds_width() {
    // 100 px wide usable area at size 12 fits 8 characters.
    let canvas = Canvas::new(125, 2000).unwrap();
    let page = layout(&timed("aaaa bbb cc"), canvas, FontConfig::default(), &mut Square);
    assert_eq!(page.font_size_px, MIN_FONT_PX);
    let lines = page
        .lines
        .iter()
        .map(|l| {
            l.words
                .iter()
                .map(|w| w.word.token.clean_text.as_str())
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    assert_eq!(lines, vec![vec!["aaaa", "bbb"], vec!["cc"]]);
}

#[test]
fn oversized_word_gets_its_own_line() {
    let canvas = Canvas::new(200, 2000).unwrap();
    let page = layout(
        &timed("a incomprehensibilities b"),
        canvas,
        FontConfig::default(),
        &mut Square,
    );
    assert_eq!(page.lines.len(), 3);
    assert_eq!(page.lines[1].words.len(), 1);
}

#[test]
fn shrinks_until_block_fits() {
    let canvas = Canvas::new(1080, 1080).unwrap();
    let words = timed(&"lorem ipsum dolor sit amet ".repeat(8));
    let font = FontConfig {
        size_class: FontSizeClass::ExtraLarge,
        family: FontFamily::Sans,
    };
    let page = layout(&words, canvas, font, &mut FixedAdvanceMeasurer::default());
    assert!(page.font_size_px < font.nominal_px(canvas));
    assert!(page.block_height() <= 1080.0 - 2.0 * 108.0);
    assert_eq!(page.words().count(), words.len());
}

#[test]
fn fit_or_floor_for_many_canvases() {
    let words = timed(&"supercalifragilistic word ".repeat(30));
    for (w, h) in [(100, 100), (101, 640), (640, 100), (320, 240), (1920, 1080), (1080, 1920)] {
        let canvas = Canvas::new(w, h).unwrap();
        let page = layout(&words, canvas, FontConfig::default(), &mut FixedAdvanceMeasurer::default());
        let padding = 0.1 * canvas.w();
        assert!(
            page.block_height() <= canvas.h() - 2.0 * padding || page.font_size_px == MIN_FONT_PX,
            "{w}x{h}: size {} height {}",
            page.font_size_px,
            page.block_height()
        );
        assert!(page.font_size_px >= MIN_FONT_PX);
    }
}

#[test]
fn family_multipliers_change_nominal_size_and_line_height() {
    let canvas = Canvas::new(1080, 1920).unwrap();
    let sans = FontConfig {
        size_class: FontSizeClass::Medium,
        family: FontFamily::Sans,
    };
    let display = FontConfig {
        family: FontFamily::Display,
        ..sans
    };
    assert_eq!(sans.nominal_px(canvas), 80.0);
    assert_eq!(display.nominal_px(canvas), 100.0);

    let page = layout(&timed("hi"), canvas, display, &mut Square);
    assert!((page.line_height_px - 100.0 * 1.2 * 0.9).abs() < 1e-9);
}

#[test]
fn layout_is_deterministic() {
    let canvas = Canvas::new(720, 1280).unwrap();
    let words = timed("the quick brown fox jumps over the lazy dog");
    let a = layout(&words, canvas, FontConfig::default(), &mut FixedAdvanceMeasurer::default());
    let b = layout(&words, canvas, FontConfig::default(), &mut FixedAdvanceMeasurer::default());
    assert_eq!(a, b);
}

#[test]
fn shaped_words_keep_their_spaces() {
    use crate::assets::font::{LoadedFont, ParleyMeasurer};

    let font = LoadedFont::from_path(std::path::Path::new("tests/data/fonts/DejaVuSans.ttf")).unwrap();
    let mut measurer = ParleyMeasurer::new(&font).unwrap();
    let canvas = Canvas::new(1080, 1920).unwrap();
    let font = FontConfig {
        size_class: FontSizeClass::Small,
        family: FontFamily::Sans,
    };
    let page = layout(&timed("You aren't busy"), canvas, font, &mut measurer);
    assert_eq!(page.lines.len(), 1);
    let line = &page.lines[0];
    let ws = &line.words;
    assert_eq!(ws.len(), 3);
    for pair in ws.windows(2) {
        let gap = pair[1].x - (pair[0].x + pair[0].width);
        assert!(gap > 1.0, "words touch: gap {gap}");
    }
    let last = &ws[2];
    assert!((last.x + last.width - (line.x + line.width)).abs() < 1.0);
}
