use super::*;

fn seg(text: &str, start: f64, end: f64) -> TranscriptSegment {
    TranscriptSegment {
        text: text.to_owned(),
        start,
        end,
    }
}

fn starts(page: &TimelinePage) -> Vec<f64> {
    page.words.iter().map(|w| w.absolute_start_ms).collect()
}

fn assert_monotonic(timeline: &Timeline) {
    for page in &timeline.pages {
        let s = starts(page);
        assert!(s.windows(2).all(|w| w[0] <= w[1]), "{s:?}");
    }
}

#[test]
fn mode_selection() {
    let segs = vec![seg("hi there", 0.0, 1.0)];
    assert!(matches!(
        TimelineMode::select(&segs, 2, Some(1000.0), false),
        TimelineMode::Timestamped { .. }
    ));
    // Preview ignores segments.
    assert!(matches!(
        TimelineMode::select(&segs, 2, Some(1000.0), true),
        TimelineMode::Paged { .. }
    ));
    assert!(matches!(
        TimelineMode::select(&[], 2, None, false),
        TimelineMode::Ambient { hold_ms } if hold_ms == EXPORT_HOLD_MS
    ));
    assert!(matches!(
        TimelineMode::select(&[], 2, None, true),
        TimelineMode::Ambient { hold_ms } if hold_ms == PREVIEW_HOLD_MS
    ));
    assert!(matches!(
        TimelineMode::select(&[], AMBIENT_MAX_WORDS + 1, None, true),
        TimelineMode::Paged { audio_ms: None }
    ));
}

#[test]
fn empty_script_is_input_error() {
    let err = build_timeline(&[], &TimelineMode::Ambient { hold_ms: 0.0 }, false).unwrap_err();
    assert!(matches!(err, KineError::Input(_)));
}

#[test]
fn ambient_pacing_follows_punctuation() {
    let tokens = parse_script("Hi, there. Friend");
    let tl = build_timeline(&tokens, &TimelineMode::Ambient { hold_ms: 2000.0 }, true).unwrap();
    let s = starts(&tl.pages[0]);
    assert_eq!(s, vec![0.0, 540.0, 1290.0]);
    assert_eq!(tl.pages[0].words[0].active_duration_ms, 540.0);
    assert_eq!(tl.pages[0].words[2].active_duration_ms, 300.0);
    assert_eq!(tl.total_ms, 1290.0 + FADE_DURATION_MS + 2000.0);
    assert!(tl.looping);
    assert_eq!(tl.page_index_at(99_999.0), Some(0));
}

#[test]
fn end_to_end_ambient_scenario() {
    let tokens = parse_script("You aren't *busy*; you are *irrelevant*.");
    let mode = TimelineMode::select(&[], tokens.len(), None, true);
    let tl = build_timeline(&tokens, &mode, true).unwrap();
    let s = starts(&tl.pages[0]);
    assert_eq!(s, vec![0.0, 300.0, 600.0, 900.0, 1200.0, 1500.0]);
    let last = tl.pages[0].words.last().unwrap();
    assert_eq!(last.active_duration_ms, BASE_WORD_DELAY_MS * 2.5);
    assert_eq!(tl.total_ms, 1500.0 + 500.0 + 2000.0);

    let export = build_timeline(&tokens, &TimelineMode::select(&[], 6, None, false), false).unwrap();
    assert_eq!(export.total_ms, 1500.0 + 500.0 + 5000.0);
    assert!(!export.looping);
}

#[test]
fn trailing_quotes_do_not_hide_punctuation() {
    assert_eq!(word_delay_ms("end.\""), 750.0);
    assert_eq!(word_delay_ms("(aside,)"), 540.0);
    assert_eq!(word_delay_ms("word"), 300.0);
}

#[test]
fn only_commas_and_sentence_ends_pause() {
    assert_eq!(word_delay_ms("wait,"), 540.0);
    assert_eq!(word_delay_ms("stop!"), 750.0);
    assert_eq!(word_delay_ms("busy;"), 300.0);
    assert_eq!(word_delay_ms("note:"), 300.0);
    assert_eq!(word_delay_ms("wait\u{2026}"), 300.0);
}

#[test]
fn paged_without_audio_uses_heuristic_total() {
    let tokens = parse_script("one two three four five six seven");
    let tl = build_timeline(&tokens, &TimelineMode::Paged { audio_ms: None }, false).unwrap();
    assert_eq!(tl.total_ms, 5000.0);
    assert_eq!(tl.pages.len(), 2);
    assert_eq!(tl.pages[0].words.len(), 5);
    assert_eq!(tl.pages[1].words.len(), 2);

    let page_ms = 2500.0;
    let spacing = page_ms * 0.9 / 5.0;
    assert_eq!(starts(&tl.pages[0])[1], spacing);
    assert_eq!(tl.pages[0].words[0].active_duration_ms, spacing);
    assert_eq!(starts(&tl.pages[1])[0], page_ms);

    assert_eq!(tl.page_index_at(0.0), Some(0));
    assert_eq!(tl.page_index_at(2499.0), Some(0));
    assert_eq!(tl.page_index_at(2500.0), Some(1));
    assert_eq!(tl.page_index_at(1e9), Some(1));
    assert_monotonic(&tl);
}

#[test]
fn paged_with_audio_uses_audio_length() {
    let tokens = parse_script(&"word ".repeat(20));
    let tl = build_timeline(
        &tokens,
        &TimelineMode::Paged {
            audio_ms: Some(8000.0),
        },
        false,
    )
    .unwrap();
    assert_eq!(tl.total_ms, 8000.0);
    assert_eq!(tl.pages.len(), 4);
    assert_eq!(tl.pages[3].end_ms, 8000.0);
    assert_monotonic(&tl);
}

#[test]
fn timestamped_splits_segments_evenly() {
    let segments = vec![seg("a b c d", 0.0, 2.0), seg("e f", 3.0, 4.0)];
    let tokens = parse_script("a b c d e f");
    let mode = TimelineMode::Timestamped {
        segments,
        audio_ms: None,
    };
    let tl = build_timeline(&tokens, &mode, false).unwrap();
    assert_eq!(starts(&tl.pages[0]), vec![0.0, 500.0, 1000.0, 1500.0]);
    assert_eq!(starts(&tl.pages[1]), vec![3000.0, 3500.0]);
    assert_eq!(tl.pages[1].words[0].active_duration_ms, 500.0);
    assert_eq!(tl.total_ms, 5000.0);
    assert_monotonic(&tl);
}

#[test]
fn timestamped_lookup_handles_gaps_and_edges() {
    let segments = vec![seg("a", 1.0, 2.0), seg("b", 3.0, 4.0), seg("c", 4.0, 5.0)];
    let tokens = parse_script("a b c");
    let tl = build_timeline(
        &tokens,
        &TimelineMode::Timestamped {
            segments,
            audio_ms: None,
        },
        false,
    )
    .unwrap();
    assert_eq!(tl.page_index_at(0.0), Some(0));
    assert_eq!(tl.page_index_at(1500.0), Some(0));
    assert_eq!(tl.page_index_at(2500.0), Some(0));
    assert_eq!(tl.page_index_at(3000.0), Some(1));
    assert_eq!(tl.page_index_at(4000.0), Some(2));
    assert_eq!(tl.page_index_at(9000.0), Some(2));
}

#[test]
fn timestamped_drift_correction_stretches_to_audio() {
    let segments = vec![seg("first words", 0.0, 50.0), seg("last words here", 50.0, 100.0)];
    let tokens = parse_script("x");
    let tl = build_timeline(
        &tokens,
        &TimelineMode::Timestamped {
            segments: segments.clone(),
            audio_ms: Some(115_000.0),
        },
        false,
    )
    .unwrap();
    let last = tl.pages[1].words.last().unwrap();
    let last_end = last.absolute_start_ms + last.active_duration_ms;
    assert!((last_end - 115_000.0).abs() < 1e-6);
    assert!((tl.total_ms - 116_000.0).abs() < 1e-6);

    let tl = build_timeline(
        &tokens,
        &TimelineMode::Timestamped {
            segments,
            audio_ms: Some(200_000.0),
        },
        false,
    )
    .unwrap();
    let last = tl.pages[1].words.last().unwrap();
    assert!((last.absolute_start_ms + last.active_duration_ms - 100_000.0).abs() < 1e-6);
    assert_eq!(tl.total_ms, 200_000.0);
}

#[test]
fn active_window_is_half_open() {
    let word = TimedWord {
        token: parse_script("x").remove(0),
        absolute_start_ms: 1000.0,
        active_duration_ms: 500.0,
    };
    assert!(!word.is_active_at(999.999));
    assert!(word.is_active_at(1000.0));
    assert!(word.is_active_at(1499.999));
    assert!(!word.is_active_at(1500.0));
}

#[test]
fn looping_wraps_and_export_finishes() {
    let tokens = parse_script("one");
    let tl = build_timeline(&tokens, &TimelineMode::Ambient { hold_ms: 500.0 }, true).unwrap();
    assert_eq!(tl.total_ms, 1000.0);
    assert_eq!(tl.local_elapsed(1250.0), 250.0);
    assert!(!tl.is_finished(5000.0));

    let tl = build_timeline(&tokens, &TimelineMode::Ambient { hold_ms: 500.0 }, false).unwrap();
    assert_eq!(tl.local_elapsed(1250.0), 1250.0);
    assert!(tl.is_finished(1000.0));
    assert!(!tl.is_finished(999.0));
}
