use super::*;

#[test]
fn progress_rounds_and_clamps() {
    assert_eq!(progress_percent(0.0, 1000.0), 0);
    assert_eq!(progress_percent(4.9, 1000.0), 0);
    assert_eq!(progress_percent(5.0, 1000.0), 1);
    assert_eq!(progress_percent(994.0, 1000.0), 99);
    assert_eq!(progress_percent(995.0, 1000.0), 100);
    assert_eq!(progress_percent(5000.0, 1000.0), 100);
    assert_eq!(progress_percent(-10.0, 1000.0), 0);
    assert_eq!(progress_percent(10.0, 0.0), 100);
}

#[test]
fn missing_font_path_is_reported_as_input() {
    let err = load_request_font(&RenderRequest::default()).unwrap_err();
    assert!(matches!(err, KineError::Input(_)));
}

#[test]
fn stage_lays_out_one_page_per_timeline_page() {
    let request = RenderRequest::default();
    let words = (0..12).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
    let script = ScriptInput::from_text(&words).unwrap();
    let mut measurer = crate::assets::font::FixedAdvanceMeasurer::default();
    let stage = Stage::build(&request, &script, &mut measurer, Some(6000.0), false).unwrap();
    assert_eq!(stage.timeline.pages.len(), 3);
    assert_eq!(stage.pages.len(), 3);
    assert_eq!(stage.pages[2].words().count(), 2);
    assert!(stage.background.is_ready());
}
