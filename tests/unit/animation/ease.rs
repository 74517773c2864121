use super::*;

#[test]
fn endpoints_are_exact() {
    for ease in [Ease::Linear, Ease::OutQuad, Ease::OutCubic] {
        assert_eq!(ease.apply(0.0), 0.0);
        assert_eq!(ease.apply(1.0), 1.0);
    }
}

#[test]
fn input_is_clamped() {
    assert_eq!(Ease::OutCubic.apply(-3.0), 0.0);
    assert_eq!(Ease::OutCubic.apply(7.0), 1.0);
}

#[test]
fn out_cubic_runs_ahead_of_linear() {
    let t = 0.25;
    assert!((Ease::OutCubic.apply(t) - (1.0 - 0.75f64.powi(3))).abs() < 1e-12);
    assert!(Ease::OutCubic.apply(t) > Ease::OutQuad.apply(t));
    assert!(Ease::OutQuad.apply(t) > Ease::Linear.apply(t));
}

#[test]
fn lerp_matches_endpoints() {
    assert_eq!(lerp(1.5, 1.0, 0.0), 1.5);
    assert_eq!(lerp(1.5, 1.0, 1.0), 1.0);
    assert_eq!(lerp(-50.0, 0.0, 0.5), -25.0);
}
