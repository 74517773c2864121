/// Drift below this many seconds is left uncorrected.
pub const DRIFT_TOLERANCE_SEC: f64 = 0.5;
/// Accepted range for the audio/transcript duration ratio.
pub const DRIFT_RATIO_RANGE: std::ops::RangeInclusive<f64> = 0.8..=1.2;

/// Factor applied to every transcript timestamp so the last segment ends with the audio.
///
/// Returns `1.0` when the audio duration is unknown, the drift is within tolerance, or the ratio
/// is implausible (outside [`DRIFT_RATIO_RANGE`]).
pub fn time_scale(last_segment_end_sec: f64, audio_duration_sec: Option<f64>) -> f64 {
    let Some(audio) = audio_duration_sec else {
        return 1.0;
    };
    if !audio.is_finite() || audio <= 0.0 || last_segment_end_sec <= 0.0 {
        return 1.0;
    }
    if (audio - last_segment_end_sec).abs() <= DRIFT_TOLERANCE_SEC {
        return 1.0;
    }
    let ratio = audio / last_segment_end_sec;
    if DRIFT_RATIO_RANGE.contains(&ratio) {
        ratio
    } else {
        tracing::warn!(
            ratio,
            audio_sec = audio,
            transcript_sec = last_segment_end_sec,
            "transcript/audio drift out of range; timestamps left unscaled"
        );
        1.0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/drift.rs"]
mod tests;
