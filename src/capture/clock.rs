use std::time::{Duration, Instant};

use crate::foundation::core::Fps;

/// Sample-accurate clock driven by an audio track.
///
/// Offline rendering has no sound card, so the clock advances exactly one frame's worth of
/// samples per tick. Sample positions are derived from the tick count to avoid accumulating
/// rounding error.
#[derive(Clone, Debug)]
pub struct AudioClock {
    sample_rate: u32,
    fps: Fps,
    ticks: u64,
    start_offset_samples: u64,
}

impl AudioClock {
    pub fn new(sample_rate: u32, fps: Fps) -> Self {
        Self {
            sample_rate,
            fps,
            ticks: 0,
            start_offset_samples: 0,
        }
    }

    /// Current position in samples, including the start offset.
    pub fn position_samples(&self) -> u64 {
        let num = u128::from(self.ticks) * u128::from(self.sample_rate) * u128::from(self.fps.den);
        self.start_offset_samples + (num / u128::from(self.fps.num)) as u64
    }

    fn elapsed_ms(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        let s = self.position_samples().saturating_sub(self.start_offset_samples);
        1000.0 * s as f64 / f64::from(self.sample_rate)
    }
}

/// Frame-indexed clock for offline exports without audio.
///
/// Time is a pure function of the frame index, so slow painting stretches render time but never
/// drops frames from the output.
#[derive(Clone, Debug)]
pub struct FrameClock {
    fps: Fps,
    ticks: u64,
}

impl FrameClock {
    pub fn new(fps: Fps) -> Self {
        Self { fps, ticks: 0 }
    }

    fn elapsed_ms(&self) -> f64 {
        let num = u128::from(self.ticks) * 1000 * u128::from(self.fps.den);
        num as f64 / f64::from(self.fps.num)
    }
}

/// Real-time clock used by previews without an audio track.
#[derive(Clone, Debug)]
pub struct WallClock {
    origin: Instant,
    fps: Fps,
    ticks: u64,
}

impl WallClock {
    pub fn new(fps: Fps) -> Self {
        Self {
            origin: Instant::now(),
            fps,
            ticks: 0,
        }
    }
}

/// The single authoritative time source of a session.
///
/// Chosen at setup and never switched afterwards.
#[derive(Clone, Debug)]
pub enum RenderClock {
    Audio(AudioClock),
    Frame(FrameClock),
    Wall(WallClock),
}

impl RenderClock {
    pub fn audio(sample_rate: u32, fps: Fps) -> Self {
        Self::Audio(AudioClock::new(sample_rate, fps))
    }

    pub fn frame(fps: Fps) -> Self {
        Self::Frame(FrameClock::new(fps))
    }

    pub fn wall(fps: Fps) -> Self {
        Self::Wall(WallClock::new(fps))
    }

    pub fn is_audio(&self) -> bool {
        matches!(self, Self::Audio(_))
    }

    /// Milliseconds since clock zero.
    pub fn elapsed_ms(&self) -> f64 {
        match self {
            Self::Audio(a) => a.elapsed_ms(),
            Self::Frame(f) => f.elapsed_ms(),
            Self::Wall(w) => w.origin.elapsed().as_secs_f64() * 1000.0,
        }
    }

    /// Move to the next frame.
    ///
    /// The audio and frame clocks step instantly; the wall clock sleeps until the next frame
    /// deadline.
    pub fn advance(&mut self) {
        match self {
            Self::Audio(a) => a.ticks += 1,
            Self::Frame(f) => f.ticks += 1,
            Self::Wall(w) => {
                w.ticks += 1;
                let deadline = w.origin
                    + Duration::from_secs_f64(w.ticks as f64 * w.fps.frame_duration_ms() / 1000.0);
                let now = Instant::now();
                if deadline > now {
                    std::thread::sleep(deadline - now);
                }
            }
        }
    }

    /// Restart from zero (preview loops restart the wall clock on every new session).
    pub fn reset(&mut self) {
        match self {
            Self::Audio(a) => a.ticks = 0,
            Self::Frame(f) => f.ticks = 0,
            Self::Wall(w) => {
                w.origin = Instant::now();
                w.ticks = 0;
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/clock.rs"]
mod tests;
