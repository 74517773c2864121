use crate::config::ThemeKind;
use crate::foundation::core::Rgba8;

/// Resolved palette for one theme preset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Theme {
    /// Plain word color.
    pub base: Rgba8,
    /// Emphasized (`*word*`) color.
    pub accent: Rgba8,
    /// Color of the word currently being spoken.
    pub highlight: Rgba8,
    /// Default solid background.
    pub background: Rgba8,
    /// Drop shadow color for the 3D text style.
    pub shadow: Rgba8,
    /// Maximum wiggle displacement in pixels.
    pub wiggle_px: f64,
}

impl Theme {
    pub fn preset(kind: ThemeKind) -> Self {
        match kind {
            ThemeKind::Midnight => Self {
                base: Rgba8::rgb(245, 245, 245),
                accent: Rgba8::rgb(255, 214, 10),
                highlight: Rgba8::rgb(0, 229, 255),
                background: Rgba8::rgb(12, 12, 16),
                shadow: Rgba8::rgb(0, 0, 0),
                wiggle_px: 2.0,
            },
            ThemeKind::Daylight => Self {
                base: Rgba8::rgb(28, 28, 30),
                accent: Rgba8::rgb(220, 38, 38),
                highlight: Rgba8::rgb(37, 99, 235),
                background: Rgba8::rgb(250, 247, 240),
                shadow: Rgba8::rgb(180, 170, 150),
                wiggle_px: 2.0,
            },
            ThemeKind::Neon => Self {
                base: Rgba8::rgb(255, 255, 255),
                accent: Rgba8::rgb(255, 0, 170),
                highlight: Rgba8::rgb(57, 255, 20),
                background: Rgba8::rgb(5, 0, 20),
                shadow: Rgba8::rgb(60, 0, 90),
                wiggle_px: 2.0,
            },
            ThemeKind::Minimal => Self {
                base: Rgba8::rgb(230, 230, 230),
                accent: Rgba8::rgb(255, 255, 255),
                highlight: Rgba8::rgb(160, 160, 160),
                background: Rgba8::rgb(20, 20, 20),
                shadow: Rgba8::rgb(0, 0, 0),
                wiggle_px: 1.0,
            },
            ThemeKind::Sunset => Self {
                base: Rgba8::rgb(255, 237, 213),
                accent: Rgba8::rgb(251, 146, 60),
                highlight: Rgba8::rgb(244, 63, 94),
                background: Rgba8::rgb(49, 16, 48),
                shadow: Rgba8::rgb(20, 5, 20),
                wiggle_px: 2.0,
            },
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::preset(ThemeKind::default())
    }
}
