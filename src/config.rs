use std::path::{Path, PathBuf};

use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{KineError, KineResult};

/// Nominal font size class, expressed for a canvas whose short side is 1080 px.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontSizeClass {
    /// Compact text.
    Small,
    /// Default size.
    #[default]
    Medium,
    /// Large text.
    Large,
    /// Poster-sized text.
    ExtraLarge,
}

impl FontSizeClass {
    /// Nominal size in pixels at the 1080 px reference.
    pub fn reference_px(self) -> f64 {
        match self {
            Self::Small => 56.0,
            Self::Medium => 80.0,
            Self::Large => 110.0,
            Self::ExtraLarge => 140.0,
        }
    }
}

/// Entrance animation applied to every word.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationVariant {
    /// Words pop in with no transition.
    Typewriter,
    /// Fade in while shrinking from 1.5x.
    #[default]
    FadeZoom,
    /// Fade in while dropping from 50 px above.
    DropIn,
}

/// Glyph painting mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextStyleMode {
    /// Solid fill.
    #[default]
    Fill,
    /// Stroke only.
    Outline,
    /// Glow behind a white fill.
    Neon,
    /// Flat drop-shadow duplicate behind the fill.
    #[serde(rename = "3d")]
    ThreeD,
}

/// Font family choice; drives size compensation in layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontFamily {
    /// Neutral sans-serif.
    #[default]
    Sans,
    /// Book serif.
    Serif,
    /// Monospace.
    Mono,
    /// Condensed display face.
    Display,
    /// Script/handwriting face.
    Handwriting,
}

impl FontFamily {
    /// Size multiplier applied before shrink-to-fit.
    ///
    /// Condensed and script faces render visually smaller at the same nominal size.
    pub fn size_multiplier(self) -> f64 {
        match self {
            Self::Sans | Self::Serif => 1.0,
            Self::Mono => 0.9,
            Self::Display => 1.25,
            Self::Handwriting => 1.15,
        }
    }

    /// Line-height multiplier applied on top of the base 1.2 line height.
    pub fn line_height_multiplier(self) -> f64 {
        match self {
            Self::Sans | Self::Serif | Self::Mono => 1.0,
            Self::Display => 0.9,
            Self::Handwriting => 1.1,
        }
    }
}

/// Visual theme preset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeKind {
    /// White on near-black with a yellow accent.
    #[default]
    Midnight,
    /// Dark text on paper.
    Daylight,
    /// Saturated colors on black.
    Neon,
    /// Understated grayscale; reduced wiggle.
    Minimal,
    /// Warm gradient-like palette.
    Sunset,
}

/// Background descriptor.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackgroundDesc {
    /// Solid fill; `None` uses the theme background.
    Solid {
        /// CSS-like color value.
        #[serde(default)]
        color: Option<String>,
    },
    /// Fully transparent output (requires an alpha-capable encoding).
    Transparent,
    /// Still image scaled to cover the canvas.
    Image {
        /// Image file path.
        source: PathBuf,
    },
    /// Looping video scaled to cover the canvas.
    Video {
        /// Video file path.
        source: PathBuf,
    },
}

impl Default for BackgroundDesc {
    fn default() -> Self {
        Self::Solid { color: None }
    }
}

impl BackgroundDesc {
    /// Return `true` for the transparent background.
    pub fn is_transparent(&self) -> bool {
        matches!(self, Self::Transparent)
    }
}

/// Where the words come from.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScriptSource {
    /// Typed or generated script with optional markup.
    Text {
        /// Script text.
        text: String,
    },
    /// Literal mode: the words are whatever the audio transcript says.
    Transcript,
}

impl Default for ScriptSource {
    fn default() -> Self {
        Self::Text {
            text: String::new(),
        }
    }
}

/// Output resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Resolution {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
        }
    }
}

fn default_font_weight() -> u16 {
    700
}

/// One render/export invocation.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderRequest {
    /// Target resolution.
    pub resolution: Resolution,
    /// Output frame rate.
    pub fps: Fps,
    /// Font size class.
    pub font_size: FontSizeClass,
    /// Word entrance animation.
    pub animation: AnimationVariant,
    /// Optional audio track (also the clock source when it decodes).
    pub audio: Option<PathBuf>,
    /// Theme preset.
    pub theme: ThemeKind,
    /// Glyph painting mode.
    pub text_style: TextStyleMode,
    /// Font family (size compensation).
    pub font_family: FontFamily,
    /// CSS-style font weight (100..=900).
    #[serde(default = "default_font_weight")]
    pub font_weight: u16,
    /// Font file used for shaping and painting.
    pub font_path: Option<PathBuf>,
    /// Preview (looping, no capture) instead of export.
    pub preview: bool,
    /// Background descriptor.
    pub background: BackgroundDesc,
    /// Seed for every pseudo-random choice (jitter, glitch, emphasis fallback).
    pub seed: u64,
    /// Script text or literal transcript mode.
    pub script: ScriptSource,
    /// JSON transcript sidecar (`{text, segments}`) for the audio track.
    pub transcript: Option<PathBuf>,
}

impl Default for RenderRequest {
    fn default() -> Self {
        Self {
            resolution: Resolution::default(),
            fps: Fps::default(),
            font_size: FontSizeClass::default(),
            animation: AnimationVariant::default(),
            audio: None,
            theme: ThemeKind::default(),
            text_style: TextStyleMode::default(),
            font_family: FontFamily::default(),
            font_weight: default_font_weight(),
            font_path: None,
            preview: false,
            background: BackgroundDesc::default(),
            seed: 1,
            script: ScriptSource::default(),
            transcript: None,
        }
    }
}

impl RenderRequest {
    /// Load a request from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> KineResult<Self> {
        let path = path.as_ref();
        let f = std::fs::File::open(path).map_err(|e| {
            KineError::input(format!("failed to open request '{}': {e}", path.display()))
        })?;
        let req: Self = serde_json::from_reader(std::io::BufReader::new(f)).map_err(|e| {
            KineError::input(format!("failed to parse request '{}': {e}", path.display()))
        })?;
        req.validate()?;
        Ok(req)
    }

    /// Validate ranges that serde cannot express.
    pub fn validate(&self) -> KineResult<()> {
        Canvas::new(self.resolution.width, self.resolution.height)?;
        Fps::new(self.fps.num, self.fps.den)?;
        if !(100..=900).contains(&self.font_weight) {
            return Err(KineError::validation("font_weight must be within 100..=900"));
        }
        if let BackgroundDesc::Solid { color: Some(c) } = &self.background
            && crate::assets::color::parse_color(c).is_none()
        {
            return Err(KineError::validation(format!(
                "unrecognized background color '{c}'"
            )));
        }
        Ok(())
    }

    /// Canvas for this request.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.resolution.width,
            height: self.resolution.height,
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/config/request.rs"]
mod tests;
