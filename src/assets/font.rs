use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::foundation::error::{KineError, KineResult};

/// Width measurement hook used by the layout engine.
///
/// Implementations must be deterministic for a given `(text, size_px)`.
pub trait TextMeasurer {
    /// Rendered advance width of `text` at `size_px`, in pixels.
    fn measure_px(&mut self, text: &str, size_px: f32) -> f32;
}

/// Approximate measurer: every character advances by `advance_em * size_px`.
///
/// Useful for headless layout where no font file is available.
#[derive(Clone, Copy, Debug)]
pub struct FixedAdvanceMeasurer {
    /// Advance per character as a fraction of the font size.
    pub advance_em: f32,
}

impl Default for FixedAdvanceMeasurer {
    fn default() -> Self {
        Self { advance_em: 0.55 }
    }
}

impl TextMeasurer for FixedAdvanceMeasurer {
    fn measure_px(&mut self, text: &str, size_px: f32) -> f32 {
        text.chars().count() as f32 * size_px * self.advance_em
    }
}

/// A font file loaded into memory, shared between measurement and painting.
#[derive(Clone, Debug)]
pub struct LoadedFont {
    /// Raw font file bytes.
    pub bytes: Arc<Vec<u8>>,
}

impl LoadedFont {
    /// Read a TTF/OTF file from disk.
    pub fn from_path(path: &Path) -> KineResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            KineError::input(format!("failed to read font '{}': {e}", path.display()))
        })?;
        if bytes.is_empty() {
            return Err(KineError::input(format!(
                "font file '{}' is empty",
                path.display()
            )));
        }
        Ok(Self {
            bytes: Arc::new(bytes),
        })
    }
}

/// Stateful helper for building Parley text layouts from one registered font.
pub(crate) struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<()>,
    family_name: String,
}

impl TextLayoutEngine {
    /// Register `font` and prepare fresh Parley contexts.
    pub(crate) fn new(font: &LoadedFont) -> KineResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font.bytes.as_ref().clone()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| KineError::input("no font families registered from font bytes"))?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| KineError::input("registered font family has no name"))?
            .to_string();

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
        })
    }

    /// Shape and lay out a single unwrapped line of text.
    pub(crate) fn layout_line(
        &mut self,
        text: &str,
        size_px: f32,
    ) -> KineResult<parley::Layout<()>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(KineError::validation(
                "text size_px must be finite and > 0",
            ));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));

        let mut layout: parley::Layout<()> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}

/// Glyph-accurate measurer backed by Parley shaping.
pub struct ParleyMeasurer {
    engine: TextLayoutEngine,
    cache: HashMap<(String, u32), f32>,
}

impl ParleyMeasurer {
    /// Build a measurer for `font`.
    pub fn new(font: &LoadedFont) -> KineResult<Self> {
        Ok(Self {
            engine: TextLayoutEngine::new(font)?,
            cache: HashMap::new(),
        })
    }
}

impl TextMeasurer for ParleyMeasurer {
    fn measure_px(&mut self, text: &str, size_px: f32) -> f32 {
        let key = (text.to_owned(), size_px.to_bits());
        if let Some(w) = self.cache.get(&key) {
            return *w;
        }
        let w = match self.engine.layout_line(text, size_px) {
            Ok(layout) => layout.width(),
            Err(e) => {
                tracing::warn!(error = %e, "text measurement failed; using fixed advance");
                FixedAdvanceMeasurer::default().measure_px(text, size_px)
            }
        };
        self.cache.insert(key, w);
        w
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/font.rs"]
mod tests;
