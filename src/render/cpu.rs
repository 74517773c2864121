use std::collections::HashMap;
use std::sync::Arc;

use crate::assets::background::{BackgroundFrame, PreparedImage, cover_transform};
use crate::assets::font::{LoadedFont, TextLayoutEngine};
use crate::config::TextStyleMode;
use crate::foundation::core::{Affine, Canvas, Rgba8};
use crate::foundation::error::{KineError, KineResult};
use crate::render::backend::{FramePainter, FrameRGBA};
use crate::render::frame::{FrameState, GlyphVisual, WordVisual};

/// Outline stroke width as a fraction of the font size.
pub const OUTLINE_WIDTH_EM: f64 = 0.04;
/// Faux-bold stroke width as a fraction of the font size.
pub const FAUX_BOLD_WIDTH_EM: f64 = 0.03;
/// 3D shadow offset as a fraction of the font size (never below 2 px).
pub const SHADOW_OFFSET_EM: f64 = 0.05;
const NEON_GLOW_RINGS: u32 = 4;
const NEON_RING_WIDTH_EM: f64 = 0.05;
const NEON_RING_OPACITY: f32 = 0.12;

/// 3D shadow offset in pixels for `font_size_px`.
pub fn shadow_offset_px(font_size_px: f64) -> f64 {
    (SHADOW_OFFSET_EM * font_size_px).max(2.0)
}

/// CPU painter backed by `vello_cpu`, shaping single characters with Parley.
pub struct CpuPainter {
    canvas: Canvas,
    width: u16,
    height: u16,
    pixmap: vello_cpu::Pixmap,
    font: vello_cpu::peniko::FontData,
    text: TextLayoutEngine,
    glyph_cache: HashMap<(char, u32), Vec<vello_cpu::Glyph>>,
    raster_cache: Option<(usize, vello_cpu::Image)>,
}

impl CpuPainter {
    pub fn new(canvas: Canvas, font: &LoadedFont) -> KineResult<Self> {
        let width: u16 = canvas
            .width
            .try_into()
            .map_err(|_| KineError::validation("canvas width exceeds u16"))?;
        let height: u16 = canvas
            .height
            .try_into()
            .map_err(|_| KineError::validation("canvas height exceeds u16"))?;
        let font_data = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(font.bytes.as_ref().clone()),
            0,
        );
        Ok(Self {
            canvas,
            width,
            height,
            pixmap: vello_cpu::Pixmap::new(width, height),
            font: font_data,
            text: TextLayoutEngine::new(font)?,
            glyph_cache: HashMap::new(),
            raster_cache: None,
        })
    }

    fn glyphs_for(&mut self, ch: char, size_px: f32) -> KineResult<Vec<vello_cpu::Glyph>> {
        let key = (ch, size_px.to_bits());
        if let Some(g) = self.glyph_cache.get(&key) {
            return Ok(g.clone());
        }
        let mut buf = [0u8; 4];
        let layout = self.text.layout_line(ch.encode_utf8(&mut buf), size_px)?;
        let mut glyphs = Vec::new();
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                glyphs.extend(run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                }));
            }
        }
        self.glyph_cache.insert(key, glyphs.clone());
        Ok(glyphs)
    }

    fn raster_paint(&mut self, img: &PreparedImage) -> KineResult<vello_cpu::Image> {
        let key = Arc::as_ptr(&img.rgba8_premul) as usize;
        if let Some((k, paint)) = &self.raster_cache
            && *k == key
        {
            return Ok(paint.clone());
        }
        let pixmap = image_premul_bytes_to_pixmap(img.rgba8_premul.as_slice(), img.width, img.height)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        self.raster_cache = Some((key, paint.clone()));
        Ok(paint)
    }

    fn paint_background(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        background: &BackgroundFrame,
    ) -> KineResult<()> {
        let full = vello_cpu::kurbo::Rect::new(0.0, 0.0, self.canvas.w(), self.canvas.h());
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        match background {
            BackgroundFrame::Clear => {}
            BackgroundFrame::Solid(c) => {
                ctx.set_paint(to_color(*c));
                ctx.fill_rect(&full);
            }
            BackgroundFrame::Raster(img) => {
                let paint = self.raster_paint(img)?;
                ctx.set_transform(affine_to_cpu(cover_transform(img.width, img.height, self.canvas)));
                ctx.set_paint(paint);
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                    0.0,
                    0.0,
                    f64::from(img.width),
                    f64::from(img.height),
                ));
            }
        }
        Ok(())
    }

    fn paint_word(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        word: &WordVisual,
        frame: &FrameState,
    ) -> KineResult<()> {
        if word.alpha <= 0.0 {
            return Ok(());
        }
        let size = frame.font_size_px;
        let center = (word.x + word.width / 2.0, word.y + frame.line_height_px / 2.0);
        let word_xf = Affine::translate(center)
            * Affine::scale(word.scale)
            * Affine::translate((-center.0, -center.1));

        if word.alpha < 1.0 {
            ctx.push_opacity_layer(word.alpha);
        }
        for glyph in &word.glyphs {
            if glyph.ch.is_whitespace() || glyph.alpha <= 0.0 {
                continue;
            }
            let glyphs = self.glyphs_for(glyph.ch, size as f32)?;
            let xf = word_xf * glyph_transform(word, glyph, frame.line_height_px);
            self.paint_glyph(ctx, &glyphs, xf, glyph, frame);
        }
        if word.alpha < 1.0 {
            ctx.pop_layer();
        }
        Ok(())
    }

    fn paint_glyph(
        &self,
        ctx: &mut vello_cpu::RenderContext,
        glyphs: &[vello_cpu::Glyph],
        xf: Affine,
        glyph: &GlyphVisual,
        frame: &FrameState,
    ) {
        let size = frame.font_size_px;
        let color = glyph.color.with_opacity(glyph.alpha);
        let fill = |ctx: &mut vello_cpu::RenderContext, c: Rgba8, at: Affine| {
            ctx.set_transform(affine_to_cpu(at));
            ctx.set_paint(to_color(c));
            ctx.glyph_run(&self.font)
                .font_size(size as f32)
                .fill_glyphs(glyphs.iter().copied());
            if frame.faux_bold {
                ctx.set_stroke(vello_cpu::kurbo::Stroke::new(FAUX_BOLD_WIDTH_EM * size));
                ctx.glyph_run(&self.font)
                    .font_size(size as f32)
                    .stroke_glyphs(glyphs.iter().copied());
            }
        };
        let stroke = |ctx: &mut vello_cpu::RenderContext, c: Rgba8, width: f64| {
            ctx.set_transform(affine_to_cpu(xf));
            ctx.set_paint(to_color(c));
            ctx.set_stroke(vello_cpu::kurbo::Stroke::new(width));
            ctx.glyph_run(&self.font)
                .font_size(size as f32)
                .stroke_glyphs(glyphs.iter().copied());
        };

        match frame.text_style {
            TextStyleMode::Fill => fill(ctx, color, xf),
            TextStyleMode::Outline => stroke(ctx, color, OUTLINE_WIDTH_EM * size),
            TextStyleMode::Neon => {
                let ring = color.with_opacity(NEON_RING_OPACITY);
                for k in (1..=NEON_GLOW_RINGS).rev() {
                    stroke(ctx, ring, NEON_RING_WIDTH_EM * size * f64::from(k));
                }
                let white = Rgba8::rgb(255, 255, 255).with_opacity(f32::from(color.a) / 255.0);
                ctx.set_transform(affine_to_cpu(xf));
                ctx.set_paint(to_color(white));
                ctx.glyph_run(&self.font)
                    .font_size(size as f32)
                    .fill_glyphs(glyphs.iter().copied());
            }
            TextStyleMode::ThreeD => {
                let off = shadow_offset_px(size);
                let shadow = frame.shadow.with_opacity(f32::from(color.a) / 255.0);
                fill(ctx, shadow, Affine::translate((off, off)) * xf);
                fill(ctx, color, xf);
            }
        }
    }
}

impl FramePainter for CpuPainter {
    fn paint(&mut self, background: &BackgroundFrame, frame: &FrameState) -> KineResult<FrameRGBA> {
        clear_pixmap(&mut self.pixmap, [0, 0, 0, 0]);
        let mut ctx = vello_cpu::RenderContext::new(self.width, self.height);
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        self.paint_background(&mut ctx, background)?;
        for word in &frame.words {
            self.paint_word(&mut ctx, word, frame)?;
        }

        ctx.flush();
        ctx.render_to_pixmap(&mut self.pixmap);
        Ok(FrameRGBA {
            width: self.canvas.width,
            height: self.canvas.height,
            data: self.pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }
}

/// Position of one character, scaled around its own vertical center.
fn glyph_transform(word: &WordVisual, glyph: &GlyphVisual, line_height: f64) -> Affine {
    let origin = (word.x + glyph.dx, word.y + glyph.dy);
    if glyph.scale == 1.0 {
        return Affine::translate(origin);
    }
    let mid = line_height / 2.0;
    Affine::translate((origin.0, origin.1 + mid))
        * Affine::scale(glyph.scale)
        * Affine::translate((0.0, -mid))
}

fn to_color(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn clear_pixmap(pixmap: &mut vello_cpu::Pixmap, rgba: [u8; 4]) {
    let data = pixmap.data_as_u8_slice_mut();
    for px in data.chunks_exact_mut(4) {
        px.copy_from_slice(&rgba);
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn image_premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> KineResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| KineError::asset("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| KineError::asset("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(KineError::asset("prepared image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
