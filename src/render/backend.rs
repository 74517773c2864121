use crate::assets::background::BackgroundFrame;
use crate::foundation::error::KineResult;
use crate::render::frame::FrameState;

/// A rendered frame.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Straight-alpha copy of the pixel data.
    pub fn to_straight_rgba(&self) -> Vec<u8> {
        if !self.premultiplied {
            return self.data.clone();
        }
        let mut out = self.data.clone();
        for px in out.chunks_exact_mut(4) {
            let a = u16::from(px[3]);
            if a == 0 || a == 255 {
                continue;
            }
            for c in &mut px[..3] {
                *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
            }
        }
        out
    }
}

/// Paints a background plus a [`FrameState`] into pixels.
///
/// The painter exclusively owns its drawing surface.
pub trait FramePainter {
    fn paint(&mut self, background: &BackgroundFrame, frame: &FrameState) -> KineResult<FrameRGBA>;
}
