use super::{Color, Image};

/// Describes how to blend pixels together in a [`Blend`] operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlendMode {
    /// Mixes the color channels of every source pixel that is not fully transparent into the
    /// destination with a constant weight:
    ///
    /// `result = dest * (1 - alpha) + src * alpha`
    ///
    /// The source alpha channel only acts as a mask; the destination alpha is kept as is. Fully
    /// transparent source pixels leave the destination untouched.
    Mix { alpha: f32 },
}

impl BlendMode {
    /// The weight used for translucent overlays unless configured otherwise.
    pub const DEFAULT_ALPHA: f32 = 0.5;
}

impl Default for BlendMode {
    fn default() -> Self {
        Self::Mix {
            alpha: Self::DEFAULT_ALPHA,
        }
    }
}

/// A blending operation between two images.
///
/// Returned by [`Image::blend_from`]. The blend is performed when this guard is dropped.
pub struct Blend<'a> {
    dest: &'a mut Image,
    src: &'a Image,
    mode: BlendMode,
}

impl<'a> Blend<'a> {
    pub(super) fn new(dest: &'a mut Image, src: &'a Image) -> Self {
        Self {
            dest,
            src,
            mode: BlendMode::default(),
        }
    }

    /// Sets the blend mode to use.
    pub fn mode(&mut self, mode: BlendMode) -> &mut Self {
        self.mode = mode;
        self
    }
}

impl Drop for Blend<'_> {
    fn drop(&mut self) {
        for (dest, src) in self.dest.buf.pixels_mut().zip(self.src.buf.pixels()) {
            let result = match self.mode {
                BlendMode::Mix { alpha } => blend_mix(Color(dest.0), Color(src.0), alpha),
            };
            dest.0 = result.0;
        }
    }
}

fn blend_mix(dest: Color, src: Color, alpha: f32) -> Color {
    if src.a() == 0 {
        return dest;
    }

    let mix = |d: u8, s: u8| -> u8 {
        let v = f32::from(d) * (1.0 - alpha) + f32::from(s) * alpha;
        v.round().clamp(0.0, 255.0) as u8
    };

    Color([
        mix(dest.r(), src.r()),
        mix(dest.g(), src.g()),
        mix(dest.b(), src.b()),
        dest.a(),
    ])
}
