use ab_glyph::{FontRef, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};

use crate::errors::Result;

/// DejaVu Sans, embedded so maps render the same everywhere.
const FONT_DATA: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

/// Font used for every label on the map.
#[derive(Debug, Clone)]
pub struct Typeface {
    font: FontRef<'static>,
}

impl Typeface {
    pub fn load() -> Result<Self> {
        Ok(Self {
            font: FontRef::try_from_slice(FONT_DATA)?,
        })
    }

    /// Size in canvas pixels of `text` set at `size` pixels.
    pub fn measure(&self, text: &str, size: f32) -> (u32, u32) {
        text_size(PxScale::from(size), &self.font, text)
    }

    /// Draws `text` with its top left corner at `(x, y)`.
    pub fn draw(&self, canvas: &mut RgbImage, x: i32, y: i32, size: f32, text: &str, color: Rgb<u8>) {
        draw_text_mut(canvas, color, x, y, PxScale::from(size), &self.font, text);
    }
}
