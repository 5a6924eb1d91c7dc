//! In-memory RGB framebuffer for the debug images.
//!
//! Implements `embedded_graphics::DrawTarget` so the usual primitives and
//! fonts draw into it, and exports the result as an 8-bit RGB PNG.

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::prelude::*;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CanvasError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("PNG encoding error: {0}")]
    Png(#[from] png::EncodingError),
}

/// RGB framebuffer, 3 bytes per pixel, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    /// New canvas filled with black
    pub fn new(width: u32, height: u32) -> Self {
        let buffer_size = width as usize * height as usize * 3;
        Self {
            width,
            height,
            pixels: vec![0; buffer_size],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGB bytes
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * 3)
    }

    /// Color at `(x, y)`, `None` outside the canvas
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb888> {
        let i = self.offset(x, y)?;
        Some(Rgb888::new(
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
        ))
    }

    /// Set one pixel; writes outside the canvas are clipped
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgb888) {
        if let Some(i) = self.offset(x, y) {
            self.pixels[i] = color.r();
            self.pixels[i + 1] = color.g();
            self.pixels[i + 2] = color.b();
        }
    }

    /// Encode the canvas as PNG into `writer`
    pub fn write_png<W: Write>(&self, writer: W) -> Result<(), CanvasError> {
        let mut encoder = png::Encoder::new(writer, self.width, self.height);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder.write_header()?;
        writer.write_image_data(&self.pixels)?;
        writer.finish()?;
        Ok(())
    }

    /// PNG bytes of the canvas
    pub fn encode_png(&self) -> Result<Vec<u8>, CanvasError> {
        let mut bytes = Vec::new();
        self.write_png(&mut bytes)?;
        Ok(bytes)
    }

    /// Write the canvas to `path` as PNG
    pub fn save_png(&self, path: &Path) -> Result<(), CanvasError> {
        let file = File::create(path)?;
        let mut out = BufWriter::new(file);
        self.write_png(&mut out)?;
        out.flush()?;
        Ok(())
    }
}

impl DrawTarget for Canvas {
    type Color = Rgb888;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let (Ok(x), Ok(y)) = (u32::try_from(point.x), u32::try_from(point.y)) {
                self.set_pixel(x, y, color);
            }
        }
        Ok(())
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}
