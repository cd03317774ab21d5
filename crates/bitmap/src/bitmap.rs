//! Bitmap: an RGBA pixel buffer
//!
//! Every drawable's content lives in a `Bitmap`. Pixels are stored as
//! straight-alpha RGBA8, row-major, and every mutation is immediate.

use std::path::Path;

use log::{debug, trace};
use rgss_types::{Color, Rect, RgssError, RgssResult};

use crate::blend::{self, HueMatrix, Rgba8};
use crate::font::Font;
use crate::loader;
use crate::quad::QuadParams;
use crate::text::{self, TextAlign};

/// Fixed-size RGBA pixel buffer with an owned font
#[derive(Debug)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pub(crate) pixels: Vec<u8>,
    font: Font,
    disposed: bool,
}

impl Bitmap {
    /// Create a transparent bitmap. Both dimensions must be at least 1.
    pub fn new(width: i32, height: i32) -> RgssResult<Self> {
        if width < 1 {
            return Err(RgssError::construction(format!(
                "Bitmap width must be greater than 0, got {}",
                width
            )));
        }
        if height < 1 {
            return Err(RgssError::construction(format!(
                "Bitmap height must be greater than 0, got {}",
                height
            )));
        }

        Ok(Self {
            width: width as u32,
            height: height as u32,
            pixels: vec![0; width as usize * height as usize * 4],
            font: Font::default(),
            disposed: false,
        })
    }

    /// Wrap existing RGBA8 data
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> RgssResult<Self> {
        if width == 0 || height == 0 {
            return Err(RgssError::construction(format!(
                "Bitmap size must be at least 1x1, got {}x{}",
                width, height
            )));
        }
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(RgssError::construction(format!(
                "RGBA data holds {} bytes, expected {}",
                data.len(),
                expected
            )));
        }

        Ok(Self {
            width,
            height,
            pixels: data,
            font: Font::default(),
            disposed: false,
        })
    }

    /// Load and decode an image file
    pub fn from_file(path: impl AsRef<Path>) -> RgssResult<Self> {
        let image = loader::load_file(path.as_ref())?;
        Self::from_rgba(image.width, image.height, image.data)
    }

    /// Decode an encoded image (PNG, JPEG, GIF, WebP)
    pub fn from_memory(bytes: &[u8]) -> RgssResult<Self> {
        let image = loader::decode_image(bytes)?;
        Self::from_rgba(image.width, image.height, image.data)
    }

    /// Copy another bitmap's current content and font
    pub fn copy_of(other: &Bitmap) -> RgssResult<Self> {
        other.check_alive()?;
        Ok(Self {
            width: other.width,
            height: other.height,
            pixels: other.pixels.clone(),
            font: other.font.clone(),
            disposed: false,
        })
    }

    pub(crate) fn check_alive(&self) -> RgssResult<()> {
        if self.disposed {
            Err(RgssError::disposed("Bitmap"))
        } else {
            Ok(())
        }
    }

    /// Release the pixel storage. Calling this twice is harmless.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        debug!("Disposing {}x{} bitmap", self.width, self.height);
        self.pixels = Vec::new();
        self.font.release_face();
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bounding rectangle `(0, 0, width, height)`
    pub fn rect(&self) -> Rect {
        Rect::new(0, 0, self.width as i32, self.height as i32)
    }

    pub fn font(&self) -> &Font {
        &self.font
    }

    pub fn font_mut(&mut self) -> &mut Font {
        &mut self.font
    }

    pub fn set_font(&mut self, font: Font) {
        self.font = font;
    }

    /// Raw RGBA8 bytes, row-major
    pub fn pixels(&self) -> RgssResult<&[u8]> {
        self.check_alive()?;
        Ok(&self.pixels)
    }

    /// Mutable raw RGBA8 bytes, row-major
    pub fn pixels_mut(&mut self) -> RgssResult<&mut [u8]> {
        self.check_alive()?;
        Ok(&mut self.pixels)
    }

    #[inline]
    fn offset(&self, x: i32, y: i32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    #[inline]
    pub(crate) fn pixel_at(&self, x: i32, y: i32) -> Rgba8 {
        let i = self.offset(x, y);
        [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]]
    }

    #[inline]
    pub(crate) fn put_pixel(&mut self, x: i32, y: i32, rgba: Rgba8) {
        let i = self.offset(x, y);
        self.pixels[i..i + 4].copy_from_slice(&rgba);
    }

    /// Read a pixel. Coordinates outside the bitmap read as `Color::CLEAR`.
    pub fn get_pixel(&self, x: i32, y: i32) -> RgssResult<Color> {
        self.check_alive()?;
        if !self.rect().contains(x, y) {
            return Ok(Color::CLEAR);
        }
        Ok(Color::from_rgba8(self.pixel_at(x, y)))
    }

    /// Write a pixel. Coordinates outside the bitmap are ignored.
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Color) -> RgssResult<()> {
        self.check_alive()?;
        if self.rect().contains(x, y) {
            self.put_pixel(x, y, color.to_rgba8());
        } else {
            trace!("set_pixel out of range at ({}, {})", x, y);
        }
        Ok(())
    }

    /// Overwrite every pixel in `rect` with `color` (no blending)
    pub fn fill_rect(&mut self, rect: Rect, color: Color) -> RgssResult<()> {
        self.check_alive()?;
        let Some(area) = rect.intersection(&self.rect()) else {
            return Ok(());
        };

        let rgba = color.to_rgba8();
        for y in area.top()..area.bottom() {
            let start = self.offset(area.left(), y);
            let end = self.offset(area.right(), y);
            for px in self.pixels[start..end].chunks_exact_mut(4) {
                px.copy_from_slice(&rgba);
            }
        }
        Ok(())
    }

    /// Reset the whole bitmap to transparent black
    pub fn clear(&mut self) -> RgssResult<()> {
        self.check_alive()?;
        self.pixels.fill(0);
        Ok(())
    }

    /// Reset one region to transparent black
    pub fn clear_rect(&mut self, rect: Rect) -> RgssResult<()> {
        self.fill_rect(rect, Color::CLEAR)
    }

    /// Copy `src_rect` of `src` to (x, y) without scaling.
    ///
    /// At full opacity the pixels are overwritten; below that they are
    /// alpha-blended. The copy is clipped to both bitmaps.
    pub fn blt(&mut self, x: i32, y: i32, src: &Bitmap, src_rect: Rect, opacity: i32) -> RgssResult<()> {
        self.check_alive()?;
        src.check_alive()?;

        let opacity = opacity.clamp(0, 255) as u8;
        if opacity == 0 {
            return Ok(());
        }

        let Some(from) = src_rect.intersection(&src.rect()) else {
            return Ok(());
        };
        // Shift the destination by however much the source was clipped
        let dest = Rect::new(
            x.saturating_add(from.x - src_rect.x),
            y.saturating_add(from.y - src_rect.y),
            from.width,
            from.height,
        );
        let Some(to) = dest.intersection(&self.rect()) else {
            return Ok(());
        };
        let sx = from.x + (to.x - dest.x);
        let sy = from.y + (to.y - dest.y);

        for row in 0..to.height {
            let src_start = src.offset(sx, sy + row);
            let dst_start = self.offset(to.x, to.y + row);
            let len = to.width as usize * 4;
            let src_row = &src.pixels[src_start..src_start + len];
            let dst_row = &mut self.pixels[dst_start..dst_start + len];

            if opacity == 255 {
                dst_row.copy_from_slice(src_row);
            } else {
                for (d, s) in dst_row.chunks_exact_mut(4).zip(src_row.chunks_exact(4)) {
                    let out = blend::blend_over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
                    d.copy_from_slice(&out);
                }
            }
        }
        Ok(())
    }

    /// Scale `src_rect` of `src` into `dest_rect`, alpha-blended with
    /// `opacity / 255`
    pub fn stretch_blt(&mut self, dest_rect: Rect, src: &Bitmap, src_rect: Rect, opacity: i32) -> RgssResult<()> {
        self.check_alive()?;
        src.check_alive()?;
        if dest_rect.is_empty() || src_rect.is_empty() {
            return Ok(());
        }

        let params = QuadParams {
            x: dest_rect.x as f32,
            y: dest_rect.y as f32,
            zoom_x: dest_rect.width as f32 / src_rect.width as f32,
            zoom_y: dest_rect.height as f32 / src_rect.height as f32,
            opacity: opacity.clamp(0, 255) as u8,
            ..QuadParams::default()
        };
        self.draw_quad(src, src_rect, &params)
    }

    /// Rotate the hue of every pixel by `degrees`; alpha is untouched
    pub fn hue_change(&mut self, degrees: i32) -> RgssResult<()> {
        self.check_alive()?;
        if degrees % 360 == 0 {
            return Ok(());
        }

        let matrix = HueMatrix::new(f64::from(degrees));
        for px in self.pixels.chunks_exact_mut(4) {
            let out = matrix.apply([px[0], px[1], px[2], px[3]]);
            px.copy_from_slice(&out);
        }
        Ok(())
    }

    /// Rasterize `text` into `rect` with the bitmap's font.
    ///
    /// The rect is first clamped to the bitmap. Without `wrap` the text is
    /// a single line centred vertically; with `wrap` it breaks at word
    /// boundaries and newlines, starting at the top.
    pub fn draw_text(&mut self, rect: Rect, text: &str, align: TextAlign, wrap: bool) -> RgssResult<()> {
        self.check_alive()?;
        let face = self.font.face().ok_or_else(|| {
            RgssError::Font(format!("font '{}' has no loaded typeface", self.font.name()))
        })?;

        let mut rect = rect;
        rect.width = rect.width.min((self.width as i32).saturating_sub(rect.x));
        rect.height = rect.height.min((self.height as i32).saturating_sub(rect.y));
        let Some(area) = rect.intersection(&self.rect()) else {
            return Ok(());
        };
        if text.is_empty() {
            return Ok(());
        }

        // Work on a detached copy of the region, then write it back
        let mut data = self.read_region(area);
        let mut scratch = text::Scratch {
            data: &mut data,
            width: area.width as usize,
            height: area.height as usize,
        };
        let layout_rect = rect.translate(-area.x, -area.y);
        text::render(&mut scratch, layout_rect, &self.font, face.as_ref(), text, align, wrap);
        self.write_region(area, &data);
        Ok(())
    }

    /// Width in pixels of `text` drawn with the bitmap's font
    pub fn measure_text(&self, text: &str) -> RgssResult<u32> {
        self.check_alive()?;
        let face = self.font.face().ok_or_else(|| {
            RgssError::Font(format!("font '{}' has no loaded typeface", self.font.name()))
        })?;
        Ok(text::measure(face.as_ref(), &self.font, text).ceil() as u32)
    }

    /// Size of `text` as a rect at the origin (width, line height)
    pub fn text_size(&self, text: &str) -> RgssResult<Rect> {
        let width = self.measure_text(text)?;
        let height = self
            .font
            .face()
            .map(|face| face.line_metrics(self.font.size() as f32).line_height.ceil() as i32)
            .unwrap_or(0);
        Ok(Rect::new(0, 0, width as i32, height))
    }

    /// Copy a region (already clipped to the bitmap) into a fresh buffer
    fn read_region(&self, area: Rect) -> Vec<u8> {
        let row_len = area.width as usize * 4;
        let mut out = Vec::with_capacity(row_len * area.height as usize);
        for y in area.top()..area.bottom() {
            let start = self.offset(area.x, y);
            out.extend_from_slice(&self.pixels[start..start + row_len]);
        }
        out
    }

    fn write_region(&mut self, area: Rect, data: &[u8]) {
        let row_len = area.width as usize * 4;
        for (row, chunk) in data.chunks_exact(row_len).enumerate() {
            let start = self.offset(area.x, area.y + row as i32);
            self.pixels[start..start + row_len].copy_from_slice(chunk);
        }
    }

    /// Encode the bitmap as a PNG file
    pub fn save_png(&self, path: impl AsRef<Path>) -> RgssResult<()> {
        self.check_alive()?;
        loader::save_png(path.as_ref(), self.width, self.height, &self.pixels)
    }
}
