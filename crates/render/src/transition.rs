//! Screen transitions
//!
//! A dissolve from the frozen frame to the live one. Each pixel switches
//! over once the transition progress passes its threshold; `vague` widens
//! the switch into a soft band.

use log::debug;
use rgss_bitmap::Bitmap;
use rgss_types::{RgssError, RgssResult};

/// Widest allowed softness band
pub const MAX_VAGUE: i32 = 256;

/// Deterministic per-pixel noise used when no mask image is given
pub fn noise(x: u32, y: u32) -> u8 {
    let mut h = x.wrapping_mul(0x9E37_79B1) ^ y.wrapping_mul(0x85EB_CA77);
    h ^= h >> 15;
    h = h.wrapping_mul(0x2C1B_3C6D);
    h ^= h >> 12;
    h = h.wrapping_mul(0x297A_2D39);
    h ^= h >> 15;
    (h >> 24) as u8
}

/// Rec. 601 luma of an RGBA pixel
pub fn luminance(px: [u8; 4]) -> u8 {
    let y = 0.299 * f32::from(px[0]) + 0.587 * f32::from(px[1]) + 0.114 * f32::from(px[2]);
    y.round().clamp(0.0, 255.0) as u8
}

/// Active dissolve between two full-screen frames
#[derive(Debug, Clone)]
pub struct Dissolve {
    width: u32,
    height: u32,
    thresholds: Vec<u8>,
    vague: f32,
    /// Duration in frames
    duration: u32,
    elapsed: u32,
}

impl Dissolve {
    /// Build thresholds from `mask` (nearest-scaled to the screen) or from
    /// noise
    pub fn new(width: u32, height: u32, duration: u32, vague: i32, mask: Option<&Bitmap>) -> RgssResult<Self> {
        let len = width as usize * height as usize;
        let mut thresholds = Vec::with_capacity(len);

        match mask {
            Some(mask) => {
                let pixels = mask.pixels()?;
                let (mw, mh) = (mask.width() as u64, mask.height() as u64);
                for y in 0..height as u64 {
                    let my = y * mh / height as u64;
                    for x in 0..width as u64 {
                        let mx = x * mw / width as u64;
                        let i = ((my * mw + mx) * 4) as usize;
                        thresholds.push(luminance([pixels[i], pixels[i + 1], pixels[i + 2], pixels[i + 3]]));
                    }
                }
            }
            None => {
                for y in 0..height {
                    for x in 0..width {
                        thresholds.push(noise(x, y));
                    }
                }
            }
        }

        debug!(
            "Dissolve over {} frame(s), vague {}, {}",
            duration,
            vague,
            if mask.is_some() { "masked" } else { "noise" }
        );

        Ok(Self {
            width,
            height,
            thresholds,
            vague: vague.clamp(1, MAX_VAGUE) as f32,
            duration: duration.max(1),
            elapsed: 0,
        })
    }

    /// Get the progress (0.0 to 1.0)
    pub fn progress(&self) -> f32 {
        (self.elapsed as f32 / self.duration as f32).clamp(0.0, 1.0)
    }

    /// Step one frame forward
    pub fn advance(&mut self) {
        self.elapsed = (self.elapsed + 1).min(self.duration);
    }

    /// Check if transition is complete
    pub fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Weight of the new frame at a pixel for the current progress
    fn weight(&self, threshold: u8) -> f32 {
        let level = self.progress() * (255.0 + self.vague);
        ((level - f32::from(threshold)) / self.vague).clamp(0.0, 1.0)
    }

    /// Mix `from` (frozen) and `to` (live) into `out`
    pub fn compose(&self, from: &Bitmap, to: &Bitmap, out: &mut Bitmap) -> RgssResult<()> {
        for bmp in [from, to, &*out] {
            if bmp.width() != self.width || bmp.height() != self.height {
                return Err(RgssError::invalid_data(format!(
                    "transition frame is {}x{}, expected {}x{}",
                    bmp.width(),
                    bmp.height(),
                    self.width,
                    self.height
                )));
            }
        }

        let src = from.pixels()?;
        let dst = to.pixels()?;
        let out = out.pixels_mut()?;
        for (i, &threshold) in self.thresholds.iter().enumerate() {
            let t = self.weight(threshold);
            let at = i * 4;
            for c in at..at + 4 {
                let a = f32::from(src[c]);
                let b = f32::from(dst[c]);
                out[c] = (a + (b - a) * t).round() as u8;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rgss_types::Color;

    fn solid(width: i32, height: i32, color: Color) -> Bitmap {
        let mut bmp = Bitmap::new(width, height).unwrap();
        bmp.fill_rect(bmp.rect(), color).unwrap();
        bmp
    }

    #[test]
    fn test_noise_is_deterministic() {
        assert_eq!(noise(3, 7), noise(3, 7));
        let distinct: std::collections::HashSet<u8> =
            (0..64).map(|i| noise(i % 8, i / 8)).collect();
        assert!(distinct.len() > 16);
    }

    #[test]
    fn test_luminance() {
        assert_eq!(luminance([0, 0, 0, 255]), 0);
        assert_eq!(luminance([255, 255, 255, 0]), 255);
        assert_eq!(luminance([255, 0, 0, 255]), 76);
    }

    #[test]
    fn test_progress_runs_to_completion() {
        let mut dissolve = Dissolve::new(1, 1, 4, 40, None).unwrap();
        assert_eq!(dissolve.progress(), 0.0);
        for _ in 0..3 {
            dissolve.advance();
        }
        assert!(!dissolve.is_complete());
        dissolve.advance();
        dissolve.advance();
        assert!(dissolve.is_complete());
        assert_eq!(dissolve.progress(), 1.0);
    }

    #[test]
    fn test_compose_endpoints() {
        let from = solid(4, 4, Color::BLACK);
        let to = solid(4, 4, Color::WHITE);
        let mut out = Bitmap::new(4, 4).unwrap();

        let mut dissolve = Dissolve::new(4, 4, 2, 64, None).unwrap();
        dissolve.compose(&from, &to, &mut out).unwrap();
        assert_eq!(out.pixels().unwrap(), from.pixels().unwrap());

        dissolve.advance();
        dissolve.advance();
        dissolve.compose(&from, &to, &mut out).unwrap();
        assert_eq!(out.pixels().unwrap(), to.pixels().unwrap());
    }

    #[test]
    fn test_mask_orders_pixels() {
        // Left half dark, right half bright: dark pixels switch first
        let mut mask = Bitmap::new(2, 1).unwrap();
        mask.set_pixel(0, 0, Color::BLACK).unwrap();
        mask.set_pixel(1, 0, Color::WHITE).unwrap();

        let from = solid(4, 2, Color::BLACK);
        let to = solid(4, 2, Color::WHITE);
        let mut out = Bitmap::new(4, 2).unwrap();

        let mut dissolve = Dissolve::new(4, 2, 2, 1, Some(&mask)).unwrap();
        dissolve.advance();
        dissolve.compose(&from, &to, &mut out).unwrap();

        assert_eq!(out.get_pixel(0, 0).unwrap(), Color::WHITE);
        assert_eq!(out.get_pixel(1, 1).unwrap(), Color::WHITE);
        assert_eq!(out.get_pixel(2, 0).unwrap(), Color::BLACK);
        assert_eq!(out.get_pixel(3, 1).unwrap(), Color::BLACK);
    }

    #[test]
    fn test_size_mismatch() {
        let dissolve = Dissolve::new(2, 2, 1, 1, None).unwrap();
        let a = Bitmap::new(2, 2).unwrap();
        let b = Bitmap::new(3, 2).unwrap();
        let mut out = Bitmap::new(2, 2).unwrap();
        assert!(dissolve.compose(&a, &b, &mut out).is_err());
    }
}
