//! Transformed, tinted quad drawing
//!
//! This is the compositor primitive behind sprites, viewports and
//! `stretch_blt`: one source rectangle mapped through translate / zoom /
//! rotate / mirror, shaded by tone and color, and alpha-blended onto the
//! destination with nearest-neighbour sampling.

use rgss_types::{Color, Rect, Tone};

use crate::blend::{self, mul_div255};
use crate::bitmap::Bitmap;

/// Placement and shading of one quad draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadParams {
    /// Destination of the pivot point
    pub x: f32,
    pub y: f32,
    /// Pivot, relative to the source rectangle's top-left corner
    pub ox: f32,
    pub oy: f32,
    pub zoom_x: f32,
    pub zoom_y: f32,
    /// Rotation in degrees, counter-clockwise on screen
    pub angle: f32,
    /// Flip the source horizontally
    pub mirror: bool,
    pub opacity: u8,
    pub tone: Tone,
    pub color: Color,
    /// Extra tint applied after `color` (sprite flash)
    pub flash: Color,
    /// Rows at the bottom of the source drawn with `bush_opacity`
    pub bush_depth: i32,
    pub bush_opacity: u8,
}

impl Default for QuadParams {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            ox: 0.0,
            oy: 0.0,
            zoom_x: 1.0,
            zoom_y: 1.0,
            angle: 0.0,
            mirror: false,
            opacity: 255,
            tone: Tone::NONE,
            color: Color::CLEAR,
            flash: Color::CLEAR,
            bush_depth: 0,
            bush_opacity: 128,
        }
    }
}

impl QuadParams {
    /// Untransformed draw with its top-left corner at (x, y)
    pub fn at(x: i32, y: i32) -> Self {
        Self {
            x: x as f32,
            y: y as f32,
            ..Self::default()
        }
    }

    fn is_tinted(&self) -> bool {
        !self.tone.is_none() || self.color.alpha() > 0.0 || self.flash.alpha() > 0.0
    }
}

impl Bitmap {
    /// Draw `src_rect` of `src` onto this bitmap through `params`.
    ///
    /// Silently draws nothing when the source region, zoom or opacity is
    /// empty; fails only if either bitmap is disposed.
    pub fn draw_quad(
        &mut self,
        src: &Bitmap,
        src_rect: Rect,
        params: &QuadParams,
    ) -> rgss_types::RgssResult<()> {
        self.check_alive()?;
        src.check_alive()?;

        let Some(src_rect) = src_rect.intersection(&src.rect()) else {
            return Ok(());
        };
        if params.opacity == 0 || params.zoom_x == 0.0 || params.zoom_y == 0.0 {
            return Ok(());
        }

        let w = src_rect.width as f32;
        let h = src_rect.height as f32;
        let (sin, cos) = params.angle.to_radians().sin_cos();

        let forward = |u: f32, v: f32| {
            let px = (u - params.ox) * params.zoom_x;
            let py = (v - params.oy) * params.zoom_y;
            (params.x + px * cos + py * sin, params.y - px * sin + py * cos)
        };

        let corners = [forward(0.0, 0.0), forward(w, 0.0), forward(0.0, h), forward(w, h)];
        let min_x = corners.iter().map(|c| c.0).fold(f32::INFINITY, f32::min);
        let max_x = corners.iter().map(|c| c.0).fold(f32::NEG_INFINITY, f32::max);
        let min_y = corners.iter().map(|c| c.1).fold(f32::INFINITY, f32::min);
        let max_y = corners.iter().map(|c| c.1).fold(f32::NEG_INFINITY, f32::max);

        // Clamp to the destination in float space; the extent of a huge
        // zoom does not fit in i32
        let left = min_x.floor().max(0.0);
        let top = min_y.floor().max(0.0);
        let right = max_x.ceil().min(self.width() as f32);
        let bottom = max_y.ceil().min(self.height() as f32);
        if !(left < right && top < bottom) {
            return Ok(());
        }
        let dest = Rect::new(
            left as i32,
            top as i32,
            (right - left) as i32,
            (bottom - top) as i32,
        );

        let tinted = params.is_tinted();
        let tints = [params.color, params.flash];
        let bush_top = src_rect.height - params.bush_depth.max(0);
        let src_width = src.width() as usize;
        let dst_width = self.width() as usize;

        for dy in dest.top()..dest.bottom() {
            for dx in dest.left()..dest.right() {
                // Inverse transform of the destination pixel centre
                let qx = dx as f32 + 0.5 - params.x;
                let qy = dy as f32 + 0.5 - params.y;
                let u = (qx * cos - qy * sin) / params.zoom_x + params.ox;
                let v = (qx * sin + qy * cos) / params.zoom_y + params.oy;
                if u < 0.0 || v < 0.0 || u >= w || v >= h {
                    continue;
                }

                let mut sx = u as i32;
                let sy = v as i32;
                if params.mirror {
                    sx = src_rect.width - 1 - sx;
                }

                let si = ((src_rect.y + sy) as usize * src_width + (src_rect.x + sx) as usize) * 4;
                let mut pixel = [
                    src.pixels[si],
                    src.pixels[si + 1],
                    src.pixels[si + 2],
                    src.pixels[si + 3],
                ];
                if pixel[3] == 0 {
                    continue;
                }
                if tinted {
                    pixel = blend::shade(pixel, &params.tone, &tints);
                }

                let mut opacity = params.opacity;
                if params.bush_depth > 0 && sy >= bush_top {
                    opacity = mul_div255(u16::from(opacity), u16::from(params.bush_opacity));
                }

                let di = (dy as usize * dst_width + dx as usize) * 4;
                let dst = [
                    self.pixels[di],
                    self.pixels[di + 1],
                    self.pixels[di + 2],
                    self.pixels[di + 3],
                ];
                let out = blend::blend_over(dst, pixel, opacity);
                self.pixels[di..di + 4].copy_from_slice(&out);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red_square(size: i32) -> Bitmap {
        let mut bmp = Bitmap::new(size, size).unwrap();
        bmp.fill_rect(bmp.rect(), Color::rgb(255.0, 0.0, 0.0)).unwrap();
        bmp
    }

    #[test]
    fn test_identity_copy() {
        let src = red_square(4);
        let mut dst = Bitmap::new(10, 10).unwrap();
        dst.draw_quad(&src, src.rect(), &QuadParams::at(3, 2)).unwrap();

        assert_eq!(dst.get_pixel(3, 2).unwrap().to_rgba8(), [255, 0, 0, 255]);
        assert_eq!(dst.get_pixel(6, 5).unwrap().to_rgba8(), [255, 0, 0, 255]);
        assert!(dst.get_pixel(7, 5).unwrap().is_transparent());
        assert!(dst.get_pixel(2, 2).unwrap().is_transparent());
    }

    #[test]
    fn test_origin_offsets_position() {
        let src = red_square(4);
        let mut dst = Bitmap::new(10, 10).unwrap();
        let params = QuadParams {
            x: 5.0,
            y: 5.0,
            ox: 2.0,
            oy: 2.0,
            ..QuadParams::default()
        };
        dst.draw_quad(&src, src.rect(), &params).unwrap();
        assert!(!dst.get_pixel(3, 3).unwrap().is_transparent());
        assert!(dst.get_pixel(2, 2).unwrap().is_transparent());
        assert!(dst.get_pixel(7, 7).unwrap().is_transparent());
    }

    #[test]
    fn test_zoom_doubles_size() {
        let src = red_square(2);
        let mut dst = Bitmap::new(8, 8).unwrap();
        let params = QuadParams {
            zoom_x: 2.0,
            zoom_y: 2.0,
            ..QuadParams::default()
        };
        dst.draw_quad(&src, src.rect(), &params).unwrap();
        assert!(!dst.get_pixel(3, 3).unwrap().is_transparent());
        assert!(dst.get_pixel(4, 0).unwrap().is_transparent());
    }

    #[test]
    fn test_huge_zoom_clips_to_destination() {
        let src = red_square(2);
        let mut dst = Bitmap::new(8, 8).unwrap();
        let off_screen = QuadParams {
            x: 10.0,
            zoom_x: 1e10,
            ..QuadParams::default()
        };
        dst.draw_quad(&src, src.rect(), &off_screen).unwrap();
        assert!(dst.pixels().unwrap().iter().all(|&b| b == 0));

        let across = QuadParams {
            x: -10.0,
            zoom_x: 1e10,
            ..QuadParams::default()
        };
        dst.draw_quad(&src, src.rect(), &across).unwrap();
        assert_eq!(dst.get_pixel(0, 0).unwrap().to_rgba8(), [255, 0, 0, 255]);
        assert_eq!(dst.get_pixel(7, 1).unwrap().to_rgba8(), [255, 0, 0, 255]);
        assert!(dst.get_pixel(0, 2).unwrap().is_transparent());
    }

    #[test]
    fn test_mirror_flips_columns() {
        let mut src = Bitmap::new(2, 1).unwrap();
        src.set_pixel(0, 0, Color::rgb(255.0, 0.0, 0.0)).unwrap();
        src.set_pixel(1, 0, Color::rgb(0.0, 0.0, 255.0)).unwrap();

        let mut dst = Bitmap::new(2, 1).unwrap();
        let params = QuadParams {
            mirror: true,
            ..QuadParams::default()
        };
        dst.draw_quad(&src, src.rect(), &params).unwrap();
        assert_eq!(dst.get_pixel(0, 0).unwrap().to_rgba8(), [0, 0, 255, 255]);
        assert_eq!(dst.get_pixel(1, 0).unwrap().to_rgba8(), [255, 0, 0, 255]);
    }

    #[test]
    fn test_rotation_quarter_turn() {
        // A 3x1 bar rotated 90 degrees about its left end points upward
        let mut src = Bitmap::new(3, 1).unwrap();
        src.fill_rect(src.rect(), Color::WHITE).unwrap();

        let mut dst = Bitmap::new(8, 8).unwrap();
        let params = QuadParams {
            x: 4.0,
            y: 4.0,
            angle: 90.0,
            ..QuadParams::default()
        };
        dst.draw_quad(&src, src.rect(), &params).unwrap();
        assert!(!dst.get_pixel(4, 2).unwrap().is_transparent());
        assert!(dst.get_pixel(6, 4).unwrap().is_transparent());
    }

    #[test]
    fn test_opacity_scales_alpha() {
        let src = red_square(1);
        let mut dst = Bitmap::new(1, 1).unwrap();
        let params = QuadParams {
            opacity: 128,
            ..QuadParams::default()
        };
        dst.draw_quad(&src, src.rect(), &params).unwrap();
        assert_eq!(dst.get_pixel(0, 0).unwrap().to_rgba8(), [255, 0, 0, 128]);
    }

    #[test]
    fn test_tone_applied_before_blend() {
        let src = red_square(1);
        let mut dst = Bitmap::new(1, 1).unwrap();
        let params = QuadParams {
            tone: Tone::new(-255.0, 255.0, 0.0, 0.0),
            ..QuadParams::default()
        };
        dst.draw_quad(&src, src.rect(), &params).unwrap();
        assert_eq!(dst.get_pixel(0, 0).unwrap().to_rgba8(), [0, 255, 0, 255]);
    }

    #[test]
    fn test_bush_depth_fades_bottom_rows() {
        let src = red_square(4);
        let mut dst = Bitmap::new(4, 4).unwrap();
        let params = QuadParams {
            bush_depth: 1,
            bush_opacity: 128,
            ..QuadParams::default()
        };
        dst.draw_quad(&src, src.rect(), &params).unwrap();
        assert_eq!(dst.get_pixel(0, 2).unwrap().to_rgba8()[3], 255);
        assert_eq!(dst.get_pixel(0, 3).unwrap().to_rgba8()[3], 128);
    }

    #[test]
    fn test_disposed_source_fails() {
        let mut src = red_square(2);
        src.dispose();
        let mut dst = Bitmap::new(2, 2).unwrap();
        let err = dst.draw_quad(&src, Rect::new(0, 0, 2, 2), &QuadParams::default());
        assert!(err.unwrap_err().is_resource_state());
    }
}
