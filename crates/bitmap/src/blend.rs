//! Pixel arithmetic
//!
//! All buffers hold straight (non-premultiplied) RGBA8.

use rgss_types::{Color, Tone};

/// One RGBA8 pixel
pub type Rgba8 = [u8; 4];

/// x * y / 255, rounded
#[inline]
pub fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

/// Source-over blend of a straight-alpha pixel, with the source alpha
/// scaled by `opacity / 255`
#[inline]
pub fn blend_over(dst: Rgba8, src: Rgba8, opacity: u8) -> Rgba8 {
    let sa = mul_div255(u16::from(src[3]), u16::from(opacity));
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return [src[0], src[1], src[2], 255];
    }

    let sa = f32::from(sa) / 255.0;
    let da = f32::from(dst[3]) / 255.0;
    let out_a = sa + da * (1.0 - sa);

    let mut out = [0u8; 4];
    for i in 0..3 {
        let c = (f32::from(src[i]) * sa + f32::from(dst[i]) * da * (1.0 - sa)) / out_a;
        out[i] = c.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    out
}

/// Apply a tone: add the channel shift, then desaturate toward luminance
#[inline]
pub fn apply_tone(rgb: [f32; 3], tone: &Tone) -> [f32; 3] {
    let mut out = [
        (rgb[0] + tone.red()).clamp(0.0, 255.0),
        (rgb[1] + tone.green()).clamp(0.0, 255.0),
        (rgb[2] + tone.blue()).clamp(0.0, 255.0),
    ];

    if tone.gray() > 0.0 {
        let gray = tone.gray() / 255.0;
        let lum = 0.299 * out[0] + 0.587 * out[1] + 0.114 * out[2];
        for c in &mut out {
            *c += (lum - *c) * gray;
        }
    }
    out
}

/// Mix toward a color by its alpha
#[inline]
pub fn apply_color(rgb: [f32; 3], color: &Color) -> [f32; 3] {
    let weight = color.alpha() / 255.0;
    [
        rgb[0] + (color.red() - rgb[0]) * weight,
        rgb[1] + (color.green() - rgb[1]) * weight,
        rgb[2] + (color.blue() - rgb[2]) * weight,
    ]
}

/// Tone then color tint, applied to one pixel; alpha is untouched
pub fn shade(pixel: Rgba8, tone: &Tone, tints: &[Color]) -> Rgba8 {
    let mut rgb = [f32::from(pixel[0]), f32::from(pixel[1]), f32::from(pixel[2])];
    if !tone.is_none() {
        rgb = apply_tone(rgb, tone);
    }
    for tint in tints {
        if tint.alpha() > 0.0 {
            rgb = apply_color(rgb, tint);
        }
    }
    [
        rgb[0].round().clamp(0.0, 255.0) as u8,
        rgb[1].round().clamp(0.0, 255.0) as u8,
        rgb[2].round().clamp(0.0, 255.0) as u8,
        pixel[3],
    ]
}

/// Luminance-preserving hue rotation matrix (NTSC weights)
#[derive(Debug, Clone, Copy)]
pub struct HueMatrix {
    m: [[f64; 3]; 3],
}

impl HueMatrix {
    pub fn new(degrees: f64) -> Self {
        let radians = degrees.to_radians();
        let (sin, cos) = radians.sin_cos();

        // Rows are output channels, columns are input channels
        let m = [
            [
                0.213 + cos * 0.787 - sin * 0.213,
                0.715 - cos * 0.715 - sin * 0.715,
                0.072 - cos * 0.072 + sin * 0.928,
            ],
            [
                0.213 - cos * 0.213 + sin * 0.143,
                0.715 + cos * 0.285 + sin * 0.140,
                0.072 - cos * 0.072 - sin * 0.283,
            ],
            [
                0.213 - cos * 0.213 - sin * 0.787,
                0.715 - cos * 0.715 + sin * 0.715,
                0.072 + cos * 0.928 + sin * 0.072,
            ],
        ];
        Self { m }
    }

    #[inline]
    pub fn apply(&self, pixel: Rgba8) -> Rgba8 {
        let r = f64::from(pixel[0]);
        let g = f64::from(pixel[1]);
        let b = f64::from(pixel[2]);
        let row = |i: usize| {
            (r * self.m[i][0] + g * self.m[i][1] + b * self.m[i][2])
                .round()
                .clamp(0.0, 255.0) as u8
        };
        [row(0), row(1), row(2), pixel[3]]
    }
}
