//! Color tone (additive shift plus desaturation)

use serde::{Deserialize, Serialize};

use crate::error::RgssResult;

/// Tone applied at composite time.
///
/// Red, green and blue are added to each channel (range -255..=255),
/// gray desaturates toward luminance (range 0..=255).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct Tone {
    red: f32,
    green: f32,
    blue: f32,
    gray: f32,
}

impl Tone {
    /// The no-op tone
    pub const NONE: Tone = Tone { red: 0.0, green: 0.0, blue: 0.0, gray: 0.0 };

    pub fn new(red: f32, green: f32, blue: f32, gray: f32) -> Self {
        let mut tone = Self::NONE;
        tone.set(red, green, blue, gray);
        tone
    }

    pub fn set(&mut self, red: f32, green: f32, blue: f32, gray: f32) {
        self.set_red(red);
        self.set_green(green);
        self.set_blue(blue);
        self.set_gray(gray);
    }

    pub fn red(&self) -> f32 {
        self.red
    }

    pub fn green(&self) -> f32 {
        self.green
    }

    pub fn blue(&self) -> f32 {
        self.blue
    }

    pub fn gray(&self) -> f32 {
        self.gray
    }

    pub fn set_red(&mut self, value: f32) {
        self.red = clamp(value, -255.0, 255.0);
    }

    pub fn set_green(&mut self, value: f32) {
        self.green = clamp(value, -255.0, 255.0);
    }

    pub fn set_blue(&mut self, value: f32) {
        self.blue = clamp(value, -255.0, 255.0);
    }

    pub fn set_gray(&mut self, value: f32) {
        self.gray = clamp(value, 0.0, 255.0);
    }

    /// Whether applying this tone changes nothing
    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }

    /// Serialize as four little-endian doubles (R, G, B, Gray)
    pub fn dump(&self) -> Vec<u8> {
        crate::write_f64s(&[
            self.red as f64,
            self.green as f64,
            self.blue as f64,
            self.gray as f64,
        ])
    }

    /// Deserialize from four little-endian doubles
    pub fn load(bytes: &[u8]) -> RgssResult<Self> {
        let [r, g, b, gray] = crate::read_f64s::<4>(bytes, "Tone")?;
        Ok(Self::new(r as f32, g as f32, b as f32, gray as f32))
    }
}

impl Default for Tone {
    fn default() -> Self {
        Self::NONE
    }
}

impl From<[f32; 4]> for Tone {
    fn from(t: [f32; 4]) -> Self {
        Self::new(t[0], t[1], t[2], t[3])
    }
}

impl From<Tone> for [f32; 4] {
    fn from(t: Tone) -> Self {
        [t.red, t.green, t.blue, t.gray]
    }
}

fn clamp(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(min, max)
    }
}
