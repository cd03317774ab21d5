//! RGBA color with clamped float channels

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{RgssError, RgssResult};

/// Color with four channels in the range 0..=255.
///
/// Channels are stored as floats so scripts can assign fractional values;
/// every assignment is clamped. The packed 8-bit form rounds to the
/// nearest integer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct Color {
    red: f32,
    green: f32,
    blue: f32,
    alpha: f32,
}

impl Color {
    pub const WHITE: Color = Color { red: 255.0, green: 255.0, blue: 255.0, alpha: 255.0 };
    pub const BLACK: Color = Color { red: 0.0, green: 0.0, blue: 0.0, alpha: 255.0 };
    pub const CLEAR: Color = Color { red: 0.0, green: 0.0, blue: 0.0, alpha: 0.0 };

    /// Create a color, clamping each channel
    pub fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        let mut color = Self::CLEAR;
        color.set(red, green, blue, alpha);
        color
    }

    /// Create an opaque color
    pub fn rgb(red: f32, green: f32, blue: f32) -> Self {
        Self::new(red, green, blue, 255.0)
    }

    /// Assign all four channels at once
    pub fn set(&mut self, red: f32, green: f32, blue: f32, alpha: f32) {
        self.set_red(red);
        self.set_green(green);
        self.set_blue(blue);
        self.set_alpha(alpha);
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

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn set_red(&mut self, value: f32) {
        self.red = clamp_channel(value);
    }

    pub fn set_green(&mut self, value: f32) {
        self.green = clamp_channel(value);
    }

    pub fn set_blue(&mut self, value: f32) {
        self.blue = clamp_channel(value);
    }

    pub fn set_alpha(&mut self, value: f32) {
        self.alpha = clamp_channel(value);
    }

    /// Convert to 8-bit RGBA
    pub fn to_rgba8(&self) -> [u8; 4] {
        [
            self.red.round() as u8,
            self.green.round() as u8,
            self.blue.round() as u8,
            self.alpha.round() as u8,
        ]
    }

    /// Build a color from 8-bit RGBA
    pub fn from_rgba8(rgba: [u8; 4]) -> Self {
        Self {
            red: rgba[0] as f32,
            green: rgba[1] as f32,
            blue: rgba[2] as f32,
            alpha: rgba[3] as f32,
        }
    }

    /// Packed value with red in the low byte (ABGR order in a u32)
    pub fn packed(&self) -> u32 {
        u32::from_le_bytes(self.to_rgba8())
    }

    /// Check if color is fully transparent
    pub fn is_transparent(&self) -> bool {
        self.to_rgba8()[3] == 0
    }

    /// HTML-style hex string, `#RRGGBB`, or `#RRGGBBAA` when not opaque
    pub fn to_hex(&self) -> String {
        let [r, g, b, a] = self.to_rgba8();
        if a == 255 {
            format!("#{:02X}{:02X}{:02X}", r, g, b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", r, g, b, a)
        }
    }

    /// Parse `RRGGBB` or `RRGGBBAA`, with or without a leading `#`
    pub fn from_hex(hex: &str) -> RgssResult<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if !(digits.len() == 6 || digits.len() == 8) || !digits.is_ascii() {
            return Err(RgssError::invalid_data(format!("invalid color '{}'", hex)));
        }

        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| RgssError::invalid_data(format!("invalid color '{}'", hex)))
        };

        let alpha = if digits.len() == 8 { channel(6)? } else { 255 };
        Ok(Self::from_rgba8([channel(0)?, channel(2)?, channel(4)?, alpha]))
    }

    /// Serialize as four little-endian doubles (R, G, B, A)
    pub fn dump(&self) -> Vec<u8> {
        crate::write_f64s(&[
            self.red as f64,
            self.green as f64,
            self.blue as f64,
            self.alpha as f64,
        ])
    }

    /// Deserialize from four little-endian doubles
    pub fn load(bytes: &[u8]) -> RgssResult<Self> {
        let [r, g, b, a] = crate::read_f64s::<4>(bytes, "Color")?;
        Ok(Self::new(r as f32, g as f32, b as f32, a as f32))
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::CLEAR
    }
}

impl From<[f32; 4]> for Color {
    fn from(c: [f32; 4]) -> Self {
        Self::new(c[0], c[1], c[2], c[3])
    }
}

impl From<Color> for [f32; 4] {
    fn from(c: Color) -> Self {
        [c.red, c.green, c.blue, c.alpha]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.6}, {:.6}, {:.6}, {:.6})",
            self.red, self.green, self.blue, self.alpha
        )
    }
}

fn clamp_channel(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 255.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channels_clamp() {
        let c = Color::new(300.0, -20.0, 128.0, 999.0);
        assert_eq!(c.red(), 255.0);
        assert_eq!(c.green(), 0.0);
        assert_eq!(c.blue(), 128.0);
        assert_eq!(c.alpha(), 255.0);
    }

    #[test]
    fn test_rgb_is_opaque() {
        let c = Color::rgb(32.0, 32.0, 64.0);
        assert_eq!(c.to_rgba8(), [32, 32, 64, 255]);
    }

    #[test]
    fn test_packed_rounds() {
        let c = Color::new(10.4, 10.6, 0.0, 255.0);
        assert_eq!(c.to_rgba8(), [10, 11, 0, 255]);
        assert_eq!(c.packed(), 0xFF00_0B0A);
    }

    #[test]
    fn test_setters_clamp() {
        let mut c = Color::BLACK;
        c.set_red(1000.0);
        c.set_alpha(-1.0);
        assert_eq!(c.red(), 255.0);
        assert!(c.is_transparent());
    }

    #[test]
    fn test_dump_load_round_trip() {
        let c = Color::new(12.5, 200.0, 33.25, 128.0);
        let bytes = c.dump();
        assert_eq!(bytes.len(), 32);
        let loaded = Color::load(&bytes).unwrap();
        assert!((loaded.red() - 12.5).abs() < 1e-4);
        assert!((loaded.green() - 200.0).abs() < 1e-4);
        assert!((loaded.blue() - 33.25).abs() < 1e-4);
        assert!((loaded.alpha() - 128.0).abs() < 1e-4);
    }

    #[test]
    fn test_load_short_payload() {
        assert!(Color::load(&[0u8; 16]).is_err());
    }

    #[test]
    fn test_hex() {
        let c = Color::from_hex("#204080").unwrap();
        assert_eq!(c.to_rgba8(), [0x20, 0x40, 0x80, 255]);
        assert_eq!(c.to_hex(), "#204080");

        let translucent = Color::from_hex("FF000080").unwrap();
        assert_eq!(translucent.to_hex(), "#FF000080");

        assert!(Color::from_hex("#12345").is_err());
        assert!(Color::from_hex("#GG0000").is_err());
    }

    #[test]
    fn test_serde_clamps() {
        let c: Color = serde_json::from_str("[300.0, 10.0, 20.0, 255.0]").unwrap();
        assert_eq!(c.red(), 255.0);
        assert_eq!(serde_json::to_string(&c).unwrap(), "[255.0,10.0,20.0,255.0]");
    }
}
