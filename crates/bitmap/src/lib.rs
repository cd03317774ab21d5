//! RGSS Bitmap Engine
//!
//! RGBA pixel buffers with blitting, scaling, hue rotation, tinted
//! quad compositing and text rasterization.

mod autotile;
mod bitmap;
pub mod blend;
mod font;
mod loader;
mod quad;
mod text;

pub use autotile::{Autotile, AUTOTILE_PATTERNS, AUTOTILE_SIZE};
pub use bitmap::Bitmap;
pub use font::{Font, FontDefaults, FontRegistry, FontdueFace, GlyphData, LineMetrics, Typeface};
pub use loader::DecodedImage;
pub use quad::QuadParams;
pub use text::TextAlign;

pub use rgss_types::{Color, Rect, RgssError, RgssResult, Tone};
