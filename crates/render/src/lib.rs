//! RGSS Render Engine
//!
//! Scene graph, compositing and display output.

mod device;
mod graphics;
mod renderable;
mod scene;
#[cfg(feature = "sdl")]
mod sdl_backend;
mod sprite;
mod transition;
mod viewport;

pub use device::{HeadlessDevice, RenderDevice};
pub use graphics::{Graphics, GraphicsConfig, DEFAULT_FRAME_RATE, MAX_FRAME_RATE, MIN_FRAME_RATE};
pub use renderable::{Offset, RenderId, RenderList, Renderable};
pub use scene::{RenderNode, Scene};
#[cfg(feature = "sdl")]
pub use sdl_backend::SdlDevice;
pub use sprite::{share, SharedBitmap, Sprite};
pub use transition::{Dissolve, MAX_VAGUE};
pub use viewport::Viewport;

pub use rgss_bitmap::{Bitmap, Color, FontRegistry, Rect, RgssError, RgssResult, TextAlign, Tone};
