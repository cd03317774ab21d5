//! Sprite: a transformed view of a shared bitmap

use std::cell::RefCell;
use std::rc::Rc;

use log::trace;
use rgss_bitmap::{Bitmap, QuadParams};
use rgss_types::{Color, Rect, RgssError, RgssResult, Tone};

use crate::renderable::{clamp_opacity, Offset, RenderId, Renderable};

/// Bitmap shared between sprites and scripts. Sprites never own it.
pub type SharedBitmap = Rc<RefCell<Bitmap>>;

/// Wrap a bitmap for sharing
pub fn share(bitmap: Bitmap) -> SharedBitmap {
    Rc::new(RefCell::new(bitmap))
}

/// Countdown shared by sprite and viewport flashes
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Flash {
    /// `None` hides the entity while the flash runs
    pub color: Option<Color>,
    pub duration: i32,
    pub remaining: i32,
}

impl Flash {
    pub fn start(color: Option<Color>, duration: i32) -> Self {
        let duration = duration.max(0);
        Self {
            color,
            duration,
            remaining: duration,
        }
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0
    }

    pub fn hides(&self) -> bool {
        self.is_active() && self.color.is_none()
    }

    /// Current tint, its alpha fading with the remaining frames
    pub fn tint(&self) -> Option<Color> {
        if !self.is_active() {
            return None;
        }
        let color = self.color?;
        let fade = self.remaining as f32 / self.duration as f32;
        Some(Color::new(color.red(), color.green(), color.blue(), color.alpha() * fade))
    }

    pub fn tick(&mut self) {
        if self.remaining > 0 {
            self.remaining -= 1;
        }
    }
}

/// A positioned, transformed and tinted view of a bitmap
#[derive(Debug)]
pub struct Sprite {
    id: RenderId,
    viewport: Option<RenderId>,
    bitmap: Option<SharedBitmap>,
    src_rect: Option<Rect>,
    pub x: i32,
    pub y: i32,
    /// Pivot inside the source rect
    pub ox: i32,
    pub oy: i32,
    pub zoom_x: f32,
    pub zoom_y: f32,
    /// Degrees, counter-clockwise
    pub angle: f32,
    pub mirror: bool,
    pub bush_depth: i32,
    bush_opacity: u8,
    pub color: Color,
    pub tone: Tone,
    z: i32,
    opacity: u8,
    visible: bool,
    flash: Flash,
    disposed: bool,
}

impl Sprite {
    pub fn new(id: RenderId, viewport: Option<RenderId>) -> Self {
        Self {
            id,
            viewport,
            bitmap: None,
            src_rect: None,
            x: 0,
            y: 0,
            ox: 0,
            oy: 0,
            zoom_x: 1.0,
            zoom_y: 1.0,
            angle: 0.0,
            mirror: false,
            bush_depth: 0,
            bush_opacity: 128,
            color: Color::CLEAR,
            tone: Tone::NONE,
            z: 0,
            opacity: 255,
            visible: true,
            flash: Flash::default(),
            disposed: false,
        }
    }

    pub fn bitmap(&self) -> Option<&SharedBitmap> {
        self.bitmap.as_ref()
    }

    /// Assign or clear the bitmap; the source rect resets to the whole
    /// bitmap
    pub fn set_bitmap(&mut self, bitmap: Option<SharedBitmap>) {
        self.bitmap = bitmap;
        self.src_rect = None;
    }

    /// Source rect, defaulting to the whole bitmap
    pub fn src_rect(&self) -> Rect {
        if let Some(rect) = self.src_rect {
            return rect;
        }
        self.bitmap
            .as_ref()
            .and_then(|b| b.try_borrow().ok().map(|b| b.rect()))
            .unwrap_or_default()
    }

    pub fn set_src_rect(&mut self, rect: Rect) {
        self.src_rect = Some(rect);
    }

    pub fn bush_opacity(&self) -> u8 {
        self.bush_opacity
    }

    pub fn set_bush_opacity(&mut self, opacity: i32) {
        self.bush_opacity = clamp_opacity(opacity);
    }

    /// Width of the source rect
    pub fn width(&self) -> i32 {
        self.src_rect().width
    }

    pub fn height(&self) -> i32 {
        self.src_rect().height
    }

    /// Tint toward `color` fading out over `duration` frames. `None` hides
    /// the sprite for that long instead.
    pub fn flash(&mut self, color: Option<Color>, duration: i32) {
        self.flash = Flash::start(color, duration);
    }

    pub fn is_flashing(&self) -> bool {
        self.flash.is_active()
    }

    /// (ox, oy) is the pivot for zoom and rotation, placed at (x, y).
    /// Unzoomed and unrotated, the top-left lands at (x - ox, y - oy).
    fn quad_params(&self, offset: Offset) -> QuadParams {
        QuadParams {
            x: self.x as f32 + offset.x as f32,
            y: self.y as f32 + offset.y as f32,
            ox: self.ox as f32,
            oy: self.oy as f32,
            zoom_x: self.zoom_x,
            zoom_y: self.zoom_y,
            angle: self.angle,
            mirror: self.mirror,
            opacity: self.opacity,
            tone: self.tone,
            color: self.color,
            flash: self.flash.tint().unwrap_or(Color::CLEAR),
            bush_depth: self.bush_depth,
            bush_opacity: self.bush_opacity,
        }
    }
}

impl Renderable for Sprite {
    fn id(&self) -> RenderId {
        self.id
    }

    fn z(&self) -> i32 {
        self.z
    }

    fn set_z(&mut self, z: i32) {
        self.z = z;
    }

    fn opacity(&self) -> u8 {
        self.opacity
    }

    fn set_opacity(&mut self, opacity: i32) {
        self.opacity = clamp_opacity(opacity);
    }

    fn visible(&self) -> bool {
        self.visible
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn viewport(&self) -> Option<RenderId> {
        self.viewport
    }

    fn draw(&mut self, target: &mut Bitmap, offset: Offset) -> RgssResult<()> {
        if self.disposed || !self.visible || self.opacity == 0 || self.flash.hides() {
            return Ok(());
        }
        let Some(bitmap) = &self.bitmap else {
            return Ok(());
        };
        let bitmap = bitmap
            .try_borrow()
            .map_err(|_| RgssError::resource_state(format!("sprite {} bitmap is borrowed", self.id)))?;
        if bitmap.is_disposed() {
            trace!("Sprite {} skipped: bitmap disposed", self.id);
            return Ok(());
        }

        let src_rect = self.src_rect.unwrap_or_else(|| bitmap.rect());
        if src_rect.is_empty() {
            return Ok(());
        }

        target.draw_quad(&bitmap, src_rect, &self.quad_params(offset))
    }

    fn update(&mut self) {
        self.flash.tick();
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn dispose(&mut self) {
        self.bitmap = None;
        self.disposed = true;
    }
}
