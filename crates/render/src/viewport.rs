//! Viewport: a clipped, scrollable sub-surface
//!
//! Children are drawn into the viewport's own surface (shifted by
//! `-ox, -oy`), which is then composited onto the parent target at the
//! viewport's rect with its tone, color and opacity.

use log::debug;
use rgss_bitmap::{blend, Bitmap, QuadParams};
use rgss_types::{Color, Rect, RgssResult, Tone};

use crate::renderable::{clamp_opacity, Offset, RenderId, RenderList, Renderable};
use crate::sprite::Flash;

#[derive(Debug)]
pub struct Viewport {
    id: RenderId,
    viewport: Option<RenderId>,
    rect: Rect,
    /// Scroll offset applied to children
    pub ox: i32,
    pub oy: i32,
    pub color: Color,
    pub tone: Tone,
    z: i32,
    opacity: u8,
    visible: bool,
    flash: Flash,
    surface: Option<Bitmap>,
    children: RenderList,
    disposed: bool,
}

fn make_surface(rect: Rect) -> RgssResult<Option<Bitmap>> {
    if rect.is_empty() {
        Ok(None)
    } else {
        Bitmap::new(rect.width, rect.height).map(Some)
    }
}

impl Viewport {
    pub fn new(id: RenderId, rect: Rect, parent: Option<RenderId>) -> RgssResult<Self> {
        Ok(Self {
            id,
            viewport: parent,
            rect,
            ox: 0,
            oy: 0,
            color: Color::CLEAR,
            tone: Tone::NONE,
            z: 0,
            opacity: 255,
            visible: true,
            flash: Flash::default(),
            surface: make_surface(rect)?,
            children: RenderList::new(),
            disposed: false,
        })
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Move or resize; the surface is reallocated when the size changes
    pub fn set_rect(&mut self, rect: Rect) -> RgssResult<()> {
        if rect.width != self.rect.width || rect.height != self.rect.height {
            debug!("Viewport {} resized to {}x{}", self.id, rect.width, rect.height);
            self.surface = make_surface(rect)?;
        }
        self.rect = rect;
        Ok(())
    }

    pub fn children(&self) -> &RenderList {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut RenderList {
        &mut self.children
    }

    /// Tint the viewport toward `color`, fading out over `duration`
    /// frames. `None` hides the viewport for that long instead.
    pub fn flash(&mut self, color: Option<Color>, duration: i32) {
        self.flash = Flash::start(color, duration);
    }

    pub fn is_flashing(&self) -> bool {
        self.flash.is_active()
    }

    /// Whether a draw pass would produce anything
    pub(crate) fn is_drawable(&self) -> bool {
        !self.disposed
            && self.visible
            && self.opacity > 0
            && !self.flash.hides()
            && self.surface.is_some()
    }

    /// Scroll offset for children drawn into the surface
    pub(crate) fn child_offset(&self) -> Offset {
        Offset::new(self.ox.saturating_neg(), self.oy.saturating_neg())
    }

    /// Detach the surface, cleared, so children can be drawn into it
    pub(crate) fn begin_frame(&mut self) -> RgssResult<Option<Bitmap>> {
        let Some(mut surface) = self.surface.take() else {
            return Ok(None);
        };
        surface.clear()?;
        Ok(Some(surface))
    }

    pub(crate) fn end_frame(&mut self, surface: Bitmap) {
        if !self.disposed {
            self.surface = Some(surface);
        }
    }

    fn apply_flash(surface: &mut Bitmap, tint: Color) -> RgssResult<()> {
        let overlay = tint.to_rgba8();
        if overlay[3] == 0 {
            return Ok(());
        }
        for px in surface.pixels_mut()?.chunks_exact_mut(4) {
            let out = blend::blend_over([px[0], px[1], px[2], px[3]], overlay, 255);
            px.copy_from_slice(&out);
        }
        Ok(())
    }
}

impl Renderable for Viewport {
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

    /// Composite the surface onto `target`. The surface already holds the
    /// children drawn by the scene for this frame.
    fn draw(&mut self, target: &mut Bitmap, offset: Offset) -> RgssResult<()> {
        if !self.is_drawable() {
            return Ok(());
        }
        let tint = self.flash.tint();
        let Some(surface) = self.surface.as_mut() else {
            return Ok(());
        };

        if let Some(tint) = tint {
            Self::apply_flash(surface, tint)?;
        }

        let params = QuadParams {
            opacity: self.opacity,
            tone: self.tone,
            color: self.color,
            ..QuadParams::at(self.rect.x.saturating_add(offset.x), self.rect.y.saturating_add(offset.y))
        };
        target.draw_quad(surface, surface.rect(), &params)
    }

    fn update(&mut self) {
        self.flash.tick();
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Children are disposed by the scene, which owns them
    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        debug!("Disposing viewport {}", self.id);
        self.children.clear();
        self.surface = None;
        self.disposed = true;
    }
}
