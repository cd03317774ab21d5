//! Drawable scene entities
//!
//! Sprites and viewports share one capability: they sit in a Z-ordered
//! list and know how to draw themselves onto a target bitmap.

use std::fmt;

use rgss_bitmap::Bitmap;
use rgss_types::RgssResult;

/// Unique scene entity ID.
///
/// IDs are handed out in creation order and never reused, so they double as
/// the Z-order tie breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderId(pub u32);

impl RenderId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for RenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Draw offset applied by the parent target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Offset {
    pub x: i32,
    pub y: i32,
}

impl Offset {
    pub const ZERO: Offset = Offset { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Shared behaviour of everything the composer can draw
pub trait Renderable {
    fn id(&self) -> RenderId;

    fn z(&self) -> i32;

    fn set_z(&mut self, z: i32);

    fn opacity(&self) -> u8;

    /// Clamped to 0..=255
    fn set_opacity(&mut self, opacity: i32);

    fn visible(&self) -> bool;

    fn set_visible(&mut self, visible: bool);

    /// Viewport whose list this entity belongs to, if any
    fn viewport(&self) -> Option<RenderId>;

    /// Draw onto `target`. Does nothing when there is nothing to show.
    fn draw(&mut self, target: &mut Bitmap, offset: Offset) -> RgssResult<()>;

    /// Advance per-frame state; never draws
    fn update(&mut self);

    fn is_disposed(&self) -> bool;

    /// Release owned resources. Calling this twice is harmless.
    fn dispose(&mut self);
}

/// Clamp a scripted opacity value into a byte
pub(crate) fn clamp_opacity(opacity: i32) -> u8 {
    opacity.clamp(0, 255) as u8
}

/// Z-ordered list of scene entities
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderList {
    ids: Vec<RenderId>,
}

impl RenderList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entity; already-present IDs are ignored
    pub fn add(&mut self, id: RenderId) -> bool {
        if self.ids.contains(&id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    pub fn remove(&mut self, id: RenderId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|&other| other != id);
        self.ids.len() != before
    }

    pub fn contains(&self, id: RenderId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn ids(&self) -> &[RenderId] {
        &self.ids
    }

    /// Drop entries `z_of` no longer knows about, then order the rest by
    /// `(z, id)`
    pub fn prune_and_sort(&mut self, z_of: impl Fn(RenderId) -> Option<i32>) {
        let mut keyed: Vec<(i32, RenderId)> = self
            .ids
            .iter()
            .filter_map(|&id| z_of(id).map(|z| (z, id)))
            .collect();
        keyed.sort_unstable();
        self.ids = keyed.into_iter().map(|(_, id)| id).collect();
    }
}
