//! Scene graph arena
//!
//! Every sprite and viewport lives in one map keyed by [`RenderId`].
//! Lists (the top-level one and each viewport's children) hold IDs only, so
//! a viewport references its children without owning their lifetime.

use log::debug;
use rgss_bitmap::Bitmap;
use rgss_types::{Rect, RgssError, RgssResult};
use rustc_hash::FxHashMap;

use crate::renderable::{Offset, RenderId, RenderList, Renderable};
use crate::sprite::Sprite;
use crate::viewport::Viewport;

/// One scene entity
#[derive(Debug)]
pub enum RenderNode {
    Sprite(Sprite),
    Viewport(Viewport),
}

impl RenderNode {
    pub fn as_renderable(&self) -> &dyn Renderable {
        match self {
            RenderNode::Sprite(sprite) => sprite,
            RenderNode::Viewport(viewport) => viewport,
        }
    }

    pub fn as_renderable_mut(&mut self) -> &mut dyn Renderable {
        match self {
            RenderNode::Sprite(sprite) => sprite,
            RenderNode::Viewport(viewport) => viewport,
        }
    }
}

/// Owns all renderables and the top-level draw list
#[derive(Debug, Default)]
pub struct Scene {
    nodes: FxHashMap<RenderId, RenderNode>,
    next_id: u32,
    roots: RenderList,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc_id(&mut self) -> RenderId {
        self.next_id += 1;
        RenderId::new(self.next_id)
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: RenderId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// The top-level draw list
    pub fn roots(&self) -> &RenderList {
        &self.roots
    }

    pub fn get(&self, id: RenderId) -> Option<&RenderNode> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: RenderId) -> Option<&mut RenderNode> {
        self.nodes.get_mut(&id)
    }

    /// List an entity is drawn from: a viewport's children or the roots
    fn owning_list(&mut self, parent: Option<RenderId>) -> RgssResult<&mut RenderList> {
        match parent {
            None => Ok(&mut self.roots),
            Some(id) => Ok(self.viewport_mut(id)?.children_mut()),
        }
    }

    /// Create a sprite, drawn from `viewport` or from the top level
    pub fn create_sprite(&mut self, viewport: Option<RenderId>) -> RgssResult<RenderId> {
        if let Some(parent) = viewport {
            self.viewport(parent)?;
        }
        let id = self.alloc_id();
        self.nodes.insert(id, RenderNode::Sprite(Sprite::new(id, viewport)));
        self.owning_list(viewport)?.add(id);
        debug!("Created sprite {}", id);
        Ok(id)
    }

    /// Create a viewport, nested in `parent` or at the top level
    pub fn create_viewport(&mut self, rect: Rect, parent: Option<RenderId>) -> RgssResult<RenderId> {
        if let Some(parent) = parent {
            self.viewport(parent)?;
        }
        let id = self.alloc_id();
        let viewport = Viewport::new(id, rect, parent)?;
        self.nodes.insert(id, RenderNode::Viewport(viewport));
        self.owning_list(parent)?.add(id);
        debug!("Created viewport {} at {:?}", id, rect);
        Ok(id)
    }

    fn missing(id: RenderId) -> RgssError {
        RgssError::resource_state(format!("renderable {} does not exist or has been disposed", id))
    }

    pub fn renderable(&self, id: RenderId) -> RgssResult<&dyn Renderable> {
        self.nodes
            .get(&id)
            .map(RenderNode::as_renderable)
            .ok_or_else(|| Self::missing(id))
    }

    pub fn renderable_mut(&mut self, id: RenderId) -> RgssResult<&mut dyn Renderable> {
        self.nodes
            .get_mut(&id)
            .map(RenderNode::as_renderable_mut)
            .ok_or_else(|| Self::missing(id))
    }

    pub fn sprite(&self, id: RenderId) -> RgssResult<&Sprite> {
        match self.nodes.get(&id) {
            Some(RenderNode::Sprite(sprite)) => Ok(sprite),
            Some(_) => Err(RgssError::resource_state(format!("{} is not a sprite", id))),
            None => Err(Self::missing(id)),
        }
    }

    pub fn sprite_mut(&mut self, id: RenderId) -> RgssResult<&mut Sprite> {
        match self.nodes.get_mut(&id) {
            Some(RenderNode::Sprite(sprite)) => Ok(sprite),
            Some(_) => Err(RgssError::resource_state(format!("{} is not a sprite", id))),
            None => Err(Self::missing(id)),
        }
    }

    pub fn viewport(&self, id: RenderId) -> RgssResult<&Viewport> {
        match self.nodes.get(&id) {
            Some(RenderNode::Viewport(viewport)) => Ok(viewport),
            Some(_) => Err(RgssError::resource_state(format!("{} is not a viewport", id))),
            None => Err(Self::missing(id)),
        }
    }

    pub fn viewport_mut(&mut self, id: RenderId) -> RgssResult<&mut Viewport> {
        match self.nodes.get_mut(&id) {
            Some(RenderNode::Viewport(viewport)) => Ok(viewport),
            Some(_) => Err(RgssError::resource_state(format!("{} is not a viewport", id))),
            None => Err(Self::missing(id)),
        }
    }

    /// Run one entity's per-frame update
    pub fn update(&mut self, id: RenderId) -> RgssResult<()> {
        self.renderable_mut(id)?.update();
        Ok(())
    }

    /// Put an entity on the top-level list
    pub fn add_root(&mut self, id: RenderId) -> RgssResult<()> {
        self.renderable(id)?;
        if self.roots.add(id) {
            self.sort_roots();
        }
        Ok(())
    }

    /// Take an entity off the top-level list without disposing it
    pub fn remove_root(&mut self, id: RenderId) -> bool {
        self.roots.remove(id)
    }

    fn z_of(&self, id: RenderId) -> Option<i32> {
        self.nodes
            .get(&id)
            .map(RenderNode::as_renderable)
            .filter(|r| !r.is_disposed())
            .map(|r| r.z())
    }

    fn sort_roots(&mut self) {
        let mut roots = std::mem::take(&mut self.roots);
        roots.prune_and_sort(|id| self.z_of(id));
        self.roots = roots;
    }

    /// Dispose an entity and, for viewports, everything drawn inside it.
    /// Unknown IDs are ignored.
    pub fn dispose(&mut self, id: RenderId) {
        let Some(mut node) = self.nodes.remove(&id) else {
            return;
        };

        if let RenderNode::Viewport(viewport) = &node {
            let children: Vec<RenderId> = viewport.children().ids().to_vec();
            for child in children {
                self.dispose(child);
            }
        }

        let parent = node.as_renderable().viewport();
        node.as_renderable_mut().dispose();
        match parent {
            Some(parent) => {
                if let Ok(viewport) = self.viewport_mut(parent) {
                    viewport.children_mut().remove(id);
                }
            }
            None => {
                self.roots.remove(id);
            }
        }
        // Entities added to the roots from inside a viewport
        self.roots.remove(id);
    }

    /// Dispose every entity
    pub fn clear(&mut self) {
        let ids: Vec<RenderId> = self.nodes.keys().copied().collect();
        for id in ids {
            self.dispose(id);
        }
        self.roots.clear();
    }

    /// Draw the top-level list onto `target` in Z order
    pub fn draw(&mut self, target: &mut Bitmap) -> RgssResult<()> {
        self.sort_roots();
        let roots = self.roots.ids().to_vec();
        for id in roots {
            self.draw_node(id, target, Offset::ZERO)?;
        }
        Ok(())
    }

    fn draw_node(&mut self, id: RenderId, target: &mut Bitmap, offset: Offset) -> RgssResult<()> {
        let Some(node) = self.nodes.get_mut(&id) else {
            return Ok(());
        };

        let viewport = match node {
            RenderNode::Sprite(sprite) => return sprite.draw(target, offset),
            RenderNode::Viewport(viewport) => viewport,
        };
        if !viewport.is_drawable() {
            return Ok(());
        }

        let child_offset = viewport.child_offset();
        let mut children = std::mem::take(viewport.children_mut());
        let Some(mut surface) = viewport.begin_frame()? else {
            *viewport.children_mut() = children;
            return Ok(());
        };

        children.prune_and_sort(|child| self.z_of(child));
        let mut result = Ok(());
        for &child in children.ids() {
            result = self.draw_node(child, &mut surface, child_offset);
            if result.is_err() {
                break;
            }
        }

        // The node cannot have left the arena while its children drew
        if let Some(RenderNode::Viewport(viewport)) = self.nodes.get_mut(&id) {
            *viewport.children_mut() = children;
            viewport.end_frame(surface);
            result?;
            viewport.draw(target, offset)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprite::share;
    use rgss_types::Color;

    fn solid(color: Color) -> crate::sprite::SharedBitmap {
        let mut bmp = Bitmap::new(1, 1).unwrap();
        bmp.fill_rect(bmp.rect(), color).unwrap();
        share(bmp)
    }

    fn red() -> Color {
        Color::rgb(255.0, 0.0, 0.0)
    }

    fn blue() -> Color {
        Color::rgb(0.0, 0.0, 255.0)
    }

    #[test]
    fn test_ids_are_monotonic() {
        let mut scene = Scene::new();
        let a = scene.create_sprite(None).unwrap();
        let b = scene.create_viewport(Rect::new(0, 0, 4, 4), None).unwrap();
        let c = scene.create_sprite(Some(b)).unwrap();
        assert!(a < b && b < c);
        assert_eq!(scene.len(), 3);
        assert_eq!(scene.roots().ids(), &[a, b]);
        assert_eq!(scene.viewport(b).unwrap().children().ids(), &[c]);
    }

    #[test]
    fn test_typed_access() {
        let mut scene = Scene::new();
        let sprite = scene.create_sprite(None).unwrap();
        assert!(scene.sprite(sprite).is_ok());
        assert!(scene.viewport(sprite).unwrap_err().is_resource_state());
        assert!(scene.sprite(RenderId(99)).unwrap_err().is_resource_state());
        assert!(scene.create_sprite(Some(sprite)).is_err());
    }

    #[test]
    fn test_z_order_independent_of_insertion() {
        let mut scene = Scene::new();
        let top = scene.create_sprite(None).unwrap();
        let bottom = scene.create_sprite(None).unwrap();

        let s = scene.sprite_mut(top).unwrap();
        s.set_bitmap(Some(solid(red())));
        s.set_z(10);
        let s = scene.sprite_mut(bottom).unwrap();
        s.set_bitmap(Some(solid(blue())));
        s.set_z(1);

        let mut target = Bitmap::new(1, 1).unwrap();
        scene.draw(&mut target).unwrap();
        assert_eq!(target.get_pixel(0, 0).unwrap(), red());
        assert_eq!(scene.roots().ids(), &[bottom, top]);

        // Re-sorted on every draw
        scene.sprite_mut(bottom).unwrap().set_z(20);
        scene.draw(&mut target).unwrap();
        assert_eq!(target.get_pixel(0, 0).unwrap(), blue());
    }

    #[test]
    fn test_equal_z_draws_in_creation_order() {
        let mut scene = Scene::new();
        let first = scene.create_sprite(None).unwrap();
        let second = scene.create_sprite(None).unwrap();
        scene.sprite_mut(second).unwrap().set_bitmap(Some(solid(blue())));
        scene.sprite_mut(first).unwrap().set_bitmap(Some(solid(red())));

        let mut target = Bitmap::new(1, 1).unwrap();
        scene.draw(&mut target).unwrap();
        assert_eq!(target.get_pixel(0, 0).unwrap(), blue());
    }

    #[test]
    fn test_viewports_drawn_by_z() {
        let mut scene = Scene::new();
        let high = scene.create_viewport(Rect::new(0, 0, 1, 1), None).unwrap();
        let low = scene.create_viewport(Rect::new(0, 0, 1, 1), None).unwrap();
        scene.viewport_mut(high).unwrap().set_z(5);
        scene.viewport_mut(low).unwrap().set_z(1);

        let a = scene.create_sprite(Some(high)).unwrap();
        scene.sprite_mut(a).unwrap().set_bitmap(Some(solid(red())));
        let b = scene.create_sprite(Some(low)).unwrap();
        scene.sprite_mut(b).unwrap().set_bitmap(Some(solid(blue())));

        let mut target = Bitmap::new(1, 1).unwrap();
        scene.draw(&mut target).unwrap();
        // Z = 1 first, so the Z = 5 viewport ends up on top
        assert_eq!(scene.roots().ids(), &[low, high]);
        assert_eq!(target.get_pixel(0, 0).unwrap(), red());
    }

    #[test]
    fn test_sprites_in_viewport_drawn_by_z() {
        let mut scene = Scene::new();
        let vp = scene.create_viewport(Rect::new(0, 0, 1, 1), None).unwrap();
        let a = scene.create_sprite(Some(vp)).unwrap();
        let b = scene.create_sprite(Some(vp)).unwrap();
        {
            let sprite = scene.sprite_mut(a).unwrap();
            sprite.set_bitmap(Some(solid(red())));
            sprite.set_z(5);
        }
        {
            let sprite = scene.sprite_mut(b).unwrap();
            sprite.set_bitmap(Some(solid(blue())));
            sprite.set_z(1);
        }

        let mut target = Bitmap::new(1, 1).unwrap();
        scene.draw(&mut target).unwrap();
        // The later, lower sprite is drawn first and ends up underneath
        assert_eq!(scene.viewport(vp).unwrap().children().ids(), &[b, a]);
        assert_eq!(target.get_pixel(0, 0).unwrap(), red());
    }

    #[test]
    fn test_viewport_clips_and_scrolls() {
        let mut scene = Scene::new();
        let vp = scene.create_viewport(Rect::new(2, 2, 2, 2), None).unwrap();
        let sprite = scene.create_sprite(Some(vp)).unwrap();

        let mut bmp = Bitmap::new(4, 4).unwrap();
        bmp.fill_rect(bmp.rect(), red()).unwrap();
        scene.sprite_mut(sprite).unwrap().set_bitmap(Some(share(bmp)));
        scene.viewport_mut(vp).unwrap().ox = 3;

        let mut target = Bitmap::new(8, 8).unwrap();
        scene.draw(&mut target).unwrap();
        // Sprite covers surface columns 0..1 after the -3 scroll
        assert_eq!(target.get_pixel(2, 2).unwrap(), red());
        assert_eq!(target.get_pixel(3, 2).unwrap(), Color::CLEAR);
        assert_eq!(target.get_pixel(1, 2).unwrap(), Color::CLEAR);
        assert_eq!(target.get_pixel(2, 4).unwrap(), Color::CLEAR);
    }

    #[test]
    fn test_nested_viewports() {
        let mut scene = Scene::new();
        let outer = scene.create_viewport(Rect::new(1, 1, 4, 4), None).unwrap();
        let inner = scene.create_viewport(Rect::new(1, 1, 2, 2), Some(outer)).unwrap();
        let sprite = scene.create_sprite(Some(inner)).unwrap();
        scene.sprite_mut(sprite).unwrap().set_bitmap(Some(solid(red())));

        let mut target = Bitmap::new(6, 6).unwrap();
        scene.draw(&mut target).unwrap();
        assert_eq!(target.get_pixel(2, 2).unwrap(), red());
        assert_eq!(target.get_pixel(1, 1).unwrap(), Color::CLEAR);
    }

    #[test]
    fn test_dispose_viewport_is_recursive() {
        let mut scene = Scene::new();
        let outer = scene.create_viewport(Rect::new(0, 0, 4, 4), None).unwrap();
        let inner = scene.create_viewport(Rect::new(0, 0, 2, 2), Some(outer)).unwrap();
        let a = scene.create_sprite(Some(outer)).unwrap();
        let b = scene.create_sprite(Some(inner)).unwrap();
        let free = scene.create_sprite(None).unwrap();

        let bitmap = solid(red());
        scene.sprite_mut(b).unwrap().set_bitmap(Some(bitmap.clone()));

        scene.dispose(outer);
        for id in [outer, inner, a, b] {
            assert!(!scene.contains(id));
            assert!(matches!(scene.renderable(id), Err(e) if e.is_resource_state()));
        }
        assert!(scene.contains(free));
        assert_eq!(scene.roots().ids(), &[free]);
        // Sprites never own their bitmap
        assert!(!bitmap.borrow().is_disposed());

        // Disposing again is a no-op
        scene.dispose(outer);
    }

    #[test]
    fn test_dispose_sprite_detaches_from_viewport() {
        let mut scene = Scene::new();
        let vp = scene.create_viewport(Rect::new(0, 0, 4, 4), None).unwrap();
        let sprite = scene.create_sprite(Some(vp)).unwrap();
        scene.dispose(sprite);
        assert!(scene.viewport(vp).unwrap().children().is_empty());
    }

    #[test]
    fn test_add_and_remove_root() {
        let mut scene = Scene::new();
        let vp = scene.create_viewport(Rect::new(0, 0, 1, 1), None).unwrap();
        let sprite = scene.create_sprite(Some(vp)).unwrap();
        assert!(scene.remove_root(vp));
        assert!(!scene.roots().contains(vp));

        scene.add_root(vp).unwrap();
        scene.add_root(sprite).unwrap();
        assert_eq!(scene.roots().len(), 2);
        assert!(scene.add_root(RenderId(42)).is_err());

        scene.clear();
        assert!(scene.is_empty());
        assert!(scene.roots().is_empty());
    }

    #[test]
    fn test_update_ticks_flash() {
        let mut scene = Scene::new();
        let sprite = scene.create_sprite(None).unwrap();
        scene.sprite_mut(sprite).unwrap().flash(Some(Color::WHITE), 1);
        scene.update(sprite).unwrap();
        assert!(!scene.sprite(sprite).unwrap().is_flashing());
        assert!(scene.update(RenderId(50)).is_err());
    }
}
