//! Scene composer
//!
//! `Graphics` owns the display device, the scene and the screen buffer.
//! Each `update` composes one frame, runs any freeze or transition,
//! presents the result and waits out the rest of the frame.

use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info};
use rgss_bitmap::{Bitmap, FontRegistry};
use rgss_types::{Color, Rect, RgssError, RgssResult};
use serde::{Deserialize, Serialize};

use crate::device::RenderDevice;
use crate::renderable::{RenderId, Renderable};
use crate::scene::Scene;
use crate::sprite::Sprite;
use crate::transition::Dissolve;
use crate::viewport::Viewport;

/// Lowest frame rate accepted
pub const MIN_FRAME_RATE: i32 = 10;
/// Highest frame rate accepted
pub const MAX_FRAME_RATE: i32 = 120;
/// Frame rate until a script changes it
pub const DEFAULT_FRAME_RATE: i32 = 40;

/// Composer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphicsConfig {
    /// Screen width in pixels
    pub width: u32,
    /// Screen height in pixels
    pub height: u32,
    pub frame_rate: i32,
    /// Sleep between frames to hold the frame rate
    pub pacing: bool,
    /// Screen color behind everything
    pub clear_color: Color,
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            frame_rate: DEFAULT_FRAME_RATE,
            pacing: true,
            clear_color: Color::BLACK,
        }
    }
}

/// Sleeps until the next frame boundary
#[derive(Debug)]
struct FramePacer {
    next_frame: Instant,
}

impl FramePacer {
    fn new() -> Self {
        Self {
            next_frame: Instant::now(),
        }
    }

    fn reset(&mut self) {
        self.next_frame = Instant::now();
    }

    fn wait(&mut self, frame_rate: i32) {
        let frame = Duration::from_secs_f64(1.0 / f64::from(frame_rate));
        self.next_frame += frame;

        let now = Instant::now();
        if self.next_frame > now {
            thread::sleep(self.next_frame - now);
        } else if now - self.next_frame > frame {
            // Too far behind to catch up; start counting again from now
            self.next_frame = now;
        }
    }
}

/// The scene composer
pub struct Graphics {
    device: Box<dyn RenderDevice>,
    scene: Scene,
    fonts: FontRegistry,
    screen: Bitmap,
    clear_color: Color,
    frame_rate: i32,
    frame_count: u64,
    pacing: bool,
    pacer: FramePacer,
    frozen: Option<Bitmap>,
    transition: Option<Dissolve>,
    shut_down: bool,
}

impl Graphics {
    /// Set up the composer. The screen takes the configured size, which
    /// must match the device.
    pub fn init(config: GraphicsConfig, device: Box<dyn RenderDevice>, fonts: FontRegistry) -> RgssResult<Self> {
        if device.width() != config.width || device.height() != config.height {
            return Err(RgssError::Device(format!(
                "device is {}x{}, configured screen is {}x{}",
                device.width(),
                device.height(),
                config.width,
                config.height
            )));
        }
        let screen = Bitmap::new(config.width as i32, config.height as i32)?;
        let frame_rate = config.frame_rate.clamp(MIN_FRAME_RATE, MAX_FRAME_RATE);

        info!(
            "Graphics initialized: {}x{} at {} fps ({} font(s))",
            config.width,
            config.height,
            frame_rate,
            fonts.len()
        );

        Ok(Self {
            device,
            scene: Scene::new(),
            fonts,
            screen,
            clear_color: config.clear_color,
            frame_rate,
            frame_count: 0,
            pacing: config.pacing,
            pacer: FramePacer::new(),
            frozen: None,
            transition: None,
            shut_down: false,
        })
    }

    fn check_running(&self) -> RgssResult<()> {
        if self.shut_down {
            Err(RgssError::resource_state("Graphics has been shut down"))
        } else {
            Ok(())
        }
    }

    pub fn width(&self) -> u32 {
        self.screen.width()
    }

    pub fn height(&self) -> u32 {
        self.screen.height()
    }

    pub fn frame_rate(&self) -> i32 {
        self.frame_rate
    }

    /// Set the target frame rate, clamped to 10..=120
    pub fn set_frame_rate(&mut self, frame_rate: i32) {
        self.frame_rate = frame_rate.clamp(MIN_FRAME_RATE, MAX_FRAME_RATE);
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn set_frame_count(&mut self, frame_count: u64) {
        self.frame_count = frame_count;
    }

    pub fn fonts(&self) -> &FontRegistry {
        &self.fonts
    }

    pub fn fonts_mut(&mut self) -> &mut FontRegistry {
        &mut self.fonts
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn device(&self) -> &dyn RenderDevice {
        self.device.as_ref()
    }

    /// Poll the device for a quit request
    pub fn poll_quit(&mut self) -> bool {
        self.device.poll_quit()
    }

    pub fn create_sprite(&mut self, viewport: Option<RenderId>) -> RgssResult<RenderId> {
        self.check_running()?;
        self.scene.create_sprite(viewport)
    }

    pub fn create_viewport(&mut self, rect: Rect, parent: Option<RenderId>) -> RgssResult<RenderId> {
        self.check_running()?;
        self.scene.create_viewport(rect, parent)
    }

    pub fn dispose(&mut self, id: RenderId) {
        self.scene.dispose(id);
    }

    pub fn sprite(&self, id: RenderId) -> RgssResult<&Sprite> {
        self.scene.sprite(id)
    }

    pub fn sprite_mut(&mut self, id: RenderId) -> RgssResult<&mut Sprite> {
        self.scene.sprite_mut(id)
    }

    pub fn viewport(&self, id: RenderId) -> RgssResult<&Viewport> {
        self.scene.viewport(id)
    }

    pub fn viewport_mut(&mut self, id: RenderId) -> RgssResult<&mut Viewport> {
        self.scene.viewport_mut(id)
    }

    pub fn renderable_mut(&mut self, id: RenderId) -> RgssResult<&mut dyn Renderable> {
        self.scene.renderable_mut(id)
    }

    /// Run one entity's per-frame update (flash countdown)
    pub fn update_renderable(&mut self, id: RenderId) -> RgssResult<()> {
        self.scene.update(id)
    }

    /// Put an entity on the top-level draw list
    pub fn add_render(&mut self, id: RenderId) -> RgssResult<()> {
        self.scene.add_root(id)
    }

    pub fn remove_render(&mut self, id: RenderId) -> bool {
        self.scene.remove_root(id)
    }

    /// Bitmap carrying the default font from the registry
    pub fn new_bitmap(&self, width: i32, height: i32) -> RgssResult<Bitmap> {
        let mut bitmap = Bitmap::new(width, height)?;
        bitmap.set_font(self.fonts.default_font());
        Ok(bitmap)
    }

    /// Compose the scene into the screen buffer
    fn compose(&mut self) -> RgssResult<()> {
        self.screen.fill_rect(self.screen.rect(), self.clear_color)?;
        self.scene.draw(&mut self.screen)
    }

    /// Advance one frame
    pub fn update(&mut self) -> RgssResult<()> {
        self.check_running()?;
        self.compose()?;

        if let (Some(dissolve), Some(frozen)) = (self.transition.as_mut(), self.frozen.as_ref()) {
            dissolve.advance();
            let mut frame = Bitmap::new(self.screen.width() as i32, self.screen.height() as i32)?;
            dissolve.compose(frozen, &self.screen, &mut frame)?;
            self.device.present(&frame)?;

            if dissolve.is_complete() {
                debug!("Transition finished at frame {}", self.frame_count);
                self.transition = None;
                self.frozen = None;
            }
        } else if let Some(frozen) = &self.frozen {
            self.device.present(frozen)?;
        } else {
            self.device.present(&self.screen)?;
        }

        self.frame_count += 1;
        if self.pacing {
            self.pacer.wait(self.frame_rate);
        }
        Ok(())
    }

    /// Hold the current screen until `transition` is called
    pub fn freeze(&mut self) -> RgssResult<()> {
        self.check_running()?;
        self.compose()?;
        self.frozen = Some(Bitmap::copy_of(&self.screen)?);
        self.transition = None;
        debug!("Screen frozen at frame {}", self.frame_count);
        Ok(())
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.is_some()
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    /// Dissolve from the frozen screen to the live scene over `duration`
    /// updates. Does nothing unless frozen; a duration of zero or less
    /// unfreezes at once.
    pub fn transition(&mut self, duration: i32, filename: Option<&Path>, vague: i32) -> RgssResult<()> {
        self.check_running()?;
        if self.frozen.is_none() {
            return Ok(());
        }
        if duration <= 0 {
            self.frozen = None;
            self.transition = None;
            return Ok(());
        }

        let mask = filename.map(Bitmap::from_file).transpose()?;
        self.transition = Some(Dissolve::new(
            self.screen.width(),
            self.screen.height(),
            duration as u32,
            vague,
            mask.as_ref(),
        )?);
        Ok(())
    }

    /// Run a started transition to completion, one update per frame
    pub fn run_transition(&mut self) -> RgssResult<()> {
        while self.transition.is_some() {
            self.update()?;
        }
        Ok(())
    }

    /// Restart frame pacing from now, e.g. after a long load
    pub fn frame_reset(&mut self) {
        self.pacer.reset();
    }

    /// Copy of the current screen contents
    pub fn snap_to_bitmap(&mut self) -> RgssResult<Bitmap> {
        self.check_running()?;
        self.compose()?;
        let mut snap = Bitmap::copy_of(&self.screen)?;
        snap.set_font(self.fonts.default_font());
        Ok(snap)
    }

    /// The most recently composed screen buffer
    pub fn screen(&self) -> &Bitmap {
        &self.screen
    }

    /// Dispose every entity and release the device
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        info!("Graphics shutting down after {} frame(s)", self.frame_count);
        self.scene.clear();
        self.frozen = None;
        self.transition = None;
        self.device.shutdown();
        self.shut_down = true;
    }
}

impl Drop for Graphics {
    fn drop(&mut self) {
        self.shutdown();
    }
}
