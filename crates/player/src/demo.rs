//! Built-in demo scene
//!
//! A spinning text banner over a scrolling, flashing viewport.

use log::{debug, warn};
use rgss_bitmap::{Bitmap, TextAlign};
use rgss_render::{share, Graphics, RenderId, Renderable, SharedBitmap};
use rgss_types::{Color, Rect, RgssResult, Tone};

const BANNER_WIDTH: i32 = 128;
const BANNER_HEIGHT: i32 = 32;
/// Frames between viewport flashes
const FLASH_INTERVAL: u64 = 60;

/// Handles to the demo's scene entities
pub struct Demo {
    banner: RenderId,
    stripes: RenderId,
    viewport: RenderId,
    /// Kept so the bitmaps outlive every sprite showing them
    _bitmaps: Vec<SharedBitmap>,
}

/// Dark blue banner with centred text, if a typeface is available
fn banner_bitmap(g: &Graphics) -> RgssResult<Bitmap> {
    let mut banner = g.new_bitmap(BANNER_WIDTH, BANNER_HEIGHT)?;
    banner.fill_rect(banner.rect(), Color::rgb(32.0, 32.0, 64.0))?;

    if banner.font().face().is_some() {
        banner.draw_text(banner.rect(), "Optimus", TextAlign::Center, false)?;
    } else {
        warn!("No fonts registered; demo banner has no text");
    }
    Ok(banner)
}

/// Diagonal color stripes used as the scrolling background
fn stripes_bitmap(width: i32, height: i32) -> RgssResult<Bitmap> {
    let mut bmp = Bitmap::new(width, height)?;
    let colors = [
        Color::rgb(200.0, 60.0, 60.0),
        Color::rgb(60.0, 160.0, 80.0),
        Color::rgb(60.0, 90.0, 200.0),
    ];
    for y in 0..height {
        for x in 0..width {
            let band = ((x + y) / 16) as usize % colors.len();
            bmp.set_pixel(x, y, colors[band])?;
        }
    }
    bmp.hue_change(30)?;
    Ok(bmp)
}

impl Demo {
    pub fn build(g: &mut Graphics) -> RgssResult<Self> {
        let (width, height) = (g.width() as i32, g.height() as i32);

        let viewport = g.create_viewport(Rect::new(0, height / 2, width, height / 2), None)?;
        {
            let vp = g.viewport_mut(viewport)?;
            vp.tone = Tone::new(-40.0, -40.0, 0.0, 64.0);
            vp.set_z(1);
        }

        let stripes_bmp = share(stripes_bitmap(width * 2, height / 2)?);
        let stripes = g.create_sprite(Some(viewport))?;
        g.sprite_mut(stripes)?.set_bitmap(Some(stripes_bmp.clone()));

        let banner_bmp = share(banner_bitmap(g)?);
        let banner = g.create_sprite(None)?;
        {
            let sprite = g.sprite_mut(banner)?;
            sprite.set_bitmap(Some(banner_bmp.clone()));
            sprite.x = width / 2;
            sprite.y = height / 3;
            sprite.ox = BANNER_WIDTH / 2;
            sprite.oy = BANNER_HEIGHT / 2;
            sprite.zoom_x = 2.0;
            sprite.zoom_y = 2.0;
            sprite.bush_depth = 8;
            sprite.set_z(10);
        }

        debug!("Demo scene built: banner {}, viewport {}", banner, viewport);

        Ok(Self {
            banner,
            stripes,
            viewport,
            _bitmaps: vec![stripes_bmp, banner_bmp],
        })
    }

    /// Animate one frame
    pub fn step(&mut self, g: &mut Graphics) -> RgssResult<()> {
        let frame = g.frame_count();

        let sprite = g.sprite_mut(self.banner)?;
        sprite.angle = (sprite.angle + 2.0) % 360.0;
        if frame % FLASH_INTERVAL == 30 {
            sprite.flash(Some(Color::new(255.0, 255.0, 160.0, 200.0)), 20);
        }
        g.update_renderable(self.banner)?;

        let scroll = (frame % u64::from(g.width())) as i32;
        let vp = g.viewport_mut(self.viewport)?;
        vp.ox = scroll;
        if frame % FLASH_INTERVAL == 0 {
            vp.flash(Some(Color::WHITE), 20);
        }
        g.update_renderable(self.viewport)?;
        g.update_renderable(self.stripes)?;
        Ok(())
    }
}
