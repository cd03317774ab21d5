//! SDL2 display device
//!
//! Streams each finished frame into an RGBA32 texture and stretches it
//! over the window.

use log::{debug, info};
use sdl2::event::Event;
use sdl2::pixels::{Color as SdlColor, PixelFormatEnum};
use sdl2::render::{BlendMode, Canvas, TextureCreator};
use sdl2::video::{Window, WindowContext};
use sdl2::{EventPump, Sdl};

use rgss_bitmap::Bitmap;
use rgss_types::{RgssError, RgssResult};

use crate::device::RenderDevice;

fn device_error(e: impl ToString) -> RgssError {
    RgssError::Device(e.to_string())
}

/// SDL2 window device
pub struct SdlDevice {
    _sdl_context: Sdl,
    canvas: Canvas<Window>,
    texture_creator: TextureCreator<WindowContext>,
    event_pump: EventPump,
    width: u32,
    height: u32,
}

impl SdlDevice {
    /// Open a window of the given size
    pub fn new(title: &str, width: u32, height: u32) -> RgssResult<Self> {
        let sdl_context = sdl2::init().map_err(device_error)?;
        let video_subsystem = sdl_context.video().map_err(device_error)?;

        let window = video_subsystem
            .window(title, width, height)
            .position_centered()
            .build()
            .map_err(device_error)?;

        let canvas = window
            .into_canvas()
            .accelerated()
            .build()
            .map_err(device_error)?;

        let texture_creator = canvas.texture_creator();
        let event_pump = sdl_context.event_pump().map_err(device_error)?;

        info!("Opened {}x{} SDL window '{}'", width, height, title);

        Ok(Self {
            _sdl_context: sdl_context,
            canvas,
            texture_creator,
            event_pump,
            width,
            height,
        })
    }
}

impl RenderDevice for SdlDevice {
    fn present(&mut self, frame: &Bitmap) -> RgssResult<()> {
        let mut texture = self
            .texture_creator
            .create_texture_streaming(PixelFormatEnum::RGBA32, frame.width(), frame.height())
            .map_err(device_error)?;
        texture.set_blend_mode(BlendMode::None);

        let pitch = (frame.width() * 4) as usize;
        texture
            .update(None, frame.pixels()?, pitch)
            .map_err(device_error)?;

        self.canvas.set_draw_color(SdlColor::RGB(0, 0, 0));
        self.canvas.clear();
        self.canvas.copy(&texture, None, None).map_err(device_error)?;
        self.canvas.present();
        Ok(())
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn poll_quit(&mut self) -> bool {
        let mut quit = false;
        for event in self.event_pump.poll_iter() {
            if let Event::Quit { .. } = event {
                quit = true;
            }
        }
        quit
    }

    fn shutdown(&mut self) {
        debug!("Closing SDL window");
        self.canvas.window_mut().hide();
    }
}
