//! Display devices
//!
//! The composer renders every frame into an RGBA8 screen bitmap and hands
//! it to a [`RenderDevice`] to show.

use log::debug;
use rgss_bitmap::Bitmap;
use rgss_types::{RgssError, RgssResult};

/// Trait for display backends
pub trait RenderDevice {
    /// Show a finished frame. The frame always matches the device size.
    fn present(&mut self, frame: &Bitmap) -> RgssResult<()>;

    /// Get the output width
    fn width(&self) -> u32;

    /// Get the output height
    fn height(&self) -> u32;

    /// Drain pending window events; true when the user asked to quit
    fn poll_quit(&mut self) -> bool {
        false
    }

    /// Release the device
    fn shutdown(&mut self) {}
}

/// Off-screen device that keeps the last presented frame
#[derive(Debug)]
pub struct HeadlessDevice {
    width: u32,
    height: u32,
    last_frame: Option<Vec<u8>>,
    frames_presented: u64,
}

impl HeadlessDevice {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            last_frame: None,
            frames_presented: 0,
        }
    }

    /// RGBA8 bytes of the most recent frame
    pub fn last_frame(&self) -> Option<&[u8]> {
        self.last_frame.as_deref()
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }
}

impl RenderDevice for HeadlessDevice {
    fn present(&mut self, frame: &Bitmap) -> RgssResult<()> {
        if frame.width() != self.width || frame.height() != self.height {
            return Err(RgssError::Device(format!(
                "frame is {}x{}, device is {}x{}",
                frame.width(),
                frame.height(),
                self.width,
                self.height
            )));
        }
        let pixels = frame.pixels()?;
        match &mut self.last_frame {
            Some(buffer) => buffer.copy_from_slice(pixels),
            None => self.last_frame = Some(pixels.to_vec()),
        }
        self.frames_presented += 1;
        Ok(())
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn shutdown(&mut self) {
        debug!("Headless device presented {} frame(s)", self.frames_presented);
        self.last_frame = None;
    }
}
