//! Autotile expansion
//!
//! An autotile sheet is 96 pixels wide per animation frame and 128 tall,
//! made of 16x16 quarter tiles. Each of the 48 patterns assembles four of
//! them into one 32x32 tile.

use log::debug;
use rgss_types::{Rect, RgssError, RgssResult};

use crate::bitmap::Bitmap;

/// Edge length of an assembled tile
pub const AUTOTILE_SIZE: i32 = 32;

const QUARTER: i32 = 16;
const FRAME_WIDTH: i32 = 96;
const SHEET_HEIGHT: i32 = 128;

/// Quarter-tile numbers (1-based, six per sheet row) for each pattern
pub const AUTOTILE_PATTERNS: [[u8; 4]; 48] = [
    [27, 28, 33, 34], [5, 28, 33, 34], [27, 6, 33, 34], [5, 6, 33, 34],
    [27, 28, 33, 12], [5, 28, 33, 12], [27, 6, 33, 12], [5, 6, 33, 12],
    [27, 28, 11, 34], [5, 28, 11, 34], [27, 6, 11, 34], [5, 6, 11, 34],
    [27, 28, 11, 12], [5, 28, 11, 12], [27, 6, 11, 12], [5, 6, 11, 12],
    [25, 26, 31, 32], [25, 6, 31, 32], [25, 26, 31, 12], [25, 6, 31, 12],
    [15, 16, 21, 22], [15, 16, 21, 12], [15, 16, 11, 22], [15, 16, 11, 12],
    [29, 30, 35, 36], [29, 30, 11, 36], [5, 30, 35, 36], [5, 30, 11, 36],
    [39, 40, 45, 46], [5, 40, 45, 46], [39, 6, 45, 46], [5, 6, 45, 46],
    [25, 30, 31, 36], [15, 16, 45, 46], [13, 14, 19, 20], [13, 14, 19, 12],
    [17, 18, 23, 24], [17, 18, 11, 24], [41, 42, 47, 48], [5, 42, 47, 48],
    [37, 38, 43, 44], [37, 6, 43, 44], [13, 18, 19, 24], [13, 14, 43, 44],
    [37, 42, 43, 48], [17, 18, 47, 48], [13, 18, 43, 48], [13, 18, 43, 48],
];

/// Pre-assembled tiles for every pattern and animation frame
#[derive(Debug)]
pub struct Autotile {
    /// `frames[frame][pattern]`
    frames: Vec<Vec<Bitmap>>,
}

impl Autotile {
    /// Expand an autotile sheet
    pub fn new(sheet: &Bitmap) -> RgssResult<Self> {
        let width = sheet.width() as i32;
        let height = sheet.height() as i32;
        if width < FRAME_WIDTH || height < SHEET_HEIGHT {
            return Err(RgssError::construction(format!(
                "Autotile sheet must be at least {}x{}, got {}x{}",
                FRAME_WIDTH, SHEET_HEIGHT, width, height
            )));
        }

        let frame_count = width / FRAME_WIDTH;
        let mut frames = Vec::with_capacity(frame_count as usize);
        for frame in 0..frame_count {
            let mut tiles = Vec::with_capacity(AUTOTILE_PATTERNS.len());
            for pattern in &AUTOTILE_PATTERNS {
                tiles.push(assemble(sheet, frame, pattern)?);
            }
            frames.push(tiles);
        }

        debug!("Expanded autotile sheet into {} frame(s)", frame_count);
        Ok(Self { frames })
    }

    /// Number of animation frames (sheet width / 96)
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Tile for a pattern id; the frame wraps around
    pub fn tile(&self, pattern: usize, frame: usize) -> Option<&Bitmap> {
        self.frames.get(frame % self.frames.len())?.get(pattern)
    }

    pub fn dispose(&mut self) {
        for tile in self.frames.iter_mut().flatten() {
            tile.dispose();
        }
    }
}

fn assemble(sheet: &Bitmap, frame: i32, pattern: &[u8; 4]) -> RgssResult<Bitmap> {
    let mut tile = Bitmap::new(AUTOTILE_SIZE, AUTOTILE_SIZE)?;
    for &number in pattern {
        let n = i32::from(number) - 1;
        let x = QUARTER * (n % 6);
        let y = QUARTER * (n / 6);
        let src = Rect::new(x + frame * FRAME_WIDTH, y, QUARTER, QUARTER);
        tile.blt(x % AUTOTILE_SIZE, y % AUTOTILE_SIZE, sheet, src, 255)?;
    }
    Ok(tile)
}
