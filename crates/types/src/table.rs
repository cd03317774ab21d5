//! Multi-dimensional short integer table
//!
//! Used for map and tile data. Each element is an `i16`.

use log::trace;

use crate::error::{RgssError, RgssResult};

/// Size of the serialized header (five u32 values)
const HEADER_LEN: usize = 20;

/// A 1-, 2- or 3-dimensional grid of signed 16-bit integers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    dimensions: u8,
    xsize: usize,
    ysize: usize,
    zsize: usize,
    data: Vec<i16>,
}

impl Table {
    /// Create a zero-filled table. `sizes` holds one to three dimension sizes.
    pub fn new(sizes: &[usize]) -> RgssResult<Self> {
        let mut table = Self {
            dimensions: 1,
            xsize: 0,
            ysize: 0,
            zsize: 0,
            data: Vec::new(),
        };
        table.resize(sizes)?;
        Ok(table)
    }

    /// Number of dimensions the table was created or last resized with
    pub fn dimensions(&self) -> u8 {
        self.dimensions
    }

    pub fn xsize(&self) -> usize {
        self.xsize
    }

    pub fn ysize(&self) -> usize {
        self.ysize
    }

    pub fn zsize(&self) -> usize {
        self.zsize
    }

    /// Raw element storage, x varying fastest
    pub fn data(&self) -> &[i16] {
        &self.data
    }

    /// Change the table dimensions.
    ///
    /// Elements inside both the old and new bounds keep their coordinates,
    /// new cells are zero.
    pub fn resize(&mut self, sizes: &[usize]) -> RgssResult<()> {
        let (xsize, ysize, zsize) = match *sizes {
            [x] => (x, 1, 1),
            [x, y] => (x, y, 1),
            [x, y, z] => (x, y, z),
            _ => {
                return Err(RgssError::construction(format!(
                    "Table takes 1 to 3 dimensions, got {}",
                    sizes.len()
                )))
            }
        };

        let len = xsize
            .checked_mul(ysize)
            .and_then(|n| n.checked_mul(zsize))
            .filter(|&n| u32::try_from(n).is_ok())
            .ok_or_else(|| {
                RgssError::construction(format!(
                    "Table of {}x{}x{} exceeds the serializable size",
                    xsize, ysize, zsize
                ))
            })?;

        let mut data = vec![0i16; len];
        let copy_x = self.xsize.min(xsize);
        let copy_y = self.ysize.min(ysize);
        let copy_z = self.zsize.min(zsize);
        for z in 0..copy_z {
            for y in 0..copy_y {
                for x in 0..copy_x {
                    data[x + xsize * (y + ysize * z)] =
                        self.data[x + self.xsize * (y + self.ysize * z)];
                }
            }
        }

        self.dimensions = sizes.len() as u8;
        self.xsize = xsize;
        self.ysize = ysize;
        self.zsize = zsize;
        self.data = data;
        Ok(())
    }

    fn index(&self, x: usize, y: usize, z: usize) -> Option<usize> {
        if x < self.xsize && y < self.ysize && z < self.zsize {
            Some(x + self.xsize * (y + self.ysize * z))
        } else {
            None
        }
    }

    /// Element at a coordinate, `None` when out of range
    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<i16> {
        self.index(x, y, z).map(|i| self.data[i])
    }

    /// Store an element; out-of-range writes are ignored
    pub fn set(&mut self, x: usize, y: usize, z: usize, value: i16) {
        match self.index(x, y, z) {
            Some(i) => self.data[i] = value,
            None => trace!("Table write out of range at ({}, {}, {})", x, y, z),
        }
    }

    /// Serialize: five little-endian u32 (dimension count, xsize, ysize,
    /// zsize, element count) then every element as a little-endian i16.
    ///
    /// `resize` keeps the element count within `u32`, so every header
    /// field fits.
    pub fn dump(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.data.len() * 2);
        for value in [
            self.dimensions as usize,
            self.xsize,
            self.ysize,
            self.zsize,
            self.data.len(),
        ] {
            out.extend_from_slice(&(value as u32).to_le_bytes());
        }
        for value in &self.data {
            out.extend_from_slice(&value.to_le_bytes());
        }
        out
    }

    /// Deserialize the layout written by [`Table::dump`]
    pub fn load(bytes: &[u8]) -> RgssResult<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(RgssError::invalid_data("Table header is truncated"));
        }

        let mut header = [0usize; 5];
        for (i, chunk) in bytes[..HEADER_LEN].chunks_exact(4).enumerate() {
            header[i] = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as usize;
        }
        let [dimensions, xsize, ysize, zsize, count] = header;

        if !(1..=3).contains(&dimensions) {
            return Err(RgssError::invalid_data(format!(
                "Table dimension tag {} is not 1, 2 or 3",
                dimensions
            )));
        }
        if xsize.checked_mul(ysize).and_then(|n| n.checked_mul(zsize)) != Some(count) {
            return Err(RgssError::invalid_data(format!(
                "Table element count {} does not match {}x{}x{}",
                count, xsize, ysize, zsize
            )));
        }

        let payload = &bytes[HEADER_LEN..];
        if payload.len() < count * 2 {
            return Err(RgssError::invalid_data(format!(
                "Table payload holds {} bytes, expected {}",
                payload.len(),
                count * 2
            )));
        }

        let data = payload
            .chunks_exact(2)
            .take(count)
            .map(|c| i16::from_le_bytes([c[0], c[1]]))
            .collect();

        Ok(Self {
            dimensions: dimensions as u8,
            xsize,
            ysize,
            zsize,
            data,
        })
    }
}
