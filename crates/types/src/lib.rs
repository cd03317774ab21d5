//! RGSS Value Types
//!
//! Colors, tones, rectangles and tables shared by every other crate,
//! along with the common error type.

mod color;
mod error;
mod rect;
mod table;
mod tone;

pub use color::Color;
pub use error::{RgssError, RgssResult};
pub use rect::Rect;
pub use table::Table;
pub use tone::Tone;

/// Read `N` little-endian doubles from the front of `bytes`.
pub(crate) fn read_f64s<const N: usize>(bytes: &[u8], what: &str) -> RgssResult<[f64; N]> {
    if bytes.len() < N * 8 {
        return Err(RgssError::invalid_data(format!(
            "{} payload needs {} bytes, got {}",
            what,
            N * 8,
            bytes.len()
        )));
    }

    let mut out = [0.0; N];
    for (i, chunk) in bytes.chunks_exact(8).take(N).enumerate() {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(chunk);
        out[i] = f64::from_le_bytes(raw);
    }
    Ok(out)
}

/// Write doubles in little-endian order.
pub(crate) fn write_f64s(values: &[f64]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}
