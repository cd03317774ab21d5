//! Image loading and saving

use std::fs;
use std::io;
use std::path::Path;

use image::{GenericImageView, ImageError, ImageFormat, RgbaImage};
use log::debug;
use rgss_types::{RgssError, RgssResult};

/// Decoded image data
#[derive(Debug)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

fn map_image_error(err: ImageError) -> RgssError {
    match err {
        ImageError::Unsupported(e) => RgssError::unsupported(e.to_string()),
        ImageError::IoError(e) => RgssError::Io(e),
        other => RgssError::Image(other.to_string()),
    }
}

/// Decode image bytes to RGBA pixel data
pub fn decode_image(bytes: &[u8]) -> RgssResult<DecodedImage> {
    let img = image::load_from_memory(bytes).map_err(map_image_error)?;

    let (width, height) = img.dimensions();
    let data = img.to_rgba8().into_raw();

    debug!("Decoded image: {}x{}", width, height);

    Ok(DecodedImage { width, height, data })
}

/// Read and decode an image file
pub fn load_file(path: &Path) -> RgssResult<DecodedImage> {
    let bytes = fs::read(path)
        .map_err(|e| RgssError::Io(io::Error::new(e.kind(), format!("{}: {}", path.display(), e))))?;
    decode_image(&bytes)
}

/// Write RGBA8 pixels as a PNG
pub fn save_png(path: &Path, width: u32, height: u32, data: &[u8]) -> RgssResult<()> {
    let img = RgbaImage::from_raw(width, height, data.to_vec())
        .ok_or_else(|| RgssError::invalid_data("pixel buffer does not match its dimensions"))?;
    img.save_with_format(path, ImageFormat::Png).map_err(map_image_error)?;
    debug!("Saved {}x{} PNG to {}", width, height, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::Bitmap;
    use rgss_types::{Color, Rect};

    #[test]
    fn test_decode_garbage_fails() {
        assert!(decode_image(b"definitely not an image").is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = load_file(Path::new("/nonexistent/rgss/image.png")).unwrap_err();
        match err {
            RgssError::Io(e) => {
                assert_eq!(e.kind(), io::ErrorKind::NotFound);
                assert!(e.to_string().contains("/nonexistent/rgss/image.png"));
            }
            other => panic!("expected an I/O error, got {:?}", other),
        }
    }

    #[test]
    fn test_png_round_trip() {
        let mut bmp = Bitmap::new(3, 2).unwrap();
        bmp.fill_rect(Rect::new(1, 0, 2, 2), Color::new(10.0, 20.0, 30.0, 40.0)).unwrap();

        let path = std::env::temp_dir().join(format!("rgss-loader-{}.png", std::process::id()));
        bmp.save_png(&path).unwrap();
        let loaded = Bitmap::from_file(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(loaded.rect(), bmp.rect());
        assert_eq!(loaded.pixels().unwrap(), bmp.pixels().unwrap());
    }

    #[test]
    fn test_from_memory() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(1, 0, image::Rgba([1, 2, 3, 4]));
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png).unwrap();

        let bmp = Bitmap::from_memory(&bytes).unwrap();
        assert_eq!(bmp.get_pixel(1, 0).unwrap().to_rgba8(), [1, 2, 3, 4]);
    }
}
