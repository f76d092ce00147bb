use std::path::Path;

use canny_image::Image;
use jpeg_encoder::{ColorType, Encoder};

use crate::error::IoError;

/// Writes the given JPEG _(grayscale)_ data to the given file path.
///
/// # Arguments
///
/// - `file_path` - The path to the JPEG image.
/// - `image` - The image to encode.
/// - `quality` - The quality of the JPEG encoding, range from 0 (lowest) to 100 (highest)
pub fn write_image_jpeg_gray8(
    file_path: impl AsRef<Path>,
    image: &Image<u8, 1>,
    quality: u8,
) -> Result<(), IoError> {
    let (width, height) = (image.width(), image.height());
    let (Ok(w), Ok(h)) = (u16::try_from(width), u16::try_from(height)) else {
        return Err(IoError::ImageTooLarge(width, height));
    };

    let encoder = Encoder::new_file(file_path, quality)?;
    encoder.encode(image.as_slice(), w, h, ColorType::Luma)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_jpeg_gray8() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let file_path = tmp_dir.path().join("gray.jpg");

        let data = (0..16 * 8).map(|i| (i * 2) as u8).collect();
        let image = Image::<u8, 1>::new([16, 8].into(), data)?;
        write_image_jpeg_gray8(&file_path, &image, 90)?;

        // SOI marker
        let bytes = std::fs::read(&file_path)?;
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

        Ok(())
    }

    #[test]
    fn write_jpeg_too_large() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let image = Image::<u8, 1>::from_size_val([70_000, 1].into(), 0)?;
        assert!(matches!(
            write_image_jpeg_gray8(tmp_dir.path().join("wide.jpg"), &image, 90),
            Err(IoError::ImageTooLarge(70_000, 1))
        ));
        Ok(())
    }
}
