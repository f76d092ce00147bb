use std::path::Path;

use canny_image::{Image, ImageSize};

use crate::error::IoError;
use crate::jpeg::write_image_jpeg_gray8;
use crate::png::write_image_png_gray8;

/// Quality used by [`write_image_gray8`] for JPEG files.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Reads an image from the given file path as RGBA8.
///
/// The method tries to read from any image format supported by the image crate
/// and expands the decoded pixels to four 8-bit channels. Grayscale sources are
/// replicated across the color channels and images without alpha get an opaque
/// alpha channel.
///
/// # Arguments
///
/// * `file_path` - The path to a valid image file.
///
/// # Returns
///
/// An RGBA8 image containing the image data.
pub fn read_image_any_rgba8(file_path: impl AsRef<Path>) -> Result<Image<u8, 4>, IoError> {
    let file_path = file_path.as_ref().to_owned();

    // verify the file exists
    if !file_path.exists() {
        return Err(IoError::FileDoesNotExist(file_path));
    }

    let img = image::ImageReader::open(&file_path)?
        .with_guessed_format()?
        .decode()?;

    let size = ImageSize {
        width: img.width() as usize,
        height: img.height() as usize,
    };

    log::debug!(
        "decoded {} as {:?} ({})",
        file_path.display(),
        img.color(),
        size
    );

    Ok(Image::new(size, img.into_rgba8().into_raw())?)
}

/// Writes a grayscale image, choosing the encoder from the file extension.
///
/// `png` files are written losslessly and `jpg`/`jpeg` files with
/// [`DEFAULT_JPEG_QUALITY`]. The extension match ignores case.
///
/// # Arguments
///
/// * `file_path` - The destination path.
/// * `image` - The image to encode.
pub fn write_image_gray8(file_path: impl AsRef<Path>, image: &Image<u8, 1>) -> Result<(), IoError> {
    let file_path = file_path.as_ref();

    let ext = file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match ext.as_deref() {
        Some("png") => write_image_png_gray8(file_path, image)?,
        Some("jpg") | Some("jpeg") => {
            write_image_jpeg_gray8(file_path, image, DEFAULT_JPEG_QUALITY)?
        }
        _ => return Err(IoError::InvalidFileExtension(file_path.to_path_buf())),
    }

    log::debug!("wrote {} ({})", file_path.display(), image.size());

    Ok(())
}
