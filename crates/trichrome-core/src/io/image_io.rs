use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat, ImageReader};
use tracing::debug;

use crate::error::{Result, TrichromeError};
use crate::plane::{Composite, Plane};

/// A decoded plate together with the format it was stored in.
#[derive(Clone, Debug)]
pub struct DecodedFrame {
    pub image: DynamicImage,
    pub format: ImageFormat,
}

/// Decoding and encoding of image files.
///
/// The batch driver calls these from several worker threads at once.
pub trait ImageCodec: Send + Sync {
    /// Read and decode the file at `path`.
    fn decode(&self, path: &Path) -> Result<DecodedFrame>;

    /// Write `composite` to `path` in `format`.
    fn encode(&self, composite: &Composite, format: ImageFormat, path: &Path) -> Result<()>;
}

/// Codec backed by the `image` crate, sniffing the format from file content.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageCrateCodec;

impl ImageCodec for ImageCrateCodec {
    fn decode(&self, path: &Path) -> Result<DecodedFrame> {
        if !path.is_file() {
            return Err(TrichromeError::NotFound(path.to_path_buf()));
        }

        let reader = ImageReader::open(path)?.with_guessed_format()?;
        let format = reader.format().ok_or_else(|| {
            TrichromeError::UnsupportedFormat(format!(
                "cannot detect image format of {}",
                path.display()
            ))
        })?;
        let image = reader.decode().map_err(TrichromeError::Decode)?;
        debug!(
            format = ?format,
            width = image.width(),
            height = image.height(),
            color = ?image.color(),
            "Decoded plate"
        );

        Ok(DecodedFrame { image, format })
    }

    fn encode(&self, composite: &Composite, format: ImageFormat, path: &Path) -> Result<()> {
        let image = DynamicImage::ImageRgba16(composite.clone());
        write_dynamic(&encodable(image, format), format, path)
    }
}

/// Save a single plane as 16-bit grayscale (8-bit where the format requires it).
pub fn save_plane(plane: &Plane, format: ImageFormat, path: &Path) -> Result<()> {
    let gray = image::ImageBuffer::<image::Luma<u16>, Vec<u16>>::from_raw(
        plane.width() as u32,
        plane.height() as u32,
        plane.samples().to_vec(),
    )
    .expect("buffer size matches dimensions");

    let image = match format {
        ImageFormat::Png | ImageFormat::Tiff => DynamicImage::ImageLuma16(gray),
        _ => DynamicImage::ImageLuma8(DynamicImage::ImageLuma16(gray).to_luma8()),
    };
    write_dynamic(&image, format, path)
}

/// Convert to a pixel layout `format` can store.
///
/// PNG, TIFF and Farbfeld keep 16-bit RGBA. JPEG has neither alpha nor
/// 16-bit samples, so it gets 8-bit RGB. OpenEXR and Radiance HDR only store
/// floats (HDR without alpha). Everything else gets 8-bit RGBA.
fn encodable(image: DynamicImage, format: ImageFormat) -> DynamicImage {
    match format {
        ImageFormat::Png | ImageFormat::Tiff | ImageFormat::Farbfeld => image,
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8()),
        ImageFormat::OpenExr => DynamicImage::ImageRgba32F(image.to_rgba32f()),
        ImageFormat::Hdr => DynamicImage::ImageRgb32F(image.to_rgb32f()),
        _ => DynamicImage::ImageRgba8(image.to_rgba8()),
    }
}

/// Encode fully in memory, then write. A failed encode leaves nothing on disk.
fn write_dynamic(image: &DynamicImage, format: ImageFormat, path: &Path) -> Result<()> {
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, format)
        .map_err(TrichromeError::Encode)?;

    std::fs::write(path, bytes.into_inner()).map_err(|e| {
        let _ = std::fs::remove_file(path);
        TrichromeError::Encode(image::ImageError::IoError(e))
    })
}
