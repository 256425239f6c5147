//! Channel splitting for triptych plates.
//!
//! A plate holds three exposures stacked vertically: blue on top, green in
//! the middle and red at the bottom. Each band is trimmed by a margin on all
//! four sides to drop plate edges and the seams between exposures.

use image::DynamicImage;
use ndarray::s;
use tracing::debug;

use crate::consts::BAND_COUNT;
use crate::error::{Result, TrichromeError};
use crate::pipeline::config::SplitConfig;
use crate::plane::{ChannelPlanes, Plane};

/// Pixel rectangle of one band inside the source frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BandRect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

/// Crop rectangles for the blue, green and red bands, in that order.
pub fn band_rects(width: usize, height: usize, config: &SplitConfig) -> Result<[BandRect; 3]> {
    config.validate()?;

    let band_height = height / BAND_COUNT;
    let cut_w = (width as f64 * config.cut_width_coeff) as usize;
    let cut_h = (band_height as f64 * config.cut_height_coeff) as usize;

    let out_w = width.saturating_sub(2 * cut_w);
    let out_h = band_height.saturating_sub(2 * cut_h);
    if out_w == 0 || out_h == 0 {
        return Err(TrichromeError::InvalidDimensions { width, height });
    }

    let rect = |band: usize| BandRect {
        x: cut_w,
        y: band * band_height + cut_h,
        width: out_w,
        height: out_h,
    };
    Ok([rect(0), rect(1), rect(2)])
}

/// Split a grayscale plate into its red, green and blue bands.
pub fn split_channels(frame: &Plane, config: &SplitConfig) -> Result<ChannelPlanes> {
    let [blue, green, red] = band_rects(frame.width(), frame.height(), config)?;
    debug!(
        width = red.width,
        height = red.height,
        "Splitting plate into bands"
    );

    let crop = |r: BandRect| {
        Plane::new(
            frame
                .data()
                .slice(s![r.y..r.y + r.height, r.x..r.x + r.width])
                .to_owned(),
        )
    };

    Ok(ChannelPlanes {
        red: crop(red),
        green: crop(green),
        blue: crop(blue),
    })
}

/// Convert a decoded image into a 16-bit luma plane.
///
/// Luma images are accepted as-is (alpha is dropped). Color-encoded images
/// are accepted only when every pixel is neutral (R = G = B); anything else
/// is a color photograph and cannot be a plate.
pub fn luma_plane(image: &DynamicImage) -> Result<Plane> {
    let (w, h) = (image.width() as usize, image.height() as usize);

    let samples = match image {
        DynamicImage::ImageLuma8(_)
        | DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageLumaA16(_) => image.to_luma16().into_raw(),
        _ => {
            let rgb = image.to_rgb16();
            if let Some(p) = rgb.pixels().find(|p| p[0] != p[1] || p[1] != p[2]) {
                return Err(TrichromeError::UnsupportedFormat(format!(
                    "{:?} image has color content (first non-neutral pixel {:?})",
                    image.color(),
                    p.0
                )));
            }
            rgb.pixels().map(|p| p[0]).collect()
        }
    };

    Plane::from_raw(w, h, samples)
}
