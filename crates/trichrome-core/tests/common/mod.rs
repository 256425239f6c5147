use std::path::Path;

use image::{ImageBuffer, Luma};
use trichrome_core::plane::{Plane, Shift};

/// Blob centres and peak heights, as fractions of the plane size.
const BLOBS: [(f64, f64, f64); 7] = [
    (0.30, 0.35, 1.00),
    (0.55, 0.30, 0.70),
    (0.70, 0.60, 0.85),
    (0.40, 0.65, 0.55),
    (0.62, 0.45, 0.40),
    (0.35, 0.50, 0.65),
    (0.52, 0.70, 0.90),
];

const BLOB_SIGMA: f64 = 5.0;

/// Intensity of the synthetic scene at continuous coordinate `(x, y)`.
///
/// Blobs sit well inside the frame so a translated copy keeps all of them.
pub fn scene(width: usize, height: usize, x: f64, y: f64) -> u16 {
    let mut v = 0.0;
    for &(fx, fy, peak) in &BLOBS {
        let cx = fx * width as f64;
        let cy = fy * height as f64;
        let d2 = (x - cx).powi(2) + (y - cy).powi(2);
        v += peak * (-d2 / (2.0 * BLOB_SIGMA * BLOB_SIGMA)).exp();
    }
    (v.min(1.0) * 60_000.0).round() as u16
}

/// A textured reference plane.
pub fn scene_plane(width: usize, height: usize) -> Plane {
    Plane::from_fn(width, height, |x, y| scene(width, height, x as f64, y as f64))
}

/// A copy of the scene such that `shifted[x + dx, y + dy] == reference[x, y]`.
pub fn shifted_scene_plane(width: usize, height: usize, shift: Shift) -> Plane {
    Plane::from_fn(width, height, |x, y| {
        scene(
            width,
            height,
            x as f64 - shift.dx as f64,
            y as f64 - shift.dy as f64,
        )
    })
}

/// A triptych plate: blue band on top, green in the middle, red at the bottom.
///
/// `green` and `blue` are the shifts of those bands relative to red.
pub fn triptych(
    width: usize,
    band_height: usize,
    green: Shift,
    blue: Shift,
) -> ImageBuffer<Luma<u16>, Vec<u16>> {
    let bands = [
        shifted_scene_plane(width, band_height, blue),
        shifted_scene_plane(width, band_height, green),
        scene_plane(width, band_height),
    ];
    ImageBuffer::from_fn(width as u32, (3 * band_height) as u32, |x, y| {
        let band = y as usize / band_height;
        let local_y = y as usize % band_height;
        Luma([bands[band].get(x as usize, local_y)])
    })
}

/// Write a triptych PNG to `path`.
pub fn write_triptych_png(path: &Path, width: usize, band_height: usize, green: Shift, blue: Shift) {
    triptych(width, band_height, green, blue)
        .save(path)
        .expect("write triptych");
}
