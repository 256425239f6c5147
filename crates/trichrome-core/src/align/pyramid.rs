//! Multi-resolution pyramids for coarse-to-fine alignment.
//!
//! Level 0 is the source plane. Every further level halves both dimensions
//! with a 2x2 area average, which keeps coarse levels free of the aliasing
//! that plain decimation would introduce into the correlation surface.

use ndarray::Array2;
use rayon::prelude::*;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::error::{Result, TrichromeError};
use crate::plane::Plane;

#[derive(Clone, Debug)]
pub struct Pyramid {
    levels: Vec<Plane>,
}

impl Pyramid {
    /// Build a pyramid, halving while the smaller dimension exceeds `floor`.
    pub fn build(source: &Plane, floor: usize) -> Result<Self> {
        let (w, h) = source.dimensions();
        if w == 0 || h == 0 {
            return Err(TrichromeError::InvalidDimensions {
                width: w,
                height: h,
            });
        }

        let mut levels = vec![source.clone()];
        loop {
            let last = &levels[levels.len() - 1];
            if last.width().min(last.height()) <= floor {
                break;
            }
            let next = downsample_2x(last);
            levels.push(next);
        }

        Ok(Self { levels })
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Level `index`, where 0 is full resolution.
    pub fn level(&self, index: usize) -> &Plane {
        &self.levels[index]
    }

    pub fn levels(&self) -> &[Plane] {
        &self.levels
    }

    /// Coarsest level first.
    pub fn coarse_to_fine(&self) -> impl Iterator<Item = &Plane> {
        self.levels.iter().rev()
    }
}

/// Halve both dimensions (floor) by averaging each 2x2 block, rounding to nearest.
///
/// An odd trailing row or column of the source is dropped.
pub fn downsample_2x(plane: &Plane) -> Plane {
    let (w, h) = plane.dimensions();
    let (new_w, new_h) = (w / 2, h / 2);
    if new_w == 0 || new_h == 0 {
        return Plane::new(Array2::zeros((new_h, new_w)));
    }

    let fill_row = |r: usize, out: &mut [u16]| {
        let top = plane.row(2 * r);
        let bottom = plane.row(2 * r + 1);
        for (c, v) in out.iter_mut().enumerate() {
            let sum = top[2 * c] as u32
                + top[2 * c + 1] as u32
                + bottom[2 * c] as u32
                + bottom[2 * c + 1] as u32;
            *v = ((sum + 2) / 4) as u16;
        }
    };

    let mut samples = vec![0u16; new_w * new_h];
    if new_w * new_h >= PARALLEL_PIXEL_THRESHOLD {
        samples
            .par_chunks_mut(new_w)
            .enumerate()
            .for_each(|(r, out)| fill_row(r, out));
    } else {
        for (r, out) in samples.chunks_mut(new_w).enumerate() {
            fill_row(r, out);
        }
    }

    let data = Array2::from_shape_vec((new_h, new_w), samples)
        .expect("sample count matches dimensions");
    Plane::new(data)
}
