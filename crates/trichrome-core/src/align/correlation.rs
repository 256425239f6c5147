//! Coarse-to-fine exhaustive cross-correlation search.
//!
//! Every integer offset inside a square window is scored by the raw sum of
//! sample products over the overlap of the two planes. The coarsest pyramid
//! level gets the wide window; each finer level only searches a small
//! neighbourhood of the doubled previous answer.

use rayon::prelude::*;
use tracing::debug;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::error::{Result, TrichromeError};
use crate::pipeline::config::{AlignmentConfig, PyramidConfig};
use crate::plane::{Plane, Shift};

use super::pyramid::Pyramid;

/// Inclusive range of candidate offsets on both axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchWindow {
    pub dx_min: i32,
    pub dx_max: i32,
    pub dy_min: i32,
    pub dy_max: i32,
}

impl SearchWindow {
    pub fn centered(center: Shift, radius: i32) -> Self {
        Self {
            dx_min: center.dx - radius,
            dx_max: center.dx + radius,
            dy_min: center.dy - radius,
            dy_max: center.dy + radius,
        }
    }

    /// Window for the next finer level: the shift scaled by 2, widened by `margin`.
    pub fn refined(best: Shift, margin: i32) -> Self {
        Self::centered(Shift::new(2 * best.dx, 2 * best.dy), margin)
    }

    /// Candidates in scan order: dx ascending, then dy ascending.
    pub fn candidates(&self) -> Vec<Shift> {
        (self.dx_min..=self.dx_max)
            .flat_map(|dx| (self.dy_min..=self.dy_max).map(move |dy| Shift::new(dx, dy)))
            .collect()
    }
}

/// Sum of `stay[x, y] * shift[x + dx, y + dy]` over coordinates valid in both planes.
///
/// Returns 0 when the translated planes do not overlap.
pub fn correlation_score(stay: &Plane, shift: &Plane, offset: Shift) -> i64 {
    let (dx, dy) = (offset.dx as i64, offset.dy as i64);
    let x0 = (-dx).max(0);
    let x1 = (stay.width() as i64).min(shift.width() as i64 - dx);
    let y0 = (-dy).max(0);
    let y1 = (stay.height() as i64).min(shift.height() as i64 - dy);
    if x0 >= x1 || y0 >= y1 {
        return 0;
    }

    let (x0, x1) = (x0 as usize, x1 as usize);
    let (sx0, sx1) = ((x0 as i64 + dx) as usize, (x1 as i64 + dx) as usize);

    let mut sum = 0i64;
    for y in y0..y1 {
        let a = &stay.row(y as usize)[x0..x1];
        let b = &shift.row((y + dy) as usize)[sx0..sx1];
        sum += a
            .iter()
            .zip(b)
            .map(|(&p, &q)| p as i64 * q as i64)
            .sum::<i64>();
    }
    sum
}

/// Best offset inside `window` and its score.
///
/// Only a strictly greater score replaces the current best, so ties resolve
/// to the first candidate in scan order.
pub fn best_in_window(stay: &Plane, shift: &Plane, window: &SearchWindow) -> (Shift, i64) {
    let candidates = window.candidates();
    let work = candidates.len() * stay.width() * stay.height();

    let scores: Vec<i64> = if work >= PARALLEL_PIXEL_THRESHOLD {
        candidates
            .par_iter()
            .map(|&c| correlation_score(stay, shift, c))
            .collect()
    } else {
        candidates
            .iter()
            .map(|&c| correlation_score(stay, shift, c))
            .collect()
    };

    let mut best = (Shift::ZERO, i64::MIN);
    for (&candidate, &score) in candidates.iter().zip(&scores) {
        if score > best.1 {
            best = (candidate, score);
        }
    }
    best
}

/// Find the shift that best aligns `shift` onto `stay`, coarse to fine.
pub fn align_pyramids(stay: &Pyramid, shift: &Pyramid, config: &AlignmentConfig) -> Result<Shift> {
    check_shapes(stay, shift)?;

    let mut window = SearchWindow::centered(Shift::ZERO, config.search_radius);
    let mut best = Shift::ZERO;

    let levels = stay.coarse_to_fine().zip(shift.coarse_to_fine());
    for (depth, (stay_level, shift_level)) in levels.enumerate() {
        let level = stay.len() - 1 - depth;
        let (found, score) = best_in_window(stay_level, shift_level, &window);
        best = found;
        debug!(level, dx = best.dx, dy = best.dy, score, "Pyramid level aligned");

        window = SearchWindow::refined(best, config.refine_margin);
    }

    Ok(best)
}

/// Build pyramids for both planes and align them.
pub fn align_planes(
    stay: &Plane,
    shift: &Plane,
    pyramid: &PyramidConfig,
    config: &AlignmentConfig,
) -> Result<Shift> {
    let (stay_pyr, shift_pyr) = rayon::join(
        || Pyramid::build(stay, pyramid.floor),
        || Pyramid::build(shift, pyramid.floor),
    );
    align_pyramids(&stay_pyr?, &shift_pyr?, config)
}

fn check_shapes(stay: &Pyramid, shift: &Pyramid) -> Result<()> {
    if stay.is_empty() || stay.len() != shift.len() {
        return Err(TrichromeError::ShapeMismatch(format!(
            "{} levels vs {} levels",
            stay.len(),
            shift.len()
        )));
    }
    for (i, (a, b)) in stay.levels().iter().zip(shift.levels()).enumerate() {
        if a.dimensions() != b.dimensions() {
            return Err(TrichromeError::ShapeMismatch(format!(
                "level {}: {}x{} vs {}x{}",
                i,
                a.width(),
                a.height(),
                b.width(),
                b.height()
            )));
        }
    }
    Ok(())
}
