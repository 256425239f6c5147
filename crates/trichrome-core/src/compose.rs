use rayon::prelude::*;
use tracing::debug;

use crate::consts::{FULL_OPACITY, PARALLEL_PIXEL_THRESHOLD};
use crate::error::{Result, TrichromeError};
use crate::plane::{Channel, ChannelPlanes, ChannelShifts, Composite};

/// Common region of the three shifted planes, in reference coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Overlap {
    pub x: i64,
    pub y: i64,
    pub width: usize,
    pub height: usize,
}

/// Intersect the bounding boxes of all channels after applying their shifts.
///
/// Reference coordinate `(x, y)` maps to `(x + dx, y + dy)` in a channel, so
/// that channel covers `[-dx, width - dx)` horizontally.
pub fn overlap(planes: &ChannelPlanes, shifts: &ChannelShifts) -> Result<Overlap> {
    let mut x0 = i64::MIN;
    let mut x1 = i64::MAX;
    let mut y0 = i64::MIN;
    let mut y1 = i64::MAX;

    for channel in Channel::ALL {
        let plane = planes.get(channel);
        let shift = shifts.get(channel);
        x0 = x0.max(-(shift.dx as i64));
        x1 = x1.min(plane.width() as i64 - shift.dx as i64);
        y0 = y0.max(-(shift.dy as i64));
        y1 = y1.min(plane.height() as i64 - shift.dy as i64);
    }

    if x0 >= x1 || y0 >= y1 {
        return Err(TrichromeError::NoOverlap);
    }

    Ok(Overlap {
        x: x0,
        y: y0,
        width: (x1 - x0) as usize,
        height: (y1 - y0) as usize,
    })
}

/// Merge the three channels into one RGBA image cropped to their overlap.
pub fn compose(planes: &ChannelPlanes, shifts: &ChannelShifts) -> Result<Composite> {
    let region = overlap(planes, shifts)?;
    debug!(
        width = region.width,
        height = region.height,
        x = region.x,
        y = region.y,
        "Compositing channels"
    );

    // Top-left sample of the overlap inside each channel; all non-negative.
    let origin = Channel::ALL.map(|channel| {
        let shift = shifts.get(channel);
        (
            (region.x + shift.dx as i64) as usize,
            (region.y + shift.dy as i64) as usize,
        )
    });
    let sources = Channel::ALL.map(|channel| planes.get(channel));

    let fill_row = |row: usize, out: &mut [u16]| {
        let rows = [0usize, 1, 2].map(|k| {
            let (ox, oy) = origin[k];
            &sources[k].row(oy + row)[ox..ox + region.width]
        });
        for (col, px) in out.chunks_exact_mut(4).enumerate() {
            px[0] = rows[0][col];
            px[1] = rows[1][col];
            px[2] = rows[2][col];
            px[3] = FULL_OPACITY;
        }
    };

    let stride = region.width * 4;
    let mut buf = vec![0u16; stride * region.height];
    if region.width * region.height >= PARALLEL_PIXEL_THRESHOLD {
        buf.par_chunks_mut(stride)
            .enumerate()
            .for_each(|(row, out)| fill_row(row, out));
    } else {
        for (row, out) in buf.chunks_mut(stride).enumerate() {
            fill_row(row, out);
        }
    }

    let composite = Composite::from_raw(region.width as u32, region.height as u32, buf)
        .expect("buffer size matches dimensions");
    Ok(composite)
}
