use std::path::Path;

use image::DynamicImage;
use tracing::{debug, info};

use crate::align::{align_pyramids, Pyramid};
use crate::compose::compose;
use crate::error::{Result, TrichromeError};
use crate::io::ImageCodec;
use crate::plane::{ChannelShifts, Composite};
use crate::split::{luma_plane, split_channels};

use super::config::TrichromeConfig;
use super::types::{ImageReport, PipelineStage};

/// Split, align and composite one decoded plate.
pub fn process_plate(
    frame: &DynamicImage,
    config: &TrichromeConfig,
) -> Result<(Composite, ChannelShifts)> {
    debug!(stage = %PipelineStage::Splitting, "Stage started");
    let planes = split_channels(&luma_plane(frame)?, &config.split)?;

    debug!(stage = %PipelineStage::BuildingPyramids, "Stage started");
    let floor = config.pyramid.floor;
    let (red, (green, blue)) = rayon::join(
        || Pyramid::build(&planes.red, floor),
        || {
            rayon::join(
                || Pyramid::build(&planes.green, floor),
                || Pyramid::build(&planes.blue, floor),
            )
        },
    );
    let pyramids = [red?, green?, blue?];
    debug!(levels = pyramids[0].len(), "Pyramids built");

    debug!(stage = %PipelineStage::Aligning, "Stage started");
    let reference = config.alignment.reference;
    let stay = &pyramids[reference.index()];
    let [first, second] = reference.others();
    let (first_shift, second_shift) = rayon::join(
        || align_pyramids(stay, &pyramids[first.index()], &config.alignment),
        || align_pyramids(stay, &pyramids[second.index()], &config.alignment),
    );

    let mut shifts = ChannelShifts::default();
    shifts.set(first, first_shift?);
    shifts.set(second, second_shift?);

    debug!(stage = %PipelineStage::Compositing, "Stage started");
    let composite = compose(&planes, &shifts)?;
    Ok((composite, shifts))
}

/// Decode `path`, process it and write the composite under `output_dir`.
///
/// The output keeps the input's file name and format.
pub fn process_image(
    path: &Path,
    output_dir: &Path,
    config: &TrichromeConfig,
    codec: &dyn ImageCodec,
) -> Result<ImageReport> {
    let file_name = path
        .file_name()
        .ok_or_else(|| TrichromeError::NotFound(path.to_path_buf()))?;
    let output = output_dir.join(file_name);

    debug!(stage = %PipelineStage::Decoding, path = %path.display(), "Stage started");
    let decoded = codec.decode(path)?;

    let (composite, shifts) = process_plate(&decoded.image, config)?;

    debug!(stage = %PipelineStage::Encoding, path = %output.display(), "Stage started");
    codec.encode(&composite, decoded.format, &output)?;

    info!(
        input = %path.display(),
        output = %output.display(),
        red = %shifts.red,
        green = %shifts.green,
        blue = %shifts.blue,
        "Plate aligned"
    );

    Ok(ImageReport {
        input: path.to_path_buf(),
        output,
        shifts,
        width: composite.width(),
        height: composite.height(),
    })
}
