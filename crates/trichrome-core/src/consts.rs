/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Fraction of the frame width trimmed from each side of every band.
pub const DEFAULT_CUT_WIDTH_COEFF: f64 = 0.1;

/// Fraction of one band's height trimmed from its top and bottom.
pub const DEFAULT_CUT_HEIGHT_COEFF: f64 = 0.1;

/// Number of bands on a triptych plate (blue, green, red from top to bottom).
pub const BAND_COUNT: usize = 3;

/// A pyramid keeps halving while the smaller dimension exceeds this floor.
pub const DEFAULT_PYRAMID_FLOOR: usize = 100;

/// Half-width of the exhaustive search window at the coarsest pyramid level.
pub const DEFAULT_SEARCH_RADIUS: i32 = 30;

/// Slack added around the upscaled shift when moving to a finer level.
pub const DEFAULT_REFINE_MARGIN: i32 = 2;

/// Upper bound for the search radius and refine margin.
pub const MAX_SEARCH_EXTENT: i32 = i16::MAX as i32;

/// Sample value written to the alpha channel of every composite pixel.
pub const FULL_OPACITY: u16 = u16::MAX;

/// Default output directory, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "result";
