use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_CUT_HEIGHT_COEFF, DEFAULT_CUT_WIDTH_COEFF, DEFAULT_OUTPUT_DIR, DEFAULT_PYRAMID_FLOOR,
    DEFAULT_REFINE_MARGIN, DEFAULT_SEARCH_RADIUS, MAX_SEARCH_EXTENT,
};
use crate::error::{Result, TrichromeError};
use crate::plane::Channel;

/// Full configuration for splitting, aligning and batch processing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrichromeConfig {
    #[serde(default)]
    pub split: SplitConfig,
    #[serde(default)]
    pub pyramid: PyramidConfig,
    #[serde(default)]
    pub alignment: AlignmentConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

impl TrichromeConfig {
    /// Check every section, returning the first problem found.
    pub fn validate(&self) -> Result<()> {
        self.split.validate()?;
        self.pyramid.validate()?;
        self.alignment.validate()?;
        self.batch.validate()
    }
}

/// Border trimming applied to each band.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Fraction of the frame width cut from the left and from the right.
    pub cut_width_coeff: f64,
    /// Fraction of the band height cut from the top and from the bottom.
    pub cut_height_coeff: f64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            cut_width_coeff: DEFAULT_CUT_WIDTH_COEFF,
            cut_height_coeff: DEFAULT_CUT_HEIGHT_COEFF,
        }
    }
}

impl SplitConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("cut_width_coeff", self.cut_width_coeff),
            ("cut_height_coeff", self.cut_height_coeff),
        ] {
            if !(0.0..0.5).contains(&value) {
                return Err(TrichromeError::InvalidConfig(format!(
                    "{name} must be in [0, 0.5), got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PyramidConfig {
    /// Levels are added while the smaller dimension exceeds this many samples.
    pub floor: usize,
}

impl Default for PyramidConfig {
    fn default() -> Self {
        Self {
            floor: DEFAULT_PYRAMID_FLOOR,
        }
    }
}

impl PyramidConfig {
    pub fn validate(&self) -> Result<()> {
        if self.floor == 0 {
            return Err(TrichromeError::InvalidConfig(
                "pyramid floor must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    /// Channel the other two are aligned against.
    pub reference: Channel,
    /// Half-width of the search window at the coarsest level.
    pub search_radius: i32,
    /// Slack around the doubled shift at each finer level.
    pub refine_margin: i32,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            reference: Channel::Red,
            search_radius: DEFAULT_SEARCH_RADIUS,
            refine_margin: DEFAULT_REFINE_MARGIN,
        }
    }
}

impl AlignmentConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("search_radius", self.search_radius),
            ("refine_margin", self.refine_margin),
        ] {
            if !(0..=MAX_SEARCH_EXTENT).contains(&value) {
                return Err(TrichromeError::InvalidConfig(format!(
                    "{name} must be in [0, {MAX_SEARCH_EXTENT}], got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub output_dir: PathBuf,
    /// Maximum number of files processed at once.
    pub max_workers: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            max_workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

impl BatchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            return Err(TrichromeError::InvalidConfig(
                "max_workers must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
