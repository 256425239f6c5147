use std::path::{Path, PathBuf};

use crate::error::{Result, TrichromeError};
use crate::plane::ChannelShifts;

/// Per-image processing stage, used in log events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    Decoding,
    Splitting,
    BuildingPyramids,
    Aligning,
    Compositing,
    Encoding,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decoding => write!(f, "Decoding plate"),
            Self::Splitting => write!(f, "Splitting bands"),
            Self::BuildingPyramids => write!(f, "Building pyramids"),
            Self::Aligning => write!(f, "Aligning channels"),
            Self::Compositing => write!(f, "Compositing"),
            Self::Encoding => write!(f, "Writing output"),
        }
    }
}

/// Result of processing one plate.
#[derive(Clone, Debug)]
pub struct ImageReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub shifts: ChannelShifts,
    pub width: u32,
    pub height: u32,
}

/// Snapshot of batch progress handed to a [`ProgressReporter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchProgress {
    pub completed: usize,
    pub succeeded: usize,
    pub total: usize,
}

/// Thread-safe progress reporting for the batch driver.
///
/// Methods are called from worker threads. All have no-op defaults.
pub trait ProgressReporter: Send + Sync {
    /// The batch is about to start on `total` files.
    fn begin_batch(&self, _total: usize) {}

    /// A worker picked up `path`.
    fn file_started(&self, _path: &Path) {}

    /// A worker finished `path`, successfully or not.
    fn file_finished(&self, _path: &Path, _ok: bool, _progress: BatchProgress) {}

    /// Every file has been handled.
    fn finish_batch(&self, _progress: BatchProgress) {}
}

/// Reporter that ignores all events.
pub struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}

/// Aggregate outcome of a batch, in input order.
#[derive(Debug)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub outcomes: Vec<(PathBuf, Result<ImageReport>)>,
}

impl BatchReport {
    pub fn failed(&self) -> usize {
        self.total - self.succeeded
    }

    /// Turn a batch with any failed file into [`TrichromeError::Batch`].
    pub fn into_result(self) -> Result<Self> {
        if self.failed() > 0 {
            return Err(TrichromeError::Batch {
                failed: self.failed(),
                total: self.total,
            });
        }
        Ok(self)
    }
}
