pub mod config;
mod batch;
mod plate;
mod types;

pub use batch::{prepare_output_dir, process, run_batch};
pub use plate::{process_image, process_plate};
pub use types::{
    BatchProgress, BatchReport, ImageReport, NoOpReporter, PipelineStage, ProgressReporter,
};
