use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use trichrome_core::pipeline::{BatchProgress, ProgressReporter};

/// Progress bar advanced as each plate finishes.
pub struct BarReporter {
    bar: ProgressBar,
}

impl BarReporter {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{msg:24} [{bar:40}] {pos}/{len}")
        {
            bar.set_style(style.progress_chars("=> "));
        }
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_with_message("Done");
    }
}

impl ProgressReporter for BarReporter {
    fn begin_batch(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_message("Aligning plates");
    }

    fn file_started(&self, path: &Path) {
        if let Some(name) = path.file_name() {
            self.bar.set_message(name.to_string_lossy().into_owned());
        }
    }

    fn file_finished(&self, _path: &Path, _ok: bool, progress: BatchProgress) {
        self.bar.set_position(progress.completed as u64);
    }
}
