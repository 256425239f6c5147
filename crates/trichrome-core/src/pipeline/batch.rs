//! Bounded-concurrency batch driver.
//!
//! A fixed set of worker threads pulls file indices from a shared cursor
//! until the backlog is empty. A failure (or panic) while processing one
//! file is recorded for that file only; the rest of the backlog still runs.
//! Inputs sharing a file name would write the same output, so only the first
//! of them is processed and the others fail with
//! [`TrichromeError::DuplicateOutput`].

use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use tracing::{info, warn};

use crate::error::{Result, TrichromeError};
use crate::io::{ImageCodec, ImageCrateCodec};

use super::config::TrichromeConfig;
use super::plate::process_image;
use super::types::{BatchProgress, BatchReport, ImageReport, NoOpReporter, ProgressReporter};

/// Process `paths` into `output_dir` with at most `max_workers` files in flight.
///
/// Returns [`TrichromeError::Batch`] if any file failed; every other file is
/// still fully processed.
pub fn process(paths: &[PathBuf], output_dir: &Path, max_workers: usize) -> Result<()> {
    let mut config = TrichromeConfig::default();
    config.batch.output_dir = output_dir.to_path_buf();
    config.batch.max_workers = max_workers;

    run_batch(paths, &config, &ImageCrateCodec, &NoOpReporter)?.into_result()?;
    Ok(())
}

/// Run the whole backlog and report every file's outcome.
///
/// Only configuration errors and failure to create the output directory
/// abort the batch; per-file errors end up in the report.
pub fn run_batch(
    paths: &[PathBuf],
    config: &TrichromeConfig,
    codec: &dyn ImageCodec,
    reporter: &dyn ProgressReporter,
) -> Result<BatchReport> {
    config.validate()?;
    let output_dir = prepare_output_dir(&config.batch.output_dir)?;

    let total = paths.len();
    let workers = config.batch.max_workers.min(total);
    info!(
        files = total,
        workers,
        output = %output_dir.display(),
        "Starting batch"
    );
    reporter.begin_batch(total);
    let claimed_by = output_claims(paths);

    let next = AtomicUsize::new(0);
    let completed = AtomicUsize::new(0);
    let succeeded = AtomicUsize::new(0);

    let worker = || {
        let mut done: Vec<(usize, Result<ImageReport>)> = Vec::new();
        loop {
            let index = next.fetch_add(1, Ordering::Relaxed);
            if index >= total {
                break;
            }
            let path = &paths[index];
            reporter.file_started(path);

            let outcome = match claimed_by[index] {
                Some(first) => Err(TrichromeError::DuplicateOutput {
                    input: path.clone(),
                    first: paths[first].clone(),
                }),
                None => isolated(|| process_image(path, &output_dir, config, codec)),
            };
            let ok = outcome.is_ok();
            let succeeded_now = if ok {
                succeeded.fetch_add(1, Ordering::AcqRel) + 1
            } else {
                succeeded.load(Ordering::Acquire)
            };
            let completed_now = completed.fetch_add(1, Ordering::AcqRel) + 1;

            if let Err(ref e) = outcome {
                warn!(path = %path.display(), error = %e, "Failed to process file");
            }
            reporter.file_finished(
                path,
                ok,
                BatchProgress {
                    completed: completed_now,
                    succeeded: succeeded_now,
                    total,
                },
            );
            done.push((index, outcome));
        }
        done
    };

    let mut slots: Vec<Option<Result<ImageReport>>> = (0..total).map(|_| None).collect();
    thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|id| {
                thread::Builder::new()
                    .name(format!("trichrome-worker-{id}"))
                    .spawn_scoped(scope, &worker)
                    .expect("Failed to spawn worker thread")
            })
            .collect();

        for handle in handles {
            if let Ok(done) = handle.join() {
                for (index, outcome) in done {
                    slots[index] = Some(outcome);
                }
            }
        }
    });

    let outcomes: Vec<_> = paths
        .iter()
        .cloned()
        .zip(slots)
        .map(|(path, slot)| {
            let outcome = slot.unwrap_or_else(|| {
                Err(TrichromeError::WorkerPanic(format!(
                    "worker stopped before reporting {}",
                    path.display()
                )))
            });
            (path, outcome)
        })
        .collect();

    let report = BatchReport {
        total,
        succeeded: outcomes.iter().filter(|(_, o)| o.is_ok()).count(),
        outcomes,
    };
    info!(
        succeeded = report.succeeded,
        total = report.total,
        "Batch finished"
    );
    reporter.finish_batch(BatchProgress {
        completed: total,
        succeeded: report.succeeded,
        total,
    });

    Ok(report)
}

/// Resolve `dir` to an absolute path and create it with all parents.
pub fn prepare_output_dir(dir: &Path) -> Result<PathBuf> {
    let directory_error = |source| TrichromeError::Directory {
        path: dir.to_path_buf(),
        source,
    };
    let absolute = std::path::absolute(dir).map_err(directory_error)?;
    std::fs::create_dir_all(&absolute).map_err(directory_error)?;
    Ok(absolute)
}

/// For each input, the index of an earlier input with the same file name.
fn output_claims(paths: &[PathBuf]) -> Vec<Option<usize>> {
    let mut owners = HashMap::new();
    paths
        .iter()
        .enumerate()
        .map(|(index, path)| {
            let name = path.file_name()?;
            match owners.get(name) {
                Some(&first) => Some(first),
                None => {
                    owners.insert(name, index);
                    None
                }
            }
        })
        .collect()
}

/// Run one unit of work, turning a panic into that unit's error.
fn isolated<T>(f: impl FnOnce() -> Result<T>) -> Result<T> {
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        Err(TrichromeError::WorkerPanic(panic_message(payload.as_ref())))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
