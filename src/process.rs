//! Batch pipeline: pair images with text lines and rasterize them in order.
//!
//! ## Pairing
//!
//! Image `i` pairs with text line `i`. Only `N = min(images, lines)` items
//! are processed; surplus entries on the longer list are ignored, not an
//! error.
//!
//! ## Execution
//!
//! Items run strictly one after another. Each item reads its background,
//! composes on a fresh canvas, and is finished before the next one starts,
//! so at most one decoded background is alive at a time.
//!
//! ## Failures
//!
//! ```text
//! read / decode failure     → recorded, batch continues (gap in results)
//! canvas / encode failure   → ProcessError::Aborted, remaining items skipped
//! cancel flag set           → stop before the next item, keep what is done
//! ```
//!
//! Progress is reported through an optional channel so the CLI can print
//! while the batch runs.

use crate::imaging::{BackendError, ImageBackend, Raster, RenderPlan};
use crate::package;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("nothing to process: {images} image(s), {lines} text line(s)")]
    Empty { images: usize, lines: usize },
    #[error("batch aborted at item {} ({name}) after {completed} item(s): {source}", .index + 1)]
    Aborted {
        index: usize,
        name: String,
        completed: usize,
        #[source]
        source: BackendError,
    },
}

/// Where a background image comes from. Read lazily, one item at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Path(PathBuf),
    Memory { name: String, bytes: Vec<u8> },
}

impl ImageSource {
    /// Short display name: the file name, or the given name.
    pub fn name(&self) -> String {
        match self {
            ImageSource::Path(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            ImageSource::Memory { name, .. } => name.clone(),
        }
    }

    pub fn load(&self) -> std::io::Result<Cow<'_, [u8]>> {
        match self {
            ImageSource::Path(path) => std::fs::read(path).map(Cow::Owned),
            ImageSource::Memory { bytes, .. } => Ok(Cow::Borrowed(bytes)),
        }
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::Path(path)
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        ImageSource::Path(path.to_path_buf())
    }
}

/// Ordered pairing of background images with text lines.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub images: Vec<ImageSource>,
    pub lines: Vec<String>,
}

impl BatchJob {
    pub fn new(images: Vec<ImageSource>, lines: Vec<String>) -> Self {
        Self { images, lines }
    }

    /// Number of items that will be processed.
    pub fn len(&self) -> usize {
        self.images.len().min(self.lines.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ignored_images(&self) -> usize {
        self.images.len() - self.len()
    }

    pub fn ignored_lines(&self) -> usize {
        self.lines.len() - self.len()
    }

    /// `(index, image, line)` for every processed item, in order.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, &ImageSource, &str)> {
        self.images
            .iter()
            .zip(&self.lines)
            .enumerate()
            .map(|(i, (image, line))| (i, image, line.as_str()))
    }
}

/// Progress events emitted while a batch runs.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessEvent {
    Started {
        total: usize,
        ignored_images: usize,
        ignored_lines: usize,
    },
    ItemDone {
        index: usize,
        name: String,
        done: usize,
        total: usize,
    },
    ItemFailed {
        index: usize,
        name: String,
        reason: String,
        done: usize,
        total: usize,
    },
}

/// One successful item; `index` is its position in the batch.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterResult {
    pub index: usize,
    pub source: String,
    pub raster: Raster,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub index: usize,
    pub source: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub total: usize,
    /// Successful items in batch order. Failed indices leave gaps.
    pub results: Vec<RasterResult>,
    pub failures: Vec<ItemFailure>,
    /// Stopped early by the cancel flag.
    pub cancelled: bool,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.failures.is_empty()
    }

    pub fn report(&self) -> BatchReport {
        BatchReport {
            total: self.total,
            succeeded: self
                .results
                .iter()
                .map(|r| ReportEntry {
                    index: r.index,
                    source: r.source.clone(),
                    entry: package::entry_name(r.index, r.raster.encoding),
                })
                .collect(),
            failed: self.failures.clone(),
            cancelled: self.cancelled,
        }
    }
}

/// JSON-serializable summary of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: Vec<ReportEntry>,
    pub failed: Vec<ItemFailure>,
    pub cancelled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub index: usize,
    pub source: String,
    /// File name inside the ZIP archive.
    pub entry: String,
}

fn emit(progress: &Option<Sender<ProcessEvent>>, event: ProcessEvent) {
    if let Some(tx) = progress {
        // A dropped receiver only means nobody is watching.
        let _ = tx.send(event);
    }
}

/// Rasterize every paired item of `job` with `plan`.
pub fn run_batch(
    backend: &impl ImageBackend,
    plan: &RenderPlan,
    job: &BatchJob,
    progress: Option<Sender<ProcessEvent>>,
    cancel: Option<&AtomicBool>,
) -> Result<BatchOutcome, ProcessError> {
    let total = job.len();
    if total == 0 {
        return Err(ProcessError::Empty {
            images: job.images.len(),
            lines: job.lines.len(),
        });
    }
    info!(
        total,
        ignored_images = job.ignored_images(),
        ignored_lines = job.ignored_lines(),
        canvas = %plan.canvas(),
        "processing batch"
    );
    emit(
        &progress,
        ProcessEvent::Started {
            total,
            ignored_images: job.ignored_images(),
            ignored_lines: job.ignored_lines(),
        },
    );

    let mut outcome = BatchOutcome {
        total,
        ..BatchOutcome::default()
    };

    for (index, image, line) in job.pairs() {
        if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            warn!(index, "batch cancelled");
            outcome.cancelled = true;
            break;
        }

        let name = image.name();
        debug!(index, image = name.as_str(), "rendering item");
        let rendered = image
            .load()
            .map_err(BackendError::from)
            .and_then(|bytes| backend.compose(plan, &bytes, line));
        let done = index + 1;

        match rendered {
            Ok(raster) => {
                outcome.results.push(RasterResult {
                    index,
                    source: name.clone(),
                    raster,
                });
                emit(
                    &progress,
                    ProcessEvent::ItemDone {
                        index,
                        name,
                        done,
                        total,
                    },
                );
            }
            Err(e) if e.is_item_scoped() => {
                warn!(index, image = name.as_str(), error = %e, "skipping item");
                let reason = e.to_string();
                outcome.failures.push(ItemFailure {
                    index,
                    source: name.clone(),
                    reason: reason.clone(),
                });
                emit(
                    &progress,
                    ProcessEvent::ItemFailed {
                        index,
                        name,
                        reason,
                        done,
                        total,
                    },
                );
            }
            Err(source) => {
                return Err(ProcessError::Aborted {
                    index,
                    name,
                    completed: outcome.results.len(),
                    source,
                });
            }
        }
    }

    info!(
        succeeded = outcome.results.len(),
        failed = outcome.failures.len(),
        "batch finished"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::RasterEncoding;
    use crate::imaging::backend::tests::{CORRUPT, MockBackend};

    fn memory(name: &str, bytes: &[u8]) -> ImageSource {
        ImageSource::Memory {
            name: name.to_string(),
            bytes: bytes.to_vec(),
        }
    }

    fn images(n: usize) -> Vec<ImageSource> {
        (0..n)
            .map(|i| memory(&format!("img{i}.png"), b"ok"))
            .collect()
    }

    fn lines(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("line {i}")).collect()
    }

    fn indices(outcome: &BatchOutcome) -> Vec<usize> {
        outcome.results.iter().map(|r| r.index).collect()
    }

    // =========================================================================
    // Pairing
    // =========================================================================

    #[test]
    fn more_images_than_lines_processes_line_count() {
        let backend = MockBackend::new();
        let job = BatchJob::new(images(5), lines(3));
        assert_eq!(job.ignored_images(), 2);

        let outcome = run_batch(&backend, &RenderPlan::for_tests(), &job, None, None).unwrap();
        assert_eq!(indices(&outcome), vec![0, 1, 2]);
        assert_eq!(backend.texts(), vec!["line 0", "line 1", "line 2"]);
    }

    #[test]
    fn more_lines_than_images_ignores_surplus_lines() {
        let backend = MockBackend::new();
        let job = BatchJob::new(images(3), lines(5));
        assert_eq!(job.ignored_lines(), 2);

        let outcome = run_batch(&backend, &RenderPlan::for_tests(), &job, None, None).unwrap();
        assert_eq!(outcome.total, 3);
        assert_eq!(indices(&outcome), vec![0, 1, 2]);
        assert!(!backend.texts().contains(&"line 3".to_string()));
    }

    #[test]
    fn empty_pairing_is_rejected() {
        let backend = MockBackend::new();
        let job = BatchJob::new(images(2), Vec::new());
        let err = run_batch(&backend, &RenderPlan::for_tests(), &job, None, None).unwrap_err();
        assert!(matches!(err, ProcessError::Empty { images: 2, lines: 0 }));
    }

    // =========================================================================
    // Failures
    // =========================================================================

    #[test]
    fn undecodable_image_leaves_a_gap() {
        let backend = MockBackend::new();
        let mut imgs = images(6);
        imgs[2] = memory("broken.png", CORRUPT);
        let job = BatchJob::new(imgs, lines(6));

        let outcome = run_batch(&backend, &RenderPlan::for_tests(), &job, None, None).unwrap();
        assert_eq!(indices(&outcome), vec![0, 1, 3, 4, 5]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].index, 2);
        assert_eq!(outcome.failures[0].source, "broken.png");
        assert!(!outcome.is_complete());
    }

    #[test]
    fn one_bad_among_five_yields_four() {
        let backend = MockBackend::new();
        let mut imgs = images(5);
        imgs[0] = memory("bad.png", CORRUPT);
        let job = BatchJob::new(imgs, lines(5));

        let outcome = run_batch(&backend, &RenderPlan::for_tests(), &job, None, None).unwrap();
        assert_eq!(indices(&outcome), vec![1, 2, 3, 4]);
        assert_eq!(outcome.failures.len(), 1);
    }

    #[test]
    fn missing_file_is_item_scoped() {
        let backend = MockBackend::new();
        let mut imgs = images(2);
        imgs[0] = ImageSource::Path(PathBuf::from("/nonexistent/textstamp/0.png"));
        let job = BatchJob::new(imgs, lines(2));

        let outcome = run_batch(&backend, &RenderPlan::for_tests(), &job, None, None).unwrap();
        assert_eq!(indices(&outcome), vec![1]);
        assert_eq!(outcome.failures[0].source, "0.png");
        // The backend never saw the unreadable item.
        assert_eq!(backend.texts(), vec!["line 1"]);
    }

    #[test]
    fn fatal_error_aborts_remaining_items() {
        let backend = MockBackend::failing_at(2);
        let job = BatchJob::new(images(5), lines(5));

        let err = run_batch(&backend, &RenderPlan::for_tests(), &job, None, None).unwrap_err();
        match err {
            ProcessError::Aborted {
                index, completed, ..
            } => {
                assert_eq!(index, 2);
                assert_eq!(completed, 2);
            }
            other => panic!("expected Aborted, got {other:?}"),
        }
        assert_eq!(backend.calls.borrow().len(), 3);
    }

    // =========================================================================
    // Cancellation and progress
    // =========================================================================

    #[test]
    fn cancel_flag_stops_before_next_item() {
        let backend = MockBackend::new();
        let job = BatchJob::new(images(3), lines(3));
        let cancel = AtomicBool::new(true);

        let outcome = run_batch(
            &backend,
            &RenderPlan::for_tests(),
            &job,
            None,
            Some(&cancel),
        )
        .unwrap();
        assert!(outcome.cancelled);
        assert!(outcome.results.is_empty());
        assert!(backend.calls.borrow().is_empty());
    }

    #[test]
    fn progress_events_count_every_item() {
        let backend = MockBackend::new();
        let mut imgs = images(3);
        imgs[1] = memory("bad.png", CORRUPT);
        let job = BatchJob::new(imgs, lines(4));
        let (tx, rx) = std::sync::mpsc::channel();

        run_batch(&backend, &RenderPlan::for_tests(), &job, Some(tx), None).unwrap();
        let events: Vec<ProcessEvent> = rx.iter().collect();

        assert_eq!(
            events[0],
            ProcessEvent::Started {
                total: 3,
                ignored_images: 0,
                ignored_lines: 1
            }
        );
        assert!(matches!(events[1], ProcessEvent::ItemDone { done: 1, total: 3, .. }));
        assert!(matches!(events[2], ProcessEvent::ItemFailed { done: 2, .. }));
        assert!(matches!(events[3], ProcessEvent::ItemDone { done: 3, .. }));
        assert_eq!(events.len(), 4);
    }

    #[test]
    fn report_lists_successes_and_failures() {
        let backend = MockBackend::new();
        let mut imgs = images(2);
        imgs[0] = memory("bad.png", CORRUPT);
        let job = BatchJob::new(imgs, lines(2));

        let outcome = run_batch(&backend, &RenderPlan::for_tests(), &job, None, None).unwrap();
        let report = outcome.report();
        assert_eq!(report.total, 2);
        assert_eq!(report.succeeded.len(), 1);
        assert_eq!(report.succeeded[0].entry, "processed_image_002.png");
        assert_eq!(report.failed[0].index, 0);

        let json = serde_json::to_string(&report).unwrap();
        let back: BatchReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
        assert_eq!(outcome.results[0].raster.encoding, RasterEncoding::Png);
    }
}
