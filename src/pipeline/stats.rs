//! Run-level statistics for a batch of labels.

use std::fmt;
use std::time::Duration;

/// What happened to the image output of one label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageStatus {
    /// Image output was not requested.
    NotRequested,
    /// The reconstructed image was written.
    Written,
    /// Image output was requested but skipped (no font or no label crop).
    Skipped,
}

/// The result of one successfully processed label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSummary {
    /// The label key.
    pub key: String,
    /// Number of text lines produced.
    pub lines: usize,
    /// Boxes dropped by the per-label cap.
    pub truncated: usize,
    /// Rows dropped while reading the label's OCR files.
    pub dropped_rows: usize,
    /// Image output status.
    pub image: ImageStatus,
}

/// Counts for a finished batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// Labels handed to the run.
    pub total: usize,
    /// Labels processed without error.
    pub processed: usize,
    /// Labels that failed or panicked.
    pub failed: usize,
    /// Processed labels that produced no text.
    pub empty: usize,
    /// Processed labels whose ensemble hit the box cap.
    pub truncated: usize,
    /// CSV rows dropped across all labels.
    pub dropped_rows: usize,
    /// Reconstructed images written.
    pub images_written: usize,
    /// Requested images that were skipped.
    pub images_skipped: usize,
    /// Keys of the failed labels, sorted.
    pub failed_keys: Vec<String>,
    /// Wall-clock time of the run.
    pub elapsed: Duration,
}

impl BatchReport {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a processed label.
    pub fn record_success(&mut self, summary: &LabelSummary) {
        self.total += 1;
        self.processed += 1;
        if summary.lines == 0 {
            self.empty += 1;
        }
        if summary.truncated > 0 {
            self.truncated += 1;
        }
        self.dropped_rows += summary.dropped_rows;
        match summary.image {
            ImageStatus::Written => self.images_written += 1,
            ImageStatus::Skipped => self.images_skipped += 1,
            ImageStatus::NotRequested => {}
        }
    }

    /// Records a failed label.
    pub fn record_failure(&mut self, key: &str) {
        self.total += 1;
        self.failed += 1;
        self.failed_keys.push(key.to_string());
    }

    /// Sorts the failed keys; called once the batch is complete.
    pub fn finish(&mut self, elapsed: Duration) {
        self.failed_keys.sort();
        self.elapsed = elapsed;
    }

    /// True when there was work and none of it succeeded.
    pub fn all_failed(&self) -> bool {
        self.total > 0 && self.processed == 0
    }

    /// Returns the success rate as a percentage (0.0 to 100.0).
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.processed as f64 / self.total as f64) * 100.0
        }
    }

    /// Returns the processing speed in labels per second.
    pub fn labels_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.total as f64 / secs
        }
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Ensemble Statistics:")?;
        writeln!(f, "  Labels: {}", self.total)?;
        writeln!(
            f,
            "  Processed: {} ({:.1}%)",
            self.processed,
            self.success_rate()
        )?;
        writeln!(f, "  Failed: {}", self.failed)?;
        writeln!(f, "  Empty: {}", self.empty)?;
        writeln!(f, "  Truncated: {}", self.truncated)?;
        writeln!(f, "  Dropped rows: {}", self.dropped_rows)?;
        writeln!(
            f,
            "  Images: {} written, {} skipped",
            self.images_written, self.images_skipped
        )?;
        writeln!(
            f,
            "  Elapsed: {:.2} s ({:.2} labels/sec)",
            self.elapsed.as_secs_f64(),
            self.labels_per_second()
        )?;
        Ok(())
    }
}
