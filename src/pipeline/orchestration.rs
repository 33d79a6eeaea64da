//! The batch driver: every label, independently, on a thread pool.
//!
//! Each label is one unit of work: read its OCR files, reconcile them, build
//! the text and image output in memory and write each file once. Labels share
//! nothing mutable; the vocabulary and the font are loaded once per run and
//! lent to every worker.
//!
//! A label that returns an error or panics is logged with its key and counted
//! as failed. It never stops the rest of the batch.

use crate::core::{EnsembleError, EnsembleResult, ParallelPolicy, ProcessingStage};
use crate::pipeline::EnsembleConfig;
use crate::pipeline::ensemble::{LabelReading, build_label};
use crate::pipeline::grouping::{LabelFiles, group_files};
use crate::pipeline::stats::{BatchReport, ImageStatus, LabelSummary};
use crate::utils::image::{encode_image, load_image};
use crate::utils::output::write_atomic;
use crate::utils::render::{LabelFont, compose_label_image, render_reconstruction};
use ocr_ensemble_core::processors::Vocabulary;
use rayon::prelude::*;
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Strategy for parallel vs sequential processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStrategy {
    /// Always process sequentially
    Sequential,
    /// Always process in parallel
    Parallel,
    /// Automatically decide based on threshold
    Auto(usize),
}

impl ProcessingStrategy {
    /// Determine if parallel processing should be used for the given item count
    pub fn should_use_parallel(&self, item_count: usize) -> bool {
        match self {
            ProcessingStrategy::Sequential => false,
            ProcessingStrategy::Parallel => true,
            ProcessingStrategy::Auto(threshold) => item_count > *threshold,
        }
    }
}

impl From<&ParallelPolicy> for ProcessingStrategy {
    /// One thread means sequential; a zero threshold means always parallel.
    fn from(policy: &ParallelPolicy) -> Self {
        match (policy.max_threads, policy.label_threshold) {
            (Some(1), _) => ProcessingStrategy::Sequential,
            (_, 0) => ProcessingStrategy::Parallel,
            (_, threshold) => ProcessingStrategy::Auto(threshold),
        }
    }
}

/// How one label ended.
#[derive(Debug)]
pub enum LabelOutcome {
    /// Output was written.
    Done(LabelSummary),
    /// The label failed; the reason has already been logged.
    Failed {
        /// The label key.
        key: String,
        /// Error or panic message.
        reason: String,
    },
}

/// Output for one label, built fully before anything is written.
struct LabelOutput {
    text: Option<Vec<u8>>,
    image: Option<Vec<u8>>,
    image_status: ImageStatus,
}

/// Runs the ensemble pipeline over a batch of labels.
#[derive(Debug)]
pub struct EnsembleBuilder {
    config: EnsembleConfig,
    vocab: Option<Vocabulary>,
    font: Option<LabelFont>,
}

impl EnsembleBuilder {
    /// Validates the configuration and loads the run's shared resources.
    ///
    /// The font is only looked up when image output is requested; without one
    /// image output is skipped for the whole run and text output continues.
    pub fn new(config: EnsembleConfig) -> EnsembleResult<Self> {
        let config = config.validated();
        config.check_runnable()?;

        let vocab = match &config.vocabulary {
            Some(path) => {
                let vocab = Vocabulary::load(path)?;
                info!("Loaded {} vocabulary words from {}", vocab.len(), path.display());
                Some(vocab)
            }
            None => None,
        };

        let font = if config.output.image_dir.is_some() {
            let font = LabelFont::load(config.output.font_path.as_deref());
            if font.is_none() {
                warn!("No usable font; reconstructed images will be skipped");
            }
            font
        } else {
            None
        };

        Ok(Self {
            config,
            vocab,
            font,
        })
    }

    /// Replaces the font used for image output.
    pub fn with_font(mut self, font: Option<LabelFont>) -> Self {
        self.font = font;
        self
    }

    /// The validated configuration.
    pub fn config(&self) -> &EnsembleConfig {
        &self.config
    }

    /// Groups the OCR files by label and applies the label limit.
    pub fn collect_labels(&self) -> EnsembleResult<Vec<LabelFiles>> {
        let mut labels = group_files(&self.config.ocr_dirs, "csv")?;
        if let Some(limit) = self.config.output.limit
            && labels.len() > limit
        {
            info!("Limiting run to the first {} of {} labels", limit, labels.len());
            labels.truncate(limit);
        }
        Ok(labels)
    }

    /// Groups the OCR files and processes every label.
    pub fn run_all(&self) -> EnsembleResult<BatchReport> {
        let labels = self.collect_labels()?;
        self.run(&labels)
    }

    /// Processes labels, in parallel when the batch is large enough.
    ///
    /// Only a failure to start the thread pool is an error; label failures
    /// are counted in the report.
    pub fn run(&self, labels: &[LabelFiles]) -> EnsembleResult<BatchReport> {
        let start = Instant::now();
        info!("Processing {} labels", labels.len());

        let strategy = ProcessingStrategy::from(&self.config.parallel);
        let outcomes: Vec<LabelOutcome> = if strategy.should_use_parallel(labels.len()) {
            let pool = self.config.parallel.build_thread_pool().map_err(|e| {
                EnsembleError::processing_error(ProcessingStage::Batch, "building thread pool", e)
            })?;
            debug!(
                "Using {} threads for {} labels",
                pool.current_num_threads(),
                labels.len()
            );
            pool.install(|| {
                labels
                    .par_iter()
                    .map(|files| self.process_isolated(files))
                    .collect::<Vec<_>>()
            })
        } else {
            labels
                .iter()
                .map(|files| self.process_isolated(files))
                .collect::<Vec<_>>()
        };

        let mut report = BatchReport::new();
        for outcome in &outcomes {
            match outcome {
                LabelOutcome::Done(summary) => report.record_success(summary),
                LabelOutcome::Failed { key, .. } => report.record_failure(key),
            }
        }
        report.finish(start.elapsed());
        info!(
            "Finished {} labels: {} processed, {} failed",
            report.total, report.processed, report.failed
        );
        Ok(report)
    }

    /// Processes one label, turning errors and panics into a failed outcome.
    pub fn process_isolated(&self, files: &LabelFiles) -> LabelOutcome {
        match catch_unwind(AssertUnwindSafe(|| self.process_label(files))) {
            Ok(Ok(summary)) => LabelOutcome::Done(summary),
            Ok(Err(e)) => {
                let reason = error_chain(&e);
                warn!("label {} failed: {}", files.key, reason);
                LabelOutcome::Failed {
                    key: files.key.clone(),
                    reason,
                }
            }
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                warn!("label {} panicked: {}", files.key, reason);
                LabelOutcome::Failed {
                    key: files.key.clone(),
                    reason,
                }
            }
        }
    }

    /// Reads, reconciles and writes one label.
    pub fn process_label(&self, files: &LabelFiles) -> EnsembleResult<LabelSummary> {
        let reading = build_label(files, &self.config, self.vocab.as_ref())?;
        let output = self.build_output(&reading)?;

        if let (Some(path), Some(text)) = (self.config.output.text_path(&reading.key), &output.text)
        {
            write_atomic(&path, text)?;
        }
        if let (Some(path), Some(image)) = (self.config.output.image_path(&reading.key), &output.image)
        {
            write_atomic(&path, image)?;
        }

        Ok(LabelSummary {
            key: reading.key.clone(),
            lines: reading.layout.row_count(),
            truncated: reading.truncated,
            dropped_rows: reading.ingest.dropped(),
            image: output.image_status,
        })
    }

    fn build_output(&self, reading: &LabelReading) -> EnsembleResult<LabelOutput> {
        let output = &self.config.output;
        let text = output
            .text_dir
            .as_ref()
            .map(|_| reading.text().into_bytes());

        if output.image_dir.is_none() {
            return Ok(LabelOutput {
                text,
                image: None,
                image_status: ImageStatus::NotRequested,
            });
        }

        let skipped = |text| LabelOutput {
            text,
            image: None,
            image_status: ImageStatus::Skipped,
        };

        let Some(font) = &self.font else {
            debug!("label {}: no font, skipping image", reading.key);
            return Ok(skipped(text));
        };
        let Some(label_path) = output.label_path(&reading.key) else {
            return Ok(skipped(text));
        };

        let label = match load_image(&label_path) {
            Ok(label) => label,
            Err(e @ EnsembleError::MissingImage { .. }) => {
                warn!("label {}: {}; skipping image", reading.key, e);
                return Ok(skipped(text));
            }
            Err(e) => return Err(e),
        };

        let arrangement = reading.arrange(font, &self.config.arrange);
        let reconstruction = render_reconstruction(&reading.merged, &arrangement, font);
        let composed = compose_label_image(&label, &reconstruction);
        let image = encode_image(&composed, &output.image_extension)?;

        Ok(LabelOutput {
            text,
            image: Some(image),
            image_status: ImageStatus::Written,
        })
    }
}

fn error_chain(error: &EnsembleError) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
