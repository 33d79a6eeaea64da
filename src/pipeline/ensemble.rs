//! Building the consensus reading of one label.
//!
//! Runs ingestion, filtering, the box cap, merging and row finding in order.
//! Layout for image output is computed on demand with
//! [`LabelReading::arrange`], since text-only runs never need it.

use crate::core::EnsembleResult;
use crate::pipeline::EnsembleConfig;
use crate::pipeline::grouping::LabelFiles;
use ocr_ensemble_core::domain::{BoxRecordStore, Ensemble, IngestStats, MergedBox};
use ocr_ensemble_core::processors::{
    ArrangeConfig, Arrangement, RowLayout, TextMeasure, Vocabulary, arrange_rows, filter_boxes,
    find_rows_of_text, merge_boxes_with_vocab,
};
use tracing::debug;

/// The reconciled boxes of one label in reading order.
#[derive(Debug, Clone)]
pub struct LabelReading {
    /// The label key.
    pub key: String,
    /// Consensus boxes; indices in `layout` refer to this vector.
    pub merged: Vec<MergedBox>,
    /// Row assignments in reading order.
    pub layout: RowLayout,
    /// Row counts summed over every input file.
    pub ingest: IngestStats,
    /// Boxes dropped by the per-label cap.
    pub truncated: usize,
}

impl LabelReading {
    /// One string per row, boxes joined by single spaces.
    pub fn lines(&self) -> Vec<String> {
        self.layout
            .rows()
            .map(|row| {
                row.iter()
                    .filter_map(|a| self.merged.get(a.index))
                    .map(|b| b.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }

    /// The label text, every line terminated by a newline.
    pub fn text(&self) -> String {
        self.lines()
            .into_iter()
            .map(|line| line + "\n")
            .collect()
    }

    /// Font sizes and straightened positions for image output.
    pub fn arrange<M: TextMeasure + ?Sized>(
        &self,
        measure: &M,
        config: &ArrangeConfig,
    ) -> Arrangement {
        arrange_rows(&self.merged, &self.layout, measure, config)
    }

    /// Returns true when the label produced no text at all.
    pub fn is_empty(&self) -> bool {
        self.merged.is_empty()
    }
}

/// Reads every OCR file of a label into one ensemble.
pub fn read_ensemble(files: &LabelFiles) -> EnsembleResult<(Ensemble, IngestStats)> {
    let mut ensemble = Ensemble::new(files.key.clone());
    let mut stats = IngestStats::default();
    for path in &files.paths {
        let store = BoxRecordStore::from_path(path)?;
        stats += store.stats();
        ensemble.extend(store);
    }
    Ok((ensemble, stats))
}

/// Filters, caps, merges and orders an ensemble already in memory.
pub fn reconcile(
    mut ensemble: Ensemble,
    config: &EnsembleConfig,
    vocab: Option<&Vocabulary>,
) -> LabelReading {
    let key = ensemble.key().to_string();
    let truncated = ensemble.truncate(config.merge.max_boxes);

    let boxes = filter_boxes(ensemble.into_boxes(), &config.filter);
    let merged = merge_boxes_with_vocab(&boxes, &config.merge, vocab);
    let layout = find_rows_of_text(&merged, &config.rows);

    debug!(
        "label {}: {} boxes, {} merged, {} rows",
        key,
        boxes.len(),
        merged.len(),
        layout.row_count()
    );

    LabelReading {
        key,
        merged,
        layout,
        ingest: IngestStats::default(),
        truncated,
    }
}

/// Reads and reconciles one label.
pub fn build_label(
    files: &LabelFiles,
    config: &EnsembleConfig,
    vocab: Option<&Vocabulary>,
) -> EnsembleResult<LabelReading> {
    let (ensemble, ingest) = read_ensemble(files)?;
    let mut reading = reconcile(ensemble, config, vocab);
    reading.ingest = ingest;
    Ok(reading)
}
