//! Ingestion of one OCR run's CSV output into box records.
//!
//! Each file holds one row per detected fragment with at least `left`, `top`,
//! `right`, `bottom`, `text` and `conf` columns (`confidence` is accepted for
//! the last). Optional `pipeline` and `engine` columns name the source; without
//! them the pipeline is the name of the directory the file lives in.
//!
//! Bad rows are dropped and counted, never fatal: a row with a missing or
//! non-numeric coordinate, a non-numeric confidence, a coordinate beyond
//! [`MAX_COORDINATE`](crate::core::constants::MAX_COORDINATE), or a box whose
//! right edge is left of its left edge (or bottom above top) is skipped.

use crate::core::{EnsembleError, EnsembleResult};
use crate::domain::{BoxSource, OcrBox};
use crate::processors::BoundingBox;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// One CSV row before validation.
#[derive(Debug, Deserialize)]
struct RawRecord {
    left: Option<f64>,
    top: Option<f64>,
    right: Option<f64>,
    bottom: Option<f64>,
    #[serde(default)]
    text: Option<String>,
    #[serde(alias = "confidence")]
    conf: Option<f64>,
    #[serde(default)]
    pipeline: Option<String>,
    #[serde(default)]
    engine: Option<String>,
}

/// Why a row was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    Malformed,
    Geometry,
}

/// Counts of what happened to the rows of one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Data rows seen.
    pub rows: usize,
    /// Rows that became boxes.
    pub kept: usize,
    /// Rows dropped for missing or non-numeric fields.
    pub malformed: usize,
    /// Rows dropped for negative extent or out-of-range coordinates.
    pub bad_geometry: usize,
}

impl IngestStats {
    /// Total number of dropped rows.
    pub fn dropped(&self) -> usize {
        self.malformed + self.bad_geometry
    }
}

impl std::ops::AddAssign for IngestStats {
    fn add_assign(&mut self, other: Self) {
        self.rows += other.rows;
        self.kept += other.kept;
        self.malformed += other.malformed;
        self.bad_geometry += other.bad_geometry;
    }
}

/// The boxes read from one pipeline/engine output file, in file order.
#[derive(Debug, Clone, Default)]
pub struct BoxRecordStore {
    boxes: Vec<OcrBox>,
    stats: IngestStats,
}

impl BoxRecordStore {
    /// Reads a CSV file; the pipeline id defaults to the parent directory name.
    pub fn from_path(path: &Path) -> EnsembleResult<Self> {
        let pipeline = path
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let file = std::fs::File::open(path)
            .map_err(|e| EnsembleError::ingestion(&format!("opening {}", path.display()), e))?;
        let store = Self::from_reader(file, &pipeline)?;

        if store.stats.dropped() > 0 {
            warn!(
                "{}: dropped {} of {} rows ({} malformed, {} with negative extent)",
                path.display(),
                store.stats.dropped(),
                store.stats.rows,
                store.stats.malformed,
                store.stats.bad_geometry
            );
        }
        Ok(store)
    }

    /// Reads CSV records from any reader, attributing them to `pipeline`
    /// unless a row names its own.
    pub fn from_reader<R: Read>(reader: R, pipeline: &str) -> EnsembleResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let default_pipeline: Arc<str> = Arc::from(pipeline);
        let default_source = BoxSource::pipeline(default_pipeline.clone());

        let mut store = Self::default();
        for (line, result) in csv_reader.deserialize::<RawRecord>().enumerate() {
            store.stats.rows += 1;
            let raw = match result {
                Ok(raw) => raw,
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => {
                    debug!("row {}: {}", line + 1, e);
                    store.stats.malformed += 1;
                    continue;
                }
            };

            match Self::to_box(raw, &default_pipeline, &default_source) {
                Ok(ocr_box) => {
                    store.stats.kept += 1;
                    store.boxes.push(ocr_box);
                }
                Err(Rejection::Malformed) => {
                    debug!("row {}: missing or non-numeric field", line + 1);
                    store.stats.malformed += 1;
                }
                Err(Rejection::Geometry) => {
                    debug!("row {}: box out of range or with negative extent", line + 1);
                    store.stats.bad_geometry += 1;
                }
            }
        }
        Ok(store)
    }

    fn to_box(
        raw: RawRecord,
        default_pipeline: &Arc<str>,
        default_source: &BoxSource,
    ) -> Result<OcrBox, Rejection> {
        let (Some(left), Some(top), Some(right), Some(bottom), Some(conf)) =
            (raw.left, raw.top, raw.right, raw.bottom, raw.conf)
        else {
            return Err(Rejection::Malformed);
        };
        if !conf.is_finite() {
            return Err(Rejection::Malformed);
        }
        if [left, top, right, bottom].iter().any(|c| !c.is_finite()) {
            return Err(Rejection::Malformed);
        }
        let bbox =
            BoundingBox::from_coords(left, top, right, bottom).ok_or(Rejection::Geometry)?;

        let source = match (raw.pipeline, raw.engine) {
            (None, None) => default_source.clone(),
            (pipeline, engine) => BoxSource::new(
                pipeline
                    .map(Arc::from)
                    .unwrap_or_else(|| default_pipeline.clone()),
                engine.unwrap_or_default(),
            ),
        };

        let text = raw.text.as_deref().map(str::trim).unwrap_or_default();
        Ok(OcrBox::new(bbox, text, conf as f32, source))
    }

    /// The boxes in file order.
    pub fn boxes(&self) -> &[OcrBox] {
        &self.boxes
    }

    /// Consumes the store, returning its boxes.
    pub fn into_boxes(self) -> Vec<OcrBox> {
        self.boxes
    }

    /// Row counts for the file.
    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    /// Number of boxes kept.
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// Returns true when no rows survived.
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(csv: &str) -> BoxRecordStore {
        BoxRecordStore::from_reader(csv.as_bytes(), "easyocr").unwrap()
    }

    #[test]
    fn test_reads_well_formed_rows() {
        let store = read(
            "conf,left,top,right,bottom,text\n\
             0.9,10,20,110,40,Quercus\n\
             0.75,120,22,180,41, alba \n",
        );
        assert_eq!(store.len(), 2);
        assert_eq!(store.boxes()[0].bbox, BoundingBox::new(10, 20, 110, 40));
        assert_eq!(store.boxes()[1].text, "alba");
        assert_eq!(store.boxes()[0].source, BoxSource::pipeline("easyocr"));
        assert_eq!(store.stats().kept, 2);
    }

    #[test]
    fn test_drops_malformed_rows() {
        let store = read(
            "left,top,right,bottom,text,conf\n\
             10,20,110,40,ok,0.9\n\
             ,20,110,40,no left,0.9\n\
             abc,20,110,40,bad left,0.9\n\
             10,20,110,40,bad conf,high\n\
             10,20,110,40,no conf,\n",
        );
        assert_eq!(store.len(), 1);
        assert_eq!(store.stats().malformed, 4);
        assert_eq!(store.stats().rows, 5);
    }

    #[test]
    fn test_rejects_negative_extent() {
        let store = read(
            "left,top,right,bottom,text,conf\n\
             110,20,10,40,backwards,0.9\n\
             10,40,110,20,upside down,0.9\n",
        );
        assert!(store.is_empty());
        assert_eq!(store.stats().bad_geometry, 2);
    }

    #[test]
    fn test_rejects_out_of_range_coordinates() {
        let store = read(
            "left,top,right,bottom,text,conf\n\
             -5,0,2147483647,20,wide,0.9\n\
             0,2000000000,10,2000000010,low,0.9\n\
             0,0,10,10,x,0.9\n",
        );
        assert_eq!(store.len(), 1);
        assert_eq!(store.boxes()[0].text, "x");
        assert_eq!(store.stats().bad_geometry, 2);

        let merged = crate::processors::merge_boxes(store.boxes(), &Default::default());
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_empty_text_is_kept() {
        let store = read("left,top,right,bottom,text,conf\n10,20,110,40,,0.4\n");
        assert_eq!(store.len(), 1);
        assert!(!store.boxes()[0].has_text());
    }

    #[test]
    fn test_source_columns_and_confidence_alias() {
        let store = read(
            "left,top,right,bottom,text,confidence,engine\n\
             10,20,110,40,Quercus,0.8,tesseract\n",
        );
        assert_eq!(
            store.boxes()[0].source,
            BoxSource::new("easyocr", "tesseract")
        );
        assert!((store.boxes()[0].confidence - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_float_coordinates_and_confidence_clamp() {
        let store = read("left,top,right,bottom,text,conf\n10.6,20.2,110.0,40.4,x,1.7\n");
        assert_eq!(store.boxes()[0].bbox, BoundingBox::new(11, 20, 110, 40));
        assert_eq!(store.boxes()[0].confidence, 1.0);
    }

    #[test]
    fn test_empty_input() {
        let store = read("left,top,right,bottom,text,conf\n");
        assert!(store.is_empty());
        assert_eq!(store.stats(), IngestStats::default());
    }
}
