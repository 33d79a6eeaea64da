//! Build OCR ensembles for a directory of labels.
//!
//! # Usage
//!
//! ```bash
//! ocr-ensemble \
//!     --ocr-dir ocr/easyocr --ocr-dir ocr/tesseract \
//!     --ensemble-text ensemble/text \
//!     --ensemble-images ensemble/images --label-dir labels \
//!     --cpus 8
//! ```
//!
//! Settings can also come from a TOML or JSON file given with `--config`;
//! flags override the file. `--dump-config <path>` writes the merged result
//! out instead of running.

use clap::Parser;
use ocr_ensemble::core::init_tracing;
use ocr_ensemble::pipeline::{ConfigLoader, EnsembleBuilder, EnsembleConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

/// Command-line arguments for building OCR ensembles.
#[derive(Parser)]
#[command(name = "ocr-ensemble")]
#[command(about = "Reconcile several OCR runs per label into one reading")]
struct Args {
    /// Directory of OCR output CSVs for one pipeline/engine run.
    ///
    /// Repeat for every run. Files with the same stem across directories
    /// belong to the same label.
    #[arg(long = "ocr-dir")]
    ocr_dirs: Vec<PathBuf>,

    /// Directory of original label crops, needed for image output.
    #[arg(long)]
    label_dir: Option<PathBuf>,

    /// Write `<label>.txt` files here.
    #[arg(long)]
    ensemble_text: Option<PathBuf>,

    /// Write reconstructed label images here.
    #[arg(long)]
    ensemble_images: Option<PathBuf>,

    /// Number of worker threads.
    #[arg(long)]
    cpus: Option<usize>,

    /// Process only the first N labels.
    #[arg(long)]
    limit: Option<usize>,

    /// Space between reconstructed rows, in pixels.
    #[arg(long)]
    gutter: Option<u32>,

    /// Font file for reconstructed images.
    #[arg(long)]
    font: Option<PathBuf>,

    /// IoU above which two OCR boxes are the same fragment.
    #[arg(long)]
    iou_threshold: Option<f32>,

    /// Horizontal overlap from which a box no longer continues a row.
    #[arg(long)]
    width_threshold: Option<f32>,

    /// Word list used to break votes without a majority.
    #[arg(long)]
    vocab: Option<PathBuf>,

    /// TOML or JSON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the effective configuration to this TOML or JSON file and exit.
    #[arg(long)]
    dump_config: Option<PathBuf>,
}

impl Args {
    /// Applies the flags that were given on top of `config`.
    fn apply(self, mut config: EnsembleConfig) -> EnsembleConfig {
        if !self.ocr_dirs.is_empty() {
            config.ocr_dirs = self.ocr_dirs;
        }
        if self.label_dir.is_some() {
            config.output.label_dir = self.label_dir;
        }
        if self.ensemble_text.is_some() {
            config.output.text_dir = self.ensemble_text;
        }
        if self.ensemble_images.is_some() {
            config.output.image_dir = self.ensemble_images;
        }
        if self.cpus.is_some() {
            config.parallel.max_threads = self.cpus;
        }
        if self.limit.is_some() {
            config.output.limit = self.limit;
        }
        if let Some(gutter) = self.gutter {
            config.arrange.gutter = gutter;
        }
        if self.font.is_some() {
            config.output.font_path = self.font;
        }
        if let Some(iou) = self.iou_threshold {
            config.merge.iou_threshold = iou;
        }
        if let Some(width) = self.width_threshold {
            config.rows.width_threshold = width;
        }
        if self.vocab.is_some() {
            config.vocabulary = self.vocab;
        }
        config
    }
}

fn main() -> ExitCode {
    init_tracing();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match ConfigLoader::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                error!("{}", e);
                return ExitCode::from(2);
            }
        },
        None => EnsembleConfig::default(),
    };
    let dump_path = args.dump_config.clone();
    let config = args.apply(config);

    if let Some(path) = dump_path {
        return match ConfigLoader::save_to_file(&config, &path) {
            Ok(()) => {
                info!("Wrote configuration to {}", path.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("{}", e);
                ExitCode::from(2)
            }
        };
    }

    let builder = match EnsembleBuilder::new(config) {
        Ok(builder) => builder,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(2);
        }
    };

    match builder.run_all() {
        Ok(report) => {
            info!("\n{}", report);
            if report.all_failed() {
                error!("Every label failed: {}", report.failed_keys.join(", "));
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
