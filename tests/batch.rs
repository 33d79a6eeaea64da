//! End-to-end batch runs over scratch directories.

use image::{Rgb, RgbImage};
use ocr_ensemble::pipeline::{EnsembleBuilder, EnsembleConfig};
use ocr_ensemble::utils::LabelFont;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const HEADER: &str = "left,top,right,bottom,text,conf\n";

struct Corpus {
    root: TempDir,
    dirs: Vec<PathBuf>,
}

impl Corpus {
    fn new(pipelines: &[&str]) -> Self {
        let root = tempfile::tempdir().unwrap();
        let dirs = pipelines
            .iter()
            .map(|name| {
                let dir = root.path().join("ocr").join(name);
                fs::create_dir_all(&dir).unwrap();
                dir
            })
            .collect();
        Self { root, dirs }
    }

    fn write(&self, pipeline: usize, key: &str, rows: &[&str]) {
        let mut body = HEADER.to_string();
        for row in rows {
            body.push_str(row);
            body.push('\n');
        }
        fs::write(self.dirs[pipeline].join(format!("{key}.csv")), body).unwrap();
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.root.path().join(rel)
    }

    fn text_config(&self) -> EnsembleConfig {
        let mut config = EnsembleConfig::new();
        config.ocr_dirs = self.dirs.clone();
        config.output.text_dir = Some(self.path("text"));
        config
    }
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

fn herbarium_corpus() -> Corpus {
    let corpus = Corpus::new(&["easyocr", "tesseract", "paddle"]);
    let rows = [
        ["10,10,150,40,Quercus,0.8", "160,14,240,44,alba,0.7", "10,60,200,90,Travis Co.,0.9"],
        ["11,11,151,41,Quercus,0.6", "161,15,241,45,alba,0.6", "12,61,201,91,Travis Co .,0.5"],
        ["9,9,149,39,Ouercus,0.95", "159,13,239,43,a1ba,0.9", "11,59,199,89,Travls Co.,0.4"],
    ];
    for (pipeline, rows) in rows.iter().enumerate() {
        corpus.write(pipeline, "label_1", rows);
        corpus.write(pipeline, "label_2", &["0,0,90,30,1901,0.9"]);
    }
    corpus
}

#[test]
fn test_text_output_for_every_label() {
    let corpus = herbarium_corpus();
    let builder = EnsembleBuilder::new(corpus.text_config()).unwrap();
    let report = builder.run_all().unwrap();

    assert_eq!(report.total, 2);
    assert_eq!(report.processed, 2);
    assert_eq!(report.failed, 0);
    assert_eq!(read(&corpus.path("text/label_1.txt")), "Quercus alba\nTravis Co.\n");
    assert_eq!(read(&corpus.path("text/label_2.txt")), "1901\n");
}

#[test]
fn test_output_is_independent_of_thread_count() {
    let corpus = herbarium_corpus();

    let mut sequential = corpus.text_config();
    sequential.parallel.label_threshold = usize::MAX;
    EnsembleBuilder::new(sequential).unwrap().run_all().unwrap();
    let first = read(&corpus.path("text/label_1.txt"));

    let mut parallel = corpus.text_config();
    parallel.parallel.max_threads = Some(4);
    parallel.parallel.label_threshold = 0;
    EnsembleBuilder::new(parallel).unwrap().run_all().unwrap();
    assert_eq!(read(&corpus.path("text/label_1.txt")), first);
}

#[test]
fn test_one_bad_label_does_not_stop_the_batch() {
    let corpus = herbarium_corpus();
    corpus.write(0, "label_3", &["0,0,50,20,May,0.9"]);

    let builder = EnsembleBuilder::new(corpus.text_config()).unwrap();
    let labels = builder.collect_labels().unwrap();
    assert_eq!(labels.len(), 3);

    // Gone between grouping and processing.
    fs::remove_file(corpus.dirs[0].join("label_3.csv")).unwrap();

    let report = builder.run(&labels).unwrap();
    assert_eq!(report.processed, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.failed_keys, vec!["label_3"]);
    assert!(!report.all_failed());
    assert!(!corpus.path("text/label_3.txt").exists());
    assert!(corpus.path("text/label_1.txt").exists());
}

#[test]
fn test_all_labels_failing_is_reported() {
    let corpus = Corpus::new(&["easyocr"]);
    corpus.write(0, "a", &["0,0,50,20,x,0.9"]);
    corpus.write(0, "b", &["0,0,50,20,y,0.9"]);

    let builder = EnsembleBuilder::new(corpus.text_config()).unwrap();
    let labels = builder.collect_labels().unwrap();
    for key in ["a", "b"] {
        fs::remove_file(corpus.dirs[0].join(format!("{key}.csv"))).unwrap();
    }

    let report = builder.run(&labels).unwrap();
    assert!(report.all_failed());
    assert_eq!(report.failed, 2);
}

#[test]
fn test_malformed_rows_and_empty_labels() {
    let corpus = Corpus::new(&["easyocr"]);
    corpus.write(
        0,
        "messy",
        &["0,0,50,20,ok,0.9", ",0,50,20,no left,0.9", "60,0,10,20,backwards,0.9"],
    );
    corpus.write(0, "blank", &["0,0,50,20,,0.9"]);
    corpus.write(0, "nothing", &[]);

    let report = EnsembleBuilder::new(corpus.text_config())
        .unwrap()
        .run_all()
        .unwrap();

    assert_eq!(report.processed, 3);
    assert_eq!(report.empty, 2);
    assert_eq!(report.dropped_rows, 2);
    assert_eq!(read(&corpus.path("text/messy.txt")), "ok\n");
    assert_eq!(read(&corpus.path("text/blank.txt")), "");
    assert_eq!(read(&corpus.path("text/nothing.txt")), "");
}

#[test]
fn test_limit_and_box_cap() {
    let corpus = herbarium_corpus();
    let mut config = corpus.text_config();
    config.output.limit = Some(1);
    config.merge.max_boxes = 4;

    let report = EnsembleBuilder::new(config).unwrap().run_all().unwrap();
    assert_eq!(report.total, 1);
    assert_eq!(report.truncated, 1);
    assert!(corpus.path("text/label_1.txt").exists());
    assert!(!corpus.path("text/label_2.txt").exists());
}

#[test]
fn test_missing_label_image_keeps_text() {
    let corpus = herbarium_corpus();
    fs::create_dir_all(corpus.path("labels")).unwrap();

    let mut config = corpus.text_config();
    config.output.image_dir = Some(corpus.path("images"));
    config.output.label_dir = Some(corpus.path("labels"));

    let report = EnsembleBuilder::new(config).unwrap().run_all().unwrap();
    assert_eq!(report.processed, 2);
    assert_eq!(report.images_skipped, 2);
    assert_eq!(report.images_written, 0);
    assert!(corpus.path("text/label_1.txt").exists());
    assert!(!corpus.path("images/label_1.jpg").exists());
}

#[test]
fn test_reconstructed_image_is_written() {
    let Some(font) = LabelFont::from_system() else {
        return;
    };
    let corpus = herbarium_corpus();
    let labels = corpus.path("labels");
    fs::create_dir_all(&labels).unwrap();
    let crop = RgbImage::from_pixel(260, 100, Rgb([200, 190, 170]));
    crop.save(labels.join("label_1.png")).unwrap();

    let mut config = EnsembleConfig::new();
    config.ocr_dirs = corpus.dirs.clone();
    config.output.image_dir = Some(corpus.path("images"));
    config.output.label_dir = Some(labels);
    config.output.image_extension = "png".to_string();

    let builder = EnsembleBuilder::new(config).unwrap().with_font(Some(font));
    let labels = builder.collect_labels().unwrap();
    let label_1: Vec<_> = labels.into_iter().filter(|l| l.key == "label_1").collect();
    let report = builder.run(&label_1).unwrap();
    assert_eq!(report.images_written, 1);

    let image = image::open(corpus.path("images/label_1.png")).unwrap();
    assert!(image.width() >= 260);
    assert!(image.height() > 100);
    assert_eq!(image.to_rgb8().get_pixel(0, 0), &Rgb([200, 190, 170]));
    assert_eq!(report.processed, 1);
}
