//! Finding the OCR output files that belong to each label.

use crate::core::{EnsembleError, EnsembleResult};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Every OCR output file for one label, across pipelines and engines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelFiles {
    /// The label key, the shared file stem.
    pub key: String,
    /// One file per OCR run, in directory order.
    pub paths: Vec<PathBuf>,
}

/// Groups the `*.<extension>` files of every directory by file stem.
///
/// Groups come back sorted by key; within a group, files follow the order of
/// `dirs`. A missing directory is an error, an empty one is not.
pub fn group_files(dirs: &[PathBuf], extension: &str) -> EnsembleResult<Vec<LabelFiles>> {
    let mut groups: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();

    for dir in dirs {
        let mut found = 0;
        for path in list_files(dir, extension)? {
            let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };
            groups.entry(stem).or_default().push(path);
            found += 1;
        }
        if found == 0 {
            warn!("no .{} files in {}", extension, dir.display());
        } else {
            debug!("{}: {} files", dir.display(), found);
        }
    }

    Ok(groups
        .into_iter()
        .map(|(key, paths)| LabelFiles { key, paths })
        .collect())
}

fn list_files(dir: &Path, extension: &str) -> EnsembleResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        EnsembleError::ingestion(&format!("listing {}", dir.display()), e)
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let matches = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if matches && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}
