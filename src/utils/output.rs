//! Write-once output files.

use crate::core::{EnsembleError, EnsembleResult};
use std::io::Write;
use std::path::Path;

/// Writes `contents` to `path` so readers see either the old file or the
/// complete new one.
///
/// The data goes to a temporary file in the target directory, which is then
/// renamed over `path`. Missing parent directories are created.
pub fn write_atomic(path: &Path, contents: &[u8]) -> EnsembleResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .map_err(|e| EnsembleError::output(&format!("creating {}", dir.display()), e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| EnsembleError::output(&format!("staging {}", path.display()), e))?;
    tmp.write_all(contents)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| EnsembleError::output(&format!("writing {}", path.display()), e))?;
    tmp.persist(path)
        .map_err(|e| EnsembleError::output(&format!("renaming into {}", path.display()), e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_creates_parents_and_replaces() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("text").join("label_1.txt");

        write_atomic(&path, b"first\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\n");

        write_atomic(&path, b"second\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second\n");

        let leftovers = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
