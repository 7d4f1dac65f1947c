//! Input enumeration: which files in the data directory are point files.
use glob::Pattern;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::errors::{ClipError, ClipResult};

/// Checks if a file has the wanted extension (case-insensitive, leading dot optional)
pub fn has_valid_extension(path: &Path, extension: &str) -> bool {
    let wanted = extension.trim_start_matches('.');
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => ext.eq_ignore_ascii_case(wanted),
        None => false,
    }
}

/// Lists the point files directly inside `dir` with the given extension.
///
/// Subdirectories are not descended into. The result is sorted so job ids are
/// stable between runs over the same directory.
pub fn list_point_files(dir: &Path, extension: &str) -> ClipResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(ClipError::InputDirNotFound(dir.to_path_buf()));
    }

    let pattern = format!("{}/*", Pattern::escape(&dir.to_string_lossy()));
    let entries = glob::glob(&pattern)
        .map_err(|e| ClipError::config_error(format!("bad input directory pattern: {}", e)))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Cannot read directory entry: {}", e);
                None
            }
        })
        .filter(|path| path.is_file() && has_valid_extension(path, extension))
        .collect();
    files.sort();

    debug!(
        "Found {} .{} files in {}",
        files.len(),
        extension.trim_start_matches('.'),
        dir.display()
    );
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_has_valid_extension() {
        assert!(has_valid_extension(Path::new("tile.xyz"), "xyz"));
        assert!(has_valid_extension(Path::new("tile.XYZ"), "xyz")); // Case insensitivity
        assert!(has_valid_extension(Path::new("tile.xyz"), ".xyz"));
        assert!(!has_valid_extension(Path::new("tile.txt"), "xyz"));
        assert!(!has_valid_extension(Path::new("tile"), "xyz"));
        assert!(!has_valid_extension(Path::new("tile.xyz.zip"), "xyz"));
    }

    #[test]
    fn test_list_point_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.xyz"), "1 2 3\n").unwrap();
        fs::write(dir.path().join("a.xyz"), "1 2 3\n").unwrap();
        fs::write(dir.path().join("c.XYZ"), "1 2 3\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "hello\n").unwrap();
        fs::write(dir.path().join("archive.zip"), "").unwrap();
        fs::create_dir(dir.path().join("nested.xyz")).unwrap();
        fs::write(dir.path().join("nested.xyz").join("d.xyz"), "1 2 3\n").unwrap();

        let files = list_point_files(dir.path(), "xyz").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.xyz", "b.xyz", "c.XYZ"]);
    }

    #[test]
    fn test_list_empty_dir() {
        let dir = tempdir().unwrap();
        assert!(list_point_files(dir.path(), "xyz").unwrap().is_empty());
    }

    #[test]
    fn test_list_dir_with_glob_characters() {
        let dir = tempdir().unwrap();
        let odd = dir.path().join("tiles [2024]");
        fs::create_dir(&odd).unwrap();
        fs::write(odd.join("a.xyz"), "1 2 3\n").unwrap();

        let files = list_point_files(&odd, "xyz").unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_missing_dir() {
        let dir = tempdir().unwrap();
        let err = list_point_files(&dir.path().join("nope"), "xyz").unwrap_err();
        assert!(matches!(err, ClipError::InputDirNotFound(_)));
    }
}
