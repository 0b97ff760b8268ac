//! Resolution of the command-line input path.

use std::path::{Path, PathBuf};

use crate::error::{ParserError, Result};
use crate::indexer::walker::FileWalker;

/// Canonical input of one extraction run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourcePath {
    /// A single source file; `base` is its parent directory
    File { path: PathBuf, base: PathBuf },
    Directory { path: PathBuf },
}

impl SourcePath {
    /// Directory that reported file paths are relative to.
    pub fn base_dir(&self) -> &Path {
        match self {
            SourcePath::File { base, .. } => base,
            SourcePath::Directory { path } => path,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            SourcePath::File { path, .. } | SourcePath::Directory { path } => path,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, SourcePath::File { .. })
    }

    /// Flat list of files to extract.
    pub fn files(&self, walker: &FileWalker) -> Result<Vec<PathBuf>> {
        match self {
            SourcePath::File { path, .. } => Ok(vec![path.clone()]),
            SourcePath::Directory { path } => walker.walk(path),
        }
    }

    /// Human-readable form, directories with a trailing separator.
    pub fn display_name(&self) -> String {
        match self {
            SourcePath::File { path, .. } => path.display().to_string(),
            SourcePath::Directory { path } => {
                format!("{}{}", path.display(), std::path::MAIN_SEPARATOR)
            }
        }
    }
}

/// Resolves `raw` into a [`SourcePath`], failing fast on missing paths.
pub fn resolve(raw: &Path) -> Result<SourcePath> {
    let not_found = |e: std::io::Error| ParserError::NotFound {
        path: raw.to_path_buf(),
        reason: e.to_string(),
    };

    let path = raw.canonicalize().map_err(not_found)?;
    let metadata = std::fs::metadata(&path).map_err(not_found)?;

    if metadata.is_dir() {
        return Ok(SourcePath::Directory { path });
    }

    if metadata.is_file() {
        let base = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| path.clone());
        return Ok(SourcePath::File { path, base });
    }

    Err(ParserError::NotFound {
        path: raw.to_path_buf(),
        reason: "not a regular file or directory".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("plugin.php");
        fs::write(&file, "<?php").unwrap();

        let resolved = resolve(&file).unwrap();

        assert!(resolved.is_file());
        assert_eq!(resolved.path(), file.canonicalize().unwrap());
        assert_eq!(resolved.base_dir(), temp_dir.path().canonicalize().unwrap());
    }

    #[test]
    fn test_resolve_directory() {
        let temp_dir = TempDir::new().unwrap();

        let resolved = resolve(temp_dir.path()).unwrap();

        assert!(!resolved.is_file());
        assert_eq!(resolved.base_dir(), temp_dir.path().canonicalize().unwrap());
        assert!(resolved.display_name().ends_with(std::path::MAIN_SEPARATOR));
    }

    #[test]
    fn test_resolve_relative_components() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("lib")).unwrap();

        let resolved = resolve(&temp_dir.path().join("lib/..")).unwrap();

        assert_eq!(resolved.path(), temp_dir.path().canonicalize().unwrap());
    }

    #[test]
    fn test_resolve_missing_path() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.php");

        let err = resolve(&missing).unwrap_err();

        match err {
            ParserError::NotFound { path, .. } => assert_eq!(path, missing),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_files_for_single_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("single.php");
        fs::write(&file, "<?php").unwrap();
        fs::write(temp_dir.path().join("sibling.php"), "<?php").unwrap();

        let walker = FileWalker::from_config(&Config::default()).unwrap();
        let files = resolve(&file).unwrap().files(&walker).unwrap();

        assert_eq!(files, vec![file.canonicalize().unwrap()]);
    }

    #[test]
    fn test_files_for_directory() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.php"), "<?php").unwrap();
        fs::write(temp_dir.path().join("b.php"), "<?php").unwrap();

        let walker = FileWalker::from_config(&Config::default()).unwrap();
        let files = resolve(temp_dir.path()).unwrap().files(&walker).unwrap();

        assert_eq!(files.len(), 2);
    }
}
