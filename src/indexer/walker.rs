use std::path::{Path, PathBuf};

use glob::Pattern;
use ignore::WalkBuilder;

use crate::config::Config;
use crate::error::{ParserError, Result};

/// Enumerates eligible source files below a directory.
pub struct FileWalker {
    extensions: Vec<String>,
    exclude: Vec<Pattern>,
}

impl FileWalker {
    pub fn new(extensions: Vec<String>, exclude: &[String]) -> Result<Self> {
        let exclude = exclude
            .iter()
            .map(|p| {
                Pattern::new(p)
                    .map_err(|e| ParserError::Config(format!("Invalid exclude pattern '{}': {}", p, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            exclude,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.extensions.clone(), &config.exclude)
    }

    /// Walks `root` and returns matching files in sorted order.
    ///
    /// Any traversal error aborts the walk.
    pub fn walk(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        let walker = WalkBuilder::new(root)
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .ignore(true)
            .build();

        for entry in walker {
            let entry = entry.map_err(|e| ParserError::ExtractionFailed {
                path: root.to_path_buf(),
                message: e.to_string(),
            })?;
            let path = entry.path();
            if path.is_file() && self.is_supported(path) && !self.is_excluded(root, path) {
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        Ok(files)
    }

    pub fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_ascii_lowercase();
                self.extensions.iter().any(|e| *e == ext)
            })
            .unwrap_or(false)
    }

    fn is_excluded(&self, root: &Path, path: &Path) -> bool {
        let relative = match path.strip_prefix(root) {
            Ok(rel) => rel,
            Err(_) => return false,
        };
        self.exclude.iter().any(|p| p.matches_path(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    fn create_walker() -> FileWalker {
        FileWalker::from_config(&Config::default()).unwrap()
    }

    fn create_file(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut file = File::create(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn test_walk_finds_php_files() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "plugin.php", "<?php");
        create_file(temp_dir.path(), "lib/class-command.php", "<?php");

        let files = create_walker().walk(temp_dir.path()).unwrap();

        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|p| p.extension().unwrap() == "php"));
    }

    #[test]
    fn test_walk_recursive_and_sorted() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "z.php", "");
        create_file(temp_dir.path(), "a/deep/nested.php", "");
        create_file(temp_dir.path(), "b.php", "");

        let files = create_walker().walk(temp_dir.path()).unwrap();

        assert_eq!(files.len(), 3);
        let mut sorted = files.clone();
        sorted.sort();
        assert_eq!(files, sorted);
    }

    #[test]
    fn test_walk_ignores_unsupported_files() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "plugin.php", "<?php");
        create_file(temp_dir.path(), "README.md", "# Readme");
        create_file(temp_dir.path(), "style.css", "body {}");

        let files = create_walker().walk(temp_dir.path()).unwrap();

        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_walk_hidden_files_ignored() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "visible.php", "");
        create_file(temp_dir.path(), ".hidden.php", "");

        let files = create_walker().walk(temp_dir.path()).unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name().unwrap().to_str().unwrap(), "visible.php");
    }

    #[test]
    fn test_walk_exclude_patterns() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "plugin.php", "");
        create_file(temp_dir.path(), "vendor/autoload.php", "");
        create_file(temp_dir.path(), "vendor/pkg/src/a.php", "");

        let walker = FileWalker::new(vec!["php".to_string()], &["vendor/**".to_string()]).unwrap();
        let files = walker.walk(temp_dir.path()).unwrap();

        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("plugin.php"));
    }

    #[test]
    fn test_walk_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        assert!(create_walker().walk(temp_dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_is_supported() {
        let walker = FileWalker::new(vec![".PHP".to_string(), "inc".to_string()], &[]).unwrap();
        assert!(walker.is_supported(Path::new("plugin.php")));
        assert!(walker.is_supported(Path::new("Legacy.PHP")));
        assert!(walker.is_supported(Path::new("template.inc")));
        assert!(!walker.is_supported(Path::new("Makefile")));
        assert!(!walker.is_supported(Path::new("data.json")));
    }

    #[test]
    fn test_invalid_exclude_pattern() {
        let result = FileWalker::new(vec!["php".to_string()], &["[".to_string()]);
        assert!(matches!(result, Err(ParserError::Config(_))));
    }
}
