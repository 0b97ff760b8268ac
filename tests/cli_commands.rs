//! Integration tests for CLI commands.
//!
//! These run the compiled binary inside a temporary working directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

use phpdoc_parser::{decode, ContentStore, SqliteStore};

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn run(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_phpdoc-parser"))
        .current_dir(cwd)
        .env("RUST_LOG", "off")
        .args(args)
        .output()
        .expect("Failed to run binary")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Working directory with a fast config and an administrator.
fn workspace() -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    fs::copy(
        fixtures().join("config.yml"),
        temp_dir.path().join(".phpdoc-parser.yml"),
    )
    .expect("Failed to copy config");

    let output = run(temp_dir.path(), &["user", "add", "admin"]);
    assert!(output.status.success(), "{}", stderr(&output));
    temp_dir
}

// ============================================================================
// Export Command Tests
// ============================================================================

mod export_command {
    use super::*;

    #[test]
    fn test_export_default_output() {
        let temp_dir = workspace();
        let plugin = fixtures().join("plugin");

        let output = run(temp_dir.path(), &["export", plugin.to_str().unwrap()]);

        assert!(output.status.success(), "{}", stderr(&output));
        let out = stdout(&output);
        assert!(out.contains("Extracting PHPDoc from"));
        assert!(out.contains("Success: Data exported to phpdoc.json"));

        let doc = decode(&fs::read(temp_dir.path().join("phpdoc.json")).unwrap()).unwrap();
        assert_eq!(doc.files.len(), 2);
    }

    #[test]
    fn test_export_missing_path_fails() {
        let temp_dir = workspace();

        let output = run(temp_dir.path(), &["export", "does-not-exist"]);

        assert!(!output.status.success());
        assert!(stderr(&output).contains("does-not-exist"));
        assert!(!temp_dir.path().join("phpdoc.json").exists());
    }
}

// ============================================================================
// Import / Create Command Tests
// ============================================================================

mod import_command {
    use super::*;

    #[test]
    fn test_export_then_import() {
        let temp_dir = workspace();
        let plugin = fixtures().join("plugin");

        let output = run(temp_dir.path(), &["export", plugin.to_str().unwrap(), "ref.json"]);
        assert!(output.status.success(), "{}", stderr(&output));

        let output = run(
            temp_dir.path(),
            &["import", "ref.json", "--quick", "--user=admin"],
        );
        assert!(output.status.success(), "{}", stderr(&output));
        assert!(stdout(&output).contains("Success: Imported 5 entities (5 created"));
        assert!(stdout(&output).contains("Skipped 2 internal entities"));

        let store = SqliteStore::new(temp_dir.path().join(".phpdoc.db")).unwrap();
        assert_eq!(store.list_entities().unwrap().len(), 5);
    }

    #[test]
    fn test_import_without_user_fails() {
        let temp_dir = workspace();
        let plugin = fixtures().join("plugin");
        run(temp_dir.path(), &["export", plugin.to_str().unwrap()]);

        let output = run(temp_dir.path(), &["import", "phpdoc.json"]);

        assert!(!output.status.success());
        assert!(stderr(&output).contains("Please specify a valid user"));
    }

    #[test]
    fn test_import_malformed_fails() {
        let temp_dir = workspace();
        let malformed = fixtures().join("malformed.json");

        let output = run(
            temp_dir.path(),
            &["import", malformed.to_str().unwrap(), "--user=1"],
        );

        assert!(!output.status.success());
        assert!(stderr(&output).contains("malformed.json"));
    }

    #[test]
    fn test_create_with_custom_db() {
        let temp_dir = workspace();
        let single = fixtures().join("single.php");

        // a fresh database has no users yet
        let output = run(
            temp_dir.path(),
            &["--db", "other.db", "create", single.to_str().unwrap(), "--user=admin"],
        );
        assert!(!output.status.success());
        assert!(!temp_dir.path().join("other.db").exists());

        let output = run(temp_dir.path(), &["--db", "other.db", "user", "add", "editor", "--role", "editor"]);
        assert!(output.status.success(), "{}", stderr(&output));

        let output = run(
            temp_dir.path(),
            &["--db", "other.db", "create", single.to_str().unwrap(), "--user=editor"],
        );
        assert!(output.status.success(), "{}", stderr(&output));
        assert!(stdout(&output).contains("Imported 1 entities"));
    }

    #[test]
    fn test_failed_create_leaves_no_database() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let single = fixtures().join("single.php");

        let output = run(
            temp_dir.path(),
            &["create", single.to_str().unwrap(), "--quick", "--user=ghost"],
        );

        assert!(!output.status.success());
        assert!(stderr(&output).contains("Please specify a valid user"));
        assert!(!temp_dir.path().join(".phpdoc.db").exists());
    }

    #[test]
    fn test_failed_import_leaves_no_database() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let output = run(
            temp_dir.path(),
            &["--db", "x.db", "import", "nope.json", "--user=1"],
        );

        assert!(!output.status.success());
        assert!(stderr(&output).contains("nope.json"));
        assert!(!temp_dir.path().join("x.db").exists());
    }
}

// ============================================================================
// User / Stats Command Tests
// ============================================================================

mod user_command {
    use super::*;

    #[test]
    fn test_user_list() {
        let temp_dir = workspace();

        let output = run(temp_dir.path(), &["user", "list"]);

        assert!(output.status.success());
        let out = stdout(&output);
        assert!(out.contains("admin"));
        assert!(out.contains("administrator"));
    }

    #[test]
    fn test_user_add_unknown_role() {
        let temp_dir = workspace();

        let output = run(temp_dir.path(), &["user", "add", "someone", "--role", "owner"]);

        assert!(!output.status.success());
        assert!(stderr(&output).contains("unknown role"));
    }

    #[test]
    fn test_stats_after_create() {
        let temp_dir = workspace();
        let plugin = fixtures().join("plugin");
        let output = run(
            temp_dir.path(),
            &["create", plugin.to_str().unwrap(), "--import-internal", "--user=admin"],
        );
        assert!(output.status.success(), "{}", stderr(&output));

        let output = run(temp_dir.path(), &["stats"]);

        assert!(output.status.success());
        let out = stdout(&output);
        assert!(out.contains("Total entities: 7"));
        assert!(out.contains("method: 2"));
        assert!(out.contains("since:"));
    }
}
