//! Versioned database migrations for SqliteStore.
//!
//! Migrations are tracked in the `meta` table with key `schema_version`.
//! Each migration has a version number and runs exactly once.

use rusqlite::{Connection, OptionalExtension};

use crate::error::{ParserError, Result};

/// Current schema version. Increment when adding new migrations.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Migration function type.
type MigrationFn = fn(&Connection) -> Result<()>;

/// All migrations in order. Index + 1 = version number.
const MIGRATIONS: &[MigrationFn] = &[migration_v1_base_schema];

/// Runs all pending migrations on the database.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;

    if current_version > CURRENT_SCHEMA_VERSION {
        return Err(ParserError::Config(format!(
            "database schema version {} is newer than supported version {}",
            current_version, CURRENT_SCHEMA_VERSION
        )));
    }

    for (idx, migration) in MIGRATIONS.iter().enumerate() {
        let version = (idx + 1) as u32;
        if version > current_version {
            migration(conn)?;
            set_schema_version(conn, version)?;
        }
    }

    Ok(())
}

/// Gets the current schema version from the database.
pub fn get_schema_version(conn: &Connection) -> Result<u32> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS meta (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
        [],
    )?;

    let version: Option<String> = conn
        .query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;

    match version {
        None => Ok(0),
        Some(v) => v
            .parse()
            .map_err(|_| ParserError::Config(format!("invalid schema version '{}'", v))),
    }
}

fn set_schema_version(conn: &Connection, version: u32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO meta (key, value) VALUES ('schema_version', ?1)",
        [version.to_string()],
    )?;
    Ok(())
}

fn migration_v1_base_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY,
            login TEXT NOT NULL UNIQUE,
            role TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS entities (
            id INTEGER PRIMARY KEY,
            kind TEXT NOT NULL,
            name TEXT NOT NULL,
            qualified_name TEXT NOT NULL,
            namespace TEXT,
            parent_id INTEGER REFERENCES entities(id) ON DELETE SET NULL,
            hook_type TEXT,
            file_path TEXT NOT NULL,
            line INTEGER NOT NULL,
            end_line INTEGER NOT NULL,
            signature TEXT,
            summary TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            tags TEXT NOT NULL DEFAULT '[]',
            since TEXT,
            content_hash TEXT NOT NULL,
            author_id INTEGER NOT NULL REFERENCES users(id),
            created_at INTEGER NOT NULL,
            modified_at INTEGER NOT NULL,
            UNIQUE(qualified_name, file_path)
        );

        CREATE INDEX IF NOT EXISTS idx_entities_kind ON entities(kind);
        CREATE INDEX IF NOT EXISTS idx_entities_name ON entities(name);
        CREATE INDEX IF NOT EXISTS idx_entities_file ON entities(file_path);

        CREATE TABLE IF NOT EXISTS terms (
            id INTEGER PRIMARY KEY,
            taxonomy TEXT NOT NULL,
            name TEXT NOT NULL,
            UNIQUE(taxonomy, name)
        );

        CREATE TABLE IF NOT EXISTS entity_terms (
            entity_id INTEGER NOT NULL REFERENCES entities(id) ON DELETE CASCADE,
            term_id INTEGER NOT NULL REFERENCES terms(id) ON DELETE CASCADE,
            PRIMARY KEY (entity_id, term_id)
        );

        CREATE INDEX IF NOT EXISTS idx_entity_terms_term ON entity_terms(term_id);
        "#,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_from_scratch() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);

        let has_modified: bool = conn
            .prepare("SELECT created_at, modified_at FROM entities LIMIT 0")
            .is_ok();
        assert!(has_modified);
    }

    #[test]
    fn test_invalid_schema_version_is_an_error() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn.execute(
            "UPDATE meta SET value = 'two' WHERE key = 'schema_version'",
            [],
        )
        .unwrap();

        assert!(matches!(get_schema_version(&conn), Err(ParserError::Config(_))));
    }

    #[test]
    fn test_schema_version_read_errors_propagate() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE meta (key TEXT PRIMARY KEY)")
            .unwrap();

        assert!(matches!(get_schema_version(&conn), Err(ParserError::Database(_))));
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn test_newer_schema_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        set_schema_version(&conn, CURRENT_SCHEMA_VERSION + 1).unwrap();

        assert!(matches!(run_migrations(&conn), Err(ParserError::Config(_))));
    }
}
