use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::document::EntityKind;
use crate::error::{ParserError, Result};
use crate::import::policy::{ActorRef, IdentityLookup};
use crate::index::migrations::run_migrations;
use crate::index::{
    ContentStore, EntityRecord, Role, StoreStats, StoredEntity, Taxonomy, Term, User,
};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        Self::configure_pragmas(&conn)?;
        run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens a database that must already exist; the file is never created.
    pub fn open_existing(db_path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Self::configure_pragmas(&conn)?;
        run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure_pragmas(&conn)?;
        run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Configure SQLite PRAGMA settings.
    /// - WAL mode: readers are not blocked by the importer
    /// - NORMAL synchronous: good durability with better performance
    /// - foreign_keys: cascade term assignments with their entities
    fn configure_pragmas(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
            "#,
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ParserError::Config("content store connection poisoned".to_string()))
    }

    fn row_to_entity(row: &Row) -> rusqlite::Result<StoredEntity> {
        let kind: String = row.get(1)?;
        let kind = EntityKind::from_str(&kind).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                1,
                rusqlite::types::Type::Text,
                format!("unknown entity kind '{}'", kind).into(),
            )
        })?;
        Ok(StoredEntity {
            id: row.get(0)?,
            kind,
            qualified_name: row.get(2)?,
            file_path: row.get(3)?,
            parent_id: row.get(4)?,
            since: row.get(5)?,
            content_hash: row.get(6)?,
            author_id: row.get(7)?,
            created_at: row.get(8)?,
            modified_at: row.get(9)?,
        })
    }

    fn row_to_user(row: &Row) -> rusqlite::Result<User> {
        let role: String = row.get(2)?;
        let role = Role::from_str(&role).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                format!("unknown role '{}'", role).into(),
            )
        })?;
        Ok(User {
            id: row.get(0)?,
            login: row.get(1)?,
            role,
        })
    }
}

const ENTITY_COLUMNS: &str =
    "id, kind, qualified_name, file_path, parent_id, since, content_hash, author_id, created_at, modified_at";

/// Returns the id of the term, creating it on first use.
fn ensure_term(conn: &Connection, taxonomy: Taxonomy, name: &str) -> Result<i64> {
    conn.execute(
        "INSERT OR IGNORE INTO terms (taxonomy, name) VALUES (?1, ?2)",
        params![taxonomy.as_str(), name],
    )?;
    let id = conn.query_row(
        "SELECT id FROM terms WHERE taxonomy = ?1 AND name = ?2",
        params![taxonomy.as_str(), name],
        |row| row.get(0),
    )?;
    Ok(id)
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

impl ContentStore for SqliteStore {
    fn find_entity(&self, qualified_name: &str, file_path: &str) -> Result<Option<StoredEntity>> {
        let conn = self.lock()?;
        let entity = conn
            .query_row(
                &format!(
                    "SELECT {} FROM entities WHERE qualified_name = ?1 AND file_path = ?2",
                    ENTITY_COLUMNS
                ),
                params![qualified_name, file_path],
                Self::row_to_entity,
            )
            .optional()?;
        Ok(entity)
    }

    fn save_entity(
        &self,
        existing: Option<i64>,
        record: &EntityRecord,
        terms: &[(Taxonomy, &str)],
    ) -> Result<i64> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let now = now_secs();

        let id = match existing {
            Some(id) => {
                tx.execute(
                    r#"
                    UPDATE entities SET
                        kind = ?2, name = ?3, qualified_name = ?4, namespace = ?5,
                        parent_id = ?6, hook_type = ?7, file_path = ?8, line = ?9,
                        end_line = ?10, signature = ?11, summary = ?12, description = ?13,
                        tags = ?14, since = ?15, content_hash = ?16, author_id = ?17,
                        modified_at = ?18
                    WHERE id = ?1
                    "#,
                    params![
                        id,
                        record.kind.as_str(),
                        record.name,
                        record.qualified_name,
                        record.namespace,
                        record.parent_id,
                        record.hook_type,
                        record.file_path,
                        record.line,
                        record.end_line,
                        record.signature,
                        record.summary,
                        record.description,
                        record.tags,
                        record.since,
                        record.content_hash,
                        record.author_id,
                        now,
                    ],
                )?;
                id
            }
            None => {
                tx.execute(
                    r#"
                    INSERT INTO entities (
                        kind, name, qualified_name, namespace, parent_id, hook_type,
                        file_path, line, end_line, signature, summary, description,
                        tags, since, content_hash, author_id, created_at, modified_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?17)
                    "#,
                    params![
                        record.kind.as_str(),
                        record.name,
                        record.qualified_name,
                        record.namespace,
                        record.parent_id,
                        record.hook_type,
                        record.file_path,
                        record.line,
                        record.end_line,
                        record.signature,
                        record.summary,
                        record.description,
                        record.tags,
                        record.since,
                        record.content_hash,
                        record.author_id,
                        now,
                    ],
                )?;
                tx.last_insert_rowid()
            }
        };

        tx.execute("DELETE FROM entity_terms WHERE entity_id = ?1", [id])?;
        for (taxonomy, name) in terms {
            let term_id = ensure_term(&tx, *taxonomy, name)?;
            tx.execute(
                "INSERT OR IGNORE INTO entity_terms (entity_id, term_id) VALUES (?1, ?2)",
                params![id, term_id],
            )?;
        }

        tx.commit()?;
        Ok(id)
    }

    fn entity_terms(&self, entity_id: i64) -> Result<Vec<Term>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT t.id, t.taxonomy, t.name
            FROM terms t
            JOIN entity_terms et ON et.term_id = t.id
            WHERE et.entity_id = ?1
            ORDER BY t.taxonomy, t.name
            "#,
        )?;

        let rows = stmt.query_map([entity_id], |row| {
            let taxonomy: String = row.get(1)?;
            Ok((row.get::<_, i64>(0)?, taxonomy, row.get::<_, String>(2)?))
        })?;

        let mut terms = Vec::new();
        for row in rows {
            let (id, taxonomy, name) = row?;
            if let Some(taxonomy) = Taxonomy::from_str(&taxonomy) {
                terms.push(Term { id, taxonomy, name });
            }
        }
        Ok(terms)
    }

    fn list_entities(&self) -> Result<Vec<StoredEntity>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM entities ORDER BY id",
            ENTITY_COLUMNS
        ))?;
        let entities = stmt
            .query_map([], Self::row_to_entity)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entities)
    }

    fn add_user(&self, login: &str, role: Role) -> Result<User> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO users (login, role) VALUES (?1, ?2)",
            params![login, role.as_str()],
        )?;
        Ok(User {
            id: conn.last_insert_rowid(),
            login: login.to_string(),
            role,
        })
    }

    fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT id, login, role FROM users ORDER BY id")?;
        let users = stmt
            .query_map([], Self::row_to_user)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    fn get_stats(&self) -> Result<StoreStats> {
        let conn = self.lock()?;

        let total_entities: i64 =
            conn.query_row("SELECT COUNT(*) FROM entities", [], |row| row.get(0))?;
        let total_users: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;

        let mut stmt =
            conn.prepare("SELECT kind, COUNT(*) FROM entities GROUP BY kind ORDER BY kind")?;
        let entities_by_kind = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn
            .prepare("SELECT taxonomy, COUNT(*) FROM terms GROUP BY taxonomy ORDER BY taxonomy")?;
        let terms_by_taxonomy = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(StoreStats {
            total_entities: total_entities as usize,
            entities_by_kind,
            terms_by_taxonomy,
            total_users: total_users as usize,
        })
    }
}

impl IdentityLookup for SqliteStore {
    fn find_user(&self, actor: &ActorRef) -> Result<Option<User>> {
        let conn = self.lock()?;
        let user = match actor {
            ActorRef::Id(id) => conn
                .query_row(
                    "SELECT id, login, role FROM users WHERE id = ?1",
                    [id],
                    Self::row_to_user,
                )
                .optional()?,
            ActorRef::Login(login) => conn
                .query_row(
                    "SELECT id, login, role FROM users WHERE login = ?1",
                    [login],
                    Self::row_to_user,
                )
                .optional()?,
        };
        Ok(user)
    }
}
