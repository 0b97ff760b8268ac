pub mod migrations;
pub mod models;
pub mod sqlite;

use crate::error::Result;
pub use models::*;

/// Persisted, queryable content model fed by the importer.
///
/// Entities are identified by `(qualified_name, file_path)`.
pub trait ContentStore {
    fn find_entity(&self, qualified_name: &str, file_path: &str) -> Result<Option<StoredEntity>>;

    /// Inserts `record` (or overwrites `existing`) and replaces its term
    /// assignments, creating terms on first use. All of it happens in one
    /// transaction. Returns the entity id.
    fn save_entity(
        &self,
        existing: Option<i64>,
        record: &EntityRecord,
        terms: &[(Taxonomy, &str)],
    ) -> Result<i64>;

    fn entity_terms(&self, entity_id: i64) -> Result<Vec<Term>>;
    fn list_entities(&self) -> Result<Vec<StoredEntity>>;

    fn add_user(&self, login: &str, role: Role) -> Result<User>;
    fn list_users(&self) -> Result<Vec<User>>;

    fn get_stats(&self) -> Result<StoreStats>;
}
