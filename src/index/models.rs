use serde::{Deserialize, Serialize};

use crate::document::EntityKind;

/// Taxonomies entities are grouped by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Taxonomy {
    SourceFile,
    Since,
}

impl Taxonomy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Taxonomy::SourceFile => "source-file",
            Taxonomy::Since => "since",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "source-file" => Some(Taxonomy::SourceFile),
            "since" => Some(Taxonomy::Since),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub id: i64,
    pub taxonomy: Taxonomy,
    pub name: String,
}

/// What a user is allowed to do with the content store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Administrator,
    Editor,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrator => "administrator",
            Role::Editor => "editor",
            Role::Viewer => "viewer",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "administrator" | "admin" => Some(Role::Administrator),
            "editor" => Some(Role::Editor),
            "viewer" => Some(Role::Viewer),
            _ => None,
        }
    }

    pub fn can_publish(&self) -> bool {
        matches!(self, Role::Administrator | Role::Editor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub login: String,
    pub role: Role,
}

/// Row written for one imported entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRecord {
    pub kind: EntityKind,
    pub name: String,
    pub qualified_name: String,
    pub namespace: Option<String>,
    pub parent_id: Option<i64>,
    pub hook_type: Option<String>,
    pub file_path: String,
    pub line: u32,
    pub end_line: u32,
    pub signature: Option<String>,
    pub summary: String,
    pub description: String,
    /// Tags serialized as a JSON array
    pub tags: String,
    pub since: Option<String>,
    pub content_hash: String,
    pub author_id: i64,
}

/// Entity as read back from the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEntity {
    pub id: i64,
    pub kind: EntityKind,
    pub qualified_name: String,
    pub file_path: String,
    pub parent_id: Option<i64>,
    pub since: Option<String>,
    pub content_hash: String,
    pub author_id: i64,
    /// Unix seconds
    pub created_at: i64,
    pub modified_at: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_entities: usize,
    pub entities_by_kind: Vec<(String, usize)>,
    pub terms_by_taxonomy: Vec<(String, usize)>,
    pub total_users: usize,
}
