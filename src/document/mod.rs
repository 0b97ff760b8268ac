//! Structured documentation model produced by extraction.
//!
//! A [`Document`] is an ordered list of per-file records. Each record holds
//! the documented entities found in that file, in source order.

pub mod codec;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

pub use codec::{decode, encode};

/// Kind of a documented entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Function,
    Class,
    Method,
    Hook,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Function => "function",
            EntityKind::Class => "class",
            EntityKind::Method => "method",
            EntityKind::Hook => "hook",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "function" => Some(EntityKind::Function),
            "class" => Some(EntityKind::Class),
            "method" => Some(EntityKind::Method),
            "hook" => Some(EntityKind::Hook),
            _ => None,
        }
    }
}

/// Whether a hook fires an action or runs a filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookType {
    Action,
    Filter,
}

impl HookType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookType::Action => "action",
            HookType::Filter => "filter",
        }
    }

    /// Maps a hook-firing function name to its hook type.
    pub fn from_function(name: &str) -> Option<Self> {
        match name {
            "do_action" | "do_action_ref_array" | "do_action_deprecated" => Some(HookType::Action),
            "apply_filters" | "apply_filters_ref_array" | "apply_filters_deprecated" => {
                Some(HookType::Filter)
            }
            _ => None,
        }
    }
}

/// A single `@tag content` annotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(default)]
    pub content: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Parsed documentation comment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocBlock {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl DocBlock {
    pub fn is_empty(&self) -> bool {
        self.summary.is_empty() && self.description.is_empty() && self.tags.is_empty()
    }

    pub fn tag(&self, name: &str) -> Option<&Tag> {
        self.tags.iter().find(|t| t.name == name)
    }

    /// Version declared by the first `@since` tag, if any.
    pub fn since(&self) -> Option<&str> {
        self.tag("since")
            .and_then(|t| t.content.split_whitespace().next())
    }

    pub fn is_internal(&self) -> bool {
        self.tag("internal").is_some()
    }
}

/// A documented function, class, method or hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub kind: EntityKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Declaring class, for methods
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook_type: Option<HookType>,
    pub line: u32,
    pub end_line: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default)]
    pub doc: DocBlock,
}

impl Entity {
    pub fn new(kind: EntityKind, name: impl Into<String>, line: u32, end_line: u32) -> Self {
        Self {
            kind,
            name: name.into(),
            namespace: None,
            parent: None,
            hook_type: None,
            line,
            end_line,
            signature: None,
            doc: DocBlock::default(),
        }
    }

    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace.filter(|ns| !ns.is_empty());
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_hook_type(mut self, hook_type: HookType) -> Self {
        self.hook_type = Some(hook_type);
        self
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn with_doc(mut self, doc: DocBlock) -> Self {
        self.doc = doc;
        self
    }

    /// Name qualified by namespace and declaring class.
    ///
    /// Functions and methods end in `()`, so a class and a function sharing
    /// a name stay distinct: `Widget` and `Widget()`. Hooks live in a global namespace of strings, so they are qualified by
    /// hook type instead: `action:init`, `filter:the_content`.
    pub fn qualified_name(&self) -> String {
        if self.kind == EntityKind::Hook {
            let hook_type = self.hook_type.unwrap_or(HookType::Action);
            return format!("{}:{}", hook_type.as_str(), self.name);
        }

        let mut qualified = String::new();
        if let Some(ns) = &self.namespace {
            qualified.push_str(ns);
            qualified.push('\\');
        }
        if let Some(parent) = &self.parent {
            qualified.push_str(parent);
            qualified.push_str("::");
        }
        qualified.push_str(&self.name);
        if matches!(self.kind, EntityKind::Function | EntityKind::Method) {
            qualified.push_str("()");
        }
        qualified
    }

    /// Qualified name of the declaring class, for methods.
    pub fn parent_qualified_name(&self) -> Option<String> {
        let parent = self.parent.as_ref()?;
        Some(match &self.namespace {
            Some(ns) => format!("{}\\{}", ns, parent),
            None => parent.clone(),
        })
    }

    pub fn since(&self) -> Option<&str> {
        self.doc.since()
    }

    pub fn is_internal(&self) -> bool {
        self.doc.is_internal()
    }
}

/// Documentation extracted from one source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Path relative to the extraction base, `/`-separated
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<DocBlock>,
    #[serde(default)]
    pub entities: Vec<Entity>,
}

impl FileRecord {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            doc: None,
            entities: Vec::new(),
        }
    }
}

/// Ordered collection of file records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    pub files: Vec<FileRecord>,
}

impl Document {
    pub fn new(files: Vec<FileRecord>) -> Self {
        Self { files }
    }

    pub fn entity_count(&self) -> usize {
        self.files.iter().map(|f| f.entities.len()).sum()
    }

    pub fn entities(&self) -> impl Iterator<Item = (&FileRecord, &Entity)> {
        self.files
            .iter()
            .flat_map(|f| f.entities.iter().map(move |e| (f, e)))
    }

    /// Checks that `(file path, qualified name)` is unique.
    ///
    /// Returns a description of the first duplicate found.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let mut seen = HashSet::new();
        for (file, entity) in self.entities() {
            let qualified = entity.qualified_name();
            if !seen.insert((file.path.as_str(), qualified.clone())) {
                return Err(format!(
                    "duplicate entity {} in {}",
                    qualified, file.path
                ));
            }
        }
        Ok(())
    }
}
