use std::collections::HashMap;

use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use xxhash_rust::xxh3::xxh3_64;

use crate::document::{Document, Entity, EntityKind, FileRecord};
use crate::error::{ParserError, Result};
use crate::import::pacing::Pacer;
use crate::import::policy::ImportPolicy;
use crate::index::{ContentStore, EntityRecord, Taxonomy};

/// Writes a structured document into a content store.
pub trait Importer {
    fn import(&self, doc: &Document, policy: &ImportPolicy) -> Result<ImportReport>;
}

/// Per-entity write that did not succeed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityFailure {
    pub file: String,
    pub qualified_name: String,
    pub message: String,
}

/// Outcome counts of one import run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failures: Vec<EntityFailure>,
}

impl ImportReport {
    /// Entities now present in the store from this document
    pub fn imported(&self) -> usize {
        self.created + self.updated + self.unchanged
    }

    /// Entities actually written during this run
    pub fn written(&self) -> usize {
        self.created + self.updated
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteOutcome {
    Created,
    Updated,
    Unchanged,
}

/// [`Importer`] backed by a [`ContentStore`].
///
/// Entities are matched by `(qualified name, source file)`; unchanged
/// records are detected by content hash and not rewritten.
pub struct ContentImporter<'a> {
    store: &'a dyn ContentStore,
    pacer: Box<dyn Pacer + 'a>,
    progress: ProgressBar,
}

impl<'a> ContentImporter<'a> {
    pub fn new(store: &'a dyn ContentStore, pacer: Box<dyn Pacer + 'a>) -> Self {
        Self {
            store,
            pacer,
            progress: ProgressBar::hidden(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    fn import_file(&self, file: &FileRecord, policy: &ImportPolicy, report: &mut ImportReport) {
        // Stored ids of classes seen in this file, for linking methods
        let mut class_ids: HashMap<String, i64> = HashMap::new();

        for entity in &file.entities {
            self.progress.inc(1);

            if entity.is_internal() && !policy.include_internal {
                debug!("Skipping internal {} in {}", entity.qualified_name(), file.path);
                report.skipped += 1;
                continue;
            }

            let parent_id = entity
                .parent_qualified_name()
                .and_then(|parent| class_ids.get(&parent).copied());

            match self.import_entity(file, entity, parent_id, policy) {
                Ok((id, outcome)) => {
                    if entity.kind == EntityKind::Class {
                        class_ids.insert(entity.qualified_name(), id);
                    }
                    match outcome {
                        WriteOutcome::Created => report.created += 1,
                        WriteOutcome::Updated => report.updated += 1,
                        WriteOutcome::Unchanged => report.unchanged += 1,
                    }
                    if outcome != WriteOutcome::Unchanged {
                        self.pacer.after_write();
                    }
                }
                Err(e) => {
                    warn!("Failed to import {} from {}: {}", entity.qualified_name(), file.path, e);
                    report.failures.push(failure(file, entity, &e));
                }
            }
        }
    }

    fn import_entity(
        &self,
        file: &FileRecord,
        entity: &Entity,
        parent_id: Option<i64>,
        policy: &ImportPolicy,
    ) -> Result<(i64, WriteOutcome)> {
        let qualified_name = entity.qualified_name();
        let content_hash = content_hash(entity, parent_id)?;

        let existing = self.store.find_entity(&qualified_name, &file.path)?;
        if let Some(stored) = &existing {
            if stored.content_hash == content_hash {
                return Ok((stored.id, WriteOutcome::Unchanged));
            }
        }

        let mut terms = vec![(Taxonomy::SourceFile, file.path.as_str())];
        if let Some(since) = entity.since() {
            terms.push((Taxonomy::Since, since));
        }

        let record = EntityRecord {
            kind: entity.kind,
            name: entity.name.clone(),
            qualified_name,
            namespace: entity.namespace.clone(),
            parent_id,
            hook_type: entity.hook_type.map(|h| h.as_str().to_string()),
            file_path: file.path.clone(),
            line: entity.line,
            end_line: entity.end_line,
            signature: entity.signature.clone(),
            summary: entity.doc.summary.clone(),
            description: entity.doc.description.clone(),
            tags: serde_json::to_string(&entity.doc.tags)
                .map_err(|e| ParserError::EncodeFailed(e.to_string()))?,
            since: entity.since().map(str::to_string),
            content_hash,
            author_id: policy.actor.id(),
        };

        let existing_id = existing.map(|s| s.id);
        let id = self.store.save_entity(existing_id, &record, &terms)?;

        let outcome = if existing_id.is_some() {
            WriteOutcome::Updated
        } else {
            WriteOutcome::Created
        };
        debug!("{:?} {} ({})", outcome, record.qualified_name, record.file_path);
        Ok((id, outcome))
    }
}

impl Importer for ContentImporter<'_> {
    fn import(&self, doc: &Document, policy: &ImportPolicy) -> Result<ImportReport> {
        info!(
            "Importing {} entities from {} files as {}",
            doc.entity_count(),
            doc.files.len(),
            policy.actor.login()
        );

        self.progress.set_length(doc.entity_count() as u64);
        let mut report = ImportReport::default();

        for file in &doc.files {
            self.import_file(file, policy, &mut report);
        }

        self.progress.finish_and_clear();
        Ok(report)
    }
}

fn content_hash(entity: &Entity, parent_id: Option<i64>) -> Result<String> {
    let mut bytes =
        serde_json::to_vec(entity).map_err(|e| ParserError::EncodeFailed(e.to_string()))?;
    if let Some(parent_id) = parent_id {
        bytes.extend_from_slice(&parent_id.to_le_bytes());
    }
    Ok(format!("{:016x}", xxh3_64(&bytes)))
}

fn failure(file: &FileRecord, entity: &Entity, error: &ParserError) -> EntityFailure {
    EntityFailure {
        file: file.path.clone(),
        qualified_name: entity.qualified_name(),
        message: error.to_string(),
    }
}
