pub mod config;
pub mod document;
pub mod error;
pub mod import;
pub mod index;
pub mod indexer;
pub mod orchestrator;

pub use config::{load_config, Config};
pub use document::{decode, encode, DocBlock, Document, Entity, EntityKind, FileRecord, HookType, Tag};
pub use error::{DecodeFailure, ParserError, Result};
pub use import::{
    validate_actor, ActorRef, ContentImporter, Identity, IdentityLookup, ImportPolicy,
    ImportReport, Importer,
};
pub use index::sqlite::SqliteStore;
pub use index::{ContentStore, Role, StoreStats, Taxonomy, User};
pub use indexer::{resolve, Extractor, FileWalker, PhpDocExtractor, SourcePath};
pub use orchestrator::{Command, CreateArgs, ExportArgs, ImportArgs, Orchestrator, Outcome};
