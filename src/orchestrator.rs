//! Export, import and create pipelines.
//!
//! Each pipeline is linear: the first failing stage halts the run and its
//! error is returned to the caller unchanged. No stage retries.

use std::fs;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use crate::config::Config;
use crate::document::{self, Document};
use crate::error::{ParserError, Result};
use crate::import::{
    validate_actor, ActorRef, ContentImporter, FixedDelay, IdentityLookup, ImportPolicy,
    ImportReport, Importer, NoPacing, Pacer,
};
use crate::index::ContentStore;
use crate::indexer::{resolve, Extractor, FileWalker, SourcePath};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArgs {
    pub path: PathBuf,
    /// Falls back to the configured output file
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportArgs {
    pub file: PathBuf,
    pub quick: bool,
    pub import_internal: bool,
    pub user: Option<ActorRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateArgs {
    pub path: PathBuf,
    pub quick: bool,
    pub import_internal: bool,
    pub user: Option<ActorRef>,
}

/// One invocation of the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Export(ExportArgs),
    Import(ImportArgs),
    Create(CreateArgs),
}

/// Result of a successful command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Exported {
        output: PathBuf,
        bytes: usize,
        files: usize,
        entities: usize,
    },
    Imported(ImportReport),
}

/// Store and identity service used by import and create.
#[derive(Clone, Copy)]
struct Backend<'a> {
    store: &'a dyn ContentStore,
    identities: &'a dyn IdentityLookup,
}

pub struct Orchestrator<'a> {
    config: Config,
    walker: FileWalker,
    extractor: Box<dyn Extractor + 'a>,
    backend: Option<Backend<'a>>,
    progress: bool,
}

impl<'a> Orchestrator<'a> {
    pub fn new(config: Config, extractor: Box<dyn Extractor + 'a>) -> Result<Self> {
        let walker = FileWalker::from_config(&config)?;
        Ok(Self {
            config,
            walker,
            extractor,
            backend: None,
            progress: false,
        })
    }

    /// Attaches the content store and identity service needed by import and create.
    pub fn with_store(
        mut self,
        store: &'a dyn ContentStore,
        identities: &'a dyn IdentityLookup,
    ) -> Self {
        self.backend = Some(Backend { store, identities });
        self
    }

    /// Shows an import progress bar on stderr.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn run(&self, command: Command) -> Result<Outcome> {
        match command {
            Command::Export(args) => self.export(&args),
            Command::Import(args) => self.import(&args).map(Outcome::Imported),
            Command::Create(args) => self.create(&args).map(Outcome::Imported),
        }
    }

    pub fn export(&self, args: &ExportArgs) -> Result<Outcome> {
        let source = resolve(&args.path)?;
        let doc = self.extract(&source)?;
        let bytes = document::encode(&doc)?;

        let output = args
            .output
            .clone()
            .unwrap_or_else(|| self.config.output_file.clone());

        fs::write(&output, &bytes).map_err(|e| ParserError::WriteFailed {
            path: output.clone(),
            bytes: bytes.len(),
            reason: e.to_string(),
        })?;

        info!("Wrote {} bytes to {}", bytes.len(), output.display());
        Ok(Outcome::Exported {
            output,
            bytes: bytes.len(),
            files: doc.files.len(),
            entities: doc.entity_count(),
        })
    }

    pub fn import(&self, args: &ImportArgs) -> Result<ImportReport> {
        let backend = self.backend()?;
        let doc = read_document(&args.file)?;
        let identity = validate_actor(backend.identities, args.user.as_ref())?;

        let policy = ImportPolicy::new(!args.quick, args.import_internal, identity);
        self.run_import(backend, &doc, &policy)
    }

    pub fn create(&self, args: &CreateArgs) -> Result<ImportReport> {
        let backend = self.backend()?;
        let source = resolve(&args.path)?;
        let doc = self.extract(&source)?;
        let identity = validate_actor(backend.identities, args.user.as_ref())?;

        let policy = ImportPolicy::new(!args.quick, args.import_internal, identity);
        self.run_import(backend, &doc, &policy)
    }

    fn backend(&self) -> Result<Backend<'a>> {
        self.backend
            .ok_or_else(|| ParserError::Config("no content store configured".to_string()))
    }

    fn extract(&self, source: &SourcePath) -> Result<Document> {
        let files = source.files(&self.walker)?;
        info!(
            "Extracting {} files from {}",
            files.len(),
            source.path().display()
        );

        let doc = self
            .extractor
            .extract(&files, source.base_dir())
            .map_err(|e| match e {
                ParserError::ExtractionFailed { .. } => e,
                other => ParserError::ExtractionFailed {
                    path: source.path().to_path_buf(),
                    message: other.to_string(),
                },
            })?;

        debug!("Extracted {} entities", doc.entity_count());
        Ok(doc)
    }

    fn pacer(&self, policy: &ImportPolicy) -> Box<dyn Pacer> {
        if policy.throttle {
            Box::new(FixedDelay::from_config(&self.config.throttle))
        } else {
            Box::new(NoPacing)
        }
    }

    fn run_import(
        &self,
        backend: Backend<'_>,
        doc: &Document,
        policy: &ImportPolicy,
    ) -> Result<ImportReport> {
        let mut importer = ContentImporter::new(backend.store, self.pacer(policy));
        if self.progress {
            let bar = ProgressBar::new(doc.entity_count() as u64);
            if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} entities") {
                bar.set_style(style);
            }
            importer = importer.with_progress(bar);
        }

        let report = importer.import(doc, policy)?;
        info!(
            "Import finished: {} created, {} updated, {} unchanged, {} skipped, {} failed",
            report.created,
            report.updated,
            report.unchanged,
            report.skipped,
            report.failures.len()
        );
        Ok(report)
    }
}

/// Reads and decodes an interchange file.
pub fn read_document(path: &Path) -> Result<Document> {
    let bytes = fs::read(path).map_err(|e| ParserError::FileUnreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    if bytes.is_empty() {
        return Err(ParserError::FileUnreadable {
            path: path.to_path_buf(),
            reason: "file is empty".to_string(),
        });
    }

    document::decode(&bytes).map_err(|e| e.in_file(path))
}
