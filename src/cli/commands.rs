use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::debug;

use phpdoc_parser::config::{load_config, Config};
use phpdoc_parser::error::{ParserError, Result};
use phpdoc_parser::import::{ActorRef, ImportReport};
use phpdoc_parser::index::sqlite::SqliteStore;
use phpdoc_parser::index::{ContentStore, Role};
use phpdoc_parser::indexer::PhpDocExtractor;
use phpdoc_parser::orchestrator::{
    Command, CreateArgs, ExportArgs, ImportArgs, Orchestrator, Outcome,
};

#[derive(Parser)]
#[command(name = "phpdoc-parser")]
#[command(about = "Extract PHPDoc from a PHP source tree and import it into a content store")]
#[command(version)]
#[command(after_long_help = r#"
EXAMPLES:
    # Export documentation of a plugin to phpdoc.json
    phpdoc-parser export ./my-plugin

    # Export to a specific file
    phpdoc-parser export ./my-plugin reference.json

    # Register a user allowed to publish
    phpdoc-parser user add admin --role administrator

    # Import a previously exported file
    phpdoc-parser import phpdoc.json --user=admin

    # Extract and import in one step, without pacing
    phpdoc-parser create ./my-plugin --quick --user=1

    # Show content store statistics
    phpdoc-parser stats
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the content store database (overrides the config file)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Path to the configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract PHPDoc into an interchange file
    Export {
        /// Directory or file to extract from
        path: PathBuf,

        /// Where to write the JSON output
        output: Option<PathBuf>,
    },

    /// Import an interchange file into the content store
    Import {
        /// JSON file produced by `export`
        file: PathBuf,

        /// Don't pause between writes
        #[arg(long)]
        quick: bool,

        /// Also import elements marked @internal
        #[arg(long)]
        import_internal: bool,

        /// Acting user: numeric id or login
        #[arg(long)]
        user: Option<String>,
    },

    /// Extract PHPDoc and import it directly
    Create {
        /// Directory or file to extract from
        path: PathBuf,

        /// Don't pause between writes
        #[arg(long)]
        quick: bool,

        /// Also import elements marked @internal
        #[arg(long)]
        import_internal: bool,

        /// Acting user: numeric id or login
        #[arg(long)]
        user: Option<String>,
    },

    /// Manage content store users
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Show content store statistics
    Stats,
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Add a user
    Add {
        /// Login name
        login: String,

        /// administrator, editor or viewer
        #[arg(long, default_value = "administrator")]
        role: String,
    },

    /// List users
    List,
}

/// Configuration and store location shared by all commands
pub struct Context {
    pub config: Config,
    pub db: PathBuf,
}

impl Context {
    pub fn load(config_path: Option<&Path>, db: Option<PathBuf>) -> Result<Self> {
        let config = load_config(config_path)?;
        let db = db.unwrap_or_else(|| config.database.clone());
        Ok(Self { config, db })
    }

    fn open_store(&self) -> Result<SqliteStore> {
        SqliteStore::new(&self.db)
    }

    /// Store for import and create, which never create the database file.
    ///
    /// Without a database there are no users, so actor validation fails
    /// after the input has been read and nothing is left on disk.
    fn open_import_store(&self) -> Result<SqliteStore> {
        if self.db.is_file() {
            SqliteStore::open_existing(&self.db)
        } else {
            debug!("No database at {}", self.db.display());
            SqliteStore::in_memory()
        }
    }
}

pub fn export(ctx: &Context, path: &Path, output: Option<PathBuf>) -> Result<()> {
    println!(
        "Extracting PHPDoc from {}. This may take a few minutes...",
        path.display()
    );

    let orchestrator = Orchestrator::new(ctx.config.clone(), Box::new(PhpDocExtractor::new()))?;
    let outcome = orchestrator.run(Command::Export(ExportArgs {
        path: path.to_path_buf(),
        output,
    }))?;

    if let Outcome::Exported {
        output,
        files,
        entities,
        ..
    } = outcome
    {
        println!(
            "Success: Data exported to {} ({} entities from {} files)",
            output.display(),
            entities,
            files
        );
    }
    Ok(())
}

pub fn import(
    ctx: &Context,
    file: &Path,
    quick: bool,
    import_internal: bool,
    user: Option<String>,
) -> Result<()> {
    let command = Command::Import(ImportArgs {
        file: file.to_path_buf(),
        quick,
        import_internal,
        user: user.as_deref().map(ActorRef::parse),
    });

    println!("Starting import. This will take some time...");
    run_import(ctx, command)
}

pub fn create(
    ctx: &Context,
    path: &Path,
    quick: bool,
    import_internal: bool,
    user: Option<String>,
) -> Result<()> {
    let command = Command::Create(CreateArgs {
        path: path.to_path_buf(),
        quick,
        import_internal,
        user: user.as_deref().map(ActorRef::parse),
    });

    println!(
        "Extracting PHPDoc from {}. This may take a few minutes...",
        path.display()
    );
    run_import(ctx, command)
}

fn run_import(ctx: &Context, command: Command) -> Result<()> {
    let store = ctx.open_import_store()?;
    let orchestrator = Orchestrator::new(ctx.config.clone(), Box::new(PhpDocExtractor::new()))?
        .with_store(&store, &store)
        .with_progress(true);

    if let Outcome::Imported(report) = orchestrator.run(command)? {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &ImportReport) {
    for failure in &report.failures {
        eprintln!(
            "Warning: {} in {} was not imported: {}",
            failure.qualified_name, failure.file, failure.message
        );
    }

    println!(
        "Success: Imported {} entities ({} created, {} updated, {} unchanged)",
        report.imported(),
        report.created,
        report.updated,
        report.unchanged
    );
    if report.skipped > 0 {
        println!("  Skipped {} internal entities", report.skipped);
    }
    if !report.failures.is_empty() {
        println!("  {} entities failed", report.failures.len());
    }
}

pub fn add_user(ctx: &Context, login: &str, role: &str) -> Result<()> {
    let role = Role::from_str(role)
        .ok_or_else(|| ParserError::Parse(format!("unknown role '{}'", role)))?;

    let store = ctx.open_store()?;
    let user = store.add_user(login, role)?;
    println!(
        "Success: Created user {} (#{}, {})",
        user.login,
        user.id,
        user.role.as_str()
    );
    Ok(())
}

pub fn list_users(ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let users = store.list_users()?;

    if users.is_empty() {
        println!("No users");
        return Ok(());
    }

    for user in &users {
        println!("{:>4}  {:<24} {}", user.id, user.login, user.role.as_str());
    }
    Ok(())
}

pub fn show_stats(ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let stats = store.get_stats()?;

    println!("Content Store Statistics:");
    println!("  Total entities: {}", stats.total_entities);
    println!("  Total users: {}", stats.total_users);

    if !stats.entities_by_kind.is_empty() {
        println!("\n  Entities by kind:");
        for (kind, count) in &stats.entities_by_kind {
            println!("    {}: {}", kind, count);
        }
    }

    if !stats.terms_by_taxonomy.is_empty() {
        println!("\n  Terms by taxonomy:");
        for (taxonomy, count) in &stats.terms_by_taxonomy {
            println!("    {}: {}", taxonomy, count);
        }
    }

    Ok(())
}
