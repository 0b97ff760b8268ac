mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands, Context, UserCommands};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "phpdoc_parser=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();
    let ctx = Context::load(cli.config.as_deref(), cli.db)?;

    match cli.command {
        Commands::Export { path, output } => {
            cli::export(&ctx, &path, output)?;
        }
        Commands::Import {
            file,
            quick,
            import_internal,
            user,
        } => {
            cli::import(&ctx, &file, quick, import_internal, user)?;
        }
        Commands::Create {
            path,
            quick,
            import_internal,
            user,
        } => {
            cli::create(&ctx, &path, quick, import_internal, user)?;
        }
        Commands::User { command } => match command {
            UserCommands::Add { login, role } => {
                cli::add_user(&ctx, &login, &role)?;
            }
            UserCommands::List => {
                cli::list_users(&ctx)?;
            }
        },
        Commands::Stats => {
            cli::show_stats(&ctx)?;
        }
    }

    Ok(())
}
