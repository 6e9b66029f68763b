//! Lifecycle commands: provision, start the database, migrate, serve.

use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use tracing::{debug, info};

use crate::db::DbOperations;
use crate::provision::{write_env_file, DatabaseContainer, SystemCommandRunner};
use crate::{server, Settings};

#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "birthday-greeter", version, long_about = None)]
#[command(about = "Birthday greeting service and its development lifecycle.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Verbosity level (-v=debug, -vv=trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// File written by `install`.
    #[arg(long, default_value = ".env", global = true)]
    pub env_file: PathBuf,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Start the PostgreSQL container (created on first use)
    Docker,
    /// Write a .env file with the current settings if none exists
    Install,
    /// Apply pending database migrations
    Database,
    /// Start the HTTP server
    Run,
    /// install, docker, database and run in sequence
    All,
    /// Stop and remove the PostgreSQL container
    Clean,
    /// Anything else is accepted and ignored.
    #[command(external_subcommand)]
    Unknown(Vec<OsString>),
}

/// Parses arguments; unrecognised subcommands or flags become [`Command::Unknown`].
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    match Cli::try_parse_from(&args) {
        Err(e) if is_unrecognised(&e) => Ok(Cli::unknown(args)),
        other => other,
    }
}

fn is_unrecognised(err: &clap::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::UnknownArgument | ErrorKind::InvalidSubcommand
    )
}

impl Cli {
    fn unknown(args: Vec<OsString>) -> Self {
        Self {
            command: Some(Command::Unknown(args.into_iter().skip(1).collect())),
            verbose: 0,
            env_file: PathBuf::from(".env"),
        }
    }

    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    pub async fn execute(self) -> anyhow::Result<()> {
        let command = match self.command {
            None => {
                Self::command().print_help()?;
                println!();
                return Ok(());
            }
            Some(Command::Unknown(args)) => {
                debug!("Ignoring unrecognised arguments: {:?}", args);
                return Ok(());
            }
            Some(command) => command,
        };

        let settings = Settings::new().context("failed to load configuration")?;
        match command {
            Command::Install => install(&self.env_file, &settings),
            Command::Docker => docker(&settings).await,
            Command::Database => database(&settings).await,
            Command::Run => run(settings).await,
            Command::Clean => clean(&settings).await,
            Command::All => {
                install(&self.env_file, &settings)?;
                docker(&settings).await?;
                let attempts = settings.database.connect_attempts;
                let db = DbOperations::wait_for(&settings.database, attempts)
                    .await
                    .context("database did not become reachable")?;
                migrate(&db).await?;
                db.close().await;
                run(settings).await
            }
            Command::Unknown(_) => Ok(()),
        }
    }
}

fn install(env_file: &std::path::Path, settings: &Settings) -> anyhow::Result<()> {
    write_env_file(env_file, settings)
        .with_context(|| format!("failed to write {}", env_file.display()))?;
    Ok(())
}

async fn docker(settings: &Settings) -> anyhow::Result<()> {
    let runner = SystemCommandRunner;
    DatabaseContainer::new(&runner, &settings.container, &settings.database)
        .start()
        .await
        .context("failed to start the database container")?;
    Ok(())
}

async fn clean(settings: &Settings) -> anyhow::Result<()> {
    let runner = SystemCommandRunner;
    DatabaseContainer::new(&runner, &settings.container, &settings.database)
        .clean()
        .await
        .context("failed to remove the database container")?;
    Ok(())
}

async fn database(settings: &Settings) -> anyhow::Result<()> {
    let db = DbOperations::connect(&settings.database)
        .await
        .context("failed to connect to the database")?;
    let result = migrate(&db).await;
    db.close().await;
    result
}

async fn migrate(db: &DbOperations) -> anyhow::Result<()> {
    let applied = db
        .run_migrations()
        .await
        .context("failed to apply migrations")?;
    if applied == 0 {
        info!("Database schema is up to date");
    } else {
        info!("Applied {} migration(s)", applied);
    }
    Ok(())
}

async fn run(settings: Settings) -> anyhow::Result<()> {
    server::run(settings)
        .await
        .context("server terminated with an error")?;
    Ok(())
}
