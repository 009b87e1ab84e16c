//! `recondesk` command line front end.
//!
//! # Responsibility
//! - Load `.env` and environment configuration, start logging, open storage.
//! - Map subcommands onto `recondesk_core` services and integrations.

mod commands;
mod handlers;
mod output;

use clap::{Parser, Subcommand};
use commands::{
    AdminCommand, BackendCommand, CalendarCommand, ContactCommand, DeployCommand,
    GithubCommand, SettingsCommand, TodoCommand,
};
use handlers::{CliResult, Context};
use log::{error, info};
use output::Output;
use recondesk_core::{core_version, format_phone, init_logging, open_db, AppConfig, TenantId};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "recondesk", version)]
#[command(about = "Dealership reconditioning desk: contacts, todos, calendar and admin")]
pub(crate) struct Cli {
    /// Dealership the command works on.
    #[arg(long, global = true, value_parser = commands::tenant_id)]
    tenant: Option<TenantId>,
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    /// Database file; overrides RECONDESK_DB_PATH.
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    Contact {
        #[command(subcommand)]
        command: ContactCommand,
    },
    Todo {
        #[command(subcommand)]
        command: TodoCommand,
    },
    Calendar {
        #[command(subcommand)]
        command: CalendarCommand,
    },
    /// Super-admin dealership registry and overview.
    Admin {
        #[command(subcommand)]
        command: AdminCommand,
    },
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
    Github {
        #[command(subcommand)]
        command: GithubCommand,
    },
    Deploy {
        #[command(subcommand)]
        command: DeployCommand,
    },
    Backend {
        #[command(subcommand)]
        command: BackendCommand,
    },
    /// Print a phone number the way contact listings show it.
    Phone {
        input: String,
    },
    Version,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_command module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let mut config = AppConfig::from_env()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Err(err) = init_logging(config.log_level, &config.log_dir) {
        eprintln!("warning: file logging disabled: {err}");
    }
    let output = Output::new(cli.json);

    let conn = match cli.command {
        Commands::Phone { input } => return Ok(output.message(&format_phone(&input))?),
        Commands::Version => return Ok(output.message(core_version())?),
        _ => open_db(&config.db_path)?,
    };
    info!(
        "event=cli_command module=cli status=start db_path={}",
        config.db_path.display()
    );

    let ctx = Context::new(&conn, cli.tenant, config, output);
    match cli.command {
        Commands::Contact { command } => handlers::contact(&ctx, command),
        Commands::Todo { command } => handlers::todo(&ctx, command),
        Commands::Calendar { command } => handlers::calendar(&ctx, command),
        Commands::Admin { command } => handlers::admin(&ctx, command),
        Commands::Settings { command } => handlers::settings(&ctx, command),
        Commands::Github { command } => handlers::github(&ctx, command).await,
        Commands::Deploy { command } => handlers::deploy(&ctx, command).await,
        Commands::Backend { command } => handlers::backend(&ctx, command).await,
        Commands::Phone { .. } | Commands::Version => Ok(()),
    }
}
