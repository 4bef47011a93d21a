//! Crustline CLI - Interactive ordering terminal and database tooling.
//!
//! # Usage
//!
//! ```bash
//! # Open a terminal session against the configured database
//! crustline shell
//!
//! # Address a local server the legacy way: database, port, user
//! crustline shell pizza_db 5432 chef
//!
//! # Try it out without PostgreSQL (seeded menu, manager/manager)
//! crustline shell --in-memory
//!
//! # Apply schema migrations
//! crustline migrate
//!
//! # Create an account with any role
//! crustline user create -l dave -p secret -r driver
//! ```
//!
//! # Commands
//!
//! - `shell` - Interactive terminal session
//! - `migrate` - Run database migrations
//! - `user create` - Create accounts, including staff
//!
//! Logs go to stderr (`RUST_LOG` overrides the default `crustline=info`);
//! the terminal owns stdout. Exits with status 1 if the database cannot be
//! reached.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Args, Parser, Subcommand, ValueEnum};
use secrecy::SecretString;
use tracing_subscriber::EnvFilter;

use crustline_backend::{BackendConfig, ConfigError};

mod commands;
mod terminal;

#[derive(Parser)]
#[command(name = "crustline")]
#[command(author, version, about = "Crustline order-management tools")]
struct Cli {
    /// Log line format on stderr
    #[arg(long, value_enum, global = true, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Open an interactive terminal session
    Shell {
        /// Use a seeded in-memory store instead of PostgreSQL
        #[arg(long, conflicts_with_all = ["database_url", "dbname"])]
        in_memory: bool,

        #[command(flatten)]
        connection: ConnectionArgs,
    },
    /// Run database migrations
    Migrate {
        #[command(flatten)]
        connection: ConnectionArgs,
    },
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create an account with an explicit role
    Create {
        /// Account login
        #[arg(short, long)]
        login: String,

        /// Account password
        #[arg(short, long)]
        password: String,

        /// Role (`customer`, `driver`, `manager`)
        #[arg(short, long, default_value = "customer")]
        role: String,

        /// Contact phone number
        #[arg(long, default_value = "")]
        phone: String,

        #[command(flatten)]
        connection: ConnectionArgs,
    },
}

/// Where to find the database.
///
/// Precedence: `--database-url`, then the positional triple, then the
/// environment (`CRUSTLINE_DATABASE_URL` or `DATABASE_URL`).
#[derive(Args)]
struct ConnectionArgs {
    /// Full `PostgreSQL` connection URL
    #[arg(long, conflicts_with = "dbname")]
    database_url: Option<String>,

    /// Database name on localhost
    #[arg(requires_all = ["port", "user"])]
    dbname: Option<String>,

    /// Server port
    port: Option<u16>,

    /// Database user
    user: Option<String>,
}

impl ConnectionArgs {
    fn config(self) -> Result<BackendConfig, ConfigError> {
        match self {
            Self {
                database_url: Some(url),
                ..
            } => BackendConfig::from_url(SecretString::from(url)),
            Self {
                dbname: Some(dbname),
                port: Some(port),
                user: Some(user),
                ..
            } => BackendConfig::for_local(&dbname, port, &user),
            _ => BackendConfig::from_env(),
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("crustline=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Shell {
            in_memory,
            connection,
        } => {
            if in_memory {
                commands::shell::in_memory().await?;
            } else {
                commands::shell::postgres(&connection.config()?).await?;
            }
        }
        Commands::Migrate { connection } => {
            commands::migrate::run(&connection.config()?).await?;
        }
        Commands::User { action } => match action {
            UserAction::Create {
                login,
                password,
                role,
                phone,
                connection,
            } => {
                commands::user::create(&connection.config()?, &login, &password, &role, &phone)
                    .await?;
            }
        },
    }
    Ok(())
}
