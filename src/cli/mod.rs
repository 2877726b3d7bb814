pub mod commands;
pub mod error;
pub mod ux;

pub use clap::Parser;

use crate::cli::error::{MigrateError, MigrateErrorKind};

use std::fmt;


#[derive(Parser)]
#[command(name = "migrate", version, about = "Report migration status and run migrations forward or backward.")]
pub struct Cli {
    #[arg(
        long = "db",
        help = "Database connection string, e.g.:
    postgresql://<username>:<password>@<host>:<port>/<database>\n",
        env = "DB_CONNECTION_STRING",
        hide_env_values = true
    )]
    pub db_connection_string: Option<String>,

    #[arg(
        long = "dir",
        help = "Directory containing one subdirectory (with up.sql and down.sql) per migration",
        env = "MIGRATION_DIRECTORY",
        default_value = "migrations",
    )]
    pub migration_directory: String,

    #[arg(
        long = "table",
        help = "Table recording executed migrations, optionally schema-qualified",
        env = "MIGRATION_TABLE",
        default_value = "migrations_meta",
    )]
    pub table: String,

    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        help = "Set level of verbosity. [default: INFO]\n\t-v: DEBUG\n\t-vv: TRACE\n--quiet takes precedence over --verbose."
    )]
    pub verbose: u8,

    #[arg(
        short,
        long,
        action = clap::ArgAction::SetTrue,
        help = "Disable all information logs (only ERROR level logs are shown).\n--quiet takes precedence over --verbose."
    )]
    pub quiet: bool,

    #[arg(help = "One of: status, up, down, next, prev")]
    pub command: Option<String>,

    #[arg(help = "Migration to stop at (inclusive) for up/down")]
    pub target: Option<String>,
}


#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Status,
    Up(Option<String>),
    Down(Option<String>),
    Next,
    Prev,
}

impl Command {
    /// Map a verb and optional target to a command. Targets on other verbs are ignored.
    pub fn parse(verb: Option<&str>, target: Option<&str>) -> Result<Self, MigrateError> {
        let verb = verb.unwrap_or_default().trim();
        let target = target
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        match verb {
            "status" => Ok(Command::Status),
            "up" => Ok(Command::Up(target)),
            "down" => Ok(Command::Down(target)),
            "next" => Ok(Command::Next),
            "prev" => Ok(Command::Prev),
            other => Err(MigrateError { kind: MigrateErrorKind::InvalidCommand(other.to_string()) }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Status => "status",
            Command::Up(_) => "up",
            Command::Down(_) => "down",
            Command::Next => "next",
            Command::Prev => "prev",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
