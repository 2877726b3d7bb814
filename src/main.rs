use migrate::cli::{self, commands, ux, Parser};
use migrate::db::PostgresEngine;
use migrate::runner::{Migrator, Runner};
use migrate::{MigrateError, MigrateErrorKind, Orchestrator};

use std::io;
use std::process::ExitCode;
use std::time::Instant;


/// Connect to the database and wrap it in a directory-backed migrator.
async fn build_runner(args: &cli::Cli) -> Result<Migrator<PostgresEngine>, MigrateError> {
    let conn_str = args.db_connection_string
        .as_deref()
        .ok_or(MigrateError { kind: MigrateErrorKind::MissingConnectionString })?;

    tracing::debug!("Connecting to database...");
    let engine = PostgresEngine::connect(conn_str, &args.table).await?;
    tracing::debug!("Loading migrations from '{}'", args.migration_directory);

    Ok(Migrator::new(engine, &args.migration_directory))
}


/// Entry point for the migrate CLI.
///
/// `migrate <command> [target]` where command is one of:
/// - `status`: Show the current, executed and pending migrations.
/// - `up [target]`: Apply pending migrations, up to and including `target` if given.
/// - `down [target]`: Revert executed migrations, down to and including `target` if given.
/// - `next`: Apply the first pending migration.
/// - `prev`: Revert the last executed migration.
#[tokio::main]
async fn main() -> ExitCode {
    let started = Instant::now();
    let args = cli::Cli::parse();

    if let Err(e) = ux::setup_logging(args.verbose, args.quiet) {
        eprintln!("{}", MigrateError::from(e));
        return ExitCode::from(commands::EXIT_FAILURE);
    }

    let mut stderr = io::stderr();

    let command = match commands::parse_command(
        args.command.as_deref(),
        args.target.as_deref(),
        &mut io::stdout(),
        &mut stderr,
    ) {
        Ok(command) => command,
        Err(code) => return ExitCode::from(code),
    };

    let mut runner = match build_runner(&args).await {
        Ok(runner) => runner,
        Err(error) => {
            println!();
            commands::report_failure(&mut stderr, command.name(), &error);
            return ExitCode::from(commands::EXIT_FAILURE);
        }
    };
    runner.subscribe(Box::new(ux::EventLogger::new(started, io::stdout())));

    let mut orchestrator = Orchestrator::new(runner, io::stdout());
    ExitCode::from(orchestrator.run(&command, &mut stderr).await)
}
