use crate::db::EngineError;
use crate::runner::RunnerError;

use std::error::Error;
use std::fmt;
use tracing::subscriber::SetGlobalDefaultError;


#[derive(Debug)]
pub struct MigrateError {
    pub kind: MigrateErrorKind
}

impl fmt::Display for MigrateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MigrateError: {}", self.kind)
    }
}

impl Error for MigrateError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.kind)
	}
}

#[derive(Debug)]
pub enum MigrateErrorKind {
    AlreadyAtInitialState,
    Engine(EngineError),
    InvalidCommand(String),
    Io(std::io::Error),
    MissingConnectionString,
    NoPendingMigrations,
    Runner(RunnerError),
    SetGlobalDefault(SetGlobalDefaultError),
}

impl fmt::Display for MigrateErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyAtInitialState => write!(f, "Already at initial state"),
            Self::Engine(error) => write!(f, "{}", error.kind),
            Self::InvalidCommand(cmd) => write!(f, "Invalid cmd: {cmd}"),
            Self::Io(error) => write!(f, "Failed to write output: {error}"),
            Self::MissingConnectionString => write!(f, "No database connection string given (--db or DB_CONNECTION_STRING)"),
            Self::NoPendingMigrations => write!(f, "No pending migrations"),
            Self::Runner(error) => write!(f, "{}", error.kind),
            Self::SetGlobalDefault(error) => write!(f, "Failed to set global default subscriber: {}", error),
        }
    }
}

impl Error for MigrateErrorKind {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			Self::Engine(source) => Some(source),
			Self::Io(source) => Some(source),
			Self::Runner(source) => Some(source),
			_ => None,
		}
	}
}

impl From<EngineError> for MigrateError {
    fn from(error: EngineError) -> Self {
        MigrateError { kind: MigrateErrorKind::Engine(error) }
    }
}

impl From<RunnerError> for MigrateError {
    fn from(error: RunnerError) -> Self {
        MigrateError { kind: MigrateErrorKind::Runner(error) }
    }
}

impl From<std::io::Error> for MigrateError {
    fn from(error: std::io::Error) -> Self {
        MigrateError { kind: MigrateErrorKind::Io(error) }
    }
}

impl From<SetGlobalDefaultError> for MigrateError {
    fn from(error: SetGlobalDefaultError) -> Self {
        MigrateError { kind: MigrateErrorKind::SetGlobalDefault(error) }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::EngineErrorKind;
    use crate::runner::RunnerErrorKind;
    use std::io;

    #[test]
    fn migrate_error_display_formats_correctly() {
        let cases: Vec<(MigrateErrorKind, &str)> = vec![
            (MigrateErrorKind::AlreadyAtInitialState, "Already at initial state"),
            (
                MigrateErrorKind::Engine(EngineError { kind: EngineErrorKind::InvalidTableName("1x".into()) }),
                "Invalid table name: '1x'",
            ),
            (MigrateErrorKind::InvalidCommand("sideways".into()), "Invalid cmd: sideways"),
            (MigrateErrorKind::MissingConnectionString, "DB_CONNECTION_STRING"),
            (MigrateErrorKind::NoPendingMigrations, "No pending migrations"),
            (
                MigrateErrorKind::Runner(RunnerError { kind: RunnerErrorKind::UnknownMigration("x".into()) }),
                "Unable to find migration: 'x'",
            ),
        ];

        for (kind, expect) in cases {
            let text = MigrateError { kind }.to_string();
            assert!(
                text.contains(expect),
                "Expected `{}` in `{}`",
                expect,
                text
            );
        }
    }

    #[test]
    fn migrate_error_source_chain_works() {
        let err: MigrateError = io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed").into();
        let src = err.kind.source().unwrap().to_string();
        assert!(src.contains("pipe closed"));
    }

    #[test]
    fn migrate_error_from_conversions_work() {
        let e1: MigrateError = RunnerError { kind: RunnerErrorKind::NotPending("a".into()) }.into();
        let e2: MigrateError = EngineError { kind: EngineErrorKind::InvalidTableName("b".into()) }.into();

        assert!(matches!(e1.kind, MigrateErrorKind::Runner(_)));
        assert!(matches!(e2.kind, MigrateErrorKind::Engine(_)));
    }
}
