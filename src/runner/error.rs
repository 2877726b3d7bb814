use crate::db::EngineError;

use std::error::Error;
use std::fmt;


/// Any failure raised by the migration runner.
#[derive(Debug)]
#[non_exhaustive]
pub struct RunnerError {
    pub kind: RunnerErrorKind
}

impl fmt::Display for RunnerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RunnerError: {}", self.kind)
    }
}

impl Error for RunnerError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		Some(&self.kind)
	}
}

#[derive(Debug)]
pub enum RunnerErrorKind {
    Engine(EngineError),
    MissingMigration(String),
    NotExecuted(String),
    NotPending(String),
    Source(anyhow::Error),
    UnknownMigration(String),
}

impl fmt::Display for RunnerErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Engine(error) => write!(f, "{}", error.kind),
            Self::MissingMigration(name) => write!(f, "Executed migration '{name}' has no source on disk"),
            Self::NotExecuted(name) => write!(f, "Migration '{name}' has not been executed"),
            Self::NotPending(name) => write!(f, "Migration '{name}' is not pending"),
            Self::Source(error) => write!(f, "{error:#}"),
            Self::UnknownMigration(name) => write!(f, "Unable to find migration: '{name}'"),
        }
    }
}

impl Error for RunnerErrorKind {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			Self::Engine(source) => Some(source),
			Self::Source(source) => Some(&**source),
			_ => None,
		}
	}
}

impl From<EngineError> for RunnerError {
    fn from(error: EngineError) -> Self {
        RunnerError { kind: RunnerErrorKind::Engine(error) }
    }
}

impl From<anyhow::Error> for RunnerError {
    fn from(error: anyhow::Error) -> Self {
        RunnerError { kind: RunnerErrorKind::Source(error) }
    }
}
