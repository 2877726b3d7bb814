pub mod cli;
pub mod db;
pub mod migration;
pub mod runner;

pub use cli::commands::{Orchestrator, StatusSnapshot};
pub use cli::error::{MigrateError, MigrateErrorKind};
pub use cli::Command;
