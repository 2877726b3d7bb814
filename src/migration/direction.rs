use crate::runner::MigrationEvent;


#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MigrationDirection {
    Up,
    Down,
}

impl MigrationDirection {
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Up => "Migrating",
            Self::Down => "Reverting",
        }
    }
    pub fn filename(&self) -> &'static str {
        match self {
            Self::Up => "up.sql",
            Self::Down => "down.sql",
        }
    }
    /// Events emitted around a single step: (before, after).
    pub fn events(&self) -> (MigrationEvent, MigrationEvent) {
        match self {
            Self::Up => (MigrationEvent::Migrating, MigrationEvent::Migrated),
            Self::Down => (MigrationEvent::Reverting, MigrationEvent::Reverted),
        }
    }
}
