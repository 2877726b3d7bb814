mod direction;

pub use direction::MigrationDirection;

use anyhow::Context;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};


/// Identifier of a migration: the directory name of its source location.
///
/// Only discovery builds these, so a name always refers to something found on disk.
/// The whole name is kept, so `1.0_init` and `1.1_users` stay distinct.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MigrationName(String);

impl MigrationName {
    fn from_path(path: &Path) -> Option<Self> {
        path.file_name()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .map(|s| MigrationName(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MigrationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for MigrationName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}


#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Migration {
    pub name: MigrationName,
    pub path: PathBuf,
}

impl Migration {
    pub fn from_path(path: PathBuf) -> Option<Self> {
        let name = MigrationName::from_path(&path)?;
        Some(Migration { name, path })
    }

    pub fn script_path(&self, direction: MigrationDirection) -> PathBuf {
        self.path.join(direction.filename())
    }

    /// Read the SQL script for the given direction.
    pub fn script(&self, direction: MigrationDirection) -> anyhow::Result<String> {
        let path = self.script_path(direction);
        if !path.is_file() {
            anyhow::bail!("No file '{}' found for migration '{}'", path.display(), self.name);
        }

        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file '{}'", path.display()))
    }

    /// SHA-256 of the forward script, hex encoded.
    pub fn checksum(&self) -> anyhow::Result<String> {
        let path = self.script_path(MigrationDirection::Up);
        file_checksum(&path)
            .with_context(|| format!("Failed to checksum '{}'", path.display()))
    }
}


fn file_checksum(path: &Path) -> Result<String, std::io::Error> {
    let file = fs::File::open(path)?;
    let mut reader = BufReader::new(file);

    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 4096];

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}


/// Fail on two migrations sharing a name. Expects `migrations` sorted by name.
fn ensure_unique_names(migrations: &[Migration]) -> anyhow::Result<()> {
    for pair in migrations.windows(2) {
        if pair[0].name == pair[1].name {
            anyhow::bail!(
                "Duplicate migration '{}' found at '{}' and '{}'",
                pair[0].name,
                pair[0].path.display(),
                pair[1].path.display()
            );
        }
    }
    Ok(())
}


/// List every migration in `directory`, sorted by name.
///
/// Each migration is a subdirectory holding `up.sql` and `down.sql`.
pub fn collect_migrations_from_directory(directory: &Path) -> anyhow::Result<Vec<Migration>> {
    if !directory.is_dir() {
        anyhow::bail!(
            "Target directory '{}' does not exist or is not a directory",
            directory.display()
        );
    }

    let mut migrations = fs::read_dir(directory)
        .with_context(|| format!("Failed to read from '{}'", directory.display()))?
        .filter_map(|entry| {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    return Some(Err(anyhow::anyhow!(
                        "Failed to read entry in '{}': {}", directory.display(), e
                    )));
                }
            };

            let path = entry.path();
            if !path.is_dir() {
                tracing::debug!("Skipping non-directory: {:?}", path);
                return None;
            }

            let hidden = path.file_name()
                .and_then(|s| s.to_str())
                .is_some_and(|s| s.starts_with('.'));
            if hidden {
                tracing::debug!("Skipping hidden directory: {:?}", path);
                return None;
            }

            match Migration::from_path(path.clone()) {
                Some(m) => Some(Ok(m)),
                None => Some(Err(anyhow::anyhow!("Invalid directory name: {:?}", path))),
            }
        })
        .collect::<anyhow::Result<Vec<Migration>>>()?;

    migrations.sort_by(|a, b| a.name.cmp(&b.name));
    ensure_unique_names(&migrations)?;
    tracing::debug!("Found {} migration(s) in '{}'", migrations.len(), directory.display());

    Ok(migrations)
}
