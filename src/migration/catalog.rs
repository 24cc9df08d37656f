//! Migration catalog
//!
//! The catalog is the validated, deduplicated, version-sorted list of
//! migrations for one invocation. It is built once from a [`MigrationSource`]
//! and never modified afterwards.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::migration::unit::{Migration, MigrationUnit};
use crate::migration::version::Version;

/// File extension of migration files
pub const MIGRATION_EXTENSION: &str = "sql";

/// Where migrations are discovered from
#[derive(Debug, Clone)]
pub enum MigrationSource {
    /// A directory holding one `.sql` file per migration
    Directory(PathBuf),
    /// Units registered by the application
    Units(Vec<MigrationUnit>),
}

impl From<PathBuf> for MigrationSource {
    fn from(path: PathBuf) -> Self {
        MigrationSource::Directory(path)
    }
}

impl From<&Path> for MigrationSource {
    fn from(path: &Path) -> Self {
        MigrationSource::Directory(path.to_path_buf())
    }
}

impl From<&str> for MigrationSource {
    fn from(path: &str) -> Self {
        MigrationSource::Directory(PathBuf::from(path))
    }
}

impl From<Vec<MigrationUnit>> for MigrationSource {
    fn from(units: Vec<MigrationUnit>) -> Self {
        MigrationSource::Units(units)
    }
}

/// Ordered set of migrations
#[derive(Debug, Clone, Default)]
pub struct MigrationCatalog {
    migrations: Vec<Migration>,
}

impl MigrationCatalog {
    /// Discover migrations from a directory or a collection of units
    pub fn discover(source: impl Into<MigrationSource>) -> Result<Self> {
        match source.into() {
            MigrationSource::Directory(path) => Self::from_directory(&path),
            MigrationSource::Units(units) => Self::from_units(units),
        }
    }

    /// Load every `.sql` file in `dir`
    ///
    /// Other files and subdirectories are ignored. Entries are processed in
    /// file-name order so that the first reported error is stable.
    pub fn from_directory(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(Error::InvalidSource {
                path: dir.to_path_buf(),
            });
        }

        let entries = std::fs::read_dir(dir).map_err(|source| Error::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| Error::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            let is_migration = path
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case(MIGRATION_EXTENSION))
                .unwrap_or(false);
            if path.is_file() && is_migration {
                paths.push(path);
            }
        }
        paths.sort();

        debug!("found {} migration files in {}", paths.len(), dir.display());

        let migrations = paths
            .iter()
            .map(|p| Migration::from_path(p))
            .collect::<Result<Vec<_>>>()?;

        Self::from_migrations(migrations)
    }

    /// Validate pre-loaded units
    pub fn from_units<I>(units: I) -> Result<Self>
    where
        I: IntoIterator<Item = MigrationUnit>,
    {
        let migrations = units
            .into_iter()
            .map(Migration::from_unit)
            .collect::<Result<Vec<_>>>()?;

        Self::from_migrations(migrations)
    }

    /// Reject duplicate versions, then sort ascending by version
    pub fn from_migrations(mut migrations: Vec<Migration>) -> Result<Self> {
        let mut by_version: BTreeMap<&Version, Vec<&str>> = BTreeMap::new();
        for migration in &migrations {
            by_version
                .entry(migration.version())
                .or_default()
                .push(migration.identifier());
        }

        let conflicts: Vec<_> = by_version
            .into_iter()
            .filter(|(_, identifiers)| identifiers.len() > 1)
            .collect();
        if !conflicts.is_empty() {
            let versions = conflicts.iter().map(|(v, _)| (*v).clone()).collect();
            let entries = conflicts
                .iter()
                .flat_map(|(_, identifiers)| identifiers.iter().map(|s| s.to_string()))
                .collect();
            return Err(Error::DuplicateVersion { versions, entries });
        }

        migrations.sort_by(|a, b| a.version().cmp(b.version()));
        info!("loaded {} migrations", migrations.len());

        Ok(Self { migrations })
    }

    pub fn migrations(&self) -> &[Migration] {
        &self.migrations
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Migration> {
        self.migrations.iter()
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    pub fn get(&self, version: &Version) -> Option<&Migration> {
        self.position(version).map(|i| &self.migrations[i])
    }

    pub fn contains(&self, version: &Version) -> bool {
        self.position(version).is_some()
    }

    /// Newest version in the catalog
    pub fn latest(&self) -> Option<&Version> {
        self.migrations.last().map(|m| m.version())
    }

    /// Version preceding the migration at `index`, or the zero sentinel
    pub fn predecessor(&self, index: usize) -> Version {
        index
            .checked_sub(1)
            .and_then(|i| self.migrations.get(i))
            .map(|m| m.version().clone())
            .unwrap_or_else(Version::zero)
    }

    fn position(&self, version: &Version) -> Option<usize> {
        self.migrations
            .binary_search_by(|m| m.version().cmp(version))
            .ok()
    }
}

impl<'a> IntoIterator for &'a MigrationCatalog {
    type Item = &'a Migration;
    type IntoIter = std::slice::Iter<'a, Migration>;

    fn into_iter(self) -> Self::IntoIter {
        self.migrations.iter()
    }
}
