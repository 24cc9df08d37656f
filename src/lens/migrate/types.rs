//! Migrate lens types
//!
//! Output types of the migrate lens, serializable for JSON output and
//! renderable as tables with the `display` feature.

use serde::Serialize;

use crate::migration::{Migration, Version};

/// Placeholder for missing values in table output
pub const NOT_AVAILABLE: &str = "-";

/// One row of `caribou list`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "display", derive(tabled::Tabled))]
pub struct MigrationEntry {
    pub version: String,
    pub name: String,
    /// Source file, `-` for migrations registered in code
    pub origin: String,
}

impl From<&Migration> for MigrationEntry {
    fn from(migration: &Migration) -> Self {
        Self {
            version: migration.version().to_string(),
            name: if migration.name().is_empty() {
                migration.identifier().to_string()
            } else {
                migration.name().to_string()
            },
            origin: migration
                .origin()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        }
    }
}

/// Version state of a database relative to a catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionStatus {
    /// `None` when the database has no version table
    pub version: Option<Version>,
    /// Newest version in the catalog
    pub latest: Option<Version>,
    /// Migrations above the current version
    pub pending: usize,
}

impl VersionStatus {
    pub fn is_version_controlled(&self) -> bool {
        self.version.is_some()
    }

    pub fn is_up_to_date(&self) -> bool {
        self.pending == 0
    }
}
