//! Version bookkeeping
//!
//! The current migration version lives in a single-row table inside the
//! migrated database. The table layout (`migration_version(version TEXT)`)
//! is shared with databases created by earlier caribou releases.

use rusqlite::{Connection, OptionalExtension};

use crate::error::Result;
use crate::migration::Version;

/// Name of the reserved version table
pub const VERSION_TABLE: &str = "migration_version";

/// SQL definitions for the version table
pub struct VersionStoreDefinitions;

impl VersionStoreDefinitions {
    /// SQL for creating the version table
    pub const VERSION_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS migration_version (
            version TEXT
        );
    "#;

    pub const SELECT_VERSION: &'static str = "SELECT version FROM migration_version LIMIT 1";

    pub const UPDATE_VERSION: &'static str = "UPDATE migration_version SET version = ?1";

    pub const INSERT_VERSION: &'static str = "INSERT INTO migration_version (version) VALUES (?1)";
}

/// Reads and writes the current version of a database
///
/// `set_version` does not open a transaction of its own; the migration runner
/// calls it inside the transaction of the step being recorded.
pub struct VersionStore<'a> {
    conn: &'a Connection,
}

impl<'a> VersionStore<'a> {
    /// Create a version store for the given connection
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Current version, creating the version table if needed
    ///
    /// Returns the zero sentinel when no version was ever recorded.
    pub fn get_version(&self) -> Result<Version> {
        self.ensure_table()?;
        Ok(self.read_version()?.unwrap_or_else(Version::zero))
    }

    /// Record `version` as the current version
    pub fn set_version(&self, version: &Version) -> Result<()> {
        self.ensure_table()?;
        let updated = self
            .conn
            .execute(VersionStoreDefinitions::UPDATE_VERSION, [version.as_str()])?;
        if updated == 0 {
            self.conn
                .execute(VersionStoreDefinitions::INSERT_VERSION, [version.as_str()])?;
        }
        Ok(())
    }

    /// Check whether the version table exists, without creating it
    pub fn is_version_controlled(&self) -> Result<bool> {
        let count: i32 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            [VERSION_TABLE],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Current version, or `None` if the database is not version controlled
    pub fn peek_version(&self) -> Result<Option<Version>> {
        if !self.is_version_controlled()? {
            return Ok(None);
        }
        Ok(Some(self.read_version()?.unwrap_or_else(Version::zero)))
    }

    fn ensure_table(&self) -> Result<()> {
        self.conn
            .execute(VersionStoreDefinitions::VERSION_TABLE, [])?;
        Ok(())
    }

    fn read_version(&self) -> Result<Option<Version>> {
        let value: Option<Option<String>> = self
            .conn
            .query_row(VersionStoreDefinitions::SELECT_VERSION, [], |row| row.get(0))
            .optional()?;
        Ok(value.flatten().map(Version::from_stored))
    }
}
