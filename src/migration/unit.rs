//! Migration units
//!
//! A [`Migration`] is a validated `(version, name)` identity plus an
//! upgrade/downgrade [`Operation`] pair. It is built either from a `.sql`
//! file on disk or from a [`MigrationUnit`] registered by the application.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rusqlite::Connection;
use tracing::debug;

use crate::error::{BoxError, Error, Result, ValidationIssue};
use crate::migration::sql_file::{parse_sections, DOWNGRADE_SECTION, UPGRADE_SECTION};
use crate::migration::version::{parse_identifier, ParsedName, Version};

/// Callback signature for non-SQL migration steps
pub type MigrationFn =
    Arc<dyn Fn(&Connection) -> std::result::Result<(), BoxError> + Send + Sync>;

/// One direction of a migration
#[derive(Clone)]
pub enum Operation {
    /// SQL batches executed in order
    Sql(Vec<String>),
    /// Compiled-in transform supplied by the application
    Callback(MigrationFn),
}

impl Operation {
    pub fn sql<I, S>(statements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Operation::Sql(statements.into_iter().map(Into::into).collect())
    }

    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&Connection) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
    {
        Operation::Callback(Arc::new(f))
    }

    /// Run the operation against the connection
    ///
    /// The caller owns the surrounding transaction.
    pub fn run(&self, conn: &Connection) -> std::result::Result<(), BoxError> {
        match self {
            Operation::Sql(statements) => {
                for sql in statements.iter().filter(|s| !s.trim().is_empty()) {
                    conn.execute_batch(sql)?;
                }
                Ok(())
            }
            Operation::Callback(f) => f(conn),
        }
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Sql(statements) => f.debug_tuple("Sql").field(statements).finish(),
            Operation::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// A pre-loaded migration registered by the embedding application
///
/// Used where the migrations directory is not available at runtime, e.g.
/// when migrations are compiled into the binary with `include_str!`.
///
/// ```rust,ignore
/// let unit = MigrationUnit::new("v20200101000000_create_users")
///     .upgrade_sql(["CREATE TABLE users (id INTEGER PRIMARY KEY)"])
///     .downgrade_sql(["DROP TABLE users"]);
/// ```
#[derive(Debug, Clone)]
pub struct MigrationUnit {
    identifier: String,
    version: Option<String>,
    upgrade: Option<Operation>,
    downgrade: Option<Operation>,
}

impl MigrationUnit {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            version: None,
            upgrade: None,
            downgrade: None,
        }
    }

    /// Build a unit from migration file content, e.g. `include_str!`
    pub fn from_sql(identifier: impl Into<String>, content: &str) -> Result<Self> {
        let identifier = identifier.into();
        let sections = parse_sections(content).map_err(|issue| Error::Validation {
            identifier: identifier.clone(),
            issue,
        })?;
        Ok(Self::new(identifier)
            .upgrade_sql([sections.upgrade])
            .downgrade_sql([sections.downgrade]))
    }

    /// Explicit version, consulted only when the identifier carries none
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn upgrade(mut self, operation: Operation) -> Self {
        self.upgrade = Some(operation);
        self
    }

    pub fn downgrade(mut self, operation: Operation) -> Self {
        self.downgrade = Some(operation);
        self
    }

    pub fn upgrade_sql<I, S>(self, statements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.upgrade(Operation::sql(statements))
    }

    pub fn downgrade_sql<I, S>(self, statements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.downgrade(Operation::sql(statements))
    }

    pub fn upgrade_fn<F>(self, f: F) -> Self
    where
        F: Fn(&Connection) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
    {
        self.upgrade(Operation::callback(f))
    }

    pub fn downgrade_fn<F>(self, f: F) -> Self
    where
        F: Fn(&Connection) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
    {
        self.downgrade(Operation::callback(f))
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

/// A validated migration
#[derive(Debug, Clone)]
pub struct Migration {
    version: Version,
    name: String,
    identifier: String,
    origin: Option<PathBuf>,
    upgrade: Operation,
    downgrade: Operation,
}

impl Migration {
    /// Load a migration from a `.sql` file
    pub fn from_path(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| Error::Naming {
                identifier: file_name.clone(),
            })?;

        let (version, name) = match parse_identifier(stem) {
            ParsedName::Recognized { version, name } => (version, name),
            ParsedName::Unrecognized => {
                return Err(Error::Naming {
                    identifier: file_name,
                })
            }
        };

        let bytes = std::fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let content = String::from_utf8(bytes).map_err(|_| Error::Validation {
            identifier: file_name.clone(),
            issue: ValidationIssue::InvalidContent("file is not valid UTF-8".to_string()),
        })?;
        let sections = parse_sections(&content).map_err(|issue| Error::Validation {
            identifier: file_name.clone(),
            issue,
        })?;

        debug!("loaded migration {} from {}", version, path.display());

        Ok(Self {
            version,
            name,
            identifier: file_name,
            origin: Some(path.to_path_buf()),
            upgrade: Operation::sql([sections.upgrade]),
            downgrade: Operation::sql([sections.downgrade]),
        })
    }

    /// Validate a pre-loaded unit
    ///
    /// The identifier is parsed first; the explicit version is only a
    /// fallback for identifiers that match neither naming form.
    pub fn from_unit(unit: MigrationUnit) -> Result<Self> {
        let MigrationUnit {
            identifier,
            version: explicit_version,
            upgrade,
            downgrade,
        } = unit;

        let (version, name) = match parse_identifier(&identifier) {
            ParsedName::Recognized { version, name } => (version, name),
            ParsedName::Unrecognized => match explicit_version {
                Some(raw) => match Version::parse(&raw) {
                    Some(v) if !v.is_zero() => (v, String::new()),
                    _ => {
                        return Err(Error::Validation {
                            identifier,
                            issue: ValidationIssue::InvalidVersion(raw),
                        })
                    }
                },
                None => {
                    return Err(Error::Validation {
                        identifier,
                        issue: ValidationIssue::MissingVersion,
                    })
                }
            },
        };

        let (upgrade, downgrade) = match (upgrade, downgrade) {
            (Some(up), Some(down)) => (up, down),
            (up, down) => {
                let mut missing = Vec::new();
                if up.is_none() {
                    missing.push(UPGRADE_SECTION);
                }
                if down.is_none() {
                    missing.push(DOWNGRADE_SECTION);
                }
                return Err(Error::Validation {
                    identifier,
                    issue: ValidationIssue::MissingOperations(missing),
                });
            }
        };

        Ok(Self {
            version,
            name,
            identifier,
            origin: None,
            upgrade,
            downgrade,
        })
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// File name or unit identifier the migration was built from
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Source file, `None` for pre-loaded units
    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    pub fn upgrade(&self, conn: &Connection) -> std::result::Result<(), BoxError> {
        self.upgrade.run(conn)
    }

    pub fn downgrade(&self, conn: &Connection) -> std::result::Result<(), BoxError> {
        self.downgrade.run(conn)
    }
}

/// Diagnostic identity: `version_name`, or the raw identifier when unnamed
impl fmt::Display for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            f.write_str(&self.identifier)
        } else {
            write!(f, "{}_{}", self.version, self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "20091112150200__migration_two.sql",
            "-- upgrade\nCREATE TABLE scores (id INTEGER, value INTEGER);\n-- downgrade\nDROP TABLE scores;\n",
        );

        let migration = Migration::from_path(&path).unwrap();
        assert_eq!(migration.version().as_str(), "20091112150200");
        assert_eq!(migration.name(), "migration_two");
        assert_eq!(migration.identifier(), "20091112150200__migration_two.sql");
        assert_eq!(migration.origin(), Some(path.as_path()));
        assert_eq!(migration.to_string(), "20091112150200_migration_two");
    }

    #[test]
    fn test_from_path_invalid_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "create_users.sql", "-- upgrade\n-- downgrade\n");

        match Migration::from_path(&path) {
            Err(Error::Naming { identifier }) => assert_eq!(identifier, "create_users.sql"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_from_path_missing_downgrade() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "20091112150205_missing_downgrade.sql",
            "-- upgrade\nCREATE TABLE jams (id INTEGER);\n",
        );

        match Migration::from_path(&path) {
            Err(Error::Validation { issue, .. }) => assert_eq!(
                issue,
                ValidationIssue::MissingOperations(vec![DOWNGRADE_SECTION])
            ),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_from_unit_prefers_identifier() {
        let unit = MigrationUnit::new("v20260206024658_create_users")
            .with_version("20990101000000")
            .upgrade_sql(["CREATE TABLE users (id INTEGER PRIMARY KEY)"])
            .downgrade_sql(["DROP TABLE users"]);

        let migration = Migration::from_unit(unit).unwrap();
        assert_eq!(migration.version().as_str(), "20260206024658");
        assert_eq!(migration.name(), "create_users");
        assert!(migration.origin().is_none());
    }

    #[test]
    fn test_from_unit_fallback_version() {
        let unit = MigrationUnit::new("create_scores")
            .with_version("20260206024701")
            .upgrade_sql(["CREATE TABLE scores (id INTEGER PRIMARY KEY)"])
            .downgrade_sql(["DROP TABLE scores"]);

        let migration = Migration::from_unit(unit).unwrap();
        assert_eq!(migration.version().as_str(), "20260206024701");
        assert_eq!(migration.name(), "");
        assert_eq!(migration.to_string(), "create_scores");
    }

    #[test]
    fn test_from_unit_validation_errors() {
        let no_version = MigrationUnit::new("create_scores")
            .upgrade_sql(["SELECT 1"])
            .downgrade_sql(["SELECT 1"]);
        match Migration::from_unit(no_version) {
            Err(Error::Validation { issue, .. }) => {
                assert_eq!(issue, ValidationIssue::MissingVersion)
            }
            other => panic!("unexpected result: {:?}", other),
        }

        let bad_version = MigrationUnit::new("create_scores")
            .with_version("1")
            .upgrade_sql(["SELECT 1"])
            .downgrade_sql(["SELECT 1"]);
        match Migration::from_unit(bad_version) {
            Err(Error::Validation { issue, .. }) => {
                assert_eq!(issue, ValidationIssue::InvalidVersion("1".to_string()))
            }
            other => panic!("unexpected result: {:?}", other),
        }

        let no_ops = MigrationUnit::new("20200101000000_empty");
        match Migration::from_unit(no_ops) {
            Err(Error::Validation { issue, .. }) => assert_eq!(
                issue,
                ValidationIssue::MissingOperations(vec![UPGRADE_SECTION, DOWNGRADE_SECTION])
            ),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_operations_run_against_connection() {
        let conn = Connection::open_in_memory().unwrap();
        let unit = MigrationUnit::new("20200101000000_animals")
            .upgrade_sql(["CREATE TABLE animals (name TEXT)", ""])
            .downgrade_fn(|conn| {
                conn.execute("DROP TABLE animals", [])?;
                Ok(())
            });
        let migration = Migration::from_unit(unit).unwrap();

        migration.upgrade(&conn).unwrap();
        conn.execute("INSERT INTO animals VALUES ('bear')", [])
            .unwrap();
        migration.downgrade(&conn).unwrap();
        assert!(conn.execute("INSERT INTO animals VALUES ('wolf')", []).is_err());
    }

    #[test]
    fn test_unit_from_sql() {
        let unit = MigrationUnit::from_sql(
            "v20200101000000_users",
            "-- upgrade\nCREATE TABLE users (id INTEGER);\n-- downgrade\nDROP TABLE users;",
        )
        .unwrap();
        assert_eq!(unit.identifier(), "v20200101000000_users");
        assert!(Migration::from_unit(unit).is_ok());

        assert!(MigrationUnit::from_sql("v20200101000000_users", "-- upgrade").is_err());
    }
}
