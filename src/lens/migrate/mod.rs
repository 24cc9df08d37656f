//! Migrate lens
//!
//! This module provides the migrate lens, the entry point used by the CLI to
//! inspect and move a database between migration versions.
//!
//! # Example
//!
//! ```rust,ignore
//! use caribou::database::DatabaseConn;
//! use caribou::lens::migrate::MigrateLens;
//! use caribou::migration::Target;
//!
//! let db = DatabaseConn::open_path("app.sqlite3")?;
//! let lens = MigrateLens::new(db.connection(), "migrations")?;
//! let report = lens.upgrade(&Target::Latest)?;
//! println!("{}", lens.format_report(&report, &OutputFormat::Table));
//! ```

pub mod types;

pub use types::{MigrationEntry, VersionStatus, NOT_AVAILABLE};

use rusqlite::Connection;
use tracing::info;

use crate::database::VersionStore;
use crate::error::{Error, Result};
use crate::lens::utils::OutputFormat;
use crate::migration::{
    Direction, MigrationCatalog, MigrationReport, MigrationRunner, MigrationSource, Plan, Target,
    Version,
};

/// Migrate lens bound to one database and one catalog
///
/// This lens provides high-level operations for:
/// - Reading the version state of a database
/// - Upgrading, downgrading, or migrating to an explicit target
/// - Formatting catalogs and run reports for output
pub struct MigrateLens<'a> {
    conn: &'a Connection,
    catalog: MigrationCatalog,
}

impl<'a> MigrateLens<'a> {
    /// Discover migrations from `source` and bind them to `conn`
    pub fn new(conn: &'a Connection, source: impl Into<MigrationSource>) -> Result<Self> {
        let catalog = MigrationCatalog::discover(source)?;
        Ok(Self::with_catalog(conn, catalog))
    }

    /// Bind an already discovered catalog
    pub fn with_catalog(conn: &'a Connection, catalog: MigrationCatalog) -> Self {
        Self { conn, catalog }
    }

    pub fn catalog(&self) -> &MigrationCatalog {
        &self.catalog
    }

    /// Current version, creating the version table if needed
    pub fn current_version(&self) -> Result<Version> {
        VersionStore::new(self.conn).get_version()
    }

    /// Version state without modifying the database
    pub fn version_status(&self) -> Result<VersionStatus> {
        let version = VersionStore::new(self.conn).peek_version()?;
        let current = version.clone().unwrap_or_else(Version::zero);
        let pending = self
            .catalog
            .iter()
            .filter(|m| *m.version() > current)
            .count();

        Ok(VersionStatus {
            version,
            latest: self.catalog.latest().cloned(),
            pending,
        })
    }

    /// Plan a run from the current version to `target`
    ///
    /// Read-only: a database without the version table is planned from the
    /// zero sentinel and left unversioned.
    pub fn plan(&self, target: &Target) -> Result<Plan<'_>> {
        self.runner().check_target(target)?;
        let current = VersionStore::new(self.conn)
            .peek_version()?
            .unwrap_or_else(Version::zero);
        self.runner().plan(&current, target)
    }

    /// Fail with [`Error::NotVersionControlled`] unless the version table exists
    pub fn require_version_control(&self) -> Result<()> {
        if VersionStore::new(self.conn).is_version_controlled()? {
            Ok(())
        } else {
            Err(Error::NotVersionControlled)
        }
    }

    /// Move forward to `target`
    ///
    /// A target below the current version is a no-op.
    pub fn upgrade(&self, target: &Target) -> Result<MigrationReport> {
        self.run_in_direction(target, Direction::Forward)
    }

    /// Move backward to `target`
    ///
    /// A target above the current version is a no-op. The database must
    /// already be under version control.
    pub fn downgrade(&self, target: &Target) -> Result<MigrationReport> {
        self.require_version_control()?;
        self.run_in_direction(target, Direction::Backward)
    }

    /// Move to `target` in whichever direction it lies
    pub fn migrate_to(&self, target: &Target) -> Result<MigrationReport> {
        self.runner().run(self.conn, target)
    }

    /// Catalog rows for listing
    pub fn entries(&self) -> Vec<MigrationEntry> {
        self.catalog.iter().map(MigrationEntry::from).collect()
    }

    /// Format catalog rows based on output format
    ///
    /// Does not need a database, so `caribou list` can call it directly.
    ///
    /// Note: Table formats require the `display` feature. Without it, they
    /// fall back to JSON output.
    pub fn format_entries(entries: &[MigrationEntry], format: &OutputFormat) -> String {
        match format {
            OutputFormat::Table | OutputFormat::Markdown => {
                #[cfg(feature = "display")]
                {
                    use tabled::settings::Style;
                    use tabled::Table;
                    match format {
                        OutputFormat::Markdown => {
                            Table::new(entries).with(Style::markdown()).to_string()
                        }
                        _ => Table::new(entries).with(Style::rounded()).to_string(),
                    }
                }
                #[cfg(not(feature = "display"))]
                {
                    OutputFormat::JsonPretty.to_json_list(entries)
                }
            }
            OutputFormat::Psv => {
                let mut output = String::from("version|name|origin\n");
                for e in entries {
                    output.push_str(&format!("{}|{}|{}\n", e.version, e.name, e.origin));
                }
                output
            }
            _ => format.to_json_list(entries),
        }
    }

    /// Format a run report based on output format
    pub fn format_report(&self, report: &MigrationReport, format: &OutputFormat) -> String {
        if format.is_json() {
            return format.to_json(report);
        }

        let applied = report
            .applied
            .iter()
            .map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join(",");

        match (format, report.direction) {
            (OutputFormat::Psv, direction) => format!(
                "direction|from_version|to_version|applied\n{}|{}|{}|{}\n",
                direction
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                report.from_version,
                report.to_version,
                applied
            ),
            (_, None) => format!("database already at version {}", report.to_version),
            (_, Some(direction)) => format!(
                "migrated {} from version {} to version {} ({} applied: {})",
                direction,
                report.from_version,
                report.to_version,
                report.applied.len(),
                applied
            ),
        }
    }

    fn runner(&self) -> MigrationRunner<'_> {
        MigrationRunner::new(&self.catalog)
    }

    fn run_in_direction(&self, target: &Target, direction: Direction) -> Result<MigrationReport> {
        let runner = self.runner();
        runner.check_target(target)?;
        let current = self.current_version()?;
        let plan = runner.plan(&current, target)?;

        match plan.direction() {
            Some(d) if d != direction => {
                info!(
                    "target {} would move {} from version {}, nothing to do",
                    target, d, current
                );
                Ok(MigrationReport::unchanged(&current))
            }
            _ => runner.execute(self.conn, &plan),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::MigrationUnit;

    const V1: &str = "20200101000000";
    const V2: &str = "20200102000000";

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn units() -> Vec<MigrationUnit> {
        vec![
            MigrationUnit::new("v20200102000000_create_scores")
                .upgrade_sql(["CREATE TABLE scores (user_id INTEGER, value INTEGER)"])
                .downgrade_sql(["DROP TABLE scores"]),
            MigrationUnit::new("20200101000000_create_users")
                .upgrade_sql(["CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)"])
                .downgrade_sql(["DROP TABLE users"]),
        ]
    }

    fn count_tables(conn: &Connection) -> i64 {
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('users', 'scores')",
            [],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn test_version_status_does_not_create_table() {
        let conn = Connection::open_in_memory().unwrap();
        let lens = MigrateLens::new(&conn, units()).unwrap();

        let status = lens.version_status().unwrap();
        assert!(!status.is_version_controlled());
        assert_eq!(status.pending, 2);
        assert_eq!(status.latest, Some(v(V2)));
        assert!(!VersionStore::new(&conn).is_version_controlled().unwrap());
    }

    #[test]
    fn test_upgrade_then_downgrade() {
        let conn = Connection::open_in_memory().unwrap();
        let lens = MigrateLens::new(&conn, units()).unwrap();

        let report = lens.upgrade(&Target::Latest).unwrap();
        assert_eq!(report.direction, Some(Direction::Forward));
        assert_eq!(report.applied, vec![v(V1), v(V2)]);
        assert_eq!(count_tables(&conn), 2);
        assert!(lens.version_status().unwrap().is_up_to_date());

        let report = lens.downgrade(&Target::Zero).unwrap();
        assert_eq!(report.direction, Some(Direction::Backward));
        assert_eq!(report.applied, vec![v(V2), v(V1)]);
        assert_eq!(report.to_version, Version::zero());
        assert_eq!(count_tables(&conn), 0);
    }

    #[test]
    fn test_wrong_direction_is_noop() {
        let conn = Connection::open_in_memory().unwrap();
        let lens = MigrateLens::new(&conn, units()).unwrap();
        lens.migrate_to(&Target::Version(v(V2))).unwrap();

        let report = lens.upgrade(&Target::Version(v(V1))).unwrap();
        assert!(report.is_noop());
        assert_eq!(lens.current_version().unwrap(), v(V2));

        lens.migrate_to(&Target::Version(v(V1))).unwrap();
        let report = lens.downgrade(&Target::Latest).unwrap();
        assert!(report.is_noop());
        assert_eq!(lens.current_version().unwrap(), v(V1));
    }

    #[test]
    fn test_unknown_target_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        let lens = MigrateLens::new(&conn, units()).unwrap();

        let err = lens.upgrade(&Target::from("20190101000000")).unwrap_err();
        assert!(matches!(err, Error::VersionMismatch { .. }));
        assert!(!VersionStore::new(&conn).is_version_controlled().unwrap());
    }

    #[test]
    fn test_plan_leaves_database_unversioned() {
        let conn = Connection::open_in_memory().unwrap();
        let lens = MigrateLens::new(&conn, units()).unwrap();

        let plan = lens.plan(&Target::Latest).unwrap();
        assert_eq!(plan.direction(), Some(Direction::Forward));
        assert!(plan.current().is_zero());
        assert_eq!(plan.steps().len(), 2);
        assert!(!VersionStore::new(&conn).is_version_controlled().unwrap());

        lens.upgrade(&Target::Version(v(V1))).unwrap();
        let plan = lens.plan(&Target::Latest).unwrap();
        assert_eq!(plan.current(), &v(V1));
        assert_eq!(plan.final_version(), &v(V2));
    }

    #[test]
    fn test_downgrade_requires_version_control() {
        let conn = Connection::open_in_memory().unwrap();
        let lens = MigrateLens::new(&conn, units()).unwrap();

        let err = lens.downgrade(&Target::Zero).unwrap_err();
        assert!(matches!(err, Error::NotVersionControlled));
        assert!(!VersionStore::new(&conn).is_version_controlled().unwrap());

        // once versioned, rolling back to zero and repeating it both succeed
        lens.upgrade(&Target::Latest).unwrap();
        lens.downgrade(&Target::Zero).unwrap();
        assert!(lens.downgrade(&Target::Zero).unwrap().is_noop());
    }

    #[test]
    fn test_entries_and_formatting() {
        let conn = Connection::open_in_memory().unwrap();
        let lens = MigrateLens::new(&conn, units()).unwrap();

        let entries = lens.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].version, V1);
        assert_eq!(entries[0].name, "create_users");
        assert_eq!(entries[0].origin, NOT_AVAILABLE);

        let psv = MigrateLens::format_entries(&entries, &OutputFormat::Psv);
        assert_eq!(
            psv,
            "version|name|origin\n20200101000000|create_users|-\n20200102000000|create_scores|-\n"
        );

        let json = MigrateLens::format_entries(&entries, &OutputFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[1]["name"], "create_scores");
    }

    #[test]
    fn test_format_report() {
        let conn = Connection::open_in_memory().unwrap();
        let lens = MigrateLens::new(&conn, units()).unwrap();

        let report = lens.upgrade(&Target::Latest).unwrap();
        assert_eq!(
            lens.format_report(&report, &OutputFormat::Table),
            "migrated forward from version 0 to version 20200102000000 (2 applied: 20200101000000,20200102000000)"
        );

        let report = lens.upgrade(&Target::Latest).unwrap();
        assert_eq!(
            lens.format_report(&report, &OutputFormat::Table),
            "database already at version 20200102000000"
        );

        let json = lens.format_report(&report, &OutputFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["direction"], serde_json::Value::Null);
        assert_eq!(parsed["to_version"], V2);
    }
}
