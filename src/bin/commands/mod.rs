pub mod config;
pub mod create;
pub mod downgrade;
pub mod list;
pub mod upgrade;
pub mod version;

use anyhow::Result;
use caribou::database::{ensure_parent_dir, DatabaseConn};
use caribou::lens::migrate::{MigrateLens, MigrationEntry};
use caribou::lens::utils::OutputFormat;
use caribou::migration::{Direction, MigrationCatalog, Target};
use caribou::CaribouConfig;

/// Discover the configured migrations, then open the database
///
/// The database file and its parent directory are only created once the
/// migrations directory has loaded cleanly.
pub(crate) fn open_migrations(config: &CaribouConfig) -> Result<(MigrationCatalog, DatabaseConn)> {
    let catalog = MigrationCatalog::discover(config.migrations_dir.as_str())?;
    ensure_parent_dir(&config.database_path)?;
    let db = DatabaseConn::open_path(&config.database_path)?;
    Ok((catalog, db))
}

/// Print the migrations a run to `target` in `direction` would apply, in order
pub(crate) fn print_plan(
    lens: &MigrateLens<'_>,
    target: &Target,
    direction: Direction,
    output_format: OutputFormat,
) -> Result<()> {
    if direction == Direction::Backward {
        lens.require_version_control()?;
    }
    let plan = lens.plan(target)?;
    let entries: Vec<MigrationEntry> = if plan.direction() == Some(direction) {
        plan.steps()
            .iter()
            .map(|step| MigrationEntry::from(step.migration))
            .collect()
    } else {
        Vec::new()
    };

    if entries.is_empty() && !output_format.is_json() {
        println!("nothing to do, database at version {}", plan.current());
        return Ok(());
    }

    if !output_format.is_json() {
        println!(
            "would migrate {} from version {} to version {}:",
            direction,
            plan.current(),
            plan.final_version()
        );
    }
    println!("{}", MigrateLens::format_entries(&entries, &output_format));
    Ok(())
}
