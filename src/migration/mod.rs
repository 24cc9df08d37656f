//! Migration engine
//!
//! ```text
//! migration/
//! ├── version    # Version type and identifier grammar
//! ├── sql_file   # upgrade/downgrade sections of .sql files
//! ├── unit       # Migration and pre-loaded MigrationUnit
//! ├── catalog    # discovery, validation, ordering
//! ├── runner     # planning and transactional execution
//! └── template   # scaffolding of new migration files
//! ```
//!
//! Typical use from an application that embeds its migrations:
//!
//! ```rust,ignore
//! use caribou::migration::{MigrationCatalog, MigrationRunner, Target};
//!
//! let catalog = MigrationCatalog::discover("migrations")?;
//! let report = MigrationRunner::new(&catalog).run(&conn, &Target::Latest)?;
//! ```

pub mod catalog;
pub mod runner;
pub mod sql_file;
pub mod template;
pub mod unit;
pub mod version;

pub use catalog::{MigrationCatalog, MigrationSource, MIGRATION_EXTENSION};
pub use runner::{
    check_target, plan, Direction, MigrationReport, MigrationRunner, Plan, PlanStep, Target,
    LATEST_TARGET,
};
pub use sql_file::{parse_sections, SqlSections, DOWNGRADE_SECTION, UPGRADE_SECTION};
pub use template::{create_migration, create_migration_at, render_template, MIGRATION_TEMPLATE};
pub use unit::{Migration, MigrationFn, MigrationUnit, Operation};
pub use version::{
    parse_identifier, ParsedName, Version, VERSION_LENGTH, VERSION_MARKER, ZERO_VERSION,
};
