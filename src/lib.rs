#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! Caribou - SQLite schema migrations
//!
//! Caribou moves a SQLite database between schema versions by applying an
//! ordered set of migrations, each with an upgrade and a downgrade step. The
//! current version is stored in the database itself. Every migration runs in
//! its own transaction, so a failed run leaves the database at the last
//! migration that committed. It can be used as both a command-line
//! application and a library.
//!
//! # Feature Flags
//!
//! | Feature | Description | Key Dependencies |
//! |---------|-------------|------------------|
//! | (none) | Migration engine, config, lenses | `rusqlite`, `thiserror`, `tracing` |
//! | `display` | Table formatting with `tabled` | `tabled` |
//! | `cli` | The `caribou` binary | All above + `clap`, `tracing-subscriber` |
//!
//! ```toml
//! # Library only
//! caribou = { version = "0.1", default-features = false }
//!
//! # Default (CLI binary)
//! caribou = "0.1"
//! ```
//!
//! # Architecture
//!
//! - **[`migration`]**: the engine (versions, catalog, planning, execution)
//! - **[`database`]**: connection wrapper and the version table
//! - **[`lens`]**: high-level operations with output formatting, used by the CLI
//! - **[`config`]**: configuration management
//! - **[`error`]**: typed engine errors
//!
//! # Quick Start
//!
//! ## Migrations from a directory
//!
//! ```rust,ignore
//! use caribou::{MigrationCatalog, MigrationRunner, Target};
//!
//! let conn = rusqlite::Connection::open("app.sqlite3")?;
//! let catalog = MigrationCatalog::discover("migrations")?;
//! let report = MigrationRunner::new(&catalog).run(&conn, &Target::Latest)?;
//! println!("now at version {}", report.to_version);
//! ```
//!
//! ## Migrations compiled into the binary
//!
//! ```rust,ignore
//! use caribou::{MigrationCatalog, MigrationRunner, MigrationUnit, Target};
//!
//! let units = vec![
//!     MigrationUnit::from_sql(
//!         "20200101000000_create_users",
//!         include_str!("../migrations/20200101000000_create_users.sql"),
//!     )?,
//!     MigrationUnit::new("v20200102000000_backfill_names")
//!         .upgrade_fn(|conn| {
//!             conn.execute("UPDATE users SET name = 'unknown' WHERE name IS NULL", [])?;
//!             Ok(())
//!         })
//!         .downgrade_sql(["SELECT 1"]),
//! ];
//! let catalog = MigrationCatalog::discover(units)?;
//! MigrationRunner::new(&catalog).run(&conn, &Target::Latest)?;
//! ```
//!
//! ## Handling failures
//!
//! ```rust,ignore
//! match runner.run(&conn, &Target::Latest) {
//!     Err(caribou::Error::Execution { migration, last_committed, .. }) => {
//!         eprintln!("{} failed, database left at {}", migration, last_committed);
//!     }
//!     other => { other?; }
//! }
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod lens;
pub mod migration;

// =============================================================================
// Configuration
// =============================================================================

pub use config::CaribouConfig;

// =============================================================================
// Errors
// =============================================================================

pub use error::{BoxError, Error, Result, ValidationIssue};

// =============================================================================
// Database
// =============================================================================

pub use database::{DatabaseConn, VersionStore, VERSION_TABLE};

// =============================================================================
// Migration engine
// =============================================================================

pub use migration::{
    create_migration, Direction, Migration, MigrationCatalog, MigrationReport, MigrationRunner,
    MigrationSource, MigrationUnit, Operation, Plan, Target, Version,
};

// =============================================================================
// Lens
// =============================================================================

pub use lens::migrate::MigrateLens;
pub use lens::utils::OutputFormat;
