//! Database module
//!
//! ```text
//! database/
//! └── core/               # Foundation
//!     ├── connection      # SQLite DatabaseConn wrapper
//!     └── version_store   # migration_version table
//! ```
//!
//! The migration engine works on a borrowed `rusqlite::Connection`. Use
//! [`DatabaseConn`] when caribou should open the database itself:
//!
//! ```rust,ignore
//! use caribou::database::{DatabaseConn, VersionStore};
//!
//! let db = DatabaseConn::open_path("app.sqlite3")?;
//! let version = VersionStore::new(db.connection()).get_version()?;
//! ```

pub mod core;

pub use core::{DatabaseConn, VersionStore, VersionStoreDefinitions, VERSION_TABLE};

/// Ensure the directory holding the database file exists
pub fn ensure_parent_dir(db_path: &str) -> anyhow::Result<()> {
    match std::path::Path::new(db_path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)
            .map_err(|e| {
                anyhow::anyhow!(
                    "Failed to create database directory '{}': {}",
                    parent.display(),
                    e
                )
            }),
        _ => Ok(()),
    }
}
