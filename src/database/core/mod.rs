//! Core database infrastructure
//!
//! This module provides the foundational database components:
//! - `DatabaseConn`: SQLite connection wrapper with configuration
//! - `VersionStore`: the persisted current-version pointer

mod connection;
mod version_store;

pub use connection::DatabaseConn;
pub use version_store::{VersionStore, VersionStoreDefinitions, VERSION_TABLE};
