//! Error types for the migration engine
//!
//! Discovery-time errors (`Naming`, `DuplicateVersion`, `Validation`,
//! `VersionMismatch`, `NotVersionControlled`, `InvalidSource`) are raised
//! before any transaction is opened. `Execution` is the only error raised after the database has been
//! touched; it records how far the run got.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::migration::Version;

/// Boxed error returned by migration operations
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error(
        "migration names must start with a 14-digit UTC timestamp, optionally prefixed with 'v'; invalid name: {identifier}"
    )]
    Naming { identifier: String },

    #[error(
        "duplicate migration versions [{}]: conflicting entries {}",
        join(.versions),
        .entries.join(", ")
    )]
    DuplicateVersion {
        versions: Vec<Version>,
        entries: Vec<String>,
    },

    #[error("invalid migration {identifier}: {issue}")]
    Validation {
        identifier: String,
        issue: ValidationIssue,
    },

    #[error(
        "migration {migration} failed, database left at version {last_committed}: {source}"
    )]
    Execution {
        version: Version,
        migration: String,
        last_committed: Version,
        source: BoxError,
    },

    #[error("no migration with version {target} exists")]
    VersionMismatch { target: String },

    #[error("the database is not under version control")]
    NotVersionControlled,

    #[error("{} is not a directory", .path.display())]
    InvalidSource { path: PathBuf },

    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl Error {
    /// Whether this error was raised before any migration step ran
    pub fn is_discovery_error(&self) -> bool {
        !matches!(self, Error::Execution { .. } | Error::Database(_))
    }

    /// Last committed version for execution failures
    pub fn last_committed(&self) -> Option<&Version> {
        match self {
            Error::Execution { last_committed, .. } => Some(last_committed),
            _ => None,
        }
    }
}

/// What made a migration unit invalid
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// Identifier matched no grammar and no fallback version was given
    MissingVersion,
    /// Fallback version is not a 14-digit timestamp
    InvalidVersion(String),
    /// One or both of `upgrade`/`downgrade` are absent
    MissingOperations(Vec<&'static str>),
    /// A migration file declares the same section twice
    DuplicateOperation(&'static str),
    /// Migration name is unusable for scaffolding
    InvalidName(String),
    /// File content could not be read as a migration
    InvalidContent(String),
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingVersion => write!(
                f,
                "no version could be derived from the identifier and no explicit version was given"
            ),
            Self::InvalidVersion(v) => {
                write!(f, "explicit version '{}' is not a 14-digit timestamp", v)
            }
            Self::MissingOperations(ops) => {
                write!(f, "missing required operations: {}", ops.join(", "))
            }
            Self::DuplicateOperation(op) => write!(f, "operation '{}' is declared twice", op),
            Self::InvalidName(name) => write!(f, "invalid migration name '{}'", name),
            Self::InvalidContent(reason) => write!(f, "{}", reason),
        }
    }
}

fn join(versions: &[Version]) -> String {
    versions
        .iter()
        .map(|v| v.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
