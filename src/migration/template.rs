//! Scaffold new migration files

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::{Error, Result, ValidationIssue};
use crate::migration::catalog::MIGRATION_EXTENSION;

/// Timestamp format of generated versions
pub const VERSION_FORMAT: &str = "%Y%m%d%H%M%S";

/// Body of a newly created migration file
pub const MIGRATION_TEMPLATE: &str = r#"-- Migration Name: {name}
-- Migration Version: {version}
--
-- Statements below the upgrade marker run when migrating forward, statements
-- below the downgrade marker run when rolling back. Each direction runs in a
-- single transaction.

-- upgrade

-- downgrade
"#;

/// Fill the template for a migration
pub fn render_template(name: &str, version: &str) -> String {
    MIGRATION_TEMPLATE
        .replace("{name}", name)
        .replace("{version}", version)
}

/// Create a migration file in `directory` versioned with the current UTC time
pub fn create_migration(name: &str, directory: &Path) -> Result<PathBuf> {
    create_migration_at(name, directory, Utc::now())
}

/// Create a migration file versioned with `now`
///
/// Spaces in the name are replaced by underscores. An existing file is
/// never overwritten.
pub fn create_migration_at(name: &str, directory: &Path, now: DateTime<Utc>) -> Result<PathBuf> {
    if !directory.is_dir() {
        return Err(Error::InvalidSource {
            path: directory.to_path_buf(),
        });
    }

    let name = normalize_name(name)?;
    let version = now.format(VERSION_FORMAT).to_string();
    let path = directory.join(format!("{}_{}.{}", version, name, MIGRATION_EXTENSION));

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(|source| Error::Io {
            path: path.clone(),
            source,
        })?;
    file.write_all(render_template(&name, &version).as_bytes())
        .map_err(|source| Error::Io {
            path: path.clone(),
            source,
        })?;

    info!("created migration {}", path.display());
    Ok(path)
}

fn normalize_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.contains(['/', '\\']) {
        return Err(Error::Validation {
            identifier: name.to_string(),
            issue: ValidationIssue::InvalidName(name.to_string()),
        });
    }
    Ok(trimmed.split_whitespace().collect::<Vec<_>>().join("_"))
}
