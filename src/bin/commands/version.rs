use anyhow::Result;
use caribou::lens::migrate::{MigrateLens, VersionStatus};
use caribou::lens::utils::OutputFormat;
use caribou::migration::MigrationCatalog;
use caribou::{CaribouConfig, DatabaseConn};
use clap::Args;
use serde::Serialize;
use std::path::Path;

/// Arguments for the Version command
#[derive(Args)]
pub struct VersionArgs {}

#[derive(Debug, Serialize)]
struct VersionInfo<'a> {
    database: &'a str,
    #[serde(flatten)]
    status: VersionStatus,
}

pub fn run(config: &CaribouConfig, _args: VersionArgs, output_format: OutputFormat) -> Result<()> {
    let status = read_status(config)?;

    if output_format.is_json() {
        let info = VersionInfo {
            database: &config.database_path,
            status,
        };
        println!("{}", output_format.to_json(&info));
        return Ok(());
    }

    match &status.version {
        None => println!(
            "the db [{}] is not under version control",
            config.database_path
        ),
        Some(v) => {
            println!("the db [{}] is at version {}", config.database_path, v);
            if let Some(latest) = &status.latest {
                if status.is_up_to_date() {
                    println!("up to date with the latest migration {}", latest);
                } else {
                    println!(
                        "{} pending migration(s), latest is {}",
                        status.pending, latest
                    );
                }
            }
        }
    }
    Ok(())
}

/// Version state of the configured database, never creating the file
fn read_status(config: &CaribouConfig) -> Result<VersionStatus> {
    let catalog = if Path::new(&config.migrations_dir).is_dir() {
        MigrationCatalog::discover(config.migrations_dir.as_str())?
    } else {
        MigrationCatalog::default()
    };

    if !Path::new(&config.database_path).is_file() {
        return Ok(VersionStatus {
            version: None,
            latest: catalog.latest().cloned(),
            pending: catalog.len(),
        });
    }

    let db = DatabaseConn::open_path(&config.database_path)?;
    let lens = MigrateLens::with_catalog(db.connection(), catalog);
    Ok(lens.version_status()?)
}
