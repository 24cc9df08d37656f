use anyhow::Result;
use caribou::config::CONFIG_FILE_NAME;
use caribou::database::VersionStore;
use caribou::lens::utils::OutputFormat;
use caribou::migration::Version;
use caribou::{CaribouConfig, DatabaseConn};
use clap::Args;
use serde::Serialize;
use std::path::Path;

/// Arguments for the Config command
#[derive(Args)]
pub struct ConfigArgs {
    /// Write a commented default caribou.toml to the current directory
    #[clap(long)]
    pub init: bool,
}

#[derive(Debug, Serialize)]
struct ConfigInfo<'a> {
    #[serde(flatten)]
    config: &'a CaribouConfig,
    database: DatabaseInfo,
    migrations_dir_exists: bool,
}

#[derive(Debug, Serialize)]
struct DatabaseInfo {
    exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_bytes: Option<u64>,
    version_controlled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<Version>,
}

pub fn run(config: &CaribouConfig, args: ConfigArgs, output_format: OutputFormat) -> Result<()> {
    let ConfigArgs { init } = args;

    if init {
        CaribouConfig::write_default(Path::new(CONFIG_FILE_NAME))?;
        if !output_format.is_json() {
            println!("created {}", CONFIG_FILE_NAME);
        }
    }

    let database = database_info(&config.database_path)?;

    if output_format.is_json() {
        let info = ConfigInfo {
            config,
            database,
            migrations_dir_exists: Path::new(&config.migrations_dir).is_dir(),
        };
        println!("{}", output_format.to_json(&info));
        return Ok(());
    }

    println!("{}", config.summary());
    if database.exists {
        println!(
            "Database Size:      {} bytes",
            database.size_bytes.unwrap_or_default()
        );
        match &database.version {
            Some(v) => println!("Database Version:   {}", v),
            None => println!("Database Version:   not under version control"),
        }
    } else {
        println!("Database does not exist yet");
    }
    Ok(())
}

fn database_info(path: &str) -> Result<DatabaseInfo> {
    if !Path::new(path).is_file() {
        return Ok(DatabaseInfo {
            exists: false,
            size_bytes: None,
            version_controlled: false,
            version: None,
        });
    }

    let size_bytes = std::fs::metadata(path).ok().map(|m| m.len());
    let db = DatabaseConn::open_path(path)?;
    let version = VersionStore::new(db.connection()).peek_version()?;

    Ok(DatabaseInfo {
        exists: true,
        size_bytes,
        version_controlled: version.is_some(),
        version,
    })
}
