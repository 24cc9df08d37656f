use anyhow::Result;
use caribou::lens::migrate::{MigrateLens, MigrationEntry};
use caribou::lens::utils::OutputFormat;
use caribou::migration::MigrationCatalog;
use caribou::CaribouConfig;
use clap::Args;

/// Arguments for the List command
#[derive(Args)]
pub struct ListArgs {}

pub fn run(config: &CaribouConfig, _args: ListArgs, output_format: OutputFormat) -> Result<()> {
    let catalog = MigrationCatalog::discover(config.migrations_dir.as_str())?;
    let entries: Vec<MigrationEntry> = catalog.iter().map(MigrationEntry::from).collect();

    if output_format.is_table() {
        println!("Migrations in [{}]:", config.migrations_dir);
        println!();
    }
    println!("{}", MigrateLens::format_entries(&entries, &output_format));
    Ok(())
}
