use anyhow::Result;
use caribou::lens::utils::OutputFormat;
use caribou::migration::create_migration;
use caribou::CaribouConfig;
use clap::Args;
use serde_json::json;
use std::path::Path;

/// Arguments for the Create command
#[derive(Args)]
pub struct CreateArgs {
    /// Name of the migration, spaces are replaced by underscores
    #[clap(required = true)]
    pub name: Vec<String>,
}

pub fn run(config: &CaribouConfig, args: CreateArgs, output_format: OutputFormat) -> Result<()> {
    let CreateArgs { name } = args;
    let name = name.join(" ");

    let path = create_migration(&name, Path::new(&config.migrations_dir))?;

    if output_format.is_json() {
        println!(
            "{}",
            output_format.to_json(&json!({ "path": path.to_string_lossy() }))
        );
    } else {
        println!("created migration {}", path.display());
    }
    Ok(())
}
