use anyhow::Result;
use caribou::lens::migrate::MigrateLens;
use caribou::lens::utils::OutputFormat;
use caribou::migration::{Direction, Target};
use caribou::CaribouConfig;
use clap::Args;

/// Arguments for the Downgrade command
#[derive(Args)]
pub struct DowngradeArgs {
    /// Target version, `0` (roll back everything) by default
    pub target: Option<String>,

    /// Only print the migrations that would run
    #[clap(long)]
    pub dry_run: bool,
}

pub fn run(config: &CaribouConfig, args: DowngradeArgs, output_format: OutputFormat) -> Result<()> {
    let DowngradeArgs { target, dry_run } = args;
    let target = target.as_deref().map(Target::from).unwrap_or(Target::Zero);

    let (catalog, db) = super::open_migrations(config)?;
    let lens = MigrateLens::with_catalog(db.connection(), catalog);

    if dry_run {
        return super::print_plan(&lens, &target, Direction::Backward, output_format);
    }

    if !output_format.is_json() {
        println!(
            "downgrading db [{}] to version [{}]",
            config.database_path, target
        );
    }

    let report = lens.downgrade(&target)?;
    println!("{}", lens.format_report(&report, &output_format));
    Ok(())
}
