use anyhow::Result;
use caribou::lens::migrate::MigrateLens;
use caribou::lens::utils::OutputFormat;
use caribou::migration::{Direction, Target};
use caribou::CaribouConfig;
use clap::Args;

/// Arguments for the Upgrade command
#[derive(Args)]
pub struct UpgradeArgs {
    /// Target version, `latest` by default
    pub target: Option<String>,

    /// Only print the migrations that would run
    #[clap(long)]
    pub dry_run: bool,
}

pub fn run(config: &CaribouConfig, args: UpgradeArgs, output_format: OutputFormat) -> Result<()> {
    let UpgradeArgs { target, dry_run } = args;
    let target = target.as_deref().map(Target::from).unwrap_or(Target::Latest);

    let (catalog, db) = super::open_migrations(config)?;
    let lens = MigrateLens::with_catalog(db.connection(), catalog);

    if dry_run {
        return super::print_plan(&lens, &target, Direction::Forward, output_format);
    }

    if !output_format.is_json() {
        match &target {
            Target::Latest => println!(
                "upgrading db [{}] to most recent version",
                config.database_path
            ),
            t => println!("upgrading db [{}] to version [{}]", config.database_path, t),
        }
    }

    let report = lens.upgrade(&target)?;
    println!("{}", lens.format_report(&report, &output_format));
    Ok(())
}
