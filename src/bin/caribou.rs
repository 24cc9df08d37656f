use caribou::lens::utils::OutputFormat;
use caribou::CaribouConfig;
use clap::{Parser, Subcommand};
use tracing::Level;

mod commands;

use commands::config::ConfigArgs;
use commands::create::CreateArgs;
use commands::downgrade::DowngradeArgs;
use commands::list::ListArgs;
use commands::upgrade::UpgradeArgs;
use commands::version::VersionArgs;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// configuration file path, by default ./caribou.toml or $HOME/.caribou/caribou.toml is used
    #[clap(short, long, global = true)]
    config: Option<String>,

    /// path to the SQLite database
    #[clap(short, long, global = true)]
    database: Option<String>,

    /// directory holding the migration files
    #[clap(short, long, global = true)]
    migrations_dir: Option<String>,

    /// Output format: table (default), markdown, json, json-pretty, json-line, psv
    #[clap(short, long, global = true, default_value = "table")]
    format: OutputFormat,

    /// Print debug information
    #[clap(long, global = true)]
    debug: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new migration file
    Create(CreateArgs),

    /// Upgrade the database, by default to the most recent version
    Upgrade(UpgradeArgs),

    /// Downgrade the database, by default rolling back every migration
    Downgrade(DowngradeArgs),

    /// Show the migration version of the database
    Version(VersionArgs),

    /// List the migrations in the migrations directory
    List(ListArgs),

    /// Show the effective configuration
    Config(ConfigArgs),
}

fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if cli.debug {
        tracing_subscriber::fmt()
            // filter spans/events with level DEBUG or higher.
            .with_max_level(Level::DEBUG)
            .init();
    }

    let config = match CaribouConfig::new(&cli.config) {
        Ok(c) => c.with_overrides(cli.database, cli.migrations_dir),
        Err(e) => {
            eprintln!("ERROR: {e:#}");
            std::process::exit(1);
        }
    };

    let format = cli.format;

    let result = match cli.command {
        Commands::Create(args) => commands::create::run(&config, args, format),
        Commands::Upgrade(args) => commands::upgrade::run(&config, args, format),
        Commands::Downgrade(args) => commands::downgrade::run(&config, args, format),
        Commands::Version(args) => commands::version::run(&config, args, format),
        Commands::List(args) => commands::list::run(&config, args, format),
        Commands::Config(args) => commands::config::run(&config, args, format),
    };

    if let Err(e) = result {
        eprintln!("ERROR: {e:#}");
        std::process::exit(1);
    }
}
