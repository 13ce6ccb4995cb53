use clap::{Parser, Subcommand};
use shieldlens_core::cli::{self, FilterArgs};
use shieldlens_core::conf::CONFIG_FILE_NAME;
use shieldlens_core::logging::init_logging;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "shieldlens",
    version,
    about = "Shieldlens: traffic dashboard for nginx access logs"
)]
struct Cli {
    /// Path to shieldlens.hcl, or a directory containing it
    #[arg(long, global = true, default_value = CONFIG_FILE_NAME)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Live dashboard, redrawn every refresh interval (default)
    Watch {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Evaluate once and print the views
    Query {
        #[command(flatten)]
        filter: FilterArgs,

        /// Print the evaluation as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate the config and open every data source
    Check {
        /// Disable colors and symbols
        #[arg(long)]
        plain: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Some(Command::Query { filter, json }) => {
            cli::query::run_query(&cli.config, &filter.into_filter(), json)
        }
        Some(Command::Check { plain }) => cli::check::check(&cli.config, plain),
        Some(Command::Watch { filter }) => cli::watch::run_watch(&cli.config, &filter.into_filter()),
        None => cli::watch::run_watch(&cli.config, &FilterArgs::default().into_filter()),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "shieldlens failed");
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
