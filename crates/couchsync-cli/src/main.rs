use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use couch_sync_core::LibraryFilter;

mod commands;
mod logging;
mod progress;

#[derive(Parser)]
#[command(name = "couchsync")]
#[command(about = "Couchsync - keep your library and tracker watch state in step")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile watched state and ratings between the library and the tracker
    #[command(
        long_about = "Load both catalogs, compute the minimal updates for each side, and apply them in bounded batches. Ctrl-C cancels at the next batch boundary; batches already sent are not rolled back."
    )]
    Sync {
        /// Restrict the run to one media domain
        #[arg(long, value_enum, default_value = "all")]
        library: LibraryArg,

        /// Run without a progress dialog (progress goes to the log instead)
        #[arg(long, action = ArgAction::SetTrue)]
        silent: bool,

        /// Print the run summary as JSON
        #[arg(long, action = ArgAction::SetTrue)]
        json: bool,

        /// Config file path (defaults to the per-user location)
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
    /// Show or initialize the configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the active configuration with secrets masked
    Show {
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
    /// Write a configuration template to the default location
    Init {
        /// Overwrite an existing config file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LibraryArg {
    All,
    Movies,
    Episodes,
}

impl From<LibraryArg> for LibraryFilter {
    fn from(value: LibraryArg) -> Self {
        match value {
            LibraryArg::All => LibraryFilter::All,
            LibraryArg::Movies => LibraryFilter::Movies,
            LibraryArg::Episodes => LibraryFilter::Episodes,
        }
    }
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.quiet).map_err(|e| color_eyre::eyre::eyre!(e))?;

    match cli.command {
        Commands::Sync {
            library,
            silent,
            json,
            config,
        } => commands::sync::run_sync(library.into(), silent, json, config).await,
        Commands::Config { cmd } => match cmd {
            ConfigCommands::Show { config } => commands::config::show(config),
            ConfigCommands::Init { force } => commands::config::init(force),
        },
    }
}
