//! JobWarden CLI - host agent for batch jobs
//!
//! A command-line tool for killing jobs launched on this host, archiving
//! finished job output, probing processes and managing the agent config.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use jobwarden_core::{Error, ErrorCategory};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jobwarden")]
#[command(author, version, about = "Kill jobs and archive their output on this host")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalArgs,
}

/// Options shared by every subcommand.
#[derive(clap::Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Agent config file [default: ~/.jobwarden/agent.json]
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Host name to act as, overriding the config and the OS host name
    #[arg(long, global = true)]
    pub hostname: Option<String>,

    /// Job records file, overriding `recordsFile` in the config
    #[arg(long, global = true, value_name = "FILE")]
    pub records: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Kill a job running on this host
    Kill {
        /// Job id
        job_id: String,
    },

    /// Archive a finished job's output directory
    Archive {
        /// Job id
        job_id: String,

        /// Directory holding the job's output
        source: PathBuf,

        /// Destination, e.g. s3://bucket/prefix
        destination: String,
    },

    /// Check whether a process is alive
    Probe {
        /// Process id
        pid: i32,
    },

    /// Show what the agent binds at startup
    Status,

    /// Manage the agent configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Process exit status for a failed command.
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<Error>().map(Error::category) {
        Some(ErrorCategory::Precondition) => 2,
        Some(ErrorCategory::NotFound) => 3,
        Some(ErrorCategory::Server) => 4,
        Some(ErrorCategory::Transfer) => 5,
        Some(ErrorCategory::Configuration) => 6,
        None => 1,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    let global = &cli.global;
    let result = match cli.command {
        Commands::Kill { job_id } => commands::kill::run(global, &job_id).await,
        Commands::Archive {
            job_id,
            source,
            destination,
        } => commands::archive::run(global, &job_id, source, &destination).await,
        Commands::Probe { pid } => commands::probe::run(global, pid).await,
        Commands::Status => commands::status::run(global).await,
        Commands::Config { action } => match action.unwrap_or(ConfigAction::Show) {
            ConfigAction::Show => commands::config::show(global).await,
            ConfigAction::Path => commands::config::path(global),
            ConfigAction::Init { force } => commands::config::init(global, force).await,
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}
