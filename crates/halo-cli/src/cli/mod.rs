mod commands;
mod helpers;

use clap::Parser;
use halo_core::domain::HaloError;
use tracing_subscriber::EnvFilter;

pub fn run_from_env() -> i32 {
    match run(std::env::args()) {
        Ok(code) => code,
        Err(error) => {
            let halo_error = error.as_halo_error();
            eprintln!("{}", halo_error.diagnostic_line());
            if let Some(summary_line) = halo_error.fatal_exit_line() {
                eprintln!("{}", summary_line);
            }
            halo_error.exit_code()
        }
    }
}

fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let args: Vec<String> = args.into_iter().map(Into::into).collect();
    match Cli::try_parse_from(&args) {
        Ok(cli) => {
            init_logging(cli.verbose, cli.quiet);
            dispatch_parsed(cli.command)
        }
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "illustris-halos",
    version,
    about = "Download Illustris subhalo cutouts as self-contained snapshot files"
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Resolve, download, normalize and archive subhalo cutouts
    Fetch(commands::FetchArgs),
    /// Normalize an already downloaded cutout in place
    Normalize(commands::NormalizeArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Fetch(args) => commands::run_fetch_command(args),
        CliCommand::Normalize(args) => commands::run_normalize_command(args),
    }
}

/// Logs go to stderr; stdout carries only the archived paths.
fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Some("warn"),
        (false, 0) => None,
        (false, 1) => Some("debug"),
        (false, _) => Some("trace"),
    };
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Halo(#[from] HaloError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_halo_error(&self) -> HaloError {
        match self {
            Self::Usage(message) => HaloError::input_validation("INPUT.CLI_USAGE", message.trim()),
            Self::Halo(error) => error.clone(),
            Self::Internal(error) => HaloError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}
