//! sigrok-cli
//!
//! Command-line front-end for scanning, configuring and capturing from
//! signal-acquisition devices, and for loading captured data from files.

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use env_logger::Env;
use log::debug;
use std::cell::RefCell;
use std::io;
use std::path::PathBuf;
use std::process;
use std::rc::Rc;

use sigrok_cli::commands::{execute, validate_args, CliArgs};
use sigrok_cli::sigrok::builtin::BuiltinContext;
use sigrok_cli::sigrok::LogLevel;
use sigrok_cli::utils::config::DEFAULT_OUTPUT_FORMAT;
use sigrok_cli::utils::CliError;

/// sigrok-cli - Command-line access to signal-acquisition devices
#[derive(Parser, Debug)]
#[command(name = "sigrok-cli")]
#[command(about, long_about = None)]
struct Cli {
    /// Show version
    #[arg(short = 'V', long)]
    version: bool,

    /// Set log level (0-5)
    #[arg(short, long, allow_negative_numbers = true)]
    loglevel: Option<i32>,

    /// The driver to use, with optional scan options: name[:key=value...]
    #[arg(short, long)]
    driver: Option<String>,

    /// Specify device configuration options: key=value[:key=value...]
    #[arg(short, long)]
    config: Option<String>,

    /// Load input from file
    #[arg(short, long)]
    input_file: Option<PathBuf>,

    /// Input format
    #[arg(short = 'I', long)]
    input_format: Option<String>,

    /// Output format
    #[arg(short = 'O', long, default_value = DEFAULT_OUTPUT_FORMAT)]
    output_format: String,

    /// Channels to use
    #[arg(short = 'p', long)]
    channels: Option<String>,

    /// Channel group to use
    #[arg(short = 'g', long)]
    channel_group: Option<String>,

    /// Scan for devices
    #[arg(long)]
    scan: bool,

    /// How long to sample (ms)
    #[arg(long)]
    time: Option<String>,

    /// Number of samples to acquire
    #[arg(long)]
    samples: Option<String>,

    /// Number of frames to acquire
    #[arg(long)]
    frames: Option<String>,

    /// Sample continuously
    #[arg(long)]
    continuous: bool,

    /// Set device options only
    #[arg(long)]
    set: bool,
}

impl From<Cli> for CliArgs {
    fn from(cli: Cli) -> Self {
        Self {
            version: cli.version,
            loglevel: cli.loglevel,
            driver: cli.driver,
            config: cli.config,
            input_file: cli.input_file,
            input_format: cli.input_format,
            output_format: cli.output_format,
            channels: cli.channels,
            channel_group: cli.channel_group,
            scan: cli.scan,
            time: cli.time,
            samples: cli.samples,
            frames: cli.frames,
            continuous: cli.continuous,
            set: cli.set,
        }
    }
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::try_parse().unwrap_or_else(|err| {
        let code = match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
            _ => 1,
        };
        let _ = err.print();
        process::exit(code);
    });

    // Setup logging
    let log_level = cli
        .loglevel
        .and_then(LogLevel::from_int)
        .map(|level| level.to_level_filter().to_string())
        .unwrap_or_else(|| "warn".to_string());
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let args = CliArgs::from(cli);

    // Check for a valid combination of arguments to proceed
    if validate_args(&args).is_err() {
        let _ = Cli::command().print_help();
        println!();
        process::exit(1);
    }

    let context = BuiltinContext::new();
    let stdout = Rc::new(RefCell::new(io::stdout()));

    match execute(&args, &context, stdout) {
        Ok(outcome) => {
            debug!("Finished: {:?}", outcome);
            Ok(())
        }
        Err(err) => match err.downcast_ref::<CliError>() {
            Some(CliError::UnrecognisedInputFormat) => {
                println!("{}", err);
                process::exit(1);
            }
            _ => Err(err),
        },
    }
}
