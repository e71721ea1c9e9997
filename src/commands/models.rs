use crate::utils::config::DEFAULT_OUTPUT_FORMAT;
use crate::utils::error::CliError;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Parsed command-line arguments
///
/// **Public** - used by main.rs to construct from CLI args
///
/// String options count as given only when non-empty; use the accessor
/// methods rather than the raw fields when checking for presence.
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Show version and supported formats
    pub version: bool,

    /// Library log level (0-5)
    pub loglevel: Option<i32>,

    /// Driver name, optionally followed by `:key=value` scan options
    pub driver: Option<String>,

    /// Device configuration, `key=value[:key=value...]`
    pub config: Option<String>,

    /// File to load instead of acquiring from hardware
    pub input_file: Option<PathBuf>,

    /// Input format name (autodetected when absent)
    pub input_format: Option<String>,

    /// Output format name
    pub output_format: String,

    /// Comma-separated channels to enable
    pub channels: Option<String>,

    /// Channel group to use
    pub channel_group: Option<String>,

    /// Scan for devices
    pub scan: bool,

    /// Acquisition time limit in milliseconds
    pub time: Option<String>,

    /// Number of samples to acquire
    pub samples: Option<String>,

    /// Number of frames to acquire
    pub frames: Option<String>,

    /// Sample continuously
    pub continuous: bool,

    /// Apply device options and exit
    pub set: bool,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            version: false,
            loglevel: None,
            driver: None,
            config: None,
            input_file: None,
            input_format: None,
            output_format: DEFAULT_OUTPUT_FORMAT.to_string(),
            channels: None,
            channel_group: None,
            scan: false,
            time: None,
            samples: None,
            frames: None,
            continuous: false,
            set: false,
        }
    }
}

fn given(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl CliArgs {
    pub fn driver(&self) -> Option<&str> {
        given(&self.driver)
    }

    pub fn config(&self) -> Option<&str> {
        given(&self.config)
    }

    pub fn input_file(&self) -> Option<&PathBuf> {
        self.input_file
            .as_ref()
            .filter(|p| !p.as_os_str().is_empty())
    }

    pub fn input_format(&self) -> Option<&str> {
        given(&self.input_format)
    }

    pub fn channels(&self) -> Option<&str> {
        given(&self.channels)
    }

    pub fn channel_group(&self) -> Option<&str> {
        given(&self.channel_group)
    }

    pub fn time(&self) -> Option<&str> {
        given(&self.time)
    }

    pub fn samples(&self) -> Option<&str> {
        given(&self.samples)
    }

    pub fn frames(&self) -> Option<&str> {
        given(&self.frames)
    }

    /// Whether an acquisition or configuration action was requested for a driver
    fn driver_action(&self) -> bool {
        self.set
            || self.time().is_some()
            || self.samples().is_some()
            || self.frames().is_some()
            || self.continuous
    }
}

/// Validate that the arguments request something this program can do
///
/// **Public** - called by main.rs before any library call
///
/// Accepted combinations: `--version`, `--scan`, `--input-file`, or
/// `--driver` together with one of `--set`, `--time`, `--samples`,
/// `--frames`, `--continuous`.
///
/// # Errors
/// * `CliError::NothingToDo` - no supported combination given
pub fn validate_args(args: &CliArgs) -> Result<(), CliError> {
    if args.version
        || args.scan
        || (args.driver().is_some() && args.driver_action())
        || args.input_file().is_some()
    {
        Ok(())
    } else {
        Err(CliError::NothingToDo)
    }
}

/// Split a `key=value` pair
fn parse_pair(pair: &str) -> Result<(String, String), CliError> {
    match pair.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(CliError::InvalidPair(pair.to_string())),
    }
}

/// Parse a colon-separated list of `key=value` pairs
///
/// Empty segments are skipped. Everything after the first `=` of a pair
/// belongs to the value.
///
/// # Errors
/// * `CliError::InvalidPair` - a segment has no `=` or an empty key
pub fn parse_config_pairs(spec: &str) -> Result<Vec<(String, String)>, CliError> {
    spec.split(':')
        .filter(|segment| !segment.is_empty())
        .map(parse_pair)
        .collect()
}

/// Split a driver specification `name[:key=value...]`
///
/// # Returns
/// The driver name and exactly the pairs after the first colon
pub fn parse_driver_spec(spec: &str) -> Result<(String, Vec<(String, String)>), CliError> {
    match spec.split_once(':') {
        Some((name, options)) => Ok((name.to_string(), parse_config_pairs(options)?)),
        None => Ok((spec.to_string(), Vec::new())),
    }
}

/// Parse a comma-separated channel list into a set of names
pub fn parse_channel_list(list: &str) -> BTreeSet<String> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
