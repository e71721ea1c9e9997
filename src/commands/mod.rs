//! CLI command implementations.
//!
//! The dispatcher lives in `capture`; argument handling in `models`;
//! the version and scan listings in `utils`.

pub mod capture;
pub mod models;
pub mod utils;

// Re-export main command functions
pub use capture::{execute, select_channels, CliDatafeedCallback, Outcome, SharedWriter};
pub use models::{
    parse_channel_list, parse_config_pairs, parse_driver_spec, validate_args, CliArgs,
};
pub use utils::{display_version, print_device_info};
