//! sigrok-cli
//!
//! Command-line front-end to a signal-acquisition object model:
//! driver enumeration, device configuration, capture session control
//! and output formatting.
//!
//! The binary parses flags into [`commands::CliArgs`], checks them with
//! [`commands::validate_args`] and hands them to [`commands::execute`]
//! together with a [`sigrok::Context`]. The built-in backend in
//! [`sigrok::builtin`] ships a demo pattern generator, file inputs and
//! several text output formats.
//!
//! ```bash
//! sigrok-cli --version
//! sigrok-cli --driver demo:num_logic_channels=4 --samples 64
//! sigrok-cli --input-file capture.csv --output-format hex
//! ```

pub mod commands;
pub mod output;
pub mod sigrok;
pub mod utils;
