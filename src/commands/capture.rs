//! Command dispatcher.
//!
//! Runs at most one library call sequence per invocation:
//! 1. Version report, or
//! 2. Device scan across all drivers, or
//! 3. Open an input file or a hardware device and configure it
//! 4. Apply channel selection, then either stop (`--set`) or
//! 5. Run a session, streaming packets through the selected output format

use super::models::{parse_channel_list, parse_config_pairs, parse_driver_spec, CliArgs};
use super::utils::{display_version, print_device_info};
use crate::sigrok::{
    ConfigKey, Context, DatafeedCallback, Device, HardwareDevice, InputFileDevice, InputFormat,
    LogLevel, Output, Packet, Variant,
};
use crate::utils::error::{CliError, SrError, SrResult};
use anyhow::{Context as _, Result};
use log::{debug, info, warn};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::rc::Rc;

/// Writer shared between the dispatcher and the datafeed callback
pub type SharedWriter = Rc<RefCell<dyn Write>>;

/// How a successful invocation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Version and capability listings printed
    VersionShown,
    /// Scan results printed
    Scanned { devices: usize },
    /// Device configured with `--set`, no session run
    Configured,
    /// A session ran to completion
    Captured,
}

/// Datafeed callback writing formatted packets to the output
///
/// **Public** - registered on the session by [`execute`]
pub struct CliDatafeedCallback {
    output: Box<dyn Output>,
    out: SharedWriter,
}

impl CliDatafeedCallback {
    pub fn new(output: Box<dyn Output>, out: SharedWriter) -> Self {
        Self { output, out }
    }
}

impl DatafeedCallback for CliDatafeedCallback {
    fn run(&mut self, packet: &Packet) -> SrResult<()> {
        let text = self.output.receive(packet)?;
        if !text.is_empty() {
            self.out.borrow_mut().write_all(text.as_bytes())?;
        }
        Ok(())
    }
}

/// Device selected for the rest of the invocation
enum Source {
    Hardware(Rc<dyn HardwareDevice>),
    File(Rc<dyn InputFileDevice>),
}

impl Source {
    fn device(&self) -> Rc<dyn Device> {
        match self {
            Source::Hardware(device) => device.clone().as_device(),
            Source::File(device) => device.clone().as_device(),
        }
    }
}

/// Execute the requested operation
///
/// **Public** - main entry point called from main.rs
///
/// # Arguments
/// * `args` - Parsed and validated command-line arguments
/// * `context` - Library context to operate on
/// * `out` - Destination for listings and formatted capture data
///
/// # Returns
/// How the invocation ended; every `Ok` maps to exit code 0
///
/// # Errors
/// * `CliError::UnrecognisedInputFormat` - no input format matches the file
/// * `CliError` variants for malformed option strings
/// * `SrError` variants propagated from the library
pub fn execute(args: &CliArgs, context: &dyn Context, out: SharedWriter) -> Result<Outcome> {
    if args.version {
        display_version(context, &mut *out.borrow_mut())?;
        return Ok(Outcome::VersionShown);
    }

    if let Some(level) = args.loglevel {
        let level = LogLevel::from_int(level).ok_or(CliError::InvalidLogLevel(level))?;
        context.set_log_level(level);
        debug!("Log level set to {:?}", context.log_level());
    }

    if args.scan && args.driver().is_none() {
        let devices = scan_all_drivers(context, &out)?;
        return Ok(Outcome::Scanned { devices });
    }

    let source = if let Some(path) = args.input_file() {
        Source::File(open_input_file(context, path, args.input_format())?)
    } else if let Some(spec) = args.driver() {
        let (name, devices) = scan_driver(context, spec)?;

        if args.scan {
            for device in &devices {
                print_device_info(device.as_ref(), &mut *out.borrow_mut())?;
            }
            return Ok(Outcome::Scanned {
                devices: devices.len(),
            });
        }

        let device = devices
            .into_iter()
            .next()
            .ok_or(SrError::NoDevicesFound(name))?;
        device.open().context("Failed to open device")?;
        configure_device(device.as_ref(), args)?;
        log_effective_config(device.as_ref());
        Source::Hardware(device)
    } else {
        return Err(CliError::NothingToDo.into());
    };

    let device = source.device();

    if let Some(list) = args.channels() {
        select_channels(device.as_ref(), list)?;
    }

    if let Some(group) = args.channel_group() {
        info!("Channel group '{}' selected; channel groups have no settings here", group);
    }

    if args.set {
        info!("Device configured, exiting without acquisition");
        device.close()?;
        return Ok(Outcome::Configured);
    }

    let mut session = context.create_session()?;
    session.add_device(device.clone());

    let output_format = context
        .output_formats()
        .get(&args.output_format)
        .cloned()
        .ok_or_else(|| SrError::UnknownOutputFormat(args.output_format.clone()))?;
    let output = output_format.create_output(device.as_ref())?;
    session.add_callback(Box::new(CliDatafeedCallback::new(output, out.clone())));

    match &source {
        Source::File(file) => {
            file.load().context("Failed to load input file")?;
            session.stop()?;
        }
        Source::Hardware(_) => {
            session.start().context("Failed to start acquisition")?;
            session.run().context("Acquisition failed")?;
            device.close()?;
        }
    }

    out.borrow_mut().flush()?;
    Ok(Outcome::Captured)
}

/// Scan every driver with default options and list what was found
///
/// **Private** - `--scan` without `--driver`
fn scan_all_drivers(context: &dyn Context, out: &SharedWriter) -> Result<usize> {
    let mut found = 0;
    for (name, driver) in context.drivers() {
        debug!("Scanning with driver {}", name);
        let devices = driver
            .scan(&HashMap::new())
            .with_context(|| format!("Scan failed for driver {}", name))?;
        for device in &devices {
            print_device_info(device.as_ref(), &mut *out.borrow_mut())?;
        }
        found += devices.len();
    }
    Ok(found)
}

/// Look up the driver named in `spec` and scan with its options
///
/// **Private** - internal helper for execute
///
/// # Returns
/// The driver name and the devices found
fn scan_driver(
    context: &dyn Context,
    spec: &str,
) -> Result<(String, Vec<Rc<dyn HardwareDevice>>)> {
    let (name, pairs) = parse_driver_spec(spec)?;
    let driver = context
        .drivers()
        .get(&name)
        .cloned()
        .ok_or_else(|| SrError::UnknownDriver(name.clone()))?;

    let options = parse_options(&pairs)?;
    debug!("Scanning driver {} with {} option(s)", name, options.len());

    let devices = driver
        .scan(&options)
        .with_context(|| format!("Scan failed for driver {}", name))?;
    Ok((name, devices))
}

fn parse_options(pairs: &[(String, String)]) -> Result<HashMap<ConfigKey, Variant>> {
    let mut options = HashMap::new();
    for (name, value) in pairs {
        let key = ConfigKey::from_name(name)?;
        options.insert(key, key.parse_string(value)?);
    }
    Ok(options)
}

/// Apply acquisition limits and `--config` pairs to an open device
///
/// **Private** - internal helper for execute
fn configure_device(device: &dyn HardwareDevice, args: &CliArgs) -> Result<()> {
    let limits = [
        (ConfigKey::LimitMsec, args.time()),
        (ConfigKey::LimitSamples, args.samples()),
        (ConfigKey::LimitFrames, args.frames()),
    ];
    for (key, value) in limits {
        if let Some(value) = value {
            device
                .config_set(key, key.parse_string(value)?)
                .with_context(|| format!("Failed to set {}", key))?;
        }
    }

    if let Some(config) = args.config() {
        for (name, value) in parse_config_pairs(config)? {
            let key = ConfigKey::from_name(&name)?;
            device
                .config_set(key, key.parse_string(&value)?)
                .with_context(|| format!("Failed to set {}", key))?;
        }
    }

    Ok(())
}

/// Report the acquisition settings the device ended up with
fn log_effective_config(device: &dyn HardwareDevice) {
    let keys = [
        ConfigKey::SampleRate,
        ConfigKey::LimitSamples,
        ConfigKey::LimitMsec,
        ConfigKey::LimitFrames,
    ];
    for key in keys {
        match device.config_get(key) {
            Ok(value) => debug!("{} = {}", key, value),
            Err(err) => debug!("{} unset: {}", key, err),
        }
    }
}

/// Enable exactly the listed channels and disable all others
///
/// **Public** - also used by tests
pub fn select_channels(device: &dyn Device, list: &str) -> SrResult<()> {
    let wanted = parse_channel_list(list);
    let channels = device.channels();

    for name in &wanted {
        if !channels.iter().any(|c| &c.name == name) {
            warn!("Channel '{}' not found on device", name);
        }
    }

    for channel in channels {
        device.set_channel_enabled(&channel.name, wanted.contains(&channel.name))?;
    }
    Ok(())
}

/// Pick the input format and open the file as a virtual device
///
/// **Private** - internal helper for execute
fn open_input_file(
    context: &dyn Context,
    path: &Path,
    format_name: Option<&str>,
) -> Result<Rc<dyn InputFileDevice>> {
    let formats = context.input_formats();

    let format: Rc<dyn InputFormat> = match format_name {
        Some(name) => formats
            .get(name)
            .cloned()
            .ok_or_else(|| CliError::UnknownInputFormat(name.to_string()))?,
        None => formats
            .values()
            .find(|format| format.format_match(path))
            .cloned()
            .ok_or(CliError::UnrecognisedInputFormat)?,
    };

    info!("Loading {} as {}", path.display(), format.name());
    let device = format
        .open_file(path, &HashMap::new())
        .with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sigrok::builtin::BuiltinContext;

    fn run(args: &CliArgs) -> (Result<Outcome>, String) {
        let buffer = Rc::new(RefCell::new(Vec::<u8>::new()));
        let result = execute(args, &BuiltinContext::new(), buffer.clone());
        let text = String::from_utf8(buffer.borrow().clone()).unwrap();
        (result, text)
    }

    #[test]
    fn test_unknown_driver() {
        let args = CliArgs {
            driver: Some("nope".to_string()),
            samples: Some("1".to_string()),
            ..Default::default()
        };
        let (result, _) = run(&args);
        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SrError>(),
            Some(SrError::UnknownDriver(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_invalid_log_level() {
        let args = CliArgs {
            loglevel: Some(9),
            scan: true,
            ..Default::default()
        };
        let (result, _) = run(&args);
        assert!(matches!(
            result.unwrap_err().downcast_ref::<CliError>(),
            Some(CliError::InvalidLogLevel(9))
        ));
    }

    #[test]
    fn test_unknown_output_format() {
        let args = CliArgs {
            driver: Some("demo".to_string()),
            samples: Some("1".to_string()),
            output_format: "pdf".to_string(),
            ..Default::default()
        };
        let (result, _) = run(&args);
        assert!(matches!(
            result.unwrap_err().downcast_ref::<SrError>(),
            Some(SrError::UnknownOutputFormat(_))
        ));
    }

    #[test]
    fn test_nothing_to_do() {
        let (result, text) = run(&CliArgs::default());
        assert!(result.is_err());
        assert!(text.is_empty());
    }
}
