//! Human-readable listings for the version and scan modes.

use crate::sigrok::{Context, HardwareDevice};
use crate::utils::config::{LISTING_NAME_WIDTH, PROGRAM_NAME, VERSION};
use std::io::{self, Write};

/// Display version information and the supported drivers and formats
pub fn display_version(context: &dyn Context, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "{} {}", PROGRAM_NAME, VERSION)?;
    writeln!(
        out,
        "Using libsigrok {} (lib version {}).",
        context.package_version(),
        context.lib_version()
    )?;

    writeln!(out, "Supported hardware drivers:")?;
    for driver in context.drivers().values() {
        write_listing_row(out, &driver.name(), &driver.long_name())?;
    }

    writeln!(out)?;
    writeln!(out, "Supported input formats:")?;
    for format in context.input_formats().values() {
        write_listing_row(out, &format.name(), &format.description())?;
    }

    writeln!(out)?;
    writeln!(out, "Supported output formats:")?;
    for format in context.output_formats().values() {
        write_listing_row(out, &format.name(), &format.description())?;
    }

    writeln!(out)
}

fn write_listing_row(out: &mut dyn Write, name: &str, description: &str) -> io::Result<()> {
    writeln!(
        out,
        "  {:<width$} {}",
        name,
        description,
        width = LISTING_NAME_WIDTH
    )
}

/// Print a one-line description of a device
///
/// Format: `driver - vendor model version with N channels: name name ...`,
/// leaving out empty vendor/model/version parts.
pub fn print_device_info(device: &dyn HardwareDevice, out: &mut dyn Write) -> io::Result<()> {
    write!(out, "{} -", device.driver_name())?;
    for part in [device.vendor(), device.model(), device.version()] {
        if !part.is_empty() {
            write!(out, " {}", part)?;
        }
    }

    let channels = device.channels();
    write!(out, " with {} channels:", channels.len())?;
    for channel in &channels {
        write!(out, " {}", channel.name)?;
    }
    writeln!(out)
}
