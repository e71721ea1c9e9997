//! Output formats turning datafeed packets into text.
//!
//! This module provides the formats registered by the built-in backend:
//! - `bits` - logic samples as rows of 0/1 per channel (default)
//! - `hex` - logic samples as rows of hex bytes per channel
//! - `analog` - one line per analog sample
//! - `csv` - one row per logic sample
//! - `wavedrom` - WaveDrom JSON, emitted at the end of the feed

pub mod analog;
pub mod bits;
pub mod csv;
pub mod hex;
pub mod lines;
pub mod wavedrom;

use crate::sigrok::{Channel, ChannelKind, Device, Output, OutputFormat};
use crate::utils::error::SrResult;
use std::rc::Rc;

type OutputFactory = fn(&dyn Device) -> SrResult<Box<dyn Output>>;

/// Output format backed by a constructor function
pub struct Format {
    name: &'static str,
    description: &'static str,
    create: OutputFactory,
}

impl OutputFormat for Format {
    fn name(&self) -> String {
        self.name.to_string()
    }

    fn description(&self) -> String {
        self.description.to_string()
    }

    fn create_output(&self, device: &dyn Device) -> SrResult<Box<dyn Output>> {
        (self.create)(device)
    }
}

/// All output formats, in no particular order
pub fn output_formats() -> Vec<Rc<dyn OutputFormat>> {
    let formats = [
        Format {
            name: "bits",
            description: "ASCII rendering of logic data using 0 and 1",
            create: bits::create,
        },
        Format {
            name: "hex",
            description: "Hexadecimal rendering of logic data",
            create: hex::create,
        },
        Format {
            name: "analog",
            description: "ASCII analog data values and units",
            create: analog::create,
        },
        Format {
            name: "csv",
            description: "Comma-separated values",
            create: self::csv::create,
        },
        Format {
            name: "wavedrom",
            description: "WaveDrom.com file format",
            create: wavedrom::create,
        },
    ];

    formats
        .into_iter()
        .map(|format| Rc::new(format) as Rc<dyn OutputFormat>)
        .collect()
}

/// Enabled channels of one kind, in device order
pub(crate) fn enabled_channels(device: &dyn Device, kind: ChannelKind) -> Vec<Channel> {
    device
        .channels()
        .into_iter()
        .filter(|c| c.kind == kind && c.enabled)
        .collect()
}
