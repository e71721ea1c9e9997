//! Signal-acquisition library object model.
//!
//! The CLI only ever talks to the traits in this module:
//! - [`Context`] - entry point, lists drivers and formats, creates sessions
//! - [`Driver`] / [`HardwareDevice`] - scanning, opening and configuring hardware
//! - [`InputFormat`] / [`InputFileDevice`] - file-backed devices
//! - [`Session`] / [`DatafeedCallback`] - running an acquisition
//! - [`OutputFormat`] / [`Output`] - turning packets into text
//!
//! Handles are reference counted and use interior mutability; the whole
//! model is single-threaded. [`builtin`] provides the implementation
//! shipped with the CLI.

pub mod builtin;
pub mod config;
pub mod packet;

pub use config::{ConfigKey, DataType, LogLevel, Variant};
pub use packet::{Analog, Logic, Packet};

use crate::utils::error::SrResult;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::rc::Rc;

/// Kind of signal carried by a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Logic,
    Analog,
}

/// Snapshot of one channel of a device
///
/// For logic channels `index` is the bit position within a logic sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub index: usize,
    pub name: String,
    pub kind: ChannelKind,
    pub enabled: bool,
}

/// Receiver of the packets a device produces once attached to a session
pub trait PacketSink {
    fn send(&self, packet: &Packet) -> SrResult<()>;
}

/// Single-method interface invoked for every packet of a session
pub trait DatafeedCallback {
    fn run(&mut self, packet: &Packet) -> SrResult<()>;
}

/// Any data source exposing channels
pub trait Device {
    fn channels(&self) -> Vec<Channel>;

    /// Enable or disable a channel by name
    fn set_channel_enabled(&self, name: &str, enabled: bool) -> SrResult<()>;

    /// Route this device's packets into a session
    fn attach(&self, sink: Rc<dyn PacketSink>);

    /// Begin an acquisition (sends the header packet)
    fn start(&self) -> SrResult<()> {
        Ok(())
    }

    /// Deliver the next chunk of an acquisition
    ///
    /// Returns false once the acquisition is complete.
    fn poll(&self) -> SrResult<bool> {
        Ok(false)
    }

    fn close(&self) -> SrResult<()>;
}

/// A device found by scanning a hardware driver
pub trait HardwareDevice: Device {
    fn driver_name(&self) -> String;
    fn vendor(&self) -> String;
    fn model(&self) -> String;
    fn version(&self) -> String;

    fn open(&self) -> SrResult<()>;
    fn config_get(&self, key: ConfigKey) -> SrResult<Variant>;
    fn config_set(&self, key: ConfigKey, value: Variant) -> SrResult<()>;

    fn as_device(self: Rc<Self>) -> Rc<dyn Device>;
}

/// A virtual device backed by an input file
pub trait InputFileDevice: Device {
    /// Read the whole file and send its contents as packets
    fn load(&self) -> SrResult<()>;

    fn as_device(self: Rc<Self>) -> Rc<dyn Device>;
}

pub trait Driver {
    fn name(&self) -> String;
    fn long_name(&self) -> String;
    fn scan(&self, options: &HashMap<ConfigKey, Variant>) -> SrResult<Vec<Rc<dyn HardwareDevice>>>;
}

pub trait InputFormat {
    fn name(&self) -> String;
    fn description(&self) -> String;

    /// Whether the file looks like data in this format
    fn format_match(&self, path: &Path) -> bool;

    fn open_file(
        &self,
        path: &Path,
        options: &HashMap<String, String>,
    ) -> SrResult<Rc<dyn InputFileDevice>>;
}

pub trait OutputFormat {
    fn name(&self) -> String;
    fn description(&self) -> String;
    fn create_output(&self, device: &dyn Device) -> SrResult<Box<dyn Output>>;
}

/// Stateful formatter bound to one device
pub trait Output {
    /// Format one packet; an empty string means nothing to print yet
    fn receive(&mut self, packet: &Packet) -> SrResult<String>;
}

pub trait Session {
    fn add_device(&mut self, device: Rc<dyn Device>);
    fn add_callback(&mut self, callback: Box<dyn DatafeedCallback>);
    fn start(&mut self) -> SrResult<()>;

    /// Run the event loop until every device has finished
    fn run(&mut self) -> SrResult<()>;
    fn stop(&mut self) -> SrResult<()>;
}

pub trait Context {
    fn package_version(&self) -> String;
    fn lib_version(&self) -> String;

    fn drivers(&self) -> BTreeMap<String, Rc<dyn Driver>>;
    fn input_formats(&self) -> BTreeMap<String, Rc<dyn InputFormat>>;
    fn output_formats(&self) -> BTreeMap<String, Rc<dyn OutputFormat>>;

    fn log_level(&self) -> LogLevel;
    fn set_log_level(&self, level: LogLevel);

    fn create_session(&self) -> SrResult<Box<dyn Session>>;
}
