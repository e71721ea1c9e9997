//! Built-in implementation of the acquisition object model.
//!
//! Provides the `demo` pattern-generator driver, the `binary` and `csv`
//! input formats, and registers the output formats from [`crate::output`].

pub mod demo;
pub mod input;
pub mod session;

pub use demo::{DemoDevice, DemoDriver, Pattern};
pub use input::{BinaryInputFormat, CsvInputFormat, FileDevice};
pub use session::BuiltinSession;

use crate::output;
use crate::sigrok::{
    Channel, ChannelKind, Context, Driver, InputFormat, LogLevel, OutputFormat, Packet,
    PacketSink, Session,
};
use crate::utils::config::{LIB_VERSION, VERSION};
use crate::utils::error::{SrError, SrResult};
use log::debug;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

/// Library context of the built-in backend
pub struct BuiltinContext {
    log_level: Cell<LogLevel>,
}

impl BuiltinContext {
    pub fn new() -> Self {
        Self {
            log_level: Cell::new(LogLevel::Warn),
        }
    }
}

impl Default for BuiltinContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Context for BuiltinContext {
    fn package_version(&self) -> String {
        VERSION.to_string()
    }

    fn lib_version(&self) -> String {
        LIB_VERSION.to_string()
    }

    fn drivers(&self) -> BTreeMap<String, Rc<dyn Driver>> {
        let drivers: Vec<Rc<dyn Driver>> = vec![Rc::new(DemoDriver)];
        drivers.into_iter().map(|d| (d.name(), d)).collect()
    }

    fn input_formats(&self) -> BTreeMap<String, Rc<dyn InputFormat>> {
        let formats: Vec<Rc<dyn InputFormat>> =
            vec![Rc::new(BinaryInputFormat), Rc::new(CsvInputFormat)];
        formats.into_iter().map(|f| (f.name(), f)).collect()
    }

    fn output_formats(&self) -> BTreeMap<String, Rc<dyn OutputFormat>> {
        output::output_formats()
            .into_iter()
            .map(|f| (f.name(), f))
            .collect()
    }

    fn log_level(&self) -> LogLevel {
        self.log_level.get()
    }

    fn set_log_level(&self, level: LogLevel) {
        debug!("Setting log level to {:?}", level);
        self.log_level.set(level);
        log::set_max_level(level.to_level_filter());
    }

    fn create_session(&self) -> SrResult<Box<dyn Session>> {
        Ok(Box::new(BuiltinSession::new()))
    }
}

/// Channel list shared by the built-in devices
#[derive(Debug, Default)]
pub(crate) struct ChannelSet {
    channels: RefCell<Vec<Channel>>,
}

impl ChannelSet {
    pub(crate) fn new(channels: Vec<Channel>) -> Self {
        Self {
            channels: RefCell::new(channels),
        }
    }

    /// Logic channels named `{prefix}{n}` followed by analog channels `A{n}`
    pub(crate) fn numbered(logic_prefix: &str, logic: usize, analog: usize) -> Self {
        let logic_channels = (0..logic).map(|i| Channel {
            index: i,
            name: format!("{}{}", logic_prefix, i),
            kind: ChannelKind::Logic,
            enabled: true,
        });
        let analog_channels = (0..analog).map(|i| Channel {
            index: i,
            name: format!("A{}", i),
            kind: ChannelKind::Analog,
            enabled: true,
        });
        Self::new(logic_channels.chain(analog_channels).collect())
    }

    pub(crate) fn snapshot(&self) -> Vec<Channel> {
        self.channels.borrow().clone()
    }

    pub(crate) fn set_enabled(&self, name: &str, enabled: bool) -> SrResult<()> {
        let mut channels = self.channels.borrow_mut();
        let channel = channels
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| SrError::UnknownChannel(name.to_string()))?;
        channel.enabled = enabled;
        Ok(())
    }

    pub(crate) fn count(&self, kind: ChannelKind) -> usize {
        self.channels.borrow().iter().filter(|c| c.kind == kind).count()
    }

    pub(crate) fn any_enabled(&self, kind: ChannelKind) -> bool {
        self.channels
            .borrow()
            .iter()
            .any(|c| c.kind == kind && c.enabled)
    }
}

/// Session connection of a built-in device
#[derive(Default)]
pub(crate) struct Attachment {
    sink: RefCell<Option<Rc<dyn PacketSink>>>,
}

impl Attachment {
    pub(crate) fn attach(&self, sink: Rc<dyn PacketSink>) {
        *self.sink.borrow_mut() = Some(sink);
    }

    pub(crate) fn send(&self, packet: &Packet) -> SrResult<()> {
        // Clone the handle so callbacks never run under our borrow
        let sink = self
            .sink
            .borrow()
            .clone()
            .ok_or(SrError::SessionNotRunning)?;
        sink.send(packet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_lists_are_name_sorted() {
        let context = BuiltinContext::new();

        let drivers: Vec<String> = context.drivers().keys().cloned().collect();
        assert_eq!(drivers, vec!["demo"]);

        let inputs: Vec<String> = context.input_formats().keys().cloned().collect();
        assert_eq!(inputs, vec!["binary", "csv"]);

        let outputs: Vec<String> = context.output_formats().keys().cloned().collect();
        assert_eq!(outputs, vec!["analog", "bits", "csv", "hex", "wavedrom"]);
    }

    #[test]
    fn test_set_log_level() {
        let context = BuiltinContext::new();
        context.set_log_level(LogLevel::Debug);
        assert_eq!(context.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_channel_set_enable_unknown() {
        let set = ChannelSet::numbered("D", 2, 1);
        assert_eq!(set.count(ChannelKind::Logic), 2);
        assert_eq!(set.count(ChannelKind::Analog), 1);

        set.set_enabled("D1", false).unwrap();
        assert!(!set.snapshot()[1].enabled);
        assert!(matches!(
            set.set_enabled("Z9", true),
            Err(SrError::UnknownChannel(_))
        ));
    }

    #[test]
    fn test_unattached_send_fails() {
        let attachment = Attachment::default();
        assert!(matches!(
            attachment.send(&Packet::End),
            Err(SrError::SessionNotRunning)
        ));
    }
}
