//! Demo driver: a deterministic pattern generator.
//!
//! Scanning always finds exactly one device. Its logic channels follow a
//! selectable [`Pattern`]; its analog channels carry a square wave. An
//! acquisition is bounded by `limit_samples`, `limit_msec` and/or
//! `limit_frames`; with no limit it runs until a callback fails.

use super::{Attachment, ChannelSet};
use crate::sigrok::{
    Analog, Channel, ChannelKind, ConfigKey, Device, Driver, HardwareDevice, Logic, Packet,
    PacketSink, Variant,
};
use crate::utils::config::{
    CHUNK_SAMPLES, DEMO_ANALOG_PERIOD, DEMO_DEFAULT_AMPLITUDE, DEMO_DEFAULT_ANALOG_CHANNELS,
    DEMO_DEFAULT_LOGIC_CHANNELS, DEMO_DEFAULT_SAMPLERATE, DEMO_FRAME_SAMPLES,
    DEMO_MAX_ANALOG_CHANNELS, DEMO_MAX_LOGIC_CHANNELS, FEED_VERSION,
};
use crate::utils::error::{SrError, SrResult};
use chrono::Local;
use log::{debug, info};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

pub const DRIVER_NAME: &str = "demo";

/// Logic pattern generated by the demo device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// Sample n carries the value n
    Incremental,
    /// A single high bit moving across the channels
    WalkingOne,
    AllLow,
    AllHigh,
}

impl Pattern {
    pub fn from_name(name: &str) -> Option<Pattern> {
        match name {
            "incremental" => Some(Pattern::Incremental),
            "walking-one" => Some(Pattern::WalkingOne),
            "all-low" => Some(Pattern::AllLow),
            "all-high" => Some(Pattern::AllHigh),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Pattern::Incremental => "incremental",
            Pattern::WalkingOne => "walking-one",
            Pattern::AllLow => "all-low",
            Pattern::AllHigh => "all-high",
        }
    }

    /// Channel states for one sample, channel n in bit n
    fn value(self, sample: u64, num_channels: usize) -> u64 {
        let mask = if num_channels >= 64 {
            u64::MAX
        } else {
            (1u64 << num_channels) - 1
        };
        let raw = match self {
            Pattern::Incremental => sample,
            Pattern::WalkingOne if num_channels > 0 => 1u64 << (sample % num_channels as u64),
            Pattern::WalkingOne => 0,
            Pattern::AllLow => 0,
            Pattern::AllHigh => u64::MAX,
        };
        raw & mask
    }
}

pub struct DemoDriver;

impl Driver for DemoDriver {
    fn name(&self) -> String {
        DRIVER_NAME.to_string()
    }

    fn long_name(&self) -> String {
        "Demo driver and pattern generator".to_string()
    }

    fn scan(
        &self,
        options: &HashMap<ConfigKey, Variant>,
    ) -> SrResult<Vec<Rc<dyn HardwareDevice>>> {
        let logic = channel_count(
            options,
            ConfigKey::NumLogicChannels,
            DEMO_DEFAULT_LOGIC_CHANNELS,
            DEMO_MAX_LOGIC_CHANNELS,
        )?;
        let analog = channel_count(
            options,
            ConfigKey::NumAnalogChannels,
            DEMO_DEFAULT_ANALOG_CHANNELS,
            DEMO_MAX_ANALOG_CHANNELS,
        )?;

        for key in options.keys() {
            if !matches!(key, ConfigKey::NumLogicChannels | ConfigKey::NumAnalogChannels) {
                debug!("demo: ignoring scan option {}", key);
            }
        }

        debug!("demo: found device with {} logic and {} analog channels", logic, analog);
        let device: Rc<dyn HardwareDevice> = Rc::new(DemoDevice::new(logic, analog));
        Ok(vec![device])
    }
}

/// Read a channel-count scan option, falling back to `default`
fn channel_count(
    options: &HashMap<ConfigKey, Variant>,
    key: ConfigKey,
    default: u64,
    max: u64,
) -> SrResult<usize> {
    let count = match options.get(&key) {
        None => default,
        Some(value) => value.as_u64().ok_or_else(|| SrError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected an unsigned number".to_string(),
        })?,
    };

    if count > max {
        return Err(SrError::InvalidValue {
            key: key.to_string(),
            value: count.to_string(),
            reason: format!("at most {} channels are supported", max),
        });
    }

    Ok(count as usize)
}

#[derive(Debug, Clone)]
struct DemoConfig {
    samplerate: u64,
    limit_samples: Option<u64>,
    limit_msec: Option<u64>,
    limit_frames: Option<u64>,
    continuous: bool,
    pattern: Pattern,
    amplitude: f64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            samplerate: DEMO_DEFAULT_SAMPLERATE,
            limit_samples: None,
            limit_msec: None,
            limit_frames: None,
            continuous: false,
            pattern: Pattern::Incremental,
            amplitude: DEMO_DEFAULT_AMPLITUDE,
        }
    }
}

impl DemoConfig {
    /// Samples to acquire (per frame when framed), None when unbounded
    fn sample_budget(&self) -> Option<u64> {
        self.limit_samples.or_else(|| {
            self.limit_msec
                .map(|ms| self.samplerate.saturating_mul(ms) / 1000)
        })
    }
}

/// Progress of a running acquisition
#[derive(Debug, Clone)]
struct Acquisition {
    next_sample: u64,
    /// Samples left in the current frame, or overall when unframed
    remaining: Option<u64>,
    frame_samples: u64,
    frames_left: Option<u64>,
    in_frame: bool,
    finished: bool,
}

pub struct DemoDevice {
    channels: ChannelSet,
    config: RefCell<DemoConfig>,
    is_open: Cell<bool>,
    attachment: Attachment,
    acquisition: RefCell<Option<Acquisition>>,
}

impl DemoDevice {
    pub fn new(logic_channels: usize, analog_channels: usize) -> Self {
        Self {
            channels: ChannelSet::numbered("D", logic_channels, analog_channels),
            config: RefCell::new(DemoConfig::default()),
            is_open: Cell::new(false),
            attachment: Attachment::default(),
            acquisition: RefCell::new(None),
        }
    }

    pub fn is_open(&self) -> bool {
        self.is_open.get()
    }

    fn send_chunk(&self, first_sample: u64, count: u64) -> SrResult<()> {
        if count == 0 {
            return Ok(());
        }
        let config = self.config.borrow().clone();
        let channels = self.channels.snapshot();

        let num_logic = self.channels.count(ChannelKind::Logic);
        if self.channels.any_enabled(ChannelKind::Logic) {
            let unit_size = num_logic.div_ceil(8);
            let mut data = Vec::with_capacity(unit_size * count as usize);
            for sample in first_sample..first_sample + count {
                let value = config.pattern.value(sample, num_logic);
                data.extend_from_slice(&value.to_le_bytes()[..unit_size]);
            }
            self.attachment.send(&Packet::Logic(Logic::new(unit_size, data)))?;
        }

        let analog_channels = channels
            .iter()
            .filter(|c| c.kind == ChannelKind::Analog && c.enabled);
        for channel in analog_channels {
            let data = (first_sample..first_sample + count)
                .map(|sample| square_wave(sample + channel.index as u64, config.amplitude))
                .collect();
            self.attachment.send(&Packet::Analog(Analog {
                channel: channel.name.clone(),
                unit: "V",
                data,
            }))?;
        }

        Ok(())
    }
}

fn square_wave(sample: u64, amplitude: f64) -> f32 {
    if sample % DEMO_ANALOG_PERIOD < DEMO_ANALOG_PERIOD / 2 {
        amplitude as f32
    } else {
        -amplitude as f32
    }
}

impl Device for DemoDevice {
    fn channels(&self) -> Vec<Channel> {
        self.channels.snapshot()
    }

    fn set_channel_enabled(&self, name: &str, enabled: bool) -> SrResult<()> {
        self.channels.set_enabled(name, enabled)
    }

    fn attach(&self, sink: Rc<dyn PacketSink>) {
        self.attachment.attach(sink);
    }

    fn start(&self) -> SrResult<()> {
        if !self.is_open() {
            return Err(SrError::DeviceNotOpen);
        }

        let config = self.config.borrow().clone();
        let budget = config.sample_budget();
        let acquisition = match config.limit_frames {
            Some(frames) => Acquisition {
                next_sample: 0,
                remaining: None,
                frame_samples: budget.unwrap_or(DEMO_FRAME_SAMPLES),
                frames_left: Some(frames),
                in_frame: false,
                finished: false,
            },
            None => Acquisition {
                next_sample: 0,
                remaining: budget,
                frame_samples: 0,
                frames_left: None,
                in_frame: false,
                finished: false,
            },
        };

        info!(
            "demo: starting acquisition at {} Hz, pattern {}",
            config.samplerate,
            config.pattern.name()
        );
        *self.acquisition.borrow_mut() = Some(acquisition);

        self.attachment.send(&Packet::Header {
            feed_version: FEED_VERSION,
            start_time: Local::now(),
        })
    }

    fn poll(&self) -> SrResult<bool> {
        let Some(mut acq) = self.acquisition.borrow().clone() else {
            return Ok(false);
        };
        if acq.finished {
            return Ok(false);
        }

        let more = match acq.frames_left {
            Some(0) => false,
            Some(frames) => {
                if !acq.in_frame {
                    self.attachment.send(&Packet::FrameBegin)?;
                    acq.in_frame = true;
                    acq.remaining = Some(acq.frame_samples);
                }
                let left = acq.remaining.unwrap_or(0);
                let count = left.min(CHUNK_SAMPLES);
                self.send_chunk(acq.next_sample, count)?;
                acq.next_sample += count;
                acq.remaining = Some(left - count);

                if left == count {
                    self.attachment.send(&Packet::FrameEnd)?;
                    acq.in_frame = false;
                    acq.frames_left = Some(frames - 1);
                }
                true
            }
            None => match acq.remaining {
                Some(0) => false,
                remaining => {
                    let count = remaining.unwrap_or(CHUNK_SAMPLES).min(CHUNK_SAMPLES);
                    self.send_chunk(acq.next_sample, count)?;
                    acq.next_sample += count;
                    acq.remaining = remaining.map(|left| left - count);
                    true
                }
            },
        };

        if !more {
            debug!("demo: acquisition finished after {} samples", acq.next_sample);
            acq.finished = true;
            self.attachment.send(&Packet::End)?;
        }

        *self.acquisition.borrow_mut() = Some(acq);
        Ok(more)
    }

    fn close(&self) -> SrResult<()> {
        debug!("demo: closing device");
        self.is_open.set(false);
        self.acquisition.borrow_mut().take();
        Ok(())
    }
}

impl HardwareDevice for DemoDevice {
    fn driver_name(&self) -> String {
        DRIVER_NAME.to_string()
    }

    fn vendor(&self) -> String {
        "Demo".to_string()
    }

    fn model(&self) -> String {
        "Demo device".to_string()
    }

    fn version(&self) -> String {
        String::new()
    }

    fn open(&self) -> SrResult<()> {
        debug!("demo: opening device");
        self.is_open.set(true);
        Ok(())
    }

    fn config_get(&self, key: ConfigKey) -> SrResult<Variant> {
        let config = self.config.borrow();
        let unset = || SrError::ConfigNotSupported(key.to_string());
        let value = match key {
            ConfigKey::SampleRate => Variant::UInt64(config.samplerate),
            ConfigKey::LimitSamples => Variant::UInt64(config.limit_samples.ok_or_else(unset)?),
            ConfigKey::LimitMsec => Variant::UInt64(config.limit_msec.ok_or_else(unset)?),
            ConfigKey::LimitFrames => Variant::UInt64(config.limit_frames.ok_or_else(unset)?),
            ConfigKey::Continuous => Variant::Bool(config.continuous),
            ConfigKey::PatternMode => Variant::Str(config.pattern.name().to_string()),
            ConfigKey::Amplitude => Variant::Double(config.amplitude),
            ConfigKey::NumLogicChannels => {
                Variant::UInt64(self.channels.count(ChannelKind::Logic) as u64)
            }
            ConfigKey::NumAnalogChannels => {
                Variant::UInt64(self.channels.count(ChannelKind::Analog) as u64)
            }
            ConfigKey::Conn => return Err(unset()),
        };
        Ok(value)
    }

    fn config_set(&self, key: ConfigKey, value: Variant) -> SrResult<()> {
        if !self.is_open() {
            return Err(SrError::DeviceNotOpen);
        }

        let invalid = |reason: &str| SrError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        };

        debug!("demo: setting {} = {}", key, value);
        let mut config = self.config.borrow_mut();
        match key {
            ConfigKey::SampleRate => {
                let rate = value.as_u64().ok_or_else(|| invalid("expected a number"))?;
                if rate == 0 {
                    return Err(invalid("sample rate must be non-zero"));
                }
                config.samplerate = rate;
            }
            ConfigKey::LimitSamples => {
                let limit = value.as_u64().ok_or_else(|| invalid("expected a number"))?;
                config.limit_samples = Some(limit);
            }
            ConfigKey::LimitMsec => {
                let limit = value.as_u64().ok_or_else(|| invalid("expected a number"))?;
                config.limit_msec = Some(limit);
            }
            ConfigKey::LimitFrames => {
                let limit = value.as_u64().ok_or_else(|| invalid("expected a number"))?;
                config.limit_frames = Some(limit);
            }
            ConfigKey::Continuous => {
                config.continuous = value.as_bool().ok_or_else(|| invalid("expected a boolean"))?;
            }
            ConfigKey::PatternMode => {
                config.pattern = value
                    .as_str()
                    .and_then(Pattern::from_name)
                    .ok_or_else(|| invalid("expected incremental, walking-one, all-low or all-high"))?;
            }
            ConfigKey::Amplitude => {
                config.amplitude = value.as_f64().ok_or_else(|| invalid("expected a number"))?;
            }
            ConfigKey::NumLogicChannels | ConfigKey::NumAnalogChannels | ConfigKey::Conn => {
                return Err(SrError::ConfigNotSupported(key.to_string()));
            }
        }
        Ok(())
    }

    fn as_device(self: Rc<Self>) -> Rc<dyn Device> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every packet it receives
    #[derive(Default)]
    struct Recorder {
        packets: RefCell<Vec<Packet>>,
    }

    impl PacketSink for Recorder {
        fn send(&self, packet: &Packet) -> SrResult<()> {
            self.packets.borrow_mut().push(packet.clone());
            Ok(())
        }
    }

    fn run_to_end(device: &DemoDevice) -> Vec<Packet> {
        let recorder = Rc::new(Recorder::default());
        device.attach(recorder.clone());
        device.start().unwrap();
        while device.poll().unwrap() {}
        let packets = recorder.packets.borrow().clone();
        packets
    }

    fn logic_samples(packets: &[Packet]) -> usize {
        packets
            .iter()
            .map(|p| match p {
                Packet::Logic(logic) => logic.num_samples(),
                _ => 0,
            })
            .sum()
    }

    #[test]
    fn test_scan_defaults() {
        let devices = DemoDriver.scan(&HashMap::new()).unwrap();
        assert_eq!(devices.len(), 1);

        let names: Vec<String> = devices[0].channels().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["D0", "D1", "D2", "D3", "D4", "D5", "D6", "D7", "A0"]);
    }

    #[test]
    fn test_scan_options_set_channel_counts() {
        let mut options = HashMap::new();
        options.insert(ConfigKey::NumLogicChannels, Variant::UInt64(2));
        options.insert(ConfigKey::NumAnalogChannels, Variant::UInt64(0));

        let devices = DemoDriver.scan(&options).unwrap();
        let names: Vec<String> = devices[0].channels().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["D0", "D1"]);
    }

    #[test]
    fn test_scan_rejects_too_many_channels() {
        let mut options = HashMap::new();
        options.insert(ConfigKey::NumLogicChannels, Variant::UInt64(65));
        assert!(DemoDriver.scan(&options).is_err());
    }

    #[test]
    fn test_config_requires_open_device() {
        let device = DemoDevice::new(8, 0);
        assert!(matches!(
            device.config_set(ConfigKey::LimitSamples, Variant::UInt64(10)),
            Err(SrError::DeviceNotOpen)
        ));

        device.open().unwrap();
        device.config_set(ConfigKey::LimitSamples, Variant::UInt64(10)).unwrap();
        assert_eq!(device.config_get(ConfigKey::LimitSamples).unwrap(), Variant::UInt64(10));
    }

    #[test]
    fn test_config_rejects_unknown_pattern() {
        let device = DemoDevice::new(8, 0);
        device.open().unwrap();
        assert!(device
            .config_set(ConfigKey::PatternMode, Variant::Str("sine".to_string()))
            .is_err());
        assert!(matches!(
            device.config_set(ConfigKey::Conn, Variant::Str("usb".to_string())),
            Err(SrError::ConfigNotSupported(_))
        ));
    }

    #[test]
    fn test_start_requires_open_device() {
        let device = DemoDevice::new(8, 0);
        device.attach(Rc::new(Recorder::default()));
        assert!(matches!(device.start(), Err(SrError::DeviceNotOpen)));
    }

    #[test]
    fn test_limit_samples_acquisition() {
        let device = DemoDevice::new(8, 0);
        device.open().unwrap();
        device.config_set(ConfigKey::LimitSamples, Variant::UInt64(5000)).unwrap();

        let packets = run_to_end(&device);
        assert!(matches!(packets.first(), Some(Packet::Header { .. })));
        assert_eq!(packets.last(), Some(&Packet::End));
        assert_eq!(logic_samples(&packets), 5000);
        // 4096 + 904
        assert_eq!(packets.len(), 4);
    }

    #[test]
    fn test_limit_msec_uses_samplerate() {
        let device = DemoDevice::new(8, 0);
        device.open().unwrap();
        device.config_set(ConfigKey::SampleRate, Variant::UInt64(10_000)).unwrap();
        device.config_set(ConfigKey::LimitMsec, Variant::UInt64(50)).unwrap();

        assert_eq!(logic_samples(&run_to_end(&device)), 500);
    }

    #[test]
    fn test_frames_are_wrapped() {
        let device = DemoDevice::new(8, 0);
        device.open().unwrap();
        device.config_set(ConfigKey::LimitFrames, Variant::UInt64(2)).unwrap();
        device.config_set(ConfigKey::LimitSamples, Variant::UInt64(3)).unwrap();

        let packets = run_to_end(&device);
        let kinds: Vec<&str> = packets
            .iter()
            .map(|p| match p {
                Packet::Header { .. } => "header",
                Packet::Logic(_) => "logic",
                Packet::Analog(_) => "analog",
                Packet::FrameBegin => "begin",
                Packet::FrameEnd => "end-frame",
                Packet::End => "end",
            })
            .collect();
        assert_eq!(
            kinds,
            vec!["header", "begin", "logic", "end-frame", "begin", "logic", "end-frame", "end"]
        );
    }

    #[test]
    fn test_incremental_pattern_and_analog() {
        let device = DemoDevice::new(4, 1);
        device.open().unwrap();
        device.config_set(ConfigKey::LimitSamples, Variant::UInt64(18)).unwrap();

        let packets = run_to_end(&device);
        let Some(Packet::Logic(logic)) = packets.get(1) else {
            panic!("expected logic packet, got {:?}", packets.get(1));
        };
        assert_eq!(logic.unit_size, 1);
        // 4 channels: values wrap at 16
        assert_eq!(logic.data[3], 3);
        assert_eq!(logic.data[17], 1);

        let Some(Packet::Analog(analog)) = packets.get(2) else {
            panic!("expected analog packet, got {:?}", packets.get(2));
        };
        assert_eq!(analog.channel, "A0");
        assert_eq!(analog.data[0], 10.0);
        assert_eq!(analog.data[10], -10.0);
    }

    #[test]
    fn test_disabled_logic_channels_skip_logic_packets() {
        let device = DemoDevice::new(2, 1);
        device.open().unwrap();
        device.set_channel_enabled("D0", false).unwrap();
        device.set_channel_enabled("D1", false).unwrap();
        device.config_set(ConfigKey::LimitSamples, Variant::UInt64(4)).unwrap();

        let packets = run_to_end(&device);
        assert_eq!(logic_samples(&packets), 0);
        assert!(packets.iter().any(|p| matches!(p, Packet::Analog(_))));
    }

    #[test]
    fn test_pattern_values() {
        assert_eq!(Pattern::WalkingOne.value(0, 4), 0b0001);
        assert_eq!(Pattern::WalkingOne.value(5, 4), 0b0010);
        assert_eq!(Pattern::AllHigh.value(7, 3), 0b111);
        assert_eq!(Pattern::AllHigh.value(7, 64), u64::MAX);
        assert_eq!(Pattern::AllLow.value(7, 8), 0);
        assert_eq!(Pattern::Incremental.value(0x1ff, 8), 0xff);
    }
}
