//! Configuration keys, typed values and log levels.
//!
//! Every key has a string identifier (as used on the command line, e.g.
//! `limit_samples`) and a data type that decides how a string value is
//! parsed into a [`Variant`].

use crate::utils::error::{SrError, SrResult};
use std::fmt;

/// Data type carried by a configuration key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    UInt64,
    Bool,
    Double,
    Str,
}

/// Typed configuration value
#[derive(Debug, Clone, PartialEq)]
pub enum Variant {
    UInt64(u64),
    Bool(bool),
    Double(f64),
    Str(String),
}

impl Variant {
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Variant::UInt64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Variant::Double(v) => Some(*v),
            Variant::UInt64(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Variant::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Variant::Str(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::UInt64(v) => write!(f, "{}", v),
            Variant::Bool(v) => write!(f, "{}", v),
            Variant::Double(v) => write!(f, "{}", v),
            Variant::Str(v) => write!(f, "{}", v),
        }
    }
}

/// Configuration keys understood by drivers and devices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConfigKey {
    SampleRate,
    LimitSamples,
    LimitMsec,
    LimitFrames,
    Continuous,
    PatternMode,
    Amplitude,
    NumLogicChannels,
    NumAnalogChannels,
    Conn,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 10] = [
        ConfigKey::SampleRate,
        ConfigKey::LimitSamples,
        ConfigKey::LimitMsec,
        ConfigKey::LimitFrames,
        ConfigKey::Continuous,
        ConfigKey::PatternMode,
        ConfigKey::Amplitude,
        ConfigKey::NumLogicChannels,
        ConfigKey::NumAnalogChannels,
        ConfigKey::Conn,
    ];

    /// String identifier of the key
    pub fn identifier(self) -> &'static str {
        match self {
            ConfigKey::SampleRate => "samplerate",
            ConfigKey::LimitSamples => "limit_samples",
            ConfigKey::LimitMsec => "limit_msec",
            ConfigKey::LimitFrames => "limit_frames",
            ConfigKey::Continuous => "continuous",
            ConfigKey::PatternMode => "pattern",
            ConfigKey::Amplitude => "amplitude",
            ConfigKey::NumLogicChannels => "num_logic_channels",
            ConfigKey::NumAnalogChannels => "num_analog_channels",
            ConfigKey::Conn => "conn",
        }
    }

    pub fn data_type(self) -> DataType {
        match self {
            ConfigKey::SampleRate
            | ConfigKey::LimitSamples
            | ConfigKey::LimitMsec
            | ConfigKey::LimitFrames
            | ConfigKey::NumLogicChannels
            | ConfigKey::NumAnalogChannels => DataType::UInt64,
            ConfigKey::Continuous => DataType::Bool,
            ConfigKey::Amplitude => DataType::Double,
            ConfigKey::PatternMode | ConfigKey::Conn => DataType::Str,
        }
    }

    /// Look up a key by its string identifier
    ///
    /// # Errors
    /// * `SrError::UnknownConfigKey` - no key has this identifier
    pub fn from_name(name: &str) -> SrResult<ConfigKey> {
        Self::ALL
            .iter()
            .copied()
            .find(|key| key.identifier() == name)
            .ok_or_else(|| SrError::UnknownConfigKey(name.to_string()))
    }

    /// Parse a string into a value of this key's data type
    ///
    /// # Arguments
    /// * `value` - Value as typed on the command line (e.g. "1M", "yes", "0.5")
    ///
    /// # Errors
    /// * `SrError::InvalidValue` - the string is not a valid value for this key
    pub fn parse_string(self, value: &str) -> SrResult<Variant> {
        let invalid = |reason: &str| SrError::InvalidValue {
            key: self.identifier().to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        };

        match self.data_type() {
            DataType::UInt64 => parse_size_string(value)
                .map(Variant::UInt64)
                .ok_or_else(|| invalid("expected an unsigned number with optional k/M/G/T suffix")),
            DataType::Bool => parse_bool_string(value)
                .map(Variant::Bool)
                .ok_or_else(|| invalid("expected a boolean")),
            DataType::Double => value
                .trim()
                .parse::<f64>()
                .map(Variant::Double)
                .map_err(|_| invalid("expected a number")),
            DataType::Str => Ok(Variant::Str(value.to_string())),
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

/// Parse a size string such as "200", "1.5k", "4M" or "1 MHz"
///
/// Multipliers are powers of 1000. A trailing "Hz" is accepted.
/// Returns None on any malformed input or overflow.
pub fn parse_size_string(input: &str) -> Option<u64> {
    let s = input.trim();
    let s = s.strip_suffix("Hz").unwrap_or(s).trim_end();

    let digits_end = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    let (number, suffix) = s.split_at(digits_end);
    if number.is_empty() || number == "." {
        return None;
    }

    let multiplier: u64 = match suffix.trim() {
        "" => 1,
        "k" | "K" => 1_000,
        "M" => 1_000_000,
        "G" => 1_000_000_000,
        "T" => 1_000_000_000_000,
        _ => return None,
    };

    match number.split_once('.') {
        None => number.parse::<u64>().ok()?.checked_mul(multiplier),
        Some((whole, frac)) => {
            if frac.contains('.') {
                return None;
            }
            let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
            let mut value = whole.checked_mul(multiplier)?;
            // Fractional digits beyond the multiplier's precision are dropped
            let mut scale = multiplier;
            for digit in frac.chars() {
                scale /= 10;
                if scale == 0 {
                    break;
                }
                value = value.checked_add(u64::from(digit.to_digit(10)?) * scale)?;
            }
            Some(value)
        }
    }
}

/// Parse a boolean string; an empty string counts as true
pub fn parse_bool_string(input: &str) -> Option<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "" | "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Library log levels, numbered 0 (silent) to 5 (spew)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    None,
    Error,
    Warn,
    Info,
    Debug,
    Spew,
}

impl LogLevel {
    pub fn from_int(level: i32) -> Option<LogLevel> {
        match level {
            0 => Some(LogLevel::None),
            1 => Some(LogLevel::Error),
            2 => Some(LogLevel::Warn),
            3 => Some(LogLevel::Info),
            4 => Some(LogLevel::Debug),
            5 => Some(LogLevel::Spew),
            _ => None,
        }
    }

    /// Equivalent filter for the `log` facade
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::None => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Spew => log::LevelFilter::Trace,
        }
    }
}
