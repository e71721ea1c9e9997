//! Datafeed packets delivered to session callbacks.

use chrono::{DateTime, Local};

/// One unit of data delivered during a session
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// First packet of every acquisition
    Header {
        feed_version: u32,
        start_time: DateTime<Local>,
    },
    Logic(Logic),
    Analog(Analog),
    FrameBegin,
    FrameEnd,
    /// Last packet of every acquisition
    End,
}

/// Packed logic samples
///
/// Each sample occupies `unit_size` bytes. Bit `n` of a sample (counting
/// LSB-first across the bytes) is the state of the logic channel with
/// index `n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Logic {
    pub unit_size: usize,
    pub data: Vec<u8>,
}

impl Logic {
    pub fn new(unit_size: usize, data: Vec<u8>) -> Self {
        Self { unit_size, data }
    }

    pub fn num_samples(&self) -> usize {
        if self.unit_size == 0 {
            0
        } else {
            self.data.len() / self.unit_size
        }
    }

    /// State of logic channel `bit` in sample `sample`
    pub fn bit(&self, sample: usize, bit: usize) -> bool {
        let offset = sample * self.unit_size + bit / 8;
        self.data
            .get(offset)
            .map(|byte| byte & (1 << (bit % 8)) != 0)
            .unwrap_or(false)
    }
}

/// Analog samples of a single channel
#[derive(Debug, Clone, PartialEq)]
pub struct Analog {
    pub channel: String,
    pub unit: &'static str,
    pub data: Vec<f32>,
}
