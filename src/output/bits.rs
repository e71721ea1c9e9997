//! `bits` output: each enabled logic channel as a row of 0 and 1.
//!
//! ```text
//! D0:01010101 01010101 ...
//! D1:00110011 00110011 ...
//! ```

use super::enabled_channels;
use super::lines::ChannelLines;
use crate::sigrok::{ChannelKind, Device, Output, Packet};
use crate::utils::error::SrResult;

pub fn create(device: &dyn Device) -> SrResult<Box<dyn Output>> {
    Ok(Box::new(BitsOutput::new(device)))
}

pub struct BitsOutput {
    lines: ChannelLines,
}

impl BitsOutput {
    pub fn new(device: &dyn Device) -> Self {
        Self {
            lines: ChannelLines::new(enabled_channels(device, ChannelKind::Logic), render_bits),
        }
    }
}

/// Groups of eight samples separated by a space
fn render_bits(bits: &[bool]) -> String {
    bits.chunks(8)
        .map(|group| group.iter().map(|&b| if b { '1' } else { '0' }).collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

impl Output for BitsOutput {
    fn receive(&mut self, packet: &Packet) -> SrResult<String> {
        Ok(match packet {
            Packet::Logic(logic) => self.lines.push(logic),
            Packet::FrameEnd | Packet::End => self.lines.flush(),
            _ => String::new(),
        })
    }
}
