//! `hex` output: each enabled logic channel as a row of hex bytes.
//!
//! Every eight samples form one byte, first sample in the most significant
//! bit.

use super::enabled_channels;
use super::lines::ChannelLines;
use crate::sigrok::{ChannelKind, Device, Output, Packet};
use crate::utils::error::SrResult;

pub fn create(device: &dyn Device) -> SrResult<Box<dyn Output>> {
    Ok(Box::new(HexOutput::new(device)))
}

pub struct HexOutput {
    lines: ChannelLines,
}

impl HexOutput {
    pub fn new(device: &dyn Device) -> Self {
        Self {
            lines: ChannelLines::new(enabled_channels(device, ChannelKind::Logic), render_hex),
        }
    }
}

fn render_hex(bits: &[bool]) -> String {
    bits.chunks(8)
        .map(|group| {
            let byte = group
                .iter()
                .enumerate()
                .filter(|(_, b)| **b)
                .fold(0u8, |acc, (i, _)| acc | (0x80 >> i));
            format!("{:02x}", byte)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

impl Output for HexOutput {
    fn receive(&mut self, packet: &Packet) -> SrResult<String> {
        Ok(match packet {
            Packet::Logic(logic) => self.lines.push(logic),
            Packet::FrameEnd | Packet::End => self.lines.flush(),
            _ => String::new(),
        })
    }
}
