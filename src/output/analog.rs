//! `analog` output: one line per sample of every enabled analog channel.

use super::enabled_channels;
use crate::sigrok::{ChannelKind, Device, Output, Packet};
use crate::utils::error::SrResult;
use std::collections::HashSet;

pub fn create(device: &dyn Device) -> SrResult<Box<dyn Output>> {
    Ok(Box::new(AnalogOutput::new(device)))
}

pub struct AnalogOutput {
    enabled: HashSet<String>,
}

impl AnalogOutput {
    pub fn new(device: &dyn Device) -> Self {
        Self {
            enabled: enabled_channels(device, ChannelKind::Analog)
                .into_iter()
                .map(|c| c.name)
                .collect(),
        }
    }
}

impl Output for AnalogOutput {
    fn receive(&mut self, packet: &Packet) -> SrResult<String> {
        let mut out = String::new();
        if let Packet::Analog(analog) = packet {
            if self.enabled.contains(&analog.channel) {
                for value in &analog.data {
                    out.push_str(&format!("{}: {:.6} {}\n", analog.channel, value, analog.unit));
                }
            }
        }
        Ok(out)
    }
}
