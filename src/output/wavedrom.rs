//! `wavedrom` output: a WaveDrom JSON document of the logic channels.
//!
//! Waves are accumulated for the whole feed and serialized on the end
//! packet. A repeated level is written as `.`. An acquisition without a
//! limit never sends that packet, so nothing is printed and the waves keep
//! growing until the run is interrupted.

use super::enabled_channels;
use crate::sigrok::{Channel, ChannelKind, Device, Output, Packet};
use crate::utils::error::SrResult;
use serde::Serialize;

pub fn create(device: &dyn Device) -> SrResult<Box<dyn Output>> {
    Ok(Box::new(WavedromOutput::new(device)))
}

#[derive(Debug, Serialize)]
struct WaveDrom<'a> {
    signal: Vec<Signal<'a>>,
}

#[derive(Debug, Serialize)]
struct Signal<'a> {
    name: &'a str,
    wave: &'a str,
}

pub struct WavedromOutput {
    channels: Vec<Channel>,
    waves: Vec<String>,
    last: Vec<Option<bool>>,
}

impl WavedromOutput {
    pub fn new(device: &dyn Device) -> Self {
        let channels = enabled_channels(device, ChannelKind::Logic);
        let count = channels.len();
        Self {
            channels,
            waves: vec![String::new(); count],
            last: vec![None; count],
        }
    }

    fn document(&self) -> SrResult<String> {
        let doc = WaveDrom {
            signal: self
                .channels
                .iter()
                .zip(&self.waves)
                .map(|(channel, wave)| Signal {
                    name: &channel.name,
                    wave,
                })
                .collect(),
        };
        Ok(serde_json::to_string(&doc)? + "\n")
    }
}

impl Output for WavedromOutput {
    fn receive(&mut self, packet: &Packet) -> SrResult<String> {
        match packet {
            Packet::Logic(logic) => {
                for sample in 0..logic.num_samples() {
                    for (i, channel) in self.channels.iter().enumerate() {
                        let level = logic.bit(sample, channel.index);
                        let symbol = match self.last[i] {
                            Some(previous) if previous == level => '.',
                            _ if level => '1',
                            _ => '0',
                        };
                        self.waves[i].push(symbol);
                        self.last[i] = Some(level);
                    }
                }
                Ok(String::new())
            }
            Packet::End => self.document(),
            _ => Ok(String::new()),
        }
    }
}
