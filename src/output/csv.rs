//! `csv` output: one row per logic sample, one column per enabled channel.
//!
//! The header packet produces a comment block with the acquisition start
//! time followed by a row of channel names.

use super::enabled_channels;
use crate::sigrok::{Channel, ChannelKind, Device, Output, Packet};
use crate::utils::config::{PROGRAM_NAME, VERSION};
use crate::utils::error::SrResult;
use csv::{Terminator, WriterBuilder};

pub fn create(device: &dyn Device) -> SrResult<Box<dyn Output>> {
    Ok(Box::new(CsvOutput::new(device)))
}

pub struct CsvOutput {
    channels: Vec<Channel>,
}

impl CsvOutput {
    pub fn new(device: &dyn Device) -> Self {
        Self {
            channels: enabled_channels(device, ChannelKind::Logic),
        }
    }
}

impl CsvOutput {
    /// Encode rows with a fresh writer, one `\n`-terminated line each
    fn write_rows<I, R>(rows: I) -> SrResult<String>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator,
        R::Item: AsRef<[u8]>,
    {
        let mut writer = WriterBuilder::new()
            .terminator(Terminator::Any(b'\n'))
            .from_writer(Vec::new());
        for row in rows {
            writer.write_record(row)?;
        }
        let bytes = writer.into_inner().map_err(|err| err.into_error())?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl Output for CsvOutput {
    fn receive(&mut self, packet: &Packet) -> SrResult<String> {
        match packet {
            Packet::Header { start_time, .. } => {
                let mut out = format!("; CSV generated by {} {}\n", PROGRAM_NAME, VERSION);
                out.push_str(&format!(
                    "; from {} channels on {}\n",
                    self.channels.len(),
                    start_time.format("%a %b %e %H:%M:%S %Y")
                ));
                if !self.channels.is_empty() {
                    let names = self.channels.iter().map(|c| c.name.as_str());
                    out.push_str(&Self::write_rows([names])?);
                }
                Ok(out)
            }
            Packet::Logic(logic) if !self.channels.is_empty() => {
                let channels = &self.channels;
                let rows = (0..logic.num_samples()).map(move |sample| {
                    channels
                        .iter()
                        .map(move |c| if logic.bit(sample, c.index) { "1" } else { "0" })
                });
                Self::write_rows(rows)
            }
            _ => Ok(String::new()),
        }
    }
}
