//! Line buffering shared by the `bits` and `hex` outputs.
//!
//! Samples are collected per channel. Whenever a line is full, one line per
//! channel (`name:rendered`) is emitted; partial lines are flushed on demand.

use crate::sigrok::{Channel, Logic};
use crate::utils::config::SAMPLES_PER_LINE;

/// Renders one line worth of samples of a single channel
pub type RenderFn = fn(&[bool]) -> String;

pub struct ChannelLines {
    channels: Vec<Channel>,
    pending: Vec<Vec<bool>>,
    render: RenderFn,
}

impl ChannelLines {
    pub fn new(channels: Vec<Channel>, render: RenderFn) -> Self {
        let pending = vec![Vec::with_capacity(SAMPLES_PER_LINE); channels.len()];
        Self {
            channels,
            pending,
            render,
        }
    }

    /// Add the samples of a logic packet, returning every completed block
    pub fn push(&mut self, logic: &Logic) -> String {
        let mut out = String::new();
        if self.channels.is_empty() {
            return out;
        }

        for sample in 0..logic.num_samples() {
            for (pending, channel) in self.pending.iter_mut().zip(&self.channels) {
                pending.push(logic.bit(sample, channel.index));
            }
            if self.pending[0].len() == SAMPLES_PER_LINE {
                out.push_str(&self.render_block());
            }
        }
        out
    }

    /// Emit whatever is left in the buffers
    pub fn flush(&mut self) -> String {
        if self.pending.first().map_or(true, |p| p.is_empty()) {
            return String::new();
        }
        self.render_block()
    }

    fn render_block(&mut self) -> String {
        let mut out = String::new();
        for (pending, channel) in self.pending.iter_mut().zip(&self.channels) {
            out.push_str(&channel.name);
            out.push(':');
            out.push_str(&(self.render)(pending));
            out.push('\n');
            pending.clear();
        }
        out
    }
}
