//! File input formats and the virtual device they produce.
//!
//! - `binary`: every byte of the file is one logic sample of channels D0-D7.
//!   Never detected automatically.
//! - `csv`: one row per sample, one 0/1 column per logic channel. Detected
//!   by the `.csv` extension.

use super::{Attachment, ChannelSet};
use crate::sigrok::{
    Channel, ChannelKind, Device, InputFileDevice, InputFormat, Logic, Packet, PacketSink,
};
use crate::utils::config::{CHUNK_SAMPLES, FEED_VERSION};
use crate::utils::error::{SrError, SrResult};
use chrono::Local;
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Maximum number of columns accepted by the csv input
const CSV_MAX_CHANNELS: usize = 64;

pub struct BinaryInputFormat;

impl InputFormat for BinaryInputFormat {
    fn name(&self) -> String {
        "binary".to_string()
    }

    fn description(&self) -> String {
        "Raw binary logic data".to_string()
    }

    fn format_match(&self, _path: &Path) -> bool {
        false
    }

    fn open_file(
        &self,
        path: &Path,
        options: &HashMap<String, String>,
    ) -> SrResult<Rc<dyn InputFileDevice>> {
        warn_unused_options(&self.name(), options);
        let data = fs::read(path)?;
        debug!("binary: read {} bytes from {}", data.len(), path.display());

        let device = FileDevice::new(
            path,
            ChannelSet::numbered("D", 8, 0),
            Logic::new(1, data),
        );
        Ok(Rc::new(device))
    }
}

pub struct CsvInputFormat;

impl InputFormat for CsvInputFormat {
    fn name(&self) -> String {
        "csv".to_string()
    }

    fn description(&self) -> String {
        "Comma-separated values".to_string()
    }

    fn format_match(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false)
    }

    fn open_file(
        &self,
        path: &Path,
        options: &HashMap<String, String>,
    ) -> SrResult<Rc<dyn InputFileDevice>> {
        warn_unused_options(&self.name(), options);
        let text = fs::read_to_string(path)?;
        let (names, logic) = parse_csv(&text)?;
        debug!(
            "csv: {} channels, {} samples from {}",
            names.len(),
            logic.num_samples(),
            path.display()
        );

        let channels = names
            .into_iter()
            .enumerate()
            .map(|(index, name)| Channel {
                index,
                name,
                kind: ChannelKind::Logic,
                enabled: true,
            })
            .collect();

        let device = FileDevice::new(path, ChannelSet::new(channels), logic);
        Ok(Rc::new(device))
    }
}

fn warn_unused_options(format: &str, options: &HashMap<String, String>) {
    for key in options.keys() {
        warn!("{}: ignoring unknown input option '{}'", format, key);
    }
}

/// Parse csv text into channel names and packed logic samples
///
/// Lines starting with `;` or `#` are comments. The first row may hold
/// channel names, which must be unique; without one the channels are
/// called CH1..CHn.
pub fn parse_csv(text: &str) -> SrResult<(Vec<String>, Logic)> {
    // Blank out `;` comments so record positions keep the file's line numbers
    let filtered: String = text
        .lines()
        .map(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with(';') {
                "\n".to_string()
            } else {
                format!("{}\n", line)
            }
        })
        .collect();

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .comment(Some(b'#'))
        .from_reader(filtered.as_bytes());

    let mut names: Option<Vec<String>> = None;
    let mut unit_size = 0;
    let mut data = Vec::new();

    for record in reader.records() {
        let record = record?;
        let line_no = record.position().map(|pos| pos.line()).unwrap_or(0);
        let numeric = record.iter().all(|f| f == "0" || f == "1");

        let columns = match &names {
            Some(names) => names.len(),
            None => {
                if record.len() > CSV_MAX_CHANNELS {
                    return Err(SrError::InvalidInput(format!(
                        "line {}: at most {} columns are supported",
                        line_no, CSV_MAX_CHANNELS
                    )));
                }
                unit_size = record.len().div_ceil(8);
                if numeric {
                    names = Some((1..=record.len()).map(|i| format!("CH{}", i)).collect());
                    record.len()
                } else {
                    names = Some(header_names(&record, line_no)?);
                    continue;
                }
            }
        };

        if record.len() != columns {
            return Err(SrError::InvalidInput(format!(
                "line {}: expected {} columns, found {}",
                line_no,
                columns,
                record.len()
            )));
        }
        if !numeric {
            return Err(SrError::InvalidInput(format!(
                "line {}: values must be 0 or 1",
                line_no
            )));
        }

        let mut sample = vec![0u8; unit_size];
        for (bit, field) in record.iter().enumerate() {
            if field == "1" {
                sample[bit / 8] |= 1 << (bit % 8);
            }
        }
        data.extend_from_slice(&sample);
    }

    let names = names.ok_or_else(|| SrError::InvalidInput("no data rows".to_string()))?;
    Ok((names, Logic::new(unit_size, data)))
}

/// Channel names from a header row; channels are selected by name
fn header_names(record: &StringRecord, line_no: u64) -> SrResult<Vec<String>> {
    let mut seen = HashSet::new();
    for name in record.iter() {
        if !seen.insert(name) {
            return Err(SrError::InvalidInput(format!(
                "line {}: duplicate channel name '{}'",
                line_no, name
            )));
        }
    }
    Ok(record.iter().map(str::to_string).collect())
}

/// Virtual device holding the decoded contents of an input file
pub struct FileDevice {
    path: PathBuf,
    channels: ChannelSet,
    logic: Logic,
    attachment: Attachment,
}

impl FileDevice {
    fn new(path: &Path, channels: ChannelSet, logic: Logic) -> Self {
        Self {
            path: path.to_path_buf(),
            channels,
            logic,
            attachment: Attachment::default(),
        }
    }
}

impl Device for FileDevice {
    fn channels(&self) -> Vec<Channel> {
        self.channels.snapshot()
    }

    fn set_channel_enabled(&self, name: &str, enabled: bool) -> SrResult<()> {
        self.channels.set_enabled(name, enabled)
    }

    fn attach(&self, sink: Rc<dyn PacketSink>) {
        self.attachment.attach(sink);
    }

    fn close(&self) -> SrResult<()> {
        Ok(())
    }
}

impl InputFileDevice for FileDevice {
    fn load(&self) -> SrResult<()> {
        info!("Loading {}", self.path.display());
        self.attachment.send(&Packet::Header {
            feed_version: FEED_VERSION,
            start_time: Local::now(),
        })?;

        let chunk_bytes = CHUNK_SAMPLES as usize * self.logic.unit_size.max(1);
        if self.channels.any_enabled(ChannelKind::Logic) {
            for chunk in self.logic.data.chunks(chunk_bytes) {
                self.attachment.send(&Packet::Logic(Logic::new(
                    self.logic.unit_size,
                    chunk.to_vec(),
                )))?;
            }
        }

        self.attachment.send(&Packet::End)
    }

    fn as_device(self: Rc<Self>) -> Rc<dyn Device> {
        self
    }
}
