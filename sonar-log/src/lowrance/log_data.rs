use super::codec;
use super::frame::Frame;
use super::frame_map;
use super::header::Header;
use crate::config::FrameFilter;
use crate::primitives::{CoordinatePoint, LinearDimension};
use crate::types::{ChannelType, FileVersion, Frequency, Result, SonarLogError, Timestamp};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

/// Per-channel summary of a log
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSummary {
    pub channel: ChannelType,
    pub frequency: Frequency,
    pub first_frame_index: u32,
    pub last_frame_index: u32,
    pub frame_count: usize,
}

/// A whole SL2/SL3 container held in memory
#[derive(Debug, Clone)]
pub struct LowranceLogData {
    pub name: String,
    pub header: Header,
    pub creation_time: Timestamp,
    pub frames: Vec<Frame>,
}

impl LowranceLogData {
    pub fn new(header: Header, creation_time: Timestamp, frames: Vec<Frame>) -> Self {
        Self {
            name: String::new(),
            header,
            creation_time,
            frames,
        }
    }

    pub fn version(&self) -> FileVersion {
        self.header.file_version
    }

    pub fn with_header(mut self, header: Header) -> Self {
        self.header = header;
        self
    }

    pub fn read_from<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let header = Header::read(reader, 0)?;
        if header.file_version == FileVersion::Slg {
            return Err(SonarLogError::Unsupported(
                "reading SLG containers".to_string(),
            ));
        }
        log::info!(
            "Read {} header (hardware {}, block size {})",
            header.file_version,
            header.hardware_version,
            header.block_size
        );

        let map = frame_map::scan(reader, Header::LEN as u64, Some(header.file_version))?;

        let mut frames = Vec::with_capacity(map.len());
        for entry in &map.entries {
            frames.push(codec::decode_frame_since(
                reader,
                entry.offset,
                map.version,
                map.creation_time,
            )?);
        }

        Ok(Self {
            name: String::new(),
            header,
            creation_time: map.creation_time,
            frames,
        })
    }

    /// Read a container from disk, naming it after the file stem
    pub fn read_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SonarLogError::Format(format!(
                "File does not exist: {:?}",
                path
            )));
        }
        let mut reader = BufReader::new(File::open(path)?);
        let mut data = Self::read_from(&mut reader)?;
        data.name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(data)
    }

    /// Write the header and every frame, returns the bytes written
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<usize> {
        self.header.write(writer)?;
        let written = codec::write_frames(
            writer,
            &self.frames,
            Header::LEN as u64,
            self.header.file_version,
            self.creation_time,
        )?;
        log::info!("Wrote {} container, {} bytes", self.header.file_version, Header::LEN + written);
        Ok(Header::LEN + written)
    }

    pub fn write_to_path(&self, path: &Path) -> Result<usize> {
        let mut writer = BufWriter::new(File::create(path)?);
        let written = self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(written)
    }

    /// Copy written as another container version. ThreeD frames are dropped
    /// when the target cannot hold them.
    pub fn converted_to(&self, version: FileVersion) -> Result<Self> {
        if version == self.version() {
            return Ok(self.clone());
        }
        let header = Header::standard(version)?;
        let frames: Vec<Frame> = self
            .frames
            .iter()
            .filter(|frame| version != FileVersion::Sl2 || frame.channel() != ChannelType::ThreeD)
            .cloned()
            .collect();
        let dropped = self.frames.len() - frames.len();
        if dropped > 0 {
            log::warn!("Dropped {} ThreeD frames unsupported by {}", dropped, version);
        }
        Ok(Self {
            name: self.name.clone(),
            header,
            creation_time: self.creation_time,
            frames,
        })
    }

    pub fn filtered(&self, filter: &FrameFilter) -> Self {
        Self {
            name: self.name.clone(),
            header: self.header,
            creation_time: self.creation_time,
            frames: self
                .frames
                .iter()
                .filter(|frame| filter.accepts(frame))
                .cloned()
                .collect(),
        }
    }

    /// Add `shift` to the depth of every frame
    pub fn shift_depth(&mut self, shift: LinearDimension) {
        for frame in &mut self.frames {
            *frame = frame.to_builder().depth(frame.depth() + shift).build();
        }
    }

    /// Replace every position with 0,0
    pub fn anonymize(&mut self) {
        for frame in &mut self.frames {
            *frame = frame.to_builder().point(CoordinatePoint::new(0.0, 0.0)).build();
        }
    }

    /// One summary per channel, in channel order
    pub fn channels(&self) -> Vec<ChannelSummary> {
        let mut summaries: BTreeMap<ChannelType, ChannelSummary> = BTreeMap::new();
        for frame in &self.frames {
            summaries
                .entry(frame.channel())
                .and_modify(|summary| {
                    summary.first_frame_index = summary.first_frame_index.min(frame.frame_index());
                    summary.last_frame_index = summary.last_frame_index.max(frame.frame_index());
                    summary.frame_count += 1;
                })
                .or_insert_with(|| ChannelSummary {
                    channel: frame.channel(),
                    frequency: frame.frequency(),
                    first_frame_index: frame.frame_index(),
                    last_frame_index: frame.frame_index(),
                    frame_count: 1,
                });
        }
        summaries.into_values().collect()
    }
}

impl std::fmt::Display for LowranceLogData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {} frames", self.header.file_version, self.frames.len())
    }
}
