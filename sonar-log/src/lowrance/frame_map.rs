//! Frame map recovery
//!
//! Containers carry no index of their frames. The scanner walks the stream
//! from the first frame and accepts a candidate record when either
//!
//! 1. its self-reported offset equals the cursor, or
//! 2. the next record's "previous frame size" equals the candidate's size.
//!
//! When both checks fail the cursor is out of step with the records, and a
//! byte scan looks for a known 32-bit signature that sits at a fixed offset
//! inside genuine frames. Scanning resumes at the frame start implied by the
//! first hit.

use super::offsets::{self, FrameField, FrameLayout};
use crate::types::{ChannelType, FileVersion, Result, SonarLogError, Timestamp};
use byteorder::{ByteOrder, LittleEndian};
use chrono::{DateTime, Utc};
use std::io::{Read, Seek, SeekFrom};

const SCAN_CHUNK: usize = 64 * 1024;

/// Start offset and time offset of one recovered frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameMapEntry {
    pub offset: u64,
    /// Milliseconds since log creation
    pub time_offset_ms: i32,
}

#[derive(Debug, Clone)]
pub struct FrameMap {
    pub version: FileVersion,
    pub creation_time: Timestamp,
    pub entries: Vec<FrameMapEntry>,
}

impl FrameMap {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn offsets(&self) -> impl Iterator<Item = u64> + '_ {
        self.entries.iter().map(|entry| entry.offset)
    }
}

/// Random access to little-endian fields of a seekable stream
pub(crate) struct Probe<'a, R> {
    reader: &'a mut R,
    len: u64,
}

impl<'a, R: Read + Seek> Probe<'a, R> {
    pub(crate) fn new(reader: &'a mut R) -> Result<Self> {
        let len = reader.seek(SeekFrom::End(0))?;
        Ok(Self { reader, len })
    }

    pub(crate) fn len(&self) -> u64 {
        self.len
    }

    fn fits(&self, pos: u64, width: u64) -> bool {
        pos.checked_add(width).map_or(false, |end| end <= self.len)
    }

    pub(crate) fn bytes<const N: usize>(&mut self, pos: u64) -> Result<Option<[u8; N]>> {
        if !self.fits(pos, N as u64) {
            return Ok(None);
        }
        let mut buf = [0u8; N];
        self.reader.seek(SeekFrom::Start(pos))?;
        self.reader.read_exact(&mut buf)?;
        Ok(Some(buf))
    }

    pub(crate) fn u16_at(&mut self, pos: u64) -> Result<Option<u16>> {
        Ok(self.bytes::<2>(pos)?.map(|b| LittleEndian::read_u16(&b)))
    }

    pub(crate) fn i32_at(&mut self, pos: u64) -> Result<Option<i32>> {
        Ok(self.bytes::<4>(pos)?.map(|b| LittleEndian::read_i32(&b)))
    }

    /// First position `>= from` holding one of the layout's signatures
    fn find_signature(&mut self, from: u64, layout: &FrameLayout) -> Result<Option<u64>> {
        let mut pos = from;
        let mut buf = vec![0u8; SCAN_CHUNK + 3];
        while self.fits(pos, 4) {
            let want = (self.len - pos).min(buf.len() as u64) as usize;
            self.reader.seek(SeekFrom::Start(pos))?;
            self.reader.read_exact(&mut buf[..want])?;

            let hit = buf[..want]
                .windows(4)
                .position(|window| layout.signatures().contains(&LittleEndian::read_u32(window)));
            if let Some(index) = hit {
                return Ok(Some(pos + index as u64));
            }
            pos += (want - 3) as u64;
        }
        Ok(None)
    }
}

/// Decision for the record under the cursor
enum Candidate {
    Accept(u64),
    Truncated,
    Resync,
}

fn check_candidate<R: Read + Seek>(
    probe: &mut Probe<'_, R>,
    layout: &FrameLayout,
    cursor: u64,
    size: u16,
) -> Result<Candidate> {
    let size = u64::from(size);
    if size < layout.header_len() as u64 {
        return Ok(Candidate::Resync);
    }

    let self_offset = probe.i32_at(cursor + layout.required(FrameField::FrameOffset) as u64)?;
    if self_offset.map(i64::from) == Some(cursor as i64) {
        if cursor + size > probe.len() {
            return Ok(Candidate::Truncated);
        }
        return Ok(Candidate::Accept(size));
    }

    let next_previous = probe.u16_at(cursor + size + layout.required(FrameField::PreviousFrameSize) as u64)?;
    if next_previous.map(u64::from) == Some(size) {
        return Ok(Candidate::Accept(size));
    }

    Ok(Candidate::Resync)
}

/// Frame start implied by the next signature strictly after `cursor`
fn resync<R: Read + Seek>(
    probe: &mut Probe<'_, R>,
    layout: &FrameLayout,
    cursor: u64,
) -> Result<Option<u64>> {
    let signature_offset = layout.signature_offset() as u64;
    let hit = probe.find_signature(cursor + signature_offset + 1, layout)?;
    Ok(hit.map(|pos| pos - signature_offset))
}

/// Guess the container version from the frames following `start`
pub fn detect_version<R: Read + Seek>(reader: &mut R, start: u64) -> Result<FileVersion> {
    let mut probe = Probe::new(reader)?;

    for layout in offsets::known_layouts() {
        let size_pos = start + layout.required(FrameField::ThisFrameSize) as u64;
        if let Some(size) = probe.u16_at(size_pos)? {
            if let Candidate::Accept(_) = check_candidate(&mut probe, layout, start, size)? {
                log::debug!("Detected {} from first frame at {}", layout.version(), start);
                return Ok(layout.version());
            }
        }
    }

    let mut best: Option<(u64, FileVersion)> = None;
    for layout in offsets::known_layouts() {
        let signature_offset = layout.signature_offset() as u64;
        if let Some(pos) = probe.find_signature(start + signature_offset, layout)? {
            let frame_start = pos - signature_offset;
            if best.map_or(true, |(offset, _)| frame_start < offset) {
                best = Some((frame_start, layout.version()));
            }
        }
    }

    match best {
        Some((offset, version)) => {
            log::debug!("Detected {} from signature at frame offset {}", version, offset);
            Ok(version)
        }
        None => Err(SonarLogError::UnknownFormat),
    }
}

/// Recover the frame map starting at `start`.
///
/// With no version hint the version is detected first, failing with
/// [`SonarLogError::UnknownFormat`] when no known signature appears. A
/// truncated trailing frame ends the scan and is not reported.
pub fn scan<R: Read + Seek>(
    reader: &mut R,
    start: u64,
    version: Option<FileVersion>,
) -> Result<FrameMap> {
    let version = match version {
        Some(version) => version,
        None => detect_version(reader, start)?,
    };
    let layout = offsets::layout(version)?;
    let mut probe = Probe::new(reader)?;

    let size_offset = layout.required(FrameField::ThisFrameSize) as u64;
    let creation_offset = layout.required(FrameField::CreationTime) as u64;
    let time_offset = layout.required(FrameField::TimeOffset) as u64;

    let mut entries = Vec::new();
    let mut creation_seconds: i32 = 0;
    let mut resyncs = 0usize;
    let mut cursor = start;

    while let Some(size) = probe.u16_at(cursor + size_offset)? {
        match check_candidate(&mut probe, layout, cursor, size)? {
            Candidate::Accept(size) => {
                let creation = probe.i32_at(cursor + creation_offset)?.unwrap_or(0);
                creation_seconds = creation_seconds.max(creation);
                let time_offset_ms = probe.i32_at(cursor + time_offset)?.unwrap_or(0);

                log::trace!("Frame at {} ({} bytes)", cursor, size);
                entries.push(FrameMapEntry {
                    offset: cursor,
                    time_offset_ms,
                });
                cursor += size;
            }
            Candidate::Truncated => {
                log::debug!("Truncated frame at {} ignored", cursor);
                break;
            }
            Candidate::Resync => match resync(&mut probe, layout, cursor)? {
                Some(next) => {
                    log::debug!("Out of step at {}, resuming at {}", cursor, next);
                    resyncs += 1;
                    cursor = next;
                }
                None => {
                    log::debug!("No frame signature after {}", cursor);
                    break;
                }
            },
        }
    }

    if resyncs > 0 {
        log::warn!("Frame map recovered after {} resynchronizations", resyncs);
    }

    let creation_time = if creation_seconds > 0 {
        DateTime::from_timestamp(i64::from(creation_seconds), 0).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    } else {
        log::warn!("No creation time stored in frames, using the Unix epoch");
        DateTime::<Utc>::UNIX_EPOCH
    };

    log::info!("Recovered {} {} frames", entries.len(), version);

    Ok(FrameMap {
        version,
        creation_time,
        entries,
    })
}

/// Four bytes at a fixed offset of every frame, with their usual readings.
/// Used to reverse-engineer undocumented fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ResearchValue {
    pub frame_offset: u64,
    pub frame_index: u32,
    pub channel: ChannelType,
    pub bytes: [u8; 4],
    pub first_i16: i16,
    pub second_i16: i16,
    pub as_i32: i32,
    pub as_f32: f32,
}

pub fn research_values<R: Read + Seek>(
    reader: &mut R,
    start: u64,
    value_offset: u64,
    version: FileVersion,
) -> Result<Vec<ResearchValue>> {
    let layout = offsets::layout(version)?;
    let map = scan(reader, start, Some(version))?;
    let mut probe = Probe::new(reader)?;

    let index_offset = layout.required(FrameField::FrameIndex) as u64;
    let channel_offset = layout.required(FrameField::ChannelType) as u64;

    let mut values = Vec::with_capacity(map.len());
    for frame_offset in map.offsets() {
        let Some(bytes) = probe.bytes::<4>(frame_offset + value_offset)? else {
            continue;
        };
        let frame_index = probe.bytes::<4>(frame_offset + index_offset)?.map_or(0, |b| LittleEndian::read_u32(&b));
        let channel = ChannelType::from_raw(probe.u16_at(frame_offset + channel_offset)?.unwrap_or(0));

        values.push(ResearchValue {
            frame_offset,
            frame_index,
            channel,
            bytes,
            first_i16: LittleEndian::read_i16(&bytes[..2]),
            second_i16: LittleEndian::read_i16(&bytes[2..]),
            as_i32: LittleEndian::read_i32(&bytes),
            as_f32: LittleEndian::read_f32(&bytes),
        });
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Minimal SL2 record: only the fields the scanner looks at
    fn sl2_record(offset: u32, size: u16, previous: u16, channel: u16, packet: u16) -> Vec<u8> {
        let mut frame = vec![0u8; size as usize];
        LittleEndian::write_u32(&mut frame[0..4], offset);
        LittleEndian::write_u16(&mut frame[28..30], size);
        LittleEndian::write_u16(&mut frame[30..32], previous);
        LittleEndian::write_u16(&mut frame[32..34], channel);
        LittleEndian::write_u16(&mut frame[34..36], packet);
        LittleEndian::write_i32(&mut frame[140..144], offset as i32);
        frame
    }

    fn sl2_stream(count: usize, packet: u16) -> Vec<u8> {
        let size = 144 + packet;
        let mut bytes = vec![2, 0, 1, 0, 0xB2, 0x07, 0, 0];
        let mut previous = 0;
        for _ in 0..count {
            let offset = bytes.len() as u32;
            bytes.extend(sl2_record(offset, size, previous, 0, packet));
            previous = size;
        }
        bytes
    }

    #[test]
    fn test_scan_clean_stream() {
        let bytes = sl2_stream(4, 1920);
        let map = scan(&mut Cursor::new(bytes), 8, Some(FileVersion::Sl2)).unwrap();
        let offsets: Vec<u64> = map.offsets().collect();
        assert_eq!(offsets, vec![8, 8 + 2064, 8 + 2 * 2064, 8 + 3 * 2064]);
        assert_eq!(map.entries[1].time_offset_ms, (8 + 2064) as i32);
    }

    #[test]
    fn test_mutual_size_check_accepts_wrong_self_offset() {
        let mut bytes = sl2_stream(3, 1920);
        // corrupt the self offset of the first frame
        LittleEndian::write_u32(&mut bytes[8..12], 0xDEAD);
        let map = scan(&mut Cursor::new(bytes), 8, Some(FileVersion::Sl2)).unwrap();
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_trailing_garbage_is_ignored() {
        let mut bytes = sl2_stream(3, 1920);
        bytes.extend(std::iter::repeat(0xAB).take(100));
        let map = scan(&mut Cursor::new(bytes), 8, Some(FileVersion::Sl2)).unwrap();
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_resync_after_gap() {
        let mut bytes = sl2_stream(2, 1920);
        bytes.extend(std::iter::repeat(0x55).take(37));
        let offset = bytes.len() as u32;
        bytes.extend(sl2_record(offset, 2064, 2064, 0, 1920));

        let map = scan(&mut Cursor::new(bytes), 8, Some(FileVersion::Sl2)).unwrap();
        let offsets: Vec<u64> = map.offsets().collect();
        assert_eq!(offsets, vec![8, 8 + 2064, u64::from(offset)]);
    }

    #[test]
    fn test_short_stream_yields_nothing() {
        let map = scan(&mut Cursor::new(vec![2, 0, 1, 0, 0, 0, 0, 0, 1, 2]), 8, Some(FileVersion::Sl2)).unwrap();
        assert!(map.is_empty());
        assert_eq!(map.creation_time, DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn test_unknown_format_without_hint() {
        let mut bytes = vec![0u8; 8];
        bytes.extend(std::iter::repeat(0x11).take(600));
        let err = scan(&mut Cursor::new(bytes), 8, None).unwrap_err();
        assert!(matches!(err, SonarLogError::UnknownFormat));
    }

    #[test]
    fn test_detect_sl2_without_hint() {
        let bytes = sl2_stream(2, 1920);
        assert_eq!(detect_version(&mut Cursor::new(bytes.clone()), 8).unwrap(), FileVersion::Sl2);
        assert_eq!(scan(&mut Cursor::new(bytes), 8, None).unwrap().len(), 2);
    }

    #[test]
    fn test_creation_time_is_maximum() {
        let mut bytes = sl2_stream(2, 1920);
        LittleEndian::write_i32(&mut bytes[8 + 60..8 + 64], -1);
        LittleEndian::write_i32(&mut bytes[8 + 2064 + 60..8 + 2064 + 64], 1_600_000_000);
        let map = scan(&mut Cursor::new(bytes), 8, Some(FileVersion::Sl2)).unwrap();
        assert_eq!(map.creation_time.timestamp(), 1_600_000_000);
    }

    #[test]
    fn test_research_values() {
        let bytes = sl2_stream(2, 1920);
        let values = research_values(&mut Cursor::new(bytes), 8, 32, FileVersion::Sl2).unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0].first_i16, 0);
        assert_eq!(values[0].second_i16, 1920);
        assert_eq!(values[0].as_i32, 125_829_120);
        assert_eq!(values[0].channel, ChannelType::Primary);
    }
}
