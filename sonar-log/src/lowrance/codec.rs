//! Frame record codec
//!
//! Device units on disk: lengths in feet, speeds in knots, angles in radians,
//! positions as integers of a spherical Mercator projection on the WGS84
//! polar radius.

use super::frame::{Frame, FrameFlags};
use super::offsets::{self, FrameField, FrameLayout};
use super::sounded::SoundedData;
use crate::primitives::{CoordinatePoint, LinearDimension, POLAR_RADIUS};
use crate::types::{ChannelType, FileVersion, Frequency, Result, SonarLogError, Timestamp};
use byteorder::{ByteOrder, LittleEndian};
use chrono::{DateTime, Duration, Utc};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};
use std::io::{Read, Seek, SeekFrom, Write};

const KNOTS_PER_METER_PER_SECOND: f64 = 1.94385;

/// Convert stored projection integers to WGS84 degrees
pub fn position_from_projection(int_longitude: i32, int_latitude: i32) -> CoordinatePoint {
    let longitude = (f64::from(int_longitude) / POLAR_RADIUS).to_degrees();
    let latitude = (2.0 * (f64::from(int_latitude) / POLAR_RADIUS).exp().atan() - FRAC_PI_2).to_degrees();
    CoordinatePoint::new(latitude, longitude)
}

/// Inverse of [`position_from_projection`], saturating at the poles
pub fn position_to_projection(point: &CoordinatePoint) -> (i32, i32) {
    let int_longitude = (point.longitude().to_radians() * POLAR_RADIUS).round() as i32;
    let int_latitude = ((point.latitude().to_radians() / 2.0 + FRAC_PI_4).tan().ln() * POLAR_RADIUS).round() as i32;
    (int_longitude, int_latitude)
}

fn knots_to_mps(knots: f32) -> f64 {
    f64::from(knots) / KNOTS_PER_METER_PER_SECOND
}

fn mps_to_knots(mps: f64) -> f32 {
    (mps * KNOTS_PER_METER_PER_SECOND) as f32
}

fn feet(value: f32) -> LinearDimension {
    LinearDimension::from_feet(f64::from(value))
}

/// Read-side view over the fixed part of one record
struct FieldReader<'a> {
    layout: &'a FrameLayout,
    bytes: &'a [u8],
}

impl FieldReader<'_> {
    fn slice(&self, field: FrameField) -> Option<&[u8]> {
        self.layout.offset(field).map(|offset| &self.bytes[offset..])
    }

    fn u8(&self, field: FrameField) -> u8 {
        self.slice(field).map_or(0, |b| b[0])
    }

    fn u16(&self, field: FrameField) -> u16 {
        self.slice(field).map_or(0, LittleEndian::read_u16)
    }

    fn u32(&self, field: FrameField) -> u32 {
        self.slice(field).map_or(0, LittleEndian::read_u32)
    }

    fn i32(&self, field: FrameField) -> i32 {
        self.slice(field).map_or(0, LittleEndian::read_i32)
    }

    fn f32(&self, field: FrameField) -> f32 {
        self.slice(field).map_or(0.0, LittleEndian::read_f32)
    }
}

/// Write-side view, fields the layout lacks are skipped
struct FieldWriter<'a> {
    layout: &'a FrameLayout,
    bytes: &'a mut [u8],
}

impl FieldWriter<'_> {
    fn slice(&mut self, field: FrameField) -> Option<&mut [u8]> {
        self.layout.offset(field).map(|offset| &mut self.bytes[offset..])
    }

    fn u8(&mut self, field: FrameField, value: u8) {
        if let Some(b) = self.slice(field) {
            b[0] = value;
        }
    }

    fn u16(&mut self, field: FrameField, value: u16) {
        if let Some(b) = self.slice(field) {
            LittleEndian::write_u16(b, value);
        }
    }

    fn u32(&mut self, field: FrameField, value: u32) {
        if let Some(b) = self.slice(field) {
            LittleEndian::write_u32(b, value);
        }
    }

    fn i32(&mut self, field: FrameField, value: i32) {
        if let Some(b) = self.slice(field) {
            LittleEndian::write_i32(b, value);
        }
    }

    fn f32(&mut self, field: FrameField, value: f32) {
        if let Some(b) = self.slice(field) {
            LittleEndian::write_f32(b, value);
        }
    }
}

/// Decode the frame starting at `offset`. The timestamp is the stored
/// millisecond offset counted from the Unix epoch.
pub fn decode_frame<R: Read + Seek>(reader: &mut R, offset: u64, version: FileVersion) -> Result<Frame> {
    decode_frame_since(reader, offset, version, DateTime::<Utc>::UNIX_EPOCH)
}

/// Decode the frame starting at `offset`, timestamped relative to `creation_time`
pub fn decode_frame_since<R: Read + Seek>(
    reader: &mut R,
    offset: u64,
    version: FileVersion,
    creation_time: Timestamp,
) -> Result<Frame> {
    let layout = offsets::layout(version)?;
    let header_len = layout.header_len();

    let mut header = vec![0u8; header_len];
    reader.seek(SeekFrom::Start(offset))?;
    reader.read_exact(&mut header).map_err(|e| {
        SonarLogError::Format(format!("frame at {} is truncated: {}", offset, e))
    })?;

    let fields = FieldReader {
        layout,
        bytes: &header,
    };

    let channel = ChannelType::from_raw(fields.u16(FrameField::ChannelType));
    let frame_size = usize::from(fields.u16(FrameField::ThisFrameSize));
    let packet_size = if channel == ChannelType::ThreeD {
        // stored packet size is unreliable for 3D frames
        frame_size.saturating_sub(header_len)
    } else {
        usize::from(fields.u16(FrameField::PacketSize))
    };

    let mut data = vec![0u8; packet_size];
    reader.read_exact(&mut data).map_err(|e| {
        SonarLogError::Format(format!(
            "sounded data of frame at {} is truncated ({} bytes expected): {}",
            offset, packet_size, e
        ))
    })?;

    let sounded_data = SoundedData::new(
        data,
        channel,
        feet(fields.f32(FrameField::UpperLimit)),
        feet(fields.f32(FrameField::LowerLimit)),
    );

    let time_offset = Duration::milliseconds(i64::from(fields.i32(FrameField::TimeOffset)));
    let point = position_from_projection(
        fields.i32(FrameField::IntLongitude),
        fields.i32(FrameField::IntLatitude),
    );

    Ok(Frame::builder(channel)
        .frame_index(fields.u32(FrameField::FrameIndex))
        .frequency(Frequency::from_raw(fields.u8(FrameField::Frequency)))
        .depth(feet(fields.f32(FrameField::Depth)))
        .keel_depth(feet(fields.f32(FrameField::KeelDepth)))
        .speed_gps(knots_to_mps(fields.f32(FrameField::SpeedGps)))
        .water_speed(knots_to_mps(fields.f32(FrameField::WaterSpeed)))
        .course_over_ground(fields.f32(FrameField::CourseOverGround))
        .heading(fields.f32(FrameField::Heading))
        .altitude(feet(fields.f32(FrameField::Altitude)))
        .temperature(fields.f32(FrameField::Temperature))
        .point(point)
        .flags(FrameFlags::from_raw(fields.u16(FrameField::Flags)))
        .timestamp(creation_time + time_offset)
        .sounded_data(sounded_data)
        .build())
}

/// Encode frames as the record sequence of a container whose first frame
/// starts at `start_offset`.
///
/// Frames are written ordered by `(frame_index, channel)`. Reserved channels
/// are skipped. Every record carries the offset of the latest record of each
/// channel, its own offset and the size of the record before it.
pub fn encode_frames(
    frames: &[Frame],
    start_offset: u64,
    version: FileVersion,
    creation_time: Timestamp,
) -> Result<Vec<u8>> {
    let layout = offsets::layout(version)?;

    let mut ordered: Vec<&Frame> = frames
        .iter()
        .filter(|frame| !frame.channel().is_reserved())
        .collect();
    let skipped = frames.len() - ordered.len();
    if skipped > 0 {
        log::debug!("Skipping {} frames of reserved channels", skipped);
    }

    if let Some(frame) = ordered
        .iter()
        .find(|frame| layout.last_offset_field(frame.channel()).is_none())
    {
        return Err(SonarLogError::Unsupported(format!(
            "{} frames cannot be written to {}",
            frame.channel(),
            version
        )));
    }

    ordered.sort_by(|a, b| a.cmp_order(b));

    let creation_seconds = creation_time.timestamp().clamp(0, i64::from(i32::MAX));
    let creation_base = DateTime::from_timestamp(creation_seconds, 0).unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

    let mut out = Vec::new();
    let mut last_offsets = [0u32; ChannelType::KNOWN.len()];
    let mut previous_size: u16 = 0;

    for frame in &ordered {
        let offset = start_offset + out.len() as u64;
        let offset = u32::try_from(offset).map_err(|_| {
            SonarLogError::Format(format!("frame offset {} exceeds the 32-bit range", offset))
        })?;

        let data = frame.sounded_data().data();
        let size = layout.header_len() + data.len();
        let size = u16::try_from(size).map_err(|_| {
            SonarLogError::Format(format!(
                "frame {} on {} is {} bytes, larger than a record can hold",
                frame.frame_index(),
                frame.channel(),
                size
            ))
        })?;

        if let Some(slot) = frame.channel().last_offset_slot() {
            last_offsets[slot] = offset;
        }

        let elapsed_ms = (frame.timestamp() - creation_base).num_milliseconds();
        let time_offset_ms = elapsed_ms.clamp(0, i64::from(i32::MAX));
        if time_offset_ms != elapsed_ms {
            log::warn!(
                "Frame {} on {} is {} ms from the creation time, stored as {} ms",
                frame.frame_index(),
                frame.channel(),
                elapsed_ms,
                time_offset_ms
            );
        }
        let time_offset_ms = time_offset_ms as i32;

        let mut record = vec![0u8; usize::from(size)];
        let mut fields = FieldWriter {
            layout,
            bytes: &mut record,
        };

        fields.u32(FrameField::FrameOffset, offset);
        for channel in ChannelType::KNOWN {
            if let (Some(field), Some(slot)) = (layout.last_offset_field(channel), channel.last_offset_slot()) {
                fields.u32(field, last_offsets[slot]);
            }
        }
        fields.u16(FrameField::ThisFrameSize, size);
        fields.u16(FrameField::PreviousFrameSize, previous_size);
        fields.u16(FrameField::ChannelType, frame.channel().raw());
        fields.u16(FrameField::PacketSize, data.len() as u16);
        fields.u32(FrameField::FrameIndex, frame.frame_index());
        fields.f32(FrameField::UpperLimit, frame.sounded_data().upper_limit().feet() as f32);
        fields.f32(FrameField::LowerLimit, frame.sounded_data().lower_limit().feet() as f32);
        fields.u8(FrameField::Frequency, frame.frequency().raw());
        // every record repeats the creation time, the scanner keeps the largest
        fields.i32(FrameField::CreationTime, creation_seconds as i32);
        fields.f32(FrameField::Depth, frame.depth().feet() as f32);
        fields.f32(FrameField::KeelDepth, frame.keel_depth().feet() as f32);
        fields.f32(FrameField::SpeedGps, mps_to_knots(frame.speed_gps()));
        fields.f32(FrameField::Temperature, frame.temperature());
        let (int_longitude, int_latitude) = position_to_projection(&frame.point());
        fields.i32(FrameField::IntLongitude, int_longitude);
        fields.i32(FrameField::IntLatitude, int_latitude);
        fields.f32(FrameField::WaterSpeed, mps_to_knots(frame.water_speed()));
        fields.f32(FrameField::CourseOverGround, frame.course_over_ground());
        fields.f32(FrameField::Altitude, frame.altitude().feet() as f32);
        fields.f32(FrameField::Heading, frame.heading());
        fields.u16(FrameField::Flags, frame.flags().raw());
        fields.i32(FrameField::TimeOffset, time_offset_ms);

        record[layout.header_len()..].copy_from_slice(data);
        out.extend_from_slice(&record);
        previous_size = size;
    }

    log::debug!("Encoded {} {} frames into {} bytes", ordered.len(), version, out.len());
    Ok(out)
}

/// [`encode_frames`] straight into a writer, returns the bytes written
pub fn write_frames<W: Write>(
    writer: &mut W,
    frames: &[Frame],
    start_offset: u64,
    version: FileVersion,
    creation_time: Timestamp,
) -> Result<usize> {
    let bytes = encode_frames(frames, start_offset, version, creation_time)?;
    writer.write_all(&bytes)?;
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_frame(channel: ChannelType, index: u32, packet: usize) -> Frame {
        let data: Vec<u8> = (0..packet).map(|i| (i % 251) as u8).collect();
        Frame::builder(channel)
            .frame_index(index)
            .frequency(Frequency::F83kHz)
            .depth(LinearDimension::from_feet(21.5))
            .keel_depth(LinearDimension::from_feet(1.5))
            .speed_gps(knots_to_mps(4.25))
            .water_speed(knots_to_mps(3.5))
            .course_over_ground(1.25)
            .heading(2.5)
            .altitude(LinearDimension::from_feet(320.0))
            .temperature(14.75)
            .point(position_from_projection(3_600_000, 8_000_000))
            .flags(FrameFlags::from_raw(0b1100_0000_0110_1011))
            .timestamp(DateTime::from_timestamp(1_500_000_000, 0).unwrap() + Duration::milliseconds(i64::from(index) * 250))
            .sounded_data(SoundedData::new(
                data,
                channel,
                LinearDimension::from_feet(0.0),
                LinearDimension::from_feet(60.0),
            ))
            .build()
    }

    fn creation() -> Timestamp {
        DateTime::from_timestamp(1_500_000_000, 0).unwrap()
    }

    #[test]
    fn test_projection_round_trip() {
        for &(lat, lon) in &[(60.1221, 32.3119), (-45.5, -120.25), (0.0, 0.0), (84.9, 179.9)] {
            let point = CoordinatePoint::new(lat, lon);
            let (x, y) = position_to_projection(&point);
            let back = position_from_projection(x, y);
            assert!((back.latitude() - lat).abs() < 1e-5, "{lat}");
            assert!((back.longitude() - lon).abs() < 1e-5, "{lon}");
        }
    }

    #[test]
    fn test_projection_round_trip_over_whole_range() {
        // half an integer step of longitude, plus float noise
        let tolerance = (0.5 / POLAR_RADIUS).to_degrees() + 1e-9;
        let mut latitudes: Vec<f64> = (0..360).map(|step| -90.0 + f64::from(step) * 0.5).collect();
        latitudes.extend([-89.9, 89.9, 89.99]);
        let longitudes: Vec<f64> = (0..48).map(|step| -180.0 + f64::from(step) * 7.5).collect();

        for &lat in &latitudes {
            for &lon in &longitudes {
                let (x, y) = position_to_projection(&CoordinatePoint::new(lat, lon));
                let back = position_from_projection(x, y);
                assert!((back.latitude() - lat).abs() <= tolerance, "latitude {lat} came back as {}", back.latitude());
                assert!((back.longitude() - lon).abs() <= tolerance, "longitude {lon} came back as {}", back.longitude());
            }
        }
    }

    #[test]
    fn test_projection_integers_are_stable() {
        let point = position_from_projection(3_600_000, 8_000_000);
        assert_eq!(position_to_projection(&point), (3_600_000, 8_000_000));
    }

    #[test]
    fn test_sl2_round_trip() {
        let frames = vec![
            sample_frame(ChannelType::Primary, 0, 64),
            sample_frame(ChannelType::DownScan, 0, 32),
        ];
        let bytes = encode_frames(&frames, 8, FileVersion::Sl2, creation()).unwrap();
        assert_eq!(bytes.len(), 144 + 64 + 144 + 32);

        let mut padded = vec![0u8; 8];
        padded.extend(bytes);
        let mut cursor = Cursor::new(padded);
        let first = decode_frame_since(&mut cursor, 8, FileVersion::Sl2, creation()).unwrap();
        let second = decode_frame_since(&mut cursor, 8 + 208, FileVersion::Sl2, creation()).unwrap();
        assert_eq!(first, frames[0]);
        assert_eq!(second, frames[1]);
    }

    #[test]
    fn test_sl3_drops_keel_depth() {
        let frames = vec![sample_frame(ChannelType::ThreeD, 3, 40)];
        let mut padded = vec![0u8; 8];
        padded.extend(encode_frames(&frames, 8, FileVersion::Sl3, creation()).unwrap());
        let decoded = decode_frame_since(&mut Cursor::new(padded), 8, FileVersion::Sl3, creation()).unwrap();

        assert_eq!(decoded.keel_depth(), LinearDimension::ZERO);
        assert_eq!(decoded.packet_size(), 40);
        assert_eq!(decoded.water_speed(), frames[0].water_speed());
        assert_eq!(decoded.flags(), frames[0].flags());
        assert_eq!(decoded.sounded_data().data(), frames[0].sounded_data().data());
    }

    #[test]
    fn test_back_references_and_sizes() {
        let frames = vec![
            sample_frame(ChannelType::DownScan, 1, 16),
            sample_frame(ChannelType::Primary, 0, 16),
            sample_frame(ChannelType::Primary, 1, 16),
        ];
        let bytes = encode_frames(&frames, 8, FileVersion::Sl2, creation()).unwrap();
        let record = 160usize;

        // order: (0, Primary), (1, Primary), (1, DownScan)
        let third = &bytes[2 * record..];
        assert_eq!(LittleEndian::read_u32(&third[0..4]), 8 + 2 * record as u32);
        assert_eq!(LittleEndian::read_u32(&third[4..8]), 8 + record as u32);
        assert_eq!(LittleEndian::read_u32(&third[12..16]), 8 + 2 * record as u32);
        assert_eq!(LittleEndian::read_u16(&third[28..30]), record as u16);
        assert_eq!(LittleEndian::read_u16(&third[30..32]), record as u16);
        assert_eq!(LittleEndian::read_u16(&bytes[30..32]), 0);

        // creation time in every record, offsets in their own field
        assert_eq!(LittleEndian::read_i32(&bytes[60..64]), 1_500_000_000);
        assert_eq!(LittleEndian::read_i32(&bytes[record + 60..record + 64]), 1_500_000_000);
        assert_eq!(LittleEndian::read_i32(&bytes[record + 140..record + 144]), 250);
    }

    #[test]
    fn test_time_offsets_are_clamped() {
        let early = sample_frame(ChannelType::Primary, 0, 16)
            .to_builder()
            .timestamp(creation() - Duration::seconds(5))
            .build();
        let late = sample_frame(ChannelType::Primary, 1, 16)
            .to_builder()
            .timestamp(creation() + Duration::days(30))
            .build();
        let bytes = encode_frames(&[early, late], 8, FileVersion::Sl2, creation()).unwrap();
        let record = 160usize;
        assert_eq!(LittleEndian::read_i32(&bytes[140..144]), 0);
        assert_eq!(LittleEndian::read_i32(&bytes[record + 140..record + 144]), i32::MAX);
    }

    #[test]
    fn test_three_d_into_sl2_is_rejected() {
        let frames = vec![sample_frame(ChannelType::ThreeD, 0, 16)];
        let result = encode_frames(&frames, 8, FileVersion::Sl2, creation());
        assert!(matches!(result, Err(SonarLogError::Unsupported(_))));
    }

    #[test]
    fn test_reserved_channels_are_skipped() {
        let frames = vec![
            sample_frame(ChannelType::Reserved(7), 0, 16),
            sample_frame(ChannelType::Primary, 0, 16),
        ];
        let bytes = encode_frames(&frames, 8, FileVersion::Sl2, creation()).unwrap();
        assert_eq!(bytes.len(), 160);
        assert_eq!(LittleEndian::read_u16(&bytes[32..34]), 0);
    }

    #[test]
    fn test_oversized_frame_is_rejected() {
        let frames = vec![sample_frame(ChannelType::Primary, 0, 70_000)];
        let result = encode_frames(&frames, 8, FileVersion::Sl2, creation());
        assert!(matches!(result, Err(SonarLogError::Format(_))));
    }

    #[test]
    fn test_truncated_frame() {
        let frames = vec![sample_frame(ChannelType::Primary, 0, 64)];
        let mut bytes = vec![0u8; 8];
        bytes.extend(encode_frames(&frames, 8, FileVersion::Sl2, creation()).unwrap());
        bytes.truncate(8 + 150);
        let result = decode_frame(&mut Cursor::new(bytes), 8, FileVersion::Sl2);
        assert!(matches!(result, Err(SonarLogError::Format(_))));
    }
}
